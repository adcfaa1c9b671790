//! Command dispatcher - turns one [`Command`] into device primitive calls.
//!
//! The caller holds the shared device lock for the whole call, so a chord
//! or a double click is never interleaved with a transport restart.
//! Commands for a disconnected device are dropped, not requeued: replaying
//! stale input after a long disconnect is worse than losing it.

use crate::command::{Command, KeyCode, Modifiers, MouseButton};
use crate::config::{CHORD_HOLD_MS, DOUBLE_CLICK_GAP_MS, MIN_REPORT_INTERVAL_US};
use crate::device::{DeviceKind, HidDevices, KeyboardDevice, MouseDevice};
use crate::error::DeviceError;
use embedded_hal_async::delay::DelayNs;

/// Timing knobs of the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Minimum spacing between two mouse movement reports (µs).
    pub min_report_interval_us: u64,
    /// Hold time of a modifier chord before release (ms).
    pub chord_hold_ms: u32,
    /// Gap between the clicks of a double click (ms).
    pub double_click_gap_ms: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            min_report_interval_us: MIN_REPORT_INTERVAL_US,
            chord_hold_ms: CHORD_HOLD_MS,
            double_click_gap_ms: DOUBLE_CLICK_GAP_MS,
        }
    }
}

/// Why a command produced no (complete) HID output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// The target device had no host connected.
    Disconnected(DeviceKind),
    /// A mouse move arrived inside the minimum report interval.
    Throttled,
    /// The command was `Command::Invalid`.
    Invalid,
    /// A device primitive failed; not retried.
    Failed(DeviceError),
}

/// Result of dispatching one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchOutcome {
    Sent,
    Dropped(DropReason),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}

pub struct Dispatcher {
    config: DispatchConfig,
    last_move_us: Option<u64>,
}

impl Dispatcher {
    pub const fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            last_move_us: None,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch one command.
    ///
    /// `now_us` is a monotonic timestamp used only for the mouse movement
    /// throttle. `delay` provides the chord hold and double-click gap.
    pub async fn dispatch<K, M, D>(
        &mut self,
        command: &Command,
        devices: &mut HidDevices<K, M>,
        delay: &mut D,
        now_us: u64,
    ) -> DispatchOutcome
    where
        K: KeyboardDevice,
        M: MouseDevice,
        D: DelayNs,
    {
        let Some(target) = command.target() else {
            return DispatchOutcome::Dropped(DropReason::Invalid);
        };
        if !devices.is_connected(target) {
            return DispatchOutcome::Dropped(DropReason::Disconnected(target));
        }

        let keyboard = &mut devices.keyboard;
        let mouse = &mut devices.mouse;

        let result = match command {
            Command::KeyPress(c) => KeyCode::from_char(*c)
                .ok_or(DeviceError::Unmapped)
                .and_then(|code| keyboard.write(code)),
            Command::SpecialKey(key) => keyboard.write(key.key_code()),
            Command::ModifiedKey { modifiers, key } => {
                press_chord(keyboard, *modifiers, *key, delay, self.config.chord_hold_ms).await
            }
            Command::TypeText(text) => keyboard.print(text),
            Command::ModifiedText { modifiers, text } => {
                type_with_modifiers(keyboard, *modifiers, text)
            }
            Command::MouseMove { x, y, scroll } => {
                if self.throttled(now_us) {
                    return DispatchOutcome::Dropped(DropReason::Throttled);
                }
                self.last_move_us = Some(now_us);
                mouse.move_by(*x, *y, *scroll)
            }
            Command::MouseScroll(wheel) => mouse.move_by(0, 0, *wheel),
            Command::MouseClick(button) => mouse.click(*button),
            Command::MousePress(button) => mouse.press(*button),
            Command::MouseRelease(button) => mouse.release(*button),
            Command::MouseDoubleClick(button) => {
                double_click(mouse, *button, delay, self.config.double_click_gap_ms).await
            }
            Command::Invalid => return DispatchOutcome::Dropped(DropReason::Invalid),
        };

        match result {
            Ok(()) => DispatchOutcome::Sent,
            Err(e) => DispatchOutcome::Dropped(DropReason::Failed(e)),
        }
    }

    fn throttled(&self, now_us: u64) -> bool {
        self.last_move_us
            .is_some_and(|last| now_us.saturating_sub(last) < self.config.min_report_interval_us)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

/// Press modifiers → press key → hold → release all.
///
/// The release always runs so a failed press never leaves keys stuck on
/// the host.
async fn press_chord<K: KeyboardDevice, D: DelayNs>(
    keyboard: &mut K,
    modifiers: Modifiers,
    key: KeyCode,
    delay: &mut D,
    hold_ms: u32,
) -> Result<(), DeviceError> {
    let pressed = press_all(keyboard, modifiers, key);
    if pressed.is_ok() {
        delay.delay_ms(hold_ms).await;
    }
    let released = keyboard.release_all();
    pressed.and(released)
}

fn press_all<K: KeyboardDevice>(
    keyboard: &mut K,
    modifiers: Modifiers,
    key: KeyCode,
) -> Result<(), DeviceError> {
    for code in modifiers.key_codes() {
        keyboard.press(code)?;
    }
    keyboard.press(key)
}

/// Press modifiers → print → release all. The release always runs.
fn type_with_modifiers<K: KeyboardDevice>(
    keyboard: &mut K,
    modifiers: Modifiers,
    text: &str,
) -> Result<(), DeviceError> {
    let typed = modifiers
        .key_codes()
        .try_for_each(|code| keyboard.press(code))
        .and_then(|()| keyboard.print(text));
    let released = keyboard.release_all();
    typed.and(released)
}

async fn double_click<M: MouseDevice, D: DelayNs>(
    mouse: &mut M,
    button: MouseButton,
    delay: &mut D,
    gap_ms: u32,
) -> Result<(), DeviceError> {
    mouse.click(button)?;
    delay.delay_ms(gap_ms).await;
    mouse.click(button)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SpecialKey;
    use crate::device::mock::*;
    use embassy_futures::block_on;

    fn dispatch(
        dispatcher: &mut Dispatcher,
        command: &Command,
        devices: &mut TestDevices,
        now_us: u64,
    ) -> DispatchOutcome {
        let mut delay = RecordingDelay::default();
        block_on(dispatcher.dispatch(command, devices, &mut delay, now_us))
    }

    #[test]
    fn key_press_writes_once() {
        let mut devices = connected_devices();
        let outcome = dispatch(
            &mut Dispatcher::default(),
            &Command::KeyPress('a'),
            &mut devices,
            0,
        );
        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(devices.keyboard.calls, [Call::Write(KeyCode(b'a'))]);
        assert!(devices.mouse.calls.is_empty());
    }

    #[test]
    fn special_key_writes_its_code() {
        let mut devices = connected_devices();
        dispatch(
            &mut Dispatcher::default(),
            &Command::SpecialKey(SpecialKey::Enter),
            &mut devices,
            0,
        );
        assert_eq!(devices.keyboard.calls, [Call::Write(KeyCode::ENTER)]);
    }

    #[test]
    fn chord_presses_modifiers_then_key_then_releases() {
        let mut devices = connected_devices();
        let mut delay = RecordingDelay::default();
        let command = Command::ModifiedKey {
            modifiers: Modifiers::SHIFT | Modifiers::CTRL,
            key: KeyCode(b't'),
        };

        let outcome =
            block_on(Dispatcher::default().dispatch(&command, &mut devices, &mut delay, 0));

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(
            devices.keyboard.calls,
            [
                Call::Press(KeyCode::LEFT_CTRL),
                Call::Press(KeyCode::LEFT_SHIFT),
                Call::Press(KeyCode(b't')),
                Call::ReleaseAll,
            ]
        );
        assert_eq!(delay.count, 1);
        assert_eq!(delay.total_ns, u64::from(CHORD_HOLD_MS) * 1_000_000);
    }

    #[test]
    fn chord_releases_even_when_a_press_fails() {
        let mut devices = connected_devices();
        devices.keyboard.fail_press = true;
        let mut delay = RecordingDelay::default();
        let command = Command::ModifiedKey {
            modifiers: Modifiers::ALT,
            key: KeyCode::TAB,
        };

        let outcome =
            block_on(Dispatcher::default().dispatch(&command, &mut devices, &mut delay, 0));

        assert_eq!(
            outcome,
            DispatchOutcome::Dropped(DropReason::Failed(DeviceError::Rollover))
        );
        assert_eq!(
            devices.keyboard.calls,
            [Call::Press(KeyCode::LEFT_ALT), Call::ReleaseAll]
        );
        assert_eq!(delay.count, 0);
    }

    #[test]
    fn type_text_prints() {
        let mut devices = connected_devices();
        let mut text = heapless::String::new();
        text.push_str("hi there").unwrap();
        dispatch(
            &mut Dispatcher::default(),
            &Command::TypeText(text),
            &mut devices,
            0,
        );
        assert_eq!(devices.keyboard.calls, [Call::Print("hi there".into())]);
    }

    #[test]
    fn text_with_modifiers_holds_them_while_printing() {
        let mut devices = connected_devices();
        let command = Command::ModifiedText {
            modifiers: Modifiers::SHIFT,
            text: heapless::String::try_from("hello").unwrap(),
        };

        let outcome = dispatch(&mut Dispatcher::default(), &command, &mut devices, 0);

        assert_eq!(outcome, DispatchOutcome::Sent);
        assert_eq!(
            devices.keyboard.calls,
            [
                Call::Press(KeyCode::LEFT_SHIFT),
                Call::Print("hello".into()),
                Call::ReleaseAll,
            ]
        );
    }

    #[test]
    fn text_with_modifiers_releases_when_a_press_fails() {
        let mut devices = connected_devices();
        devices.keyboard.fail_press = true;
        let command = Command::ModifiedText {
            modifiers: Modifiers::CTRL | Modifiers::SHIFT,
            text: heapless::String::try_from("ab").unwrap(),
        };

        let outcome = dispatch(&mut Dispatcher::default(), &command, &mut devices, 0);

        assert_eq!(
            outcome,
            DispatchOutcome::Dropped(DropReason::Failed(DeviceError::Rollover))
        );
        assert_eq!(
            devices.keyboard.calls,
            [Call::Press(KeyCode::LEFT_CTRL), Call::ReleaseAll]
        );
    }

    #[test]
    fn disconnected_keyboard_gets_no_calls() {
        let mut devices = disconnected_devices();
        let mut dispatcher = Dispatcher::default();
        for command in [
            Command::KeyPress('q'),
            Command::SpecialKey(SpecialKey::Esc),
            Command::ModifiedKey {
                modifiers: Modifiers::CTRL,
                key: KeyCode(b'c'),
            },
        ] {
            let outcome = dispatch(&mut dispatcher, &command, &mut devices, 0);
            assert_eq!(
                outcome,
                DispatchOutcome::Dropped(DropReason::Disconnected(DeviceKind::Keyboard))
            );
        }
        assert!(devices.keyboard.calls.is_empty());
    }

    #[test]
    fn disconnected_mouse_gets_no_calls() {
        let mut devices = disconnected_devices();
        devices.keyboard.connected = true;
        let mut dispatcher = Dispatcher::default();
        for command in [
            Command::MouseMove { x: 1, y: 1, scroll: 0 },
            Command::MouseClick(MouseButton::Middle),
            Command::MousePress(MouseButton::Left),
            Command::MouseRelease(MouseButton::Left),
            Command::MouseScroll(4),
            Command::MouseDoubleClick(MouseButton::Left),
        ] {
            let outcome = dispatch(&mut dispatcher, &command, &mut devices, 0);
            assert_eq!(
                outcome,
                DispatchOutcome::Dropped(DropReason::Disconnected(DeviceKind::Mouse))
            );
        }
        assert!(devices.mouse.calls.is_empty());
        assert!(devices.keyboard.calls.is_empty());
    }

    #[test]
    fn invalid_is_dropped() {
        let mut devices = connected_devices();
        let outcome = dispatch(&mut Dispatcher::default(), &Command::Invalid, &mut devices, 0);
        assert_eq!(outcome, DispatchOutcome::Dropped(DropReason::Invalid));
        assert!(devices.keyboard.calls.is_empty());
        assert!(devices.mouse.calls.is_empty());
    }

    #[test]
    fn mouse_move_is_throttled_by_timestamp() {
        let mut devices = connected_devices();
        let mut dispatcher = Dispatcher::default();
        let step = Command::MouseMove { x: 3, y: -3, scroll: 0 };

        assert!(dispatch(&mut dispatcher, &step, &mut devices, 1_000).is_sent());
        assert_eq!(
            dispatch(&mut dispatcher, &step, &mut devices, 1_000 + MIN_REPORT_INTERVAL_US - 1),
            DispatchOutcome::Dropped(DropReason::Throttled)
        );
        let later = 1_000 + MIN_REPORT_INTERVAL_US;
        assert!(dispatch(&mut dispatcher, &step, &mut devices, later).is_sent());

        assert_eq!(devices.mouse.calls, [Call::Move(3, -3, 0), Call::Move(3, -3, 0)]);
    }

    #[test]
    fn throttle_ignores_clicks_and_scroll() {
        let mut devices = connected_devices();
        let mut dispatcher = Dispatcher::default();
        dispatch(&mut dispatcher, &Command::MouseMove { x: 1, y: 0, scroll: 0 }, &mut devices, 0);
        let click = Command::MouseClick(MouseButton::Left);
        assert!(dispatch(&mut dispatcher, &click, &mut devices, 1).is_sent());
        assert!(dispatch(&mut dispatcher, &Command::MouseScroll(-1), &mut devices, 2).is_sent());
        assert_eq!(
            devices.mouse.calls,
            [
                Call::Move(1, 0, 0),
                Call::Click(MouseButton::Left),
                Call::Move(0, 0, -1),
            ]
        );
    }

    #[test]
    fn move_carries_scroll() {
        let mut devices = connected_devices();
        dispatch(
            &mut Dispatcher::default(),
            &Command::MouseMove { x: -7, y: 9, scroll: 2 },
            &mut devices,
            0,
        );
        assert_eq!(devices.mouse.calls, [Call::Move(-7, 9, 2)]);
    }

    #[test]
    fn button_press_and_release() {
        let mut devices = connected_devices();
        let mut dispatcher = Dispatcher::default();
        dispatch(&mut dispatcher, &Command::MousePress(MouseButton::Left), &mut devices, 0);
        dispatch(&mut dispatcher, &Command::MouseRelease(MouseButton::Left), &mut devices, 0);
        assert_eq!(
            devices.mouse.calls,
            [
                Call::ButtonPress(MouseButton::Left),
                Call::ButtonRelease(MouseButton::Left)
            ]
        );
    }

    #[test]
    fn double_click_waits_between_clicks() {
        let mut devices = connected_devices();
        let mut delay = RecordingDelay::default();
        let outcome = block_on(Dispatcher::default().dispatch(
            &Command::MouseDoubleClick(MouseButton::Right),
            &mut devices,
            &mut delay,
            0,
        ));
        assert!(outcome.is_sent());
        assert_eq!(
            devices.mouse.calls,
            [Call::Click(MouseButton::Right), Call::Click(MouseButton::Right)]
        );
        assert_eq!(delay.total_ns, u64::from(DOUBLE_CLICK_GAP_MS) * 1_000_000);
    }
}
