//! Integration tests for the serial2ble command pipeline.
//!
//! Serial line → parser → queue → dispatcher → device calls, with the
//! connection monitor sharing the same device lock.

use core::future::ready;
use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;

use serial2ble::line::LineBuffer;
use serial2ble::monitor::MonitorConfig;
use serial2ble::runtime::{self, DispatchStep, SharedDevices};
use serial2ble::status::{StatusMessage, StatusReport};
use serial2ble::{
    parse, Command, CommandKind, CommandQueue, ConnectionMonitor, DeviceError, DeviceKind,
    DispatchOutcome, Dispatcher, DropReason, Error, HidDevices, KeyCode, KeyboardDevice,
    MonitorEvent, MouseButton, MouseDevice, SpecialKey,
};

// ═══════════════════════════════════════════════════════════════════════════
// Fakes
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
enum Event {
    Begin,
    End,
    Write(KeyCode),
    Press(KeyCode),
    ReleaseAll,
    Print(String),
    Move(i8, i8, i8),
    Click(MouseButton),
    ButtonPress(MouseButton),
    ButtonRelease(MouseButton),
}

#[derive(Default)]
struct FakeKeyboard {
    connected: bool,
    events: Vec<Event>,
}

impl KeyboardDevice for FakeKeyboard {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.events.push(Event::Begin);
        Ok(())
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        self.events.push(Event::Write(key));
        Ok(())
    }

    fn press(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        self.events.push(Event::Press(key));
        Ok(())
    }

    fn release_all(&mut self) -> Result<(), DeviceError> {
        self.events.push(Event::ReleaseAll);
        Ok(())
    }

    fn print(&mut self, text: &str) -> Result<(), DeviceError> {
        self.events.push(Event::Print(text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeMouse {
    connected: bool,
    events: Vec<Event>,
}

impl MouseDevice for FakeMouse {
    fn begin(&mut self) -> Result<(), DeviceError> {
        self.events.push(Event::Begin);
        Ok(())
    }

    fn end(&mut self) {
        self.events.push(Event::End);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn move_by(&mut self, dx: i8, dy: i8, wheel: i8) -> Result<(), DeviceError> {
        self.events.push(Event::Move(dx, dy, wheel));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        self.events.push(Event::Click(button));
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        self.events.push(Event::ButtonPress(button));
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> Result<(), DeviceError> {
        self.events.push(Event::ButtonRelease(button));
        Ok(())
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

type Devices = SharedDevices<NoopRawMutex, FakeKeyboard, FakeMouse>;
type Queue = CommandQueue<NoopRawMutex, 8>;

fn devices(keyboard_up: bool, mouse_up: bool) -> Devices {
    Mutex::new(HidDevices::new(
        FakeKeyboard {
            connected: keyboard_up,
            ..Default::default()
        },
        FakeMouse {
            connected: mouse_up,
            ..Default::default()
        },
    ))
}

/// Feed raw serial bytes through the line assembler into the queue.
fn feed(queue: &Queue, bytes: &[u8]) -> Vec<Result<CommandKind, Error>> {
    let mut lines: LineBuffer<128> = LineBuffer::new();
    bytes
        .iter()
        .filter_map(|&b| lines.push(b))
        .map(|line| line.and_then(|line| runtime::accept_line(queue, &line)))
        .collect()
}

fn drain(
    queue: &Queue,
    devices: &Devices,
    dispatcher: &mut Dispatcher,
    now_us: u64,
) -> Vec<DispatchStep> {
    let mut steps = Vec::new();
    loop {
        let step = block_on(runtime::dispatch_next(
            queue,
            devices,
            dispatcher,
            &mut NoDelay,
            now_us,
            ready(()),
        ))
        .unwrap();
        if step == DispatchStep::Idle {
            return steps;
        }
        steps.push(step);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// End-to-end scenarios
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn special_enter_writes_once() {
    assert_eq!(parse("special:enter"), Command::SpecialKey(SpecialKey::Enter));

    let queue = Queue::new();
    let devices = devices(true, true);
    assert_eq!(feed(&queue, b"special:enter\r\n"), [Ok(CommandKind::SpecialKey)]);

    let steps = drain(&queue, &devices, &mut Dispatcher::default(), 0);
    assert_eq!(
        steps,
        [DispatchStep::Dispatched {
            kind: CommandKind::SpecialKey,
            outcome: DispatchOutcome::Sent
        }]
    );

    let devices = devices.into_inner();
    assert_eq!(devices.keyboard.events, [Event::Write(KeyCode::ENTER)]);
    assert!(devices.mouse.events.is_empty());
}

#[test]
fn legacy_shifted_text_holds_shift_while_typing() {
    let queue = Queue::new();
    let devices = devices(true, true);
    assert_eq!(feed(&queue, b"k:shift+hello\n"), [Ok(CommandKind::ModifiedText)]);

    let steps = drain(&queue, &devices, &mut Dispatcher::default(), 0);
    assert_eq!(
        steps,
        [DispatchStep::Dispatched {
            kind: CommandKind::ModifiedText,
            outcome: DispatchOutcome::Sent
        }]
    );
    assert_eq!(
        devices.into_inner().keyboard.events,
        [
            Event::Press(KeyCode::LEFT_SHIFT),
            Event::Print("hello".into()),
            Event::ReleaseAll,
        ]
    );
}

#[test]
fn oversized_move_is_clamped() {
    assert_eq!(
        parse("move:500,-900"),
        Command::MouseMove {
            x: 127,
            y: -127,
            scroll: 0
        }
    );

    let queue = Queue::new();
    let devices = devices(true, true);
    feed(&queue, b"move:500,-900\n");
    drain(&queue, &devices, &mut Dispatcher::default(), 0);

    assert_eq!(devices.into_inner().mouse.events, [Event::Move(127, -127, 0)]);
}

#[test]
fn click_on_disconnected_mouse_is_dropped() {
    assert_eq!(parse("click:middle"), Command::MouseClick(MouseButton::Middle));

    let queue = Queue::new();
    let devices = devices(true, false);
    feed(&queue, b"click:middle\n");
    let steps = drain(&queue, &devices, &mut Dispatcher::default(), 0);

    assert_eq!(
        steps,
        [DispatchStep::Dispatched {
            kind: CommandKind::MouseClick,
            outcome: DispatchOutcome::Dropped(DropReason::Disconnected(DeviceKind::Mouse))
        }]
    );
    let devices = devices.into_inner();
    assert!(devices.mouse.events.is_empty());
    assert!(devices.keyboard.events.is_empty());
}

#[test]
fn mixed_session_preserves_order() {
    let queue = Queue::new();
    let devices = devices(true, true);
    let input = b"key:ctrl+c\r\ntype:hi\r\nscroll:-3\r\npress:left\r\nrelease:left\r\n";
    assert!(feed(&queue, input).iter().all(Result::is_ok));
    assert_eq!(queue.len(), 5);

    let steps = drain(&queue, &devices, &mut Dispatcher::default(), 0);
    assert!(steps.iter().all(|s| matches!(
        s,
        DispatchStep::Dispatched {
            outcome: DispatchOutcome::Sent,
            ..
        }
    )));

    let devices = devices.into_inner();
    assert_eq!(
        devices.keyboard.events,
        [
            Event::Press(KeyCode::LEFT_CTRL),
            Event::Press(KeyCode(b'c')),
            Event::ReleaseAll,
            Event::Print("hi".to_string()),
        ]
    );
    assert_eq!(
        devices.mouse.events,
        [
            Event::Move(0, 0, -3),
            Event::ButtonPress(MouseButton::Left),
            Event::ButtonRelease(MouseButton::Left),
        ]
    );
}

#[test]
fn bad_lines_are_reported_and_good_ones_still_queue() {
    let queue = Queue::new();
    let results = feed(&queue, b"jump:1\nkey:a\n\xff\n");
    assert!(matches!(results[0], Err(Error::Parse(_))));
    assert_eq!(results[1], Ok(CommandKind::KeyPress));
    assert_eq!(results[2], Err(Error::NotUtf8));
    assert_eq!(queue.len(), 1);

    let line = StatusMessage::Error(Error::NotUtf8).encode();
    assert!(line.starts_with("ERR "));
    assert!(line.ends_with("\r\n"));
}

#[test]
fn queue_overflow_drops_newest() {
    let queue = Queue::new();
    let input: Vec<u8> = (0..10).flat_map(|_| b"key:x\n".iter().copied()).collect();
    let results = feed(&queue, &input);
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 8);
    assert_eq!(results[8], Err(Error::QueueFull));
    assert_eq!(results[9], Err(Error::QueueFull));
}

#[test]
fn held_lock_keeps_command_queued() {
    let queue = Queue::new();
    let devices = devices(true, true);
    feed(&queue, b"key:a\n");

    {
        let _monitor_holds = devices.try_lock().unwrap();
        let step = block_on(runtime::dispatch_next(
            &queue,
            &devices,
            &mut Dispatcher::default(),
            &mut NoDelay,
            0,
            ready(()),
        ));
        assert_eq!(step, Err(Error::LockTimeout));
        assert_eq!(queue.len(), 1);
    }

    let steps = drain(&queue, &devices, &mut Dispatcher::default(), 0);
    assert_eq!(steps.len(), 1);
    assert_eq!(devices.into_inner().keyboard.events, [Event::Write(KeyCode(b'a'))]);
}

// ═══════════════════════════════════════════════════════════════════════════
// Monitor alongside the dispatcher
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn disconnect_restarts_then_commands_flow_again() {
    let devices = devices(true, true);
    let mut monitor = ConnectionMonitor::new(MonitorConfig::default(), 0);
    let tick = |monitor: &mut ConnectionMonitor, now_ms| {
        block_on(runtime::monitor_tick(monitor, &devices, &mut NoDelay, now_ms, ready(())))
            .unwrap()
    };

    let report = tick(&mut monitor, 0);
    assert!(report.iter().any(|e| *e == MonitorEvent::Connected(DeviceKind::Keyboard)));

    block_on(devices.lock()).keyboard.connected = false;
    let report = tick(&mut monitor, 1_000);
    assert!(report.iter().any(|e| *e == MonitorEvent::Disconnected(DeviceKind::Keyboard)));

    // Still inside the cooldown.
    let report = tick(&mut monitor, 3_000);
    assert!(!report
        .iter()
        .any(|e| matches!(e, MonitorEvent::RestartIssued(_))));

    let cooldown = MonitorConfig::default().reconnect_cooldown_ms;
    let report = tick(&mut monitor, 1_000 + cooldown);
    assert!(report.iter().any(|e| *e == MonitorEvent::RestartIssued(DeviceKind::Keyboard)));

    // Host comes back; queued keys go out.
    block_on(devices.lock()).keyboard.connected = true;
    tick(&mut monitor, 1_000 + cooldown + 100);

    let queue = Queue::new();
    feed(&queue, b"key:z\n");
    drain(&queue, &devices, &mut Dispatcher::default(), 0);

    let devices = devices.into_inner();
    assert_eq!(
        devices.keyboard.events,
        [Event::End, Event::Begin, Event::Write(KeyCode(b'z'))]
    );
    assert!(devices.mouse.events.is_empty());
}

#[test]
fn status_line_reflects_device_state() {
    let queue = Queue::new();
    let devices = devices(true, false);
    feed(&queue, b"key:a\nkey:b\n");

    let guard = block_on(runtime::lock_within(&devices, ready(()))).unwrap();
    let report = StatusReport {
        keyboard_connected: guard.is_connected(DeviceKind::Keyboard),
        mouse_connected: guard.is_connected(DeviceKind::Mouse),
        battery: None,
        queued: queue.len(),
    };
    assert_eq!(
        StatusMessage::Status(report).encode().as_str(),
        "STATUS kb=up mouse=down battery=n/a queued=2\r\n"
    );
}
