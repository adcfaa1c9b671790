//! Connection monitor - per-device connectivity tracking and recovery.
//!
//! Polled every `MONITOR_POLL_MS` with the device lock held. Two recovery
//! levels:
//!
//! 1. **Restart** - a device that dropped its host gets one `end()` /
//!    `begin()` cycle once `reconnect_cooldown_ms` has passed since the
//!    disconnect (or since its last attempt). The transport does not always
//!    resume advertising by itself after a disconnect.
//! 2. **Reinit** - when both devices stay down for `reinit_timeout_ms` the
//!    whole subsystem is re-run through `begin_all()`. A failed reinit is
//!    retried on the next tick.
//!
//! The monitor never logs; it returns a [`MonitorReport`] and the caller
//! decides what to print.

use crate::config::{REINIT_TIMEOUT_MS, RECONNECT_COOLDOWN_MS, RESTART_SETTLE_MS};
use crate::device::{DeviceKind, HidDevices, KeyboardDevice, MouseDevice};
use crate::error::DeviceError;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

/// Most events one poll can produce: two transitions, two restart
/// results and one reinit result.
pub const MAX_EVENTS_PER_POLL: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Minimum spacing between restart attempts of one device (ms).
    pub reconnect_cooldown_ms: u64,
    /// How long both devices must be down before a reinit (ms).
    pub reinit_timeout_ms: u64,
    /// Pause between `end()` and `begin()` of a restart (ms).
    pub restart_settle_ms: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            reconnect_cooldown_ms: RECONNECT_COOLDOWN_MS,
            reinit_timeout_ms: REINIT_TIMEOUT_MS,
            restart_settle_ms: RESTART_SETTLE_MS,
        }
    }
}

/// Connectivity bookkeeping for one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    pub connected: bool,
    pub last_transition_ms: u64,
    pub last_reconnect_attempt_ms: Option<u64>,
    /// A disconnect happened and no restart has succeeded since.
    pub restart_pending: bool,
}

impl ConnectionState {
    const fn new(now_ms: u64) -> Self {
        Self {
            connected: false,
            last_transition_ms: now_ms,
            last_reconnect_attempt_ms: None,
            restart_pending: false,
        }
    }

    /// True once the cooldown since the disconnect and since the last
    /// attempt have both elapsed.
    fn restart_due(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        if !self.restart_pending || self.connected {
            return false;
        }
        let since = match self.last_reconnect_attempt_ms {
            Some(attempt) => attempt.max(self.last_transition_ms),
            None => self.last_transition_ms,
        };
        now_ms.saturating_sub(since) >= cooldown_ms
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MonitorEvent {
    Connected(DeviceKind),
    Disconnected(DeviceKind),
    /// `end()` + `begin()` ran and `begin()` succeeded.
    RestartIssued(DeviceKind),
    RestartFailed(DeviceKind, DeviceError),
    /// Both devices were down past the timeout; `begin_all()` succeeded.
    Reinitialized,
    ReinitFailed(DeviceError),
}

/// Everything that happened during one poll, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub events: Vec<MonitorEvent, MAX_EVENTS_PER_POLL>,
}

impl MonitorReport {
    fn push(&mut self, event: MonitorEvent) {
        // Capacity covers the worst case of one poll.
        let _ = self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitorEvent> {
        self.events.iter()
    }
}

pub struct ConnectionMonitor {
    config: MonitorConfig,
    keyboard: ConnectionState,
    mouse: ConnectionState,
    both_down_since_ms: Option<u64>,
    last_reinit_ms: Option<u64>,
}

impl ConnectionMonitor {
    /// Both devices start disconnected at `now_ms`; the reinit clock runs
    /// from here so a transport that never comes up is retried.
    pub const fn new(config: MonitorConfig, now_ms: u64) -> Self {
        Self {
            config,
            keyboard: ConnectionState::new(now_ms),
            mouse: ConnectionState::new(now_ms),
            both_down_since_ms: Some(now_ms),
            last_reinit_ms: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self, kind: DeviceKind) -> &ConnectionState {
        match kind {
            DeviceKind::Keyboard => &self.keyboard,
            DeviceKind::Mouse => &self.mouse,
        }
    }

    fn state_mut(&mut self, kind: DeviceKind) -> &mut ConnectionState {
        match kind {
            DeviceKind::Keyboard => &mut self.keyboard,
            DeviceKind::Mouse => &mut self.mouse,
        }
    }

    pub fn both_down_since_ms(&self) -> Option<u64> {
        self.both_down_since_ms
    }

    pub fn last_reinit_ms(&self) -> Option<u64> {
        self.last_reinit_ms
    }

    /// One monitor tick. Must be called with the device lock held.
    pub async fn poll<K, M, D>(
        &mut self,
        devices: &mut HidDevices<K, M>,
        delay: &mut D,
        now_ms: u64,
    ) -> MonitorReport
    where
        K: KeyboardDevice,
        M: MouseDevice,
        D: DelayNs,
    {
        let mut report = MonitorReport::default();

        for kind in [DeviceKind::Keyboard, DeviceKind::Mouse] {
            self.observe(kind, devices.is_connected(kind), now_ms, &mut report);
        }
        self.track_both_down(now_ms);

        if self.reinit_due(now_ms) {
            self.reinit(devices, now_ms, &mut report);
            return report;
        }

        for kind in [DeviceKind::Keyboard, DeviceKind::Mouse] {
            if self
                .state(kind)
                .restart_due(now_ms, self.config.reconnect_cooldown_ms)
            {
                self.restart(kind, devices, delay, now_ms, &mut report).await;
            }
        }

        report
    }

    fn observe(
        &mut self,
        kind: DeviceKind,
        connected: bool,
        now_ms: u64,
        report: &mut MonitorReport,
    ) {
        let state = self.state_mut(kind);
        if state.connected == connected {
            return;
        }

        state.connected = connected;
        state.last_transition_ms = now_ms;
        state.restart_pending = !connected;

        report.push(if connected {
            MonitorEvent::Connected(kind)
        } else {
            MonitorEvent::Disconnected(kind)
        });
    }

    fn track_both_down(&mut self, now_ms: u64) {
        if self.keyboard.connected || self.mouse.connected {
            self.both_down_since_ms = None;
        } else if self.both_down_since_ms.is_none() {
            self.both_down_since_ms = Some(now_ms);
        }
    }

    fn reinit_due(&self, now_ms: u64) -> bool {
        let Some(since) = self.both_down_since_ms else {
            return false;
        };
        let since = match self.last_reinit_ms {
            Some(reinit) => reinit.max(since),
            None => since,
        };
        now_ms.saturating_sub(since) >= self.config.reinit_timeout_ms
    }

    fn reinit<K: KeyboardDevice, M: MouseDevice>(
        &mut self,
        devices: &mut HidDevices<K, M>,
        now_ms: u64,
        report: &mut MonitorReport,
    ) {
        match devices.begin_all() {
            Ok(()) => {
                self.last_reinit_ms = Some(now_ms);
                self.keyboard.last_reconnect_attempt_ms = Some(now_ms);
                self.mouse.last_reconnect_attempt_ms = Some(now_ms);
                report.push(MonitorEvent::Reinitialized);
            }
            Err(e) => report.push(MonitorEvent::ReinitFailed(e)),
        }
    }

    async fn restart<K, M, D>(
        &mut self,
        kind: DeviceKind,
        devices: &mut HidDevices<K, M>,
        delay: &mut D,
        now_ms: u64,
        report: &mut MonitorReport,
    ) where
        K: KeyboardDevice,
        M: MouseDevice,
        D: DelayNs,
    {
        devices.end(kind);
        delay.delay_ms(self.config.restart_settle_ms).await;
        let result = devices.begin(kind);

        let state = self.state_mut(kind);
        state.last_reconnect_attempt_ms = Some(now_ms);
        match result {
            Ok(()) => {
                state.restart_pending = false;
                report.push(MonitorEvent::RestartIssued(kind));
            }
            Err(e) => report.push(MonitorEvent::RestartFailed(kind, e)),
        }
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default(), 0)
    }
}
