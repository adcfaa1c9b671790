//! Device capabilities consumed by the dispatcher and the monitor.
//!
//! The BLE transport implements these in firmware (`ble::devices`); tests
//! use recording doubles. Method names follow the Arduino BLE keyboard /
//! mouse libraries the command grammar was designed around.

use crate::command::{KeyCode, MouseButton};
use crate::error::DeviceError;

/// Which of the two HID devices an operation concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl DeviceKind {
    pub const fn name(self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "keyboard",
            DeviceKind::Mouse => "mouse",
        }
    }
}

/// Keyboard half of the HID transport.
pub trait KeyboardDevice {
    /// Start (or restart) advertising the keyboard.
    fn begin(&mut self) -> Result<(), DeviceError>;
    /// Stop the keyboard transport and drop any connection.
    fn end(&mut self);
    fn is_connected(&self) -> bool;
    /// Press and release one key.
    fn write(&mut self, key: KeyCode) -> Result<(), DeviceError>;
    /// Press a key and keep it held.
    fn press(&mut self, key: KeyCode) -> Result<(), DeviceError>;
    fn release_all(&mut self) -> Result<(), DeviceError>;
    /// Type a string, one `write` per character.
    fn print(&mut self, text: &str) -> Result<(), DeviceError>;
}

/// Mouse half of the HID transport.
pub trait MouseDevice {
    fn begin(&mut self) -> Result<(), DeviceError>;
    fn end(&mut self);
    fn is_connected(&self) -> bool;
    /// Relative move with optional wheel delta.
    fn move_by(&mut self, dx: i8, dy: i8, wheel: i8) -> Result<(), DeviceError>;
    fn click(&mut self, button: MouseButton) -> Result<(), DeviceError>;
    fn press(&mut self, button: MouseButton) -> Result<(), DeviceError>;
    fn release(&mut self, button: MouseButton) -> Result<(), DeviceError>;
}

/// The pair of device handles shared by the dispatcher and the monitor.
///
/// Always accessed through one mutex (see `runtime::lock_within`).
pub struct HidDevices<K, M> {
    pub keyboard: K,
    pub mouse: M,
}

impl<K: KeyboardDevice, M: MouseDevice> HidDevices<K, M> {
    pub const fn new(keyboard: K, mouse: M) -> Self {
        Self { keyboard, mouse }
    }

    pub fn is_connected(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Keyboard => self.keyboard.is_connected(),
            DeviceKind::Mouse => self.mouse.is_connected(),
        }
    }

    pub fn begin(&mut self, kind: DeviceKind) -> Result<(), DeviceError> {
        match kind {
            DeviceKind::Keyboard => self.keyboard.begin(),
            DeviceKind::Mouse => self.mouse.begin(),
        }
    }

    pub fn end(&mut self, kind: DeviceKind) {
        match kind {
            DeviceKind::Keyboard => self.keyboard.end(),
            DeviceKind::Mouse => self.mouse.end(),
        }
    }

    /// Run the begin sequence for the whole subsystem.
    ///
    /// Both devices are attempted; the first failure is returned.
    pub fn begin_all(&mut self) -> Result<(), DeviceError> {
        let keyboard = self.keyboard.begin();
        let mouse = self.mouse.begin();
        keyboard.and(mouse)
    }
}
