//! HID keyboard input report (boot protocol compatible).
//!
//! Layout (8 bytes, report ID 1 is carried by the characteristic):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (HID usage codes)
//! ```

use super::keymap::{self, KeyUsage};
use crate::command::KeyCode;
use crate::error::DeviceError;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Standard boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Reserved byte (always 0x00 per HID spec).
    pub reserved: u8,
    /// Up to 6 simultaneously pressed key codes.
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            reserved: 0,
            keycodes: [0; 6],
        }
    }

    /// Add a key to the held set.
    ///
    /// Pressing a key that is already held is a no-op. A seventh key is
    /// rejected with `Rollover` and leaves the report unchanged.
    pub fn press(&mut self, key: KeyCode) -> Result<(), DeviceError> {
        match keymap::resolve(key).ok_or(DeviceError::Unmapped)? {
            KeyUsage::Modifier(bit) => {
                self.modifier |= bit;
                Ok(())
            }
            KeyUsage::Key { usage, modifiers } => {
                if !self.keycodes.contains(&usage) {
                    let slot = self
                        .keycodes
                        .iter_mut()
                        .find(|k| **k == 0)
                        .ok_or(DeviceError::Rollover)?;
                    *slot = usage;
                }
                self.modifier |= modifiers;
                Ok(())
            }
        }
    }

    /// Remove a key from the held set.
    ///
    /// Modifier bits implied by the key (shift for capitals) are cleared
    /// too.
    pub fn release(&mut self, key: KeyCode) {
        match keymap::resolve(key) {
            Some(KeyUsage::Modifier(bit)) => self.modifier &= !bit,
            Some(KeyUsage::Key { usage, modifiers }) => {
                for k in self.keycodes.iter_mut().filter(|k| **k == usage) {
                    *k = 0;
                }
                self.modifier &= !modifiers;
            }
            None => {}
        }
    }

    /// Press `key`, hand the report to `send`, release it and send again.
    ///
    /// The key is cleared from the local report even when a send fails,
    /// so it cannot leak into later reports.
    pub fn tap<F>(&mut self, key: KeyCode, mut send: F) -> Result<(), DeviceError>
    where
        F: FnMut(&KeyboardReport) -> Result<(), DeviceError>,
    {
        self.press(key)?;
        let pressed = send(&*self);
        self.release(key);
        let released = send(&*self);
        pressed.and(released)
    }

    pub fn release_all(&mut self) {
        *self = Self::empty();
    }

    /// Serialise into a byte slice for transmission.
    /// Returns the number of bytes written (always 8).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < KEYBOARD_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.modifier;
        buf[1] = self.reserved;
        buf[2..8].copy_from_slice(&self.keycodes);
        KEYBOARD_REPORT_SIZE
    }

    /// Returns `true` if no keys are pressed (release event).
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.keycodes.iter().all(|&k| k == 0)
    }
}
