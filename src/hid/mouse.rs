//! HID mouse input report (boot protocol compatible).
//!
//! Layout (4 bytes, report ID 2 is carried by the characteristic):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, -127..127)
//! ```

use crate::command::MouseButton;

/// Mouse report size in bytes.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Standard boot-protocol mouse report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right, bit 2 = middle).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
}

impl MouseReport {
    /// Create an idle (no movement, no buttons) report.
    pub const fn empty() -> Self {
        Self {
            buttons: 0,
            x: 0,
            y: 0,
            wheel: 0,
        }
    }

    /// Movement report that keeps the currently held buttons.
    pub const fn motion(buttons: u8, x: i8, y: i8, wheel: i8) -> Self {
        Self { buttons, x, y, wheel }
    }

    /// Button-only report.
    pub const fn buttons(buttons: u8) -> Self {
        Self::motion(buttons, 0, 0, 0)
    }

    pub const fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons & button.bit() != 0
    }

    /// Serialise into a byte slice for transmission.
    /// Returns the number of bytes written (always 4).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        if buf.len() < MOUSE_REPORT_SIZE {
            return 0;
        }
        buf[0] = self.buttons;
        buf[1] = self.x as u8;
        buf[2] = self.y as u8;
        buf[3] = self.wheel as u8;
        MOUSE_REPORT_SIZE
    }

    /// Returns `true` when no buttons are pressed and there is no movement.
    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        self.buttons == 0 && self.x == 0 && self.y == 0 && self.wheel == 0
    }
}

/// Held mouse buttons, tracked across reports.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState(u8);

impl ButtonState {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn press(&mut self, button: MouseButton) -> MouseReport {
        self.0 |= button.bit();
        MouseReport::buttons(self.0)
    }

    pub fn release(&mut self, button: MouseButton) -> MouseReport {
        self.0 &= !button.bit();
        MouseReport::buttons(self.0)
    }

    pub fn motion(&self, x: i8, y: i8, wheel: i8) -> MouseReport {
        MouseReport::motion(self.0, x, y, wheel)
    }

    /// Press-then-release report pair for a click.
    pub fn click(&self, button: MouseButton) -> [MouseReport; 2] {
        [
            MouseReport::buttons(self.0 | button.bit()),
            MouseReport::buttons(self.0 & !button.bit()),
        ]
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }
}
