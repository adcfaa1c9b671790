//! HID input reports sent over the BLE transport.

pub mod descriptor;
pub mod keyboard;
pub mod keymap;
pub mod mouse;


use keyboard::{KeyboardReport, KEYBOARD_REPORT_SIZE};
use mouse::MouseReport;

/// Report IDs of the composite report map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportId {
    Keyboard = 1,
    Mouse = 2,
}

/// Largest serialised input report.
pub const MAX_REPORT_SIZE: usize = KEYBOARD_REPORT_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

impl HidReport {
    pub const fn id(&self) -> ReportId {
        match self {
            HidReport::Keyboard(_) => ReportId::Keyboard,
            HidReport::Mouse(_) => ReportId::Mouse,
        }
    }

    /// Serialise the report body (without the report ID byte).
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(kb) => kb.serialize(buf),
            HidReport::Mouse(m) => m.serialize(buf),
        }
    }
}
