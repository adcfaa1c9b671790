//! Operator-facing status output on the serial TX line.
//!
//! Boot markers are single bytes so they survive a host that is still
//! opening the port. Everything else is one text line per message.

use crate::config::{
    ADC_FULL_SCALE_MV, ADC_RESOLUTION, BATTERY_DIVIDER, BATTERY_EMPTY_MV, BATTERY_FULL_MV,
    BATTERY_LOW_MV, STATUS_LINE_LEN,
};
use crate::error::Error;
use core::fmt::{self, Write};
use heapless::String;

/// Grammar summary printed once at boot.
pub const HELP: &str = "HELP key:<c> key:<mod>+<key> special:<name> type:<text>\r\n\
HELP move:<x>,<y>[,<s>] scroll:<n> click|press|release|dblclick:<left|right|middle>\r\n";

/// One-byte boot progress markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootMarker {
    Starting,
    InitFailed,
    TransportFailed,
    Ready,
    BatteryLow,
}

impl BootMarker {
    pub const fn byte(self) -> u8 {
        match self {
            BootMarker::Starting => b'S',
            BootMarker::InitFailed => b'E',
            BootMarker::TransportFailed => b'F',
            BootMarker::Ready => b'R',
            BootMarker::BatteryLow => b'B',
        }
    }
}

/// Battery voltage as seen at the cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryLevel {
    pub millivolts: u16,
}

impl BatteryLevel {
    pub const fn from_millivolts(millivolts: u16) -> Self {
        Self { millivolts }
    }

    /// Build from a raw 12-bit SAADC sample taken behind the divider.
    pub fn from_raw(raw: i16) -> Self {
        Self::from_millivolts(millivolts_from_raw(raw))
    }

    /// Linear charge estimate between the empty and full voltages.
    pub fn percent(&self) -> u8 {
        let mv = u32::from(self.millivolts).clamp(BATTERY_EMPTY_MV, BATTERY_FULL_MV);
        ((mv - BATTERY_EMPTY_MV) * 100 / (BATTERY_FULL_MV - BATTERY_EMPTY_MV)) as u8
    }

    pub fn is_low(&self) -> bool {
        u32::from(self.millivolts) < BATTERY_LOW_MV
    }
}

/// Convert a raw SAADC sample to cell millivolts.
///
/// Negative samples (noise around 0 V in single-ended mode) count as 0.
pub fn millivolts_from_raw(raw: i16) -> u16 {
    let raw = u32::from(raw.max(0) as u16);
    let mv = raw * ADC_FULL_SCALE_MV / ADC_RESOLUTION * BATTERY_DIVIDER;
    mv.min(u32::from(u16::MAX)) as u16
}

/// Periodic status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub keyboard_connected: bool,
    pub mouse_connected: bool,
    pub battery: Option<BatteryLevel>,
    pub queued: usize,
}

fn up_down(connected: bool) -> &'static str {
    if connected {
        "up"
    } else {
        "down"
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "STATUS kb={} mouse={} ",
            up_down(self.keyboard_connected),
            up_down(self.mouse_connected)
        )?;
        match self.battery {
            Some(level) => write!(f, "battery={}mV({}%)", level.millivolts, level.percent())?,
            None => f.write_str("battery=n/a")?,
        }
        write!(f, " queued={}", self.queued)
    }
}

/// `ERR <reason>` line for a rejected command or serial error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorLine(pub Error);

impl fmt::Display for ErrorLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ERR {}", self.0)
    }
}

/// Everything the serial writer task prints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusMessage {
    Marker(BootMarker),
    Error(Error),
    Status(StatusReport),
}

impl StatusMessage {
    /// Bytes to put on the wire. Markers are a single byte without a line
    /// terminator.
    pub fn encode(&self) -> String<STATUS_LINE_LEN> {
        match self {
            StatusMessage::Marker(marker) => {
                let mut out = String::new();
                let _ = out.push(char::from(marker.byte()));
                out
            }
            StatusMessage::Error(e) => render(&ErrorLine(*e)),
            StatusMessage::Status(report) => render(report),
        }
    }

    /// Text written right after this message. The [`HELP`] banner follows
    /// the `S` marker so that marker is the first byte on the wire.
    pub fn follow_up(&self) -> Option<&'static str> {
        match self {
            StatusMessage::Marker(BootMarker::Starting) => Some(HELP),
            _ => None,
        }
    }
}

/// Render a message into a fixed-size line terminated with `\r\n`.
///
/// Text that does not fit is cut off; the terminator is always kept.
pub fn render<T: fmt::Display>(message: &T) -> String<STATUS_LINE_LEN> {
    let mut line: String<{ STATUS_LINE_LEN - 2 }> = String::new();
    let _ = write!(TruncatingWriter(&mut line), "{}", message);

    let mut out = String::new();
    // Both fit: the body is at most STATUS_LINE_LEN - 2 bytes.
    let _ = out.push_str(&line);
    let _ = out.push_str("\r\n");
    out
}

/// `fmt::Write` adapter that keeps what fits and drops the rest.
struct TruncatingWriter<'a, const N: usize>(&'a mut String<N>);

impl<const N: usize> Write for TruncatingWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
