//! Unified error types for serial2ble.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for on-target
//! logging and `Display` for the operator-facing serial lines.

use core::fmt;

/// Top-level error type used across the command pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The command line could not be parsed.
    Parse(ParseError),

    /// The command queue was full; the command was dropped.
    QueueFull,

    /// The shared device lock was not acquired in time; the step was skipped.
    LockTimeout,

    /// A device primitive failed.
    Device(DeviceError),

    /// A serial line exceeded the line buffer and was discarded.
    LineTooLong,

    /// A serial line was not valid UTF-8.
    NotUtf8,
}

/// Why a command line was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Nothing left after trimming.
    Empty,
    /// No `:` separating domain and body.
    MissingDomain,
    /// Domain is not part of the grammar.
    UnknownDomain,
    /// Domain present but body empty.
    EmptyBody,
    /// Key is not a single printable ASCII character or special-key name.
    InvalidKey,
    /// A chord token is not a modifier name.
    UnknownModifier,
    /// `special:` name not in the lookup table.
    UnknownSpecialKey,
    /// Button is not `left`, `right` or `middle`.
    UnknownButton,
    /// `move:` without a `,` between x and y.
    MissingComma,
    /// A numeric field is not an integer.
    InvalidNumber,
    /// `type:` text longer than the text buffer or not printable ASCII.
    InvalidText,
}

/// Failures reported by a keyboard or mouse device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// No host is connected.
    NotConnected,
    /// The key code has no HID usage.
    Unmapped,
    /// Six keys are already held.
    Rollover,
    /// The transport refused the report or the restart.
    Transport,
}

// Convenience conversions

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "parse: {}", e),
            Error::QueueFull => f.write_str("queue full"),
            Error::LockTimeout => f.write_str("device busy"),
            Error::Device(e) => write!(f, "device: {}", e),
            Error::LineTooLong => f.write_str("line too long"),
            Error::NotUtf8 => f.write_str("line not utf-8"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ParseError::Empty => "empty command",
            ParseError::MissingDomain => "missing ':'",
            ParseError::UnknownDomain => "unknown domain",
            ParseError::EmptyBody => "empty body",
            ParseError::InvalidKey => "invalid key",
            ParseError::UnknownModifier => "unknown modifier",
            ParseError::UnknownSpecialKey => "unknown special key",
            ParseError::UnknownButton => "unknown button",
            ParseError::MissingComma => "missing ','",
            ParseError::InvalidNumber => "invalid number",
            ParseError::InvalidText => "invalid text",
        };
        f.write_str(text)
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeviceError::NotConnected => "not connected",
            DeviceError::Unmapped => "no HID usage for key",
            DeviceError::Rollover => "too many keys held",
            DeviceError::Transport => "transport error",
        };
        f.write_str(text)
    }
}
