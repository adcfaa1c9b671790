//! Key code → HID usage translation.
//!
//! [`KeyCode`] uses the single-byte convention of the Arduino BLE keyboard
//! library: ASCII below 0x80, modifier keys at 0x80..=0x87, and every
//! other non-printing key at `0x88 + usage`.

use crate::command::KeyCode;

/// Keyboard/Keypad page usages used directly by the report builders.
pub mod usage {
    pub const A: u8 = 0x04;
    pub const DIGIT_1: u8 = 0x1E;
    pub const DIGIT_0: u8 = 0x27;
    pub const ENTER: u8 = 0x28;
    pub const ESCAPE: u8 = 0x29;
    pub const BACKSPACE: u8 = 0x2A;
    pub const TAB: u8 = 0x2B;
    pub const SPACE: u8 = 0x2C;
    pub const MINUS: u8 = 0x2D;
    pub const EQUAL: u8 = 0x2E;
    pub const LEFT_BRACKET: u8 = 0x2F;
    pub const RIGHT_BRACKET: u8 = 0x30;
    pub const BACKSLASH: u8 = 0x31;
    pub const SEMICOLON: u8 = 0x33;
    pub const QUOTE: u8 = 0x34;
    pub const GRAVE: u8 = 0x35;
    pub const COMMA: u8 = 0x36;
    pub const PERIOD: u8 = 0x37;
    pub const SLASH: u8 = 0x38;
}

/// Modifier bit for Left Shift in byte 0 of the keyboard report.
pub const MOD_LEFT_SHIFT: u8 = 0x02;

/// What pressing a [`KeyCode`] puts into a keyboard report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyUsage {
    /// A modifier bit (byte 0).
    Modifier(u8),
    /// A key slot usage, plus modifier bits it needs (shift for `A`).
    Key { usage: u8, modifiers: u8 },
}

/// Translate a key code, or `None` if it has no HID usage.
pub fn resolve(code: KeyCode) -> Option<KeyUsage> {
    match code.0 {
        0x80..=0x87 => Some(KeyUsage::Modifier(1 << (code.0 - 0x80))),
        0x88..=0xFF => Some(KeyUsage::Key {
            usage: code.0 - 0x88,
            modifiers: 0,
        }),
        ascii => ascii_usage(ascii).map(|(usage, shift)| KeyUsage::Key {
            usage,
            modifiers: if shift { MOD_LEFT_SHIFT } else { 0 },
        }),
    }
}

/// US layout: ASCII byte → (usage, needs shift).
fn ascii_usage(c: u8) -> Option<(u8, bool)> {
    use usage::*;

    let entry = match c {
        b'a'..=b'z' => (A + (c - b'a'), false),
        b'A'..=b'Z' => (A + (c - b'A'), true),
        b'1'..=b'9' => (DIGIT_1 + (c - b'1'), false),
        b'0' => (DIGIT_0, false),
        b'!' => (DIGIT_1, true),
        b'@' => (DIGIT_1 + 1, true),
        b'#' => (DIGIT_1 + 2, true),
        b'$' => (DIGIT_1 + 3, true),
        b'%' => (DIGIT_1 + 4, true),
        b'^' => (DIGIT_1 + 5, true),
        b'&' => (DIGIT_1 + 6, true),
        b'*' => (DIGIT_1 + 7, true),
        b'(' => (DIGIT_1 + 8, true),
        b')' => (DIGIT_0, true),
        b'\n' => (ENTER, false),
        0x1B => (ESCAPE, false),
        0x08 => (BACKSPACE, false),
        b'\t' => (TAB, false),
        b' ' => (SPACE, false),
        b'-' => (MINUS, false),
        b'_' => (MINUS, true),
        b'=' => (EQUAL, false),
        b'+' => (EQUAL, true),
        b'[' => (LEFT_BRACKET, false),
        b'{' => (LEFT_BRACKET, true),
        b']' => (RIGHT_BRACKET, false),
        b'}' => (RIGHT_BRACKET, true),
        b'\\' => (BACKSLASH, false),
        b'|' => (BACKSLASH, true),
        b';' => (SEMICOLON, false),
        b':' => (SEMICOLON, true),
        b'\'' => (QUOTE, false),
        b'"' => (QUOTE, true),
        b'`' => (GRAVE, false),
        b'~' => (GRAVE, true),
        b',' => (COMMA, false),
        b'<' => (COMMA, true),
        b'.' => (PERIOD, false),
        b'>' => (PERIOD, true),
        b'/' => (SLASH, false),
        b'?' => (SLASH, true),
        _ => return None,
    };
    Some(entry)
}
