//! Command model - one parsed serial line.
//!
//! A `Command` is built by the parser, copied into the queue and consumed
//! exactly once by the dispatcher.

use crate::config::MAX_TEXT_LEN;
use crate::device::DeviceKind;
use heapless::String;

/// One key in the Arduino BLE keyboard convention.
///
/// ```text
/// 0x00..=0x7F  ASCII character (shift applied from the key map)
/// 0x80..=0x87  modifier keys (bit = code - 0x80 in the modifier byte)
/// 0x88..=0xFF  non-printing keys (HID usage = code - 0x88)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyCode(pub u8);

impl KeyCode {
    pub const LEFT_CTRL: KeyCode = KeyCode(0x80);
    pub const LEFT_SHIFT: KeyCode = KeyCode(0x81);
    pub const LEFT_ALT: KeyCode = KeyCode(0x82);
    pub const LEFT_GUI: KeyCode = KeyCode(0x83);

    pub const ENTER: KeyCode = KeyCode(0xB0);
    pub const ESC: KeyCode = KeyCode(0xB1);
    pub const BACKSPACE: KeyCode = KeyCode(0xB2);
    pub const TAB: KeyCode = KeyCode(0xB3);
    pub const INSERT: KeyCode = KeyCode(0xD1);
    pub const HOME: KeyCode = KeyCode(0xD2);
    pub const PAGE_UP: KeyCode = KeyCode(0xD3);
    pub const DELETE: KeyCode = KeyCode(0xD4);
    pub const END: KeyCode = KeyCode(0xD5);
    pub const PAGE_DOWN: KeyCode = KeyCode(0xD6);
    pub const RIGHT: KeyCode = KeyCode(0xD7);
    pub const LEFT: KeyCode = KeyCode(0xD8);
    pub const DOWN: KeyCode = KeyCode(0xD9);
    pub const UP: KeyCode = KeyCode(0xDA);

    /// Key code for a printable ASCII character.
    pub fn from_char(c: char) -> Option<Self> {
        if is_printable(c) {
            Some(KeyCode(c as u8))
        } else {
            None
        }
    }
}

/// Printable ASCII: space through `~`.
pub(crate) fn is_printable(c: char) -> bool {
    c == ' ' || c.is_ascii_graphic()
}

/// Modifier bitmask (OR-combinable).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0x01);
    pub const SHIFT: Modifiers = Modifiers(0x02);
    pub const ALT: Modifiers = Modifiers(0x04);
    pub const GUI: Modifiers = Modifiers(0x08);

    /// Press order used for chords.
    const ORDERED: [(Modifiers, KeyCode); 4] = [
        (Modifiers::CTRL, KeyCode::LEFT_CTRL),
        (Modifiers::SHIFT, KeyCode::LEFT_SHIFT),
        (Modifiers::ALT, KeyCode::LEFT_ALT),
        (Modifiers::GUI, KeyCode::LEFT_GUI),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    /// Look up a modifier token (`ctrl`, `shift`, `alt`, `gui`/`win`).
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, Modifiers); 5] = [
            ("ctrl", Modifiers::CTRL),
            ("shift", Modifiers::SHIFT),
            ("alt", Modifiers::ALT),
            ("gui", Modifiers::GUI),
            ("win", Modifiers::GUI),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, m)| m)
    }

    /// Key codes of the set modifiers, in chord press order.
    pub fn key_codes(self) -> impl Iterator<Item = KeyCode> {
        Self::ORDERED
            .into_iter()
            .filter(move |(m, _)| self.contains(*m))
            .map(|(_, code)| code)
    }
}

impl core::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

/// Non-printable keys reachable through `special:`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecialKey {
    Enter,
    Backspace,
    Tab,
    Esc,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
}

impl SpecialKey {
    /// Look up a special-key name. `space` is not here: it is printable.
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, SpecialKey); 14] = [
            ("enter", SpecialKey::Enter),
            ("backspace", SpecialKey::Backspace),
            ("tab", SpecialKey::Tab),
            ("esc", SpecialKey::Esc),
            ("delete", SpecialKey::Delete),
            ("insert", SpecialKey::Insert),
            ("home", SpecialKey::Home),
            ("end", SpecialKey::End),
            ("pageup", SpecialKey::PageUp),
            ("pagedown", SpecialKey::PageDown),
            ("up", SpecialKey::Up),
            ("down", SpecialKey::Down),
            ("left", SpecialKey::Left),
            ("right", SpecialKey::Right),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, k)| k)
    }

    pub const fn key_code(self) -> KeyCode {
        match self {
            SpecialKey::Enter => KeyCode::ENTER,
            SpecialKey::Backspace => KeyCode::BACKSPACE,
            SpecialKey::Tab => KeyCode::TAB,
            SpecialKey::Esc => KeyCode::ESC,
            SpecialKey::Delete => KeyCode::DELETE,
            SpecialKey::Insert => KeyCode::INSERT,
            SpecialKey::Home => KeyCode::HOME,
            SpecialKey::End => KeyCode::END,
            SpecialKey::PageUp => KeyCode::PAGE_UP,
            SpecialKey::PageDown => KeyCode::PAGE_DOWN,
            SpecialKey::Up => KeyCode::UP,
            SpecialKey::Down => KeyCode::DOWN,
            SpecialKey::Left => KeyCode::LEFT,
            SpecialKey::Right => KeyCode::RIGHT,
        }
    }
}

/// Mouse buttons. Discriminants match the boot-protocol button bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x04,
}

impl MouseButton {
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("left") {
            Some(MouseButton::Left)
        } else if name.eq_ignore_ascii_case("right") {
            Some(MouseButton::Right)
        } else if name.eq_ignore_ascii_case("middle") {
            Some(MouseButton::Middle)
        } else {
            None
        }
    }

    pub const fn bit(self) -> u8 {
        self as u8
    }
}

/// A parsed command.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Type one printable character.
    KeyPress(char),
    /// Tap a non-printable key.
    SpecialKey(SpecialKey),
    /// Hold modifiers, tap `key`, release everything.
    ModifiedKey { modifiers: Modifiers, key: KeyCode },
    /// Relative pointer movement, each axis in -127..=127.
    MouseMove { x: i8, y: i8, scroll: i8 },
    MouseClick(MouseButton),
    MousePress(MouseButton),
    MouseRelease(MouseButton),
    /// Wheel movement in -127..=127.
    MouseScroll(i8),
    MouseDoubleClick(MouseButton),
    /// Type a short printable ASCII string.
    TypeText(String<MAX_TEXT_LEN>),
    /// Type text while holding modifiers, then release everything.
    ModifiedText {
        modifiers: Modifiers,
        text: String<MAX_TEXT_LEN>,
    },
    /// The line did not parse.
    Invalid,
}

/// Payload-free discriminant of [`Command`], handy for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    KeyPress,
    SpecialKey,
    ModifiedKey,
    MouseMove,
    MouseClick,
    MousePress,
    MouseRelease,
    MouseScroll,
    MouseDoubleClick,
    TypeText,
    ModifiedText,
    Invalid,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::KeyPress(_) => CommandKind::KeyPress,
            Command::SpecialKey(_) => CommandKind::SpecialKey,
            Command::ModifiedKey { .. } => CommandKind::ModifiedKey,
            Command::MouseMove { .. } => CommandKind::MouseMove,
            Command::MouseClick(_) => CommandKind::MouseClick,
            Command::MousePress(_) => CommandKind::MousePress,
            Command::MouseRelease(_) => CommandKind::MouseRelease,
            Command::MouseScroll(_) => CommandKind::MouseScroll,
            Command::MouseDoubleClick(_) => CommandKind::MouseDoubleClick,
            Command::TypeText(_) => CommandKind::TypeText,
            Command::ModifiedText { .. } => CommandKind::ModifiedText,
            Command::Invalid => CommandKind::Invalid,
        }
    }

    /// Device that has to be connected for this command to go out.
    pub fn target(&self) -> Option<DeviceKind> {
        match self.kind() {
            CommandKind::KeyPress
            | CommandKind::SpecialKey
            | CommandKind::ModifiedKey
            | CommandKind::TypeText
            | CommandKind::ModifiedText => Some(DeviceKind::Keyboard),
            CommandKind::MouseMove
            | CommandKind::MouseClick
            | CommandKind::MousePress
            | CommandKind::MouseRelease
            | CommandKind::MouseScroll
            | CommandKind::MouseDoubleClick => Some(DeviceKind::Mouse),
            CommandKind::Invalid => None,
        }
    }
}
