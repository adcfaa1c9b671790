//! Command grammar - one serial line to one [`Command`].
//!
//! ```text
//! key:<c>                 KeyPress            key:a
//! key:<mod>+..+<key>      ModifiedKey         key:ctrl+shift+t, key:ctrl+alt+delete
//! special:<name>          SpecialKey          special:enter (space → KeyPress(' '))
//! move:<x>,<y>[,<s>]      MouseMove           move:10,-5
//! click|press|release:<b> Mouse button        click:left
//! dblclick:<b>            MouseDoubleClick    dblclick:left
//! scroll:<n>              MouseScroll         scroll:-3
//! type:<text>             TypeText            type:hello
//! k:<body>, m:<body>      legacy short forms  k:ctrl+c, k:shift+hello, m:left
//! ```
//!
//! Domains and names are case-insensitive; key characters are not.
//! Numbers are clamped to the HID range -127..=127. Anything that does
//! not fit the grammar is rejected, never guessed.


use crate::command::{is_printable, Command, KeyCode, Modifiers, MouseButton, SpecialKey};
use crate::config::MAX_TEXT_LEN;
use crate::error::ParseError;
use heapless::String;

/// Smallest / largest value of a HID relative axis.
pub const AXIS_MIN: i64 = -127;
pub const AXIS_MAX: i64 = 127;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Domain {
    Key,
    Special,
    Move,
    Click,
    Press,
    Release,
    Scroll,
    DoubleClick,
    Type,
}

impl Domain {
    fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, Domain); 9] = [
            ("key", Domain::Key),
            ("special", Domain::Special),
            ("move", Domain::Move),
            ("click", Domain::Click),
            ("press", Domain::Press),
            ("release", Domain::Release),
            ("scroll", Domain::Scroll),
            ("dblclick", Domain::DoubleClick),
            ("type", Domain::Type),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, d)| d)
    }

    fn is_mouse(self) -> bool {
        matches!(
            self,
            Domain::Move
                | Domain::Click
                | Domain::Press
                | Domain::Release
                | Domain::Scroll
                | Domain::DoubleClick
        )
    }
}

/// Parse one line, mapping every failure to [`Command::Invalid`].
pub fn parse(line: &str) -> Command {
    try_parse(line).unwrap_or(Command::Invalid)
}

/// Parse one line, keeping the reason for a rejection.
pub fn try_parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let (domain, body) = line.split_once(':').ok_or(ParseError::MissingDomain)?;

    if domain.eq_ignore_ascii_case("k") {
        return parse_legacy_key(body);
    }
    if domain.eq_ignore_ascii_case("m") {
        return parse_legacy_mouse(body);
    }

    let domain = Domain::from_name(domain).ok_or(ParseError::UnknownDomain)?;
    parse_body(domain, body)
}

fn parse_body(domain: Domain, body: &str) -> Result<Command, ParseError> {
    if body.is_empty() {
        return Err(ParseError::EmptyBody);
    }

    match domain {
        Domain::Key => parse_key(body),
        Domain::Special => parse_special(body.trim()),
        Domain::Move => parse_move(body),
        Domain::Click => parse_button(body).map(Command::MouseClick),
        Domain::Press => parse_button(body).map(Command::MousePress),
        Domain::Release => parse_button(body).map(Command::MouseRelease),
        Domain::DoubleClick => parse_button(body).map(Command::MouseDoubleClick),
        Domain::Scroll => parse_axis(body).map(Command::MouseScroll),
        Domain::Type => parse_text(body),
    }
}

/// `key:` body - a single character, or a `+`-separated chord.
fn parse_key(body: &str) -> Result<Command, ParseError> {
    if let Some(c) = single_char(body) {
        return if is_printable(c) {
            Ok(Command::KeyPress(c))
        } else {
            Err(ParseError::InvalidKey)
        };
    }

    let (mods, key) = body.rsplit_once('+').ok_or(ParseError::InvalidKey)?;
    let modifiers = parse_modifiers(mods)?;
    let key = chord_key(key.trim())?;
    Ok(Command::ModifiedKey { modifiers, key })
}

/// `+`-separated modifier names, OR-ed together.
fn parse_modifiers(mods: &str) -> Result<Modifiers, ParseError> {
    let mut modifiers = Modifiers::NONE;
    for token in mods.split('+') {
        let modifier = Modifiers::from_name(token.trim()).ok_or(ParseError::UnknownModifier)?;
        modifiers.insert(modifier);
    }
    Ok(modifiers)
}

/// Final token of a chord: one printable character or a key name.
fn chord_key(token: &str) -> Result<KeyCode, ParseError> {
    if let Some(c) = single_char(token) {
        return KeyCode::from_char(c).ok_or(ParseError::InvalidKey);
    }
    if token.eq_ignore_ascii_case("space") {
        return Ok(KeyCode(b' '));
    }
    SpecialKey::from_name(token)
        .map(SpecialKey::key_code)
        .ok_or(ParseError::InvalidKey)
}

fn parse_special(name: &str) -> Result<Command, ParseError> {
    if name.eq_ignore_ascii_case("space") {
        return Ok(Command::KeyPress(' '));
    }
    SpecialKey::from_name(name)
        .map(Command::SpecialKey)
        .ok_or(ParseError::UnknownSpecialKey)
}

/// `move:` body - split at the first comma, optional scroll field.
fn parse_move(body: &str) -> Result<Command, ParseError> {
    let (x, rest) = body.split_once(',').ok_or(ParseError::MissingComma)?;
    let (y, scroll) = match rest.split_once(',') {
        Some((y, scroll)) => (y, parse_axis(scroll)?),
        None => (rest, 0),
    };

    Ok(Command::MouseMove {
        x: parse_axis(x)?,
        y: parse_axis(y)?,
        scroll,
    })
}

fn parse_button(body: &str) -> Result<MouseButton, ParseError> {
    MouseButton::from_name(body.trim()).ok_or(ParseError::UnknownButton)
}

/// Parse a signed integer and clamp it to the HID axis range.
fn parse_axis(field: &str) -> Result<i8, ParseError> {
    let value: i64 = field
        .trim()
        .parse()
        .map_err(|_| ParseError::InvalidNumber)?;
    Ok(clamp_axis(value))
}

/// Clamp to -127..=127.
pub fn clamp_axis(value: i64) -> i8 {
    value.clamp(AXIS_MIN, AXIS_MAX) as i8
}

fn parse_text(body: &str) -> Result<Command, ParseError> {
    text_body(body).map(Command::TypeText)
}

fn text_body(body: &str) -> Result<String<MAX_TEXT_LEN>, ParseError> {
    if body.is_empty() || !body.chars().all(is_printable) {
        return Err(ParseError::InvalidText);
    }
    let mut text = String::new();
    text.push_str(body).map_err(|_| ParseError::InvalidText)?;
    Ok(text)
}

/// Legacy `k:` form: one key, a chord, a key name, or free text.
fn parse_legacy_key(body: &str) -> Result<Command, ParseError> {
    if body.is_empty() {
        return Err(ParseError::EmptyBody);
    }
    if single_char(body).is_some() {
        return parse_key(body);
    }
    if let Ok(command) = parse_special(body) {
        return Ok(command);
    }
    if let Some((mods, tail)) = body.rsplit_once('+') {
        // A single key or key name is a chord; longer text is typed with
        // the modifiers held.
        if tail.is_empty() || chord_key(tail.trim()).is_ok() {
            return parse_key(body);
        }
        return Ok(Command::ModifiedText {
            modifiers: parse_modifiers(mods)?,
            text: text_body(tail)?,
        });
    }
    parse_text(body)
}

/// Legacy `m:` form: bare button names click, otherwise a mouse command.
fn parse_legacy_mouse(body: &str) -> Result<Command, ParseError> {
    if body.is_empty() {
        return Err(ParseError::EmptyBody);
    }
    if let Some(button) = MouseButton::from_name(body) {
        return Ok(Command::MouseClick(button));
    }
    if body.eq_ignore_ascii_case("doubleclick") {
        return Ok(Command::MouseDoubleClick(MouseButton::Left));
    }

    let (domain, rest) = body.split_once(':').ok_or(ParseError::UnknownDomain)?;
    match Domain::from_name(domain) {
        Some(domain) if domain.is_mouse() => parse_body(domain, rest),
        _ => Err(ParseError::UnknownDomain),
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
