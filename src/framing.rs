//! Byte decoding and line framing, the parts that differ between text and
//! binary terminals.

use crate::element::{Direction, DisplayElement, Origin};
use crate::line_state::LineState;
use crate::radix::{self, ControlCharRadix, Radix};
use crate::settings::{ParsedSequences, TerminalSettings};
use serde::{Deserialize, Serialize};

const VISIBLE_SPACE: &str = "\u{2423}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMode {
    #[default]
    Text,
    Binary,
}

/// Outcome of framing after a byte has been appended to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Continue,
    /// The line is complete. The last `trim` bytes are the line terminator
    /// and are not shown.
    Complete { trim: usize },
}

pub trait LineFraming {
    /// Sequence that `LineState::eol` watches for.
    fn break_sequence<'a>(&self, direction: Direction, sequences: &'a ParsedSequences) -> &'a [u8];

    /// Renders one byte into display elements. A byte that only continues a
    /// multi-byte character yields a single `NoData` element.
    fn decode_byte(
        &self,
        state: &mut LineState,
        byte: u8,
        direction: Direction,
        settings: &TerminalSettings,
    ) -> Vec<DisplayElement>;

    /// Decides whether the line ends after the byte just processed.
    fn frame(&self, state: &LineState, settings: &TerminalSettings) -> LineEnd;
}

/// Lines end on the direction's EOL sequence, which is trimmed unless shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFraming;

impl LineFraming for TextFraming {
    fn break_sequence<'a>(&self, direction: Direction, sequences: &'a ParsedSequences) -> &'a [u8] {
        sequences.eol(direction)
    }

    fn decode_byte(
        &self,
        state: &mut LineState,
        byte: u8,
        direction: Direction,
        settings: &TerminalSettings,
    ) -> Vec<DisplayElement> {
        let radix = settings.radix(direction);
        if radix.is_numeric() {
            return vec![numeric_element(byte, direction, radix, settings)];
        }
        let decoded = state.decoder.push(byte);
        if decoded.is_empty() {
            return vec![DisplayElement::no_data()];
        }
        decoded
            .into_iter()
            .map(|d| char_element(d.ch, d.bytes, direction, settings))
            .collect()
    }

    fn frame(&self, state: &LineState, settings: &TerminalSettings) -> LineEnd {
        if !state.eol.matches() {
            return LineEnd::Continue;
        }
        let trim = if settings.show_eol { 0 } else { state.eol.len() };
        LineEnd::Complete { trim }
    }
}

/// Lines end after a fixed number of bytes or after a break sequence, which
/// stays visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFraming;

impl LineFraming for BinaryFraming {
    fn break_sequence<'a>(
        &self,
        _direction: Direction,
        sequences: &'a ParsedSequences,
    ) -> &'a [u8] {
        &sequences.binary
    }

    fn decode_byte(
        &self,
        _state: &mut LineState,
        byte: u8,
        direction: Direction,
        settings: &TerminalSettings,
    ) -> Vec<DisplayElement> {
        let radix = settings.radix(direction);
        if radix.is_numeric() {
            vec![numeric_element(byte, direction, radix, settings)]
        } else {
            vec![char_element(char::from(byte), vec![byte], direction, settings)]
        }
    }

    fn frame(&self, state: &LineState, settings: &TerminalSettings) -> LineEnd {
        let length = settings.binary.line_length;
        if state.eol.matches() || (length > 0 && state.byte_count >= length) {
            LineEnd::Complete { trim: 0 }
        } else {
            LineEnd::Continue
        }
    }
}

/// The framing a terminal was constructed with.
#[derive(Debug, Clone, Copy)]
pub enum Framing {
    Text(TextFraming),
    Binary(BinaryFraming),
}

impl Framing {
    pub fn for_mode(mode: TerminalMode) -> Self {
        match mode {
            TerminalMode::Text => Framing::Text(TextFraming),
            TerminalMode::Binary => Framing::Binary(BinaryFraming),
        }
    }

    pub fn mode(&self) -> TerminalMode {
        match self {
            Framing::Text(_) => TerminalMode::Text,
            Framing::Binary(_) => TerminalMode::Binary,
        }
    }
}

impl LineFraming for Framing {
    fn break_sequence<'a>(&self, direction: Direction, sequences: &'a ParsedSequences) -> &'a [u8] {
        match self {
            Framing::Text(f) => f.break_sequence(direction, sequences),
            Framing::Binary(f) => f.break_sequence(direction, sequences),
        }
    }

    fn decode_byte(
        &self,
        state: &mut LineState,
        byte: u8,
        direction: Direction,
        settings: &TerminalSettings,
    ) -> Vec<DisplayElement> {
        match self {
            Framing::Text(f) => f.decode_byte(state, byte, direction, settings),
            Framing::Binary(f) => f.decode_byte(state, byte, direction, settings),
        }
    }

    fn frame(&self, state: &LineState, settings: &TerminalSettings) -> LineEnd {
        match self {
            Framing::Text(f) => f.frame(state, settings),
            Framing::Binary(f) => f.frame(state, settings),
        }
    }
}

fn numeric_element(
    byte: u8,
    direction: Direction,
    radix: Radix,
    settings: &TerminalSettings,
) -> DisplayElement {
    let origin = Origin {
        bytes: vec![byte],
        direction,
    };
    if !radix::is_control(byte) {
        return DisplayElement::data(origin, radix::format_numeric(byte, radix));
    }
    let text = match radix::mnemonic(byte) {
        Some(name) if settings.mnemonic_substitution() => name,
        _ => radix::format_numeric_with_suffix(byte, radix),
    };
    DisplayElement::control(origin, text)
}

fn char_element(
    ch: char,
    bytes: Vec<u8>,
    direction: Direction,
    settings: &TerminalSettings,
) -> DisplayElement {
    let origin = Origin { bytes, direction };
    if ch.is_ascii_control() {
        let byte = ch as u8;
        if !settings.replace_control_chars {
            let message = format!(
                "<{} not displayable>",
                radix::format_numeric_with_suffix(byte, Radix::Hex)
            );
            return DisplayElement::error(direction, message);
        }
        let text = match settings.control_char_radix {
            ControlCharRadix::AsciiMnemonic => radix::mnemonic(byte)
                .unwrap_or_else(|| radix::format_numeric_with_suffix(byte, Radix::Hex)),
            ControlCharRadix::Numeric => radix::format_numeric_with_suffix(byte, Radix::Hex),
        };
        return DisplayElement::control(origin, text);
    }
    if ch == ' ' && settings.replace_space {
        return DisplayElement::data(origin, VISIBLE_SPACE);
    }
    let text = match direction {
        Direction::Tx => settings.char_substitution.apply(ch),
        Direction::Rx => ch.to_string(),
    };
    DisplayElement::data(origin, text)
}
