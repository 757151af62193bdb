use crate::decode::Encoding;
use crate::element::Direction;
use crate::eol;
use crate::radix::{ControlCharRadix, Radix};
use crate::repository::RepositoryKind;
use anyhow::{Context, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharSubstitution {
    #[default]
    None,
    ToUpper,
    ToLower,
}

impl CharSubstitution {
    pub fn apply(self, c: char) -> String {
        match self {
            CharSubstitution::None => c.to_string(),
            CharSubstitution::ToUpper => c.to_uppercase().collect(),
            CharSubstitution::ToLower => c.to_lowercase().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionSettings {
    pub radix: Radix,
    /// Textual EOL sequence, see [`eol::parse_sequence`].
    pub eol: String,
}

impl Default for DirectionSettings {
    fn default() -> Self {
        Self {
            radix: Radix::String,
            eol: eol::StandardEol::CrLf.as_str().to_string(),
        }
    }
}

/// Line framing for binary terminals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinarySettings {
    /// Bytes per line, `0` disables length based breaks.
    pub line_length: usize,
    /// Textual sequence after which a line breaks, empty disables.
    pub sequence: String,
}

impl Default for BinarySettings {
    fn default() -> Self {
        Self {
            line_length: 16,
            sequence: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSettings {
    pub tx_lines: usize,
    pub bidir_lines: usize,
    pub rx_lines: usize,
}

impl BufferSettings {
    pub fn lines(&self, which: RepositoryKind) -> usize {
        match which {
            RepositoryKind::Tx => self.tx_lines,
            RepositoryKind::Bidir => self.bidir_lines,
            RepositoryKind::Rx => self.rx_lines,
        }
    }
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            tx_lines: 1000,
            bidir_lines: 1000,
            rx_lines: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalSettings {
    pub encoding: Encoding,
    pub show_time_stamp: bool,
    pub show_length: bool,
    pub show_eol: bool,
    pub tx: DirectionSettings,
    pub rx: DirectionSettings,
    pub control_char_radix: ControlCharRadix,
    pub char_substitution: CharSubstitution,
    pub replace_space: bool,
    pub replace_control_chars: bool,
    pub direction_line_break: bool,
    pub binary: BinarySettings,
    pub buffers: BufferSettings,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            encoding: Encoding::Utf8,
            show_time_stamp: false,
            show_length: false,
            show_eol: false,
            tx: DirectionSettings::default(),
            rx: DirectionSettings::default(),
            control_char_radix: ControlCharRadix::AsciiMnemonic,
            char_substitution: CharSubstitution::None,
            replace_space: false,
            replace_control_chars: true,
            direction_line_break: true,
            binary: BinarySettings::default(),
            buffers: BufferSettings::default(),
        }
    }
}

impl TerminalSettings {
    pub fn direction(&self, direction: Direction) -> &DirectionSettings {
        match direction {
            Direction::Tx => &self.tx,
            Direction::Rx => &self.rx,
        }
    }

    pub fn direction_mut(&mut self, direction: Direction) -> &mut DirectionSettings {
        match direction {
            Direction::Tx => &mut self.tx,
            Direction::Rx => &mut self.rx,
        }
    }

    pub fn radix(&self, direction: Direction) -> Radix {
        self.direction(direction).radix
    }

    pub fn set_radix(&mut self, radix: Radix) {
        self.tx.radix = radix;
        self.rx.radix = radix;
    }

    /// Whether control bytes are replaced by their `<CR>` style names.
    pub fn mnemonic_substitution(&self) -> bool {
        self.replace_control_chars && self.control_char_radix == ControlCharRadix::AsciiMnemonic
    }

    /// Parses every textual byte sequence, failing on the first malformed one.
    pub fn parse(&self) -> Result<ParsedSequences> {
        Ok(ParsedSequences {
            tx_eol: eol::parse_sequence(&self.tx.eol).context("invalid Tx EOL sequence")?,
            rx_eol: eol::parse_sequence(&self.rx.eol).context("invalid Rx EOL sequence")?,
            binary: eol::parse_sequence(&self.binary.sequence)
                .context("invalid binary line break sequence")?,
        })
    }

    /// Which parts of a running terminal are affected by moving from `self`
    /// to `new`.
    pub fn changes(&self, new: &TerminalSettings) -> Changes {
        let mut changes = Changes::empty();
        if self.buffers != new.buffers {
            changes |= Changes::CAPACITY;
        }
        if self.encoding != new.encoding
            || self.tx != new.tx
            || self.rx != new.rx
            || self.binary != new.binary
            || self.control_char_radix != new.control_char_radix
            || self.char_substitution != new.char_substitution
            || self.replace_space != new.replace_space
            || self.replace_control_chars != new.replace_control_chars
        {
            changes |= Changes::LINE_STATE;
        }
        if self.show_time_stamp != new.show_time_stamp
            || self.show_length != new.show_length
            || self.show_eol != new.show_eol
            || self.direction_line_break != new.direction_line_break
        {
            changes |= Changes::DISPLAY;
        }
        changes
    }
}

/// Byte sequences parsed from their textual settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSequences {
    pub tx_eol: Vec<u8>,
    pub rx_eol: Vec<u8>,
    pub binary: Vec<u8>,
}

impl ParsedSequences {
    pub fn eol(&self, direction: Direction) -> &[u8] {
        match direction {
            Direction::Tx => &self.tx_eol,
            Direction::Rx => &self.rx_eol,
        }
    }
}

bitflags! {
    /// What a settings change requires from a running terminal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Changes: u8 {
        /// Repository capacities changed; applied in place.
        const CAPACITY = 1 << 0;
        /// Decoding or framing changed; line states are reset.
        const LINE_STATE = 1 << 1;
        /// Only the presentation of lines changed.
        const DISPLAY = 1 << 2;
    }
}

impl Changes {
    pub fn requires_reload(self) -> bool {
        self.intersects(Changes::LINE_STATE | Changes::DISPLAY)
    }
}
