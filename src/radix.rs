use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How bytes of one direction are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Radix {
    Bin,
    Oct,
    Dec,
    Hex,
    /// One character per token, tokens separated by spaces.
    Char,
    /// Characters run together as text.
    String,
}

impl Radix {
    pub fn is_numeric(self) -> bool {
        matches!(self, Radix::Bin | Radix::Oct | Radix::Dec | Radix::Hex)
    }

    /// Whether consecutive data elements render as visually separate tokens.
    pub fn is_separated(self) -> bool {
        self != Radix::String
    }

    fn suffix(self) -> char {
        match self {
            Radix::Bin => 'b',
            Radix::Oct => 'o',
            Radix::Dec => 'd',
            Radix::Hex | Radix::Char | Radix::String => 'h',
        }
    }
}

impl FromStr for Radix {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bin" | "binary" => Radix::Bin,
            "oct" | "octal" => Radix::Oct,
            "dec" | "decimal" => Radix::Dec,
            "hex" | "hexadecimal" => Radix::Hex,
            "char" => Radix::Char,
            "string" | "str" => Radix::String,
            other => bail!("unknown radix {other:?}"),
        })
    }
}

/// How control characters are rendered when they are replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCharRadix {
    Numeric,
    AsciiMnemonic,
}

const MNEMONICS: [&str; 32] = [
    "NUL", "SOH", "STX", "ETX", "EOT", "ENQ", "ACK", "BEL", "BS", "TAB", "LF", "VT", "FF", "CR",
    "SO", "SI", "DLE", "DC1", "DC2", "DC3", "DC4", "NAK", "SYN", "ETB", "CAN", "EM", "SUB", "ESC",
    "FS", "GS", "RS", "US",
];

pub fn is_control(byte: u8) -> bool {
    byte < 0x20 || byte == 0x7F
}

/// `<CR>` style name of an ASCII control byte.
pub fn mnemonic(byte: u8) -> Option<String> {
    let name = match byte {
        0x7F => "DEL",
        b if b < 0x20 => MNEMONICS[b as usize],
        _ => return None,
    };
    Some(format!("<{name}>"))
}

/// Inverse of [`mnemonic`], without the angle brackets and ignoring case.
/// `HT` is accepted as an alias of `TAB`.
pub fn mnemonic_byte(name: &str) -> Option<u8> {
    let name = name.to_ascii_uppercase();
    match name.as_str() {
        "DEL" => Some(0x7F),
        "HT" => Some(0x09),
        _ => MNEMONICS.iter().position(|m| *m == name).map(|i| i as u8),
    }
}

/// Renders a byte as digits of a numeric radix. Character radices fall back
/// to hex.
pub fn format_numeric(byte: u8, radix: Radix) -> String {
    match radix {
        Radix::Bin => format!("{byte:08b}"),
        Radix::Oct => format!("{byte:03o}"),
        Radix::Dec => format!("{byte:03}"),
        Radix::Hex | Radix::Char | Radix::String => format!("{byte:02X}"),
    }
}

/// Numeric form with the radix suffix letter, used where a control byte
/// must be told apart from ordinary numeric data.
pub fn format_numeric_with_suffix(byte: u8, radix: Radix) -> String {
    format!("{}{}", format_numeric(byte, radix), radix.suffix())
}
