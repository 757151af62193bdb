use crate::radix;
use anyhow::{bail, Context, Result};
use std::collections::VecDeque;

/// Sliding window over the most recent bytes of a line, matched against a
/// configured end-of-line sequence.
///
/// The window never holds more bytes than the sequence is long, so detecting a
/// multi-byte EOL never requires buffering the whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EolQueue {
    target: Vec<u8>,
    window: VecDeque<u8>,
}

impl EolQueue {
    pub fn new(target: impl Into<Vec<u8>>) -> Self {
        let target = target.into();
        Self {
            window: VecDeque::with_capacity(target.len()),
            target,
        }
    }

    pub fn enqueue(&mut self, byte: u8) {
        if self.target.is_empty() {
            return;
        }
        if self.window.len() == self.target.len() {
            self.window.pop_front();
        }
        self.window.push_back(byte);
    }

    /// True iff the last `N` enqueued bytes equal the target. An empty target
    /// never matches.
    pub fn matches(&self) -> bool {
        !self.target.is_empty()
            && self.window.len() == self.target.len()
            && self.window.iter().eq(self.target.iter())
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn target(&self) -> &[u8] {
        &self.target
    }

    /// Length of the EOL sequence in bytes.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// The EOL sequences offered by default, in their textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardEol {
    None,
    Cr,
    Lf,
    CrLf,
    LfCr,
    Tab,
    Nul,
}

impl StandardEol {
    pub const ALL: [StandardEol; 7] = [
        StandardEol::None,
        StandardEol::Cr,
        StandardEol::Lf,
        StandardEol::CrLf,
        StandardEol::LfCr,
        StandardEol::Tab,
        StandardEol::Nul,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StandardEol::None => "",
            StandardEol::Cr => "<CR>",
            StandardEol::Lf => "<LF>",
            StandardEol::CrLf => "<CR><LF>",
            StandardEol::LfCr => "<LF><CR>",
            StandardEol::Tab => "<TAB>",
            StandardEol::Nul => "<NUL>",
        }
    }

    pub fn bytes(self) -> &'static [u8] {
        match self {
            StandardEol::None => &[],
            StandardEol::Cr => b"\r",
            StandardEol::Lf => b"\n",
            StandardEol::CrLf => b"\r\n",
            StandardEol::LfCr => b"\n\r",
            StandardEol::Tab => b"\t",
            StandardEol::Nul => b"\0",
        }
    }
}

/// Parses a textual byte sequence such as `<CR><LF>`, `\r\n` or `\x0D;` into
/// bytes.
///
/// Understood forms are ASCII mnemonics in angle brackets (`<ESC>`), the C
/// escapes `\r \n \t \0 \\ \<`, hex escapes `\xHH`, and any other literal
/// character, which contributes its UTF-8 bytes.
pub fn parse_sequence(text: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        match c {
            '<' => {
                let rest = &text[index + 1..];
                let end = rest.find('>').with_context(|| {
                    format!("unterminated mnemonic at offset {index} in {text:?}")
                })?;
                let name = &rest[..end];
                let byte = radix::mnemonic_byte(name)
                    .with_context(|| format!("unknown ASCII mnemonic <{name}> in {text:?}"))?;
                bytes.push(byte);
                // Skip the name and the closing bracket.
                for _ in 0..name.chars().count() + 1 {
                    chars.next();
                }
            }
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    bail!("dangling escape at end of {text:?}");
                };
                match escaped {
                    'r' => bytes.push(b'\r'),
                    'n' => bytes.push(b'\n'),
                    't' => bytes.push(b'\t'),
                    '0' => bytes.push(0),
                    '\\' => bytes.push(b'\\'),
                    '<' => bytes.push(b'<'),
                    'x' => {
                        let digits: String = (0..2)
                            .filter_map(|_| chars.next().map(|(_, d)| d))
                            .collect();
                        if digits.len() != 2 || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
                            bail!("invalid hex escape \\x{digits} in {text:?}");
                        }
                        let byte = u8::from_str_radix(&digits, 16)?;
                        bytes.push(byte);
                    }
                    other => bail!("unknown escape \\{other} in {text:?}"),
                }
            }
            _ => {
                let mut buf = [0; 4];
                bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    Ok(bytes)
}
