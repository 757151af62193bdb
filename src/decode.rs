use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

/// A character together with the bytes it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedChar {
    pub ch: char,
    pub bytes: Vec<u8>,
}

/// Streaming decoder fed one byte at a time.
///
/// Bytes of an incomplete multi-byte sequence are held back until the
/// sequence completes. An invalid sequence decodes to U+FFFD and decoding
/// resumes at the byte that broke it.
#[derive(Debug, Clone)]
pub struct CharDecoder {
    encoding: Encoding,
    pending: Vec<u8>,
}

impl CharDecoder {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: Vec::with_capacity(4),
        }
    }

    /// Bytes of a sequence that has not completed yet.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Feeds one byte. Returns no characters while a sequence is incomplete.
    pub fn push(&mut self, byte: u8) -> Vec<DecodedChar> {
        match self.encoding {
            Encoding::Latin1 => vec![DecodedChar {
                ch: char::from(byte),
                bytes: vec![byte],
            }],
            Encoding::Ascii => {
                let ch = if byte.is_ascii() {
                    char::from(byte)
                } else {
                    char::REPLACEMENT_CHARACTER
                };
                vec![DecodedChar { ch, bytes: vec![byte] }]
            }
            Encoding::Utf8 => self.push_utf8(byte),
        }
    }

    fn push_utf8(&mut self, byte: u8) -> Vec<DecodedChar> {
        self.pending.push(byte);
        match std::str::from_utf8(&self.pending) {
            Ok(s) => {
                let ch = s.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
                vec![DecodedChar {
                    ch,
                    bytes: std::mem::take(&mut self.pending),
                }]
            }
            Err(e) if e.error_len().is_none() => Vec::new(),
            Err(_) => {
                if self.pending.len() == 1 {
                    return vec![DecodedChar {
                        ch: char::REPLACEMENT_CHARACTER,
                        bytes: std::mem::take(&mut self.pending),
                    }];
                }
                // The last byte broke an otherwise valid prefix.
                let broken = self.pending.len() - 1;
                let mut bytes = std::mem::take(&mut self.pending);
                let last = bytes.split_off(broken);
                let mut decoded = vec![DecodedChar {
                    ch: char::REPLACEMENT_CHARACTER,
                    bytes,
                }];
                decoded.extend(self.push_utf8(last[0]));
                decoded
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn feed(decoder: &mut CharDecoder, bytes: &[u8]) -> Vec<Vec<char>> {
        bytes
            .iter()
            .map(|b| decoder.push(*b).into_iter().map(|d| d.ch).collect())
            .collect()
    }

    #[test]
    fn multi_byte_sequences_wait_for_completion() {
        let mut decoder = CharDecoder::new(Encoding::Utf8);
        let steps = feed(&mut decoder, "aé€".as_bytes());
        assert_eq!(
            steps,
            vec![vec!['a'], vec![], vec!['é'], vec![], vec![], vec!['€']]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn decoded_char_keeps_its_bytes() {
        let mut decoder = CharDecoder::new(Encoding::Utf8);
        decoder.push(0xC3);
        let decoded = decoder.push(0xA9);
        assert_eq!(decoded[0].bytes, vec![0xC3, 0xA9]);
    }

    #[test]
    fn invalid_prefix_is_replaced_and_decoding_resumes() {
        let mut decoder = CharDecoder::new(Encoding::Utf8);
        assert!(decoder.push(0xE2).is_empty());
        let decoded: Vec<char> = decoder.push(b'A').into_iter().map(|d| d.ch).collect();
        assert_eq!(decoded, vec![char::REPLACEMENT_CHARACTER, 'A']);
    }

    #[test]
    fn lone_continuation_byte_is_replaced() {
        let mut decoder = CharDecoder::new(Encoding::Utf8);
        let decoded = decoder.push(0x80);
        assert_eq!(decoded[0].ch, char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn single_byte_encodings() {
        let mut ascii = CharDecoder::new(Encoding::Ascii);
        assert_eq!(ascii.push(0xE9)[0].ch, char::REPLACEMENT_CHARACTER);
        let mut latin1 = CharDecoder::new(Encoding::Latin1);
        assert_eq!(latin1.push(0xE9)[0].ch, 'é');
    }

    #[test]
    fn reset_drops_pending_bytes() {
        let mut decoder = CharDecoder::new(Encoding::Utf8);
        decoder.push(0xE2);
        decoder.reset();
        assert_eq!(decoder.push(b'x')[0].ch, 'x');
    }
}
