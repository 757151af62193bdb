use crate::decode::{CharDecoder, Encoding};
use crate::element::{Direction, DisplayElement, DisplayLine, ElementKind};
use crate::eol::EolQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePosition {
    Begin,
    Data,
    End,
}

/// Line assembly state of one direction.
#[derive(Debug, Clone)]
pub struct LineState {
    pub position: LinePosition,
    pub accumulated: DisplayLine,
    pub eol: EolQueue,
    pub decoder: CharDecoder,
    /// Bytes of the current line, for length based framing.
    pub byte_count: usize,
    /// Elements of the current line produced by the raw element being
    /// processed, as opposed to earlier ones already handed out.
    pub(crate) emitted_in_chunk: usize,
    /// The merged view broke this line early on a direction change.
    pub(crate) split_in_bidir: bool,
}

impl LineState {
    pub fn new(eol: &[u8], encoding: Encoding) -> Self {
        Self {
            position: LinePosition::Begin,
            accumulated: DisplayLine::new(),
            eol: EolQueue::new(eol),
            decoder: CharDecoder::new(encoding),
            byte_count: 0,
            emitted_in_chunk: 0,
            split_in_bidir: false,
        }
    }

    pub(crate) fn push(&mut self, element: DisplayElement) {
        self.accumulated.push(element);
        self.emitted_in_chunk += 1;
    }

    /// Number of trailing elements that render the last `bytes` bytes of the
    /// line, together with the separators in front of them.
    pub(crate) fn trailing_span(&self, bytes: usize) -> usize {
        let mut covered = 0;
        let mut span = 0;
        for element in self.accumulated.iter().rev() {
            if covered >= bytes && element.kind() != ElementKind::Space {
                break;
            }
            span += 1;
            covered += element.byte_len();
        }
        span
    }

    /// Drops the last `span` elements, returning how many of them were
    /// produced during the current raw element.
    pub(crate) fn truncate_tail(&mut self, span: usize) -> usize {
        for _ in 0..span {
            self.accumulated.pop();
        }
        let in_chunk = span.min(self.emitted_in_chunk);
        self.emitted_in_chunk -= in_chunk;
        in_chunk
    }

    pub fn reset(&mut self) {
        self.position = LinePosition::Begin;
        self.accumulated.clear();
        self.eol.reset();
        self.decoder.reset();
        self.byte_count = 0;
        self.emitted_in_chunk = 0;
        self.split_in_bidir = false;
    }
}

/// Tracks the talker of the merged view, to break its line when the talker
/// changes.
#[derive(Debug, Clone)]
pub struct BidirLineState {
    pub is_first_line: bool,
    pub last_direction: Direction,
}

impl Default for BidirLineState {
    fn default() -> Self {
        Self {
            is_first_line: true,
            last_direction: Direction::Tx,
        }
    }
}

impl BidirLineState {
    /// Records `direction` as the current talker. Returns the previous
    /// talker if it differs, except for the very first element.
    pub fn change_to(&mut self, direction: Direction) -> Option<Direction> {
        if self.is_first_line {
            self.is_first_line = false;
            self.last_direction = direction;
            return None;
        }
        let previous = std::mem::replace(&mut self.last_direction, direction);
        (previous != direction).then_some(previous)
    }
}
