/*
Bytes come in tagged Tx or Rx from a transport, one RawElement per read/write
Each direction decodes its bytes and frames them into lines on its own EOL
Lines go to the direction's repository and to the merged Bidir repository
    Bidir gets an extra line break when the talker changes
Repositories keep the last N complete lines plus the line in progress

Settings changes that affect rendering reset line framing and reload
    Reload replays the transport's retained raw log with notifications off
    One cleared + one reloaded event per repository instead

Everything mutable sits behind one lock per terminal
    Tx from the sending thread, Rx from the I/O thread, never interleaved
*/
mod decode;
mod element;
mod eol;
mod framing;
mod line_state;
mod observer;
mod radix;
mod raw;
mod repository;
mod settings;
mod terminal;

pub use decode::{CharDecoder, DecodedChar, Encoding};
pub use element::{Direction, DisplayElement, DisplayLine, ElementKind, Origin};
pub use eol::{parse_sequence, EolQueue, StandardEol};
pub use framing::{BinaryFraming, Framing, LineEnd, LineFraming, TerminalMode, TextFraming};
pub use line_state::{BidirLineState, LinePosition, LineState};
pub use observer::{ObserverId, TerminalEvent, TerminalObserver};
pub use radix::{ControlCharRadix, Radix};
pub use raw::{RawElement, RawRepository, RetainedLog};
pub use repository::{DisplayRepository, RepositoryKind};
pub use settings::{
    BinarySettings, BufferSettings, Changes, CharSubstitution, DirectionSettings, ParsedSequences,
    TerminalSettings,
};
pub use terminal::{ReplayMode, Terminal, TerminalCore};
