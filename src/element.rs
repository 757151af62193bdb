use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the connection a byte travelled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Tx,
    Rx,
}

impl Direction {
    pub fn other(self) -> Self {
        match self {
            Direction::Tx => Direction::Rx,
            Direction::Rx => Direction::Tx,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Direction::Tx => 0,
            Direction::Rx => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Tx => f.write_str("Tx"),
            Direction::Rx => f.write_str("Rx"),
        }
    }
}

/// The raw bytes a data or control element was decoded from.
///
/// A single element can stand for several bytes when a multi-byte character
/// is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub bytes: Vec<u8>,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    NoData,
    TxData,
    RxData,
    TxControl,
    RxControl,
    TimeStamp,
    LeftMargin,
    RightMargin,
    Space,
    LineLength,
    LineBreak,
    Error,
}

impl ElementKind {
    pub fn is_data(self) -> bool {
        matches!(
            self,
            ElementKind::TxData
                | ElementKind::RxData
                | ElementKind::TxControl
                | ElementKind::RxControl
        )
    }
}

/// One immutable renderable unit produced by the terminal.
///
/// Every element except [`ElementKind::NoData`] carries the direction of the
/// line it belongs to, which is what allows the merged view to retract the
/// elements of one direction without touching the other. Only data and control
/// elements carry an [`Origin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayElement {
    kind: ElementKind,
    direction: Option<Direction>,
    origin: Option<Origin>,
    text: String,
}

impl DisplayElement {
    pub fn no_data() -> Self {
        Self {
            kind: ElementKind::NoData,
            direction: None,
            origin: None,
            text: String::new(),
        }
    }

    pub fn data(origin: Origin, text: impl Into<String>) -> Self {
        let kind = match origin.direction {
            Direction::Tx => ElementKind::TxData,
            Direction::Rx => ElementKind::RxData,
        };
        Self::with_origin(kind, origin, text)
    }

    pub fn control(origin: Origin, text: impl Into<String>) -> Self {
        let kind = match origin.direction {
            Direction::Tx => ElementKind::TxControl,
            Direction::Rx => ElementKind::RxControl,
        };
        Self::with_origin(kind, origin, text)
    }

    fn with_origin(kind: ElementKind, origin: Origin, text: impl Into<String>) -> Self {
        Self {
            kind,
            direction: Some(origin.direction),
            origin: Some(origin),
            text: text.into(),
        }
    }

    pub fn time_stamp(direction: Direction, text: impl Into<String>) -> Self {
        Self::decoration(ElementKind::TimeStamp, direction, text)
    }

    pub fn left_margin(direction: Direction) -> Self {
        Self::decoration(ElementKind::LeftMargin, direction, " ")
    }

    pub fn right_margin(direction: Direction) -> Self {
        Self::decoration(ElementKind::RightMargin, direction, " ")
    }

    pub fn space(direction: Direction) -> Self {
        Self::decoration(ElementKind::Space, direction, " ")
    }

    pub fn line_length(direction: Direction, length: usize) -> Self {
        Self::decoration(ElementKind::LineLength, direction, format!("({length})"))
    }

    pub fn line_break(direction: Direction) -> Self {
        Self::decoration(ElementKind::LineBreak, direction, "")
    }

    /// A cosmetic failure to render a single control byte; processing
    /// carries on.
    pub fn error(direction: Direction, message: impl Into<String>) -> Self {
        Self::decoration(ElementKind::Error, direction, message)
    }

    fn decoration(kind: ElementKind, direction: Direction, text: impl Into<String>) -> Self {
        Self {
            kind,
            direction: Some(direction),
            origin: None,
            text: text.into(),
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_data(&self) -> bool {
        self.kind.is_data()
    }

    pub fn is_eol(&self) -> bool {
        self.kind == ElementKind::LineBreak
    }

    /// Number of received or transmitted bytes this element renders. Zero
    /// for decorations.
    pub fn byte_len(&self) -> usize {
        match (&self.origin, self.kind) {
            (Some(origin), _) => origin.bytes.len(),
            (None, ElementKind::Error) => 1,
            (None, _) => 0,
        }
    }
}

impl fmt::Display for DisplayElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A sequence of elements, normally terminated by a line break once committed.
///
/// The data element count is kept alongside the elements so that evicting a
/// line from a repository is O(1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayLine {
    elements: Vec<DisplayElement>,
    data_count: usize,
}

impl DisplayLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: DisplayElement) {
        if element.is_data() {
            self.data_count += 1;
        }
        self.elements.push(element);
    }

    pub fn pop(&mut self) -> Option<DisplayElement> {
        let element = self.elements.pop()?;
        if element.is_data() {
            self.data_count -= 1;
        }
        Some(element)
    }

    pub(crate) fn remove(&mut self, index: usize) -> DisplayElement {
        let element = self.elements.remove(index);
        if element.is_data() {
            self.data_count -= 1;
        }
        element
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.data_count = 0;
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn data_count(&self) -> usize {
        self.data_count
    }

    pub fn elements(&self) -> &[DisplayElement] {
        &self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DisplayElement> {
        self.elements.iter()
    }

    pub fn last(&self) -> Option<&DisplayElement> {
        self.elements.last()
    }

    pub fn has_direction(&self, direction: Direction) -> bool {
        self.elements
            .iter()
            .any(|element| element.direction() == Some(direction))
    }

    /// Concatenated text of every element, the way a plain renderer shows it.
    pub fn text(&self) -> String {
        self.elements.iter().map(DisplayElement::text).collect()
    }
}

impl From<Vec<DisplayElement>> for DisplayLine {
    fn from(elements: Vec<DisplayElement>) -> Self {
        let data_count = elements.iter().filter(|e| e.is_data()).count();
        Self {
            elements,
            data_count,
        }
    }
}

impl<'a> IntoIterator for &'a DisplayLine {
    type Item = &'a DisplayElement;
    type IntoIter = std::slice::Iter<'a, DisplayElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl Extend<DisplayElement> for DisplayLine {
    fn extend<T: IntoIterator<Item = DisplayElement>>(&mut self, iter: T) {
        for element in iter {
            self.push(element);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn rx(byte: u8) -> DisplayElement {
        DisplayElement::data(
            Origin {
                bytes: vec![byte],
                direction: Direction::Rx,
            },
            (byte as char).to_string(),
        )
    }

    #[test]
    fn only_line_breaks_are_eol() {
        assert!(DisplayElement::line_break(Direction::Tx).is_eol());
        assert!(!DisplayElement::space(Direction::Tx).is_eol());
        assert!(!rx(b'A').is_eol());
    }

    #[test]
    fn origin_follows_direction() {
        let element = DisplayElement::control(
            Origin {
                bytes: vec![0x0D],
                direction: Direction::Tx,
            },
            "<CR>",
        );
        assert_eq!(element.kind(), ElementKind::TxControl);
        assert!(element.is_data());
        assert_eq!(element.origin().map(|o| o.direction), Some(Direction::Tx));
        assert!(DisplayElement::time_stamp(Direction::Tx, "x").origin().is_none());
    }

    #[test]
    fn errors_are_not_counted_as_data() {
        let error = DisplayElement::error(Direction::Rx, "oops");
        assert!(!error.is_data());
        assert_eq!(error.byte_len(), 1);
        assert_eq!(DisplayElement::space(Direction::Rx).byte_len(), 0);
    }

    #[test]
    fn line_tracks_data_count() {
        let mut line = DisplayLine::new();
        line.push(rx(b'A'));
        line.push(DisplayElement::space(Direction::Rx));
        line.push(rx(b'B'));
        assert_eq!(line.data_count(), 2);
        assert_eq!(line.text(), "A B");

        line.pop();
        assert_eq!(line.data_count(), 1);
        line.remove(0);
        assert_eq!(line.data_count(), 0);
        assert_eq!(line.len(), 1);
    }
}
