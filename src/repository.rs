use crate::element::{Direction, DisplayElement, DisplayLine};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Selects one of a terminal's three repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryKind {
    Tx,
    Bidir,
    Rx,
}

impl RepositoryKind {
    pub const ALL: [RepositoryKind; 3] = [
        RepositoryKind::Tx,
        RepositoryKind::Bidir,
        RepositoryKind::Rx,
    ];
}

impl From<Direction> for RepositoryKind {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Tx => RepositoryKind::Tx,
            Direction::Rx => RepositoryKind::Rx,
        }
    }
}

impl fmt::Display for RepositoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryKind::Tx => f.write_str("Tx"),
            RepositoryKind::Bidir => f.write_str("Bidir"),
            RepositoryKind::Rx => f.write_str("Rx"),
        }
    }
}

impl FromStr for RepositoryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "tx" => RepositoryKind::Tx,
            "bidir" => RepositoryKind::Bidir,
            "rx" => RepositoryKind::Rx,
            other => bail!("unknown repository {other:?}"),
        })
    }
}

/// Bounded buffer of committed display lines plus the line in progress.
///
/// Capacity counts complete lines. The in-progress line is never evicted, no
/// matter how long it grows. The data element count is maintained on every
/// mutation rather than recomputed.
#[derive(Debug, Clone)]
pub struct DisplayRepository {
    capacity: usize,
    committed: VecDeque<DisplayLine>,
    current: DisplayLine,
    data_count: usize,
}

impl DisplayRepository {
    /// A capacity of `0` keeps only the in-progress line.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            committed: VecDeque::with_capacity(capacity.min(4096)),
            current: DisplayLine::new(),
            data_count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends an element to the in-progress line, committing the line when
    /// the element is a line break.
    pub fn enqueue(&mut self, element: DisplayElement) {
        if element.is_data() {
            self.data_count += 1;
        }
        let is_eol = element.is_eol();
        self.current.push(element);
        if is_eol {
            self.commit_current();
        }
    }

    fn commit_current(&mut self) {
        let line = std::mem::take(&mut self.current);
        if self.capacity == 0 {
            self.data_count -= line.data_count();
            return;
        }
        if self.committed.len() == self.capacity {
            self.evict_oldest();
        }
        self.committed.push_back(line);
    }

    fn evict_oldest(&mut self) {
        if let Some(line) = self.committed.pop_front() {
            self.data_count -= line.data_count();
        }
    }

    /// Growing never evicts. Shrinking evicts the oldest committed lines.
    pub fn set_line_capacity(&mut self, capacity: usize) {
        while self.committed.len() > capacity {
            self.evict_oldest();
        }
        self.capacity = capacity;
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.current.clear();
        self.data_count = 0;
    }

    /// Removes up to `count` of the most recent elements of `direction` from
    /// the in-progress line, skipping elements of the other direction.
    /// Returns how many were removed.
    pub fn retract(&mut self, direction: Direction, count: usize) -> usize {
        let mut removed = 0;
        let mut index = self.current.len();
        while removed < count && index > 0 {
            index -= 1;
            if self.current.elements()[index].direction() == Some(direction) {
                let element = self.current.remove(index);
                if element.is_data() {
                    self.data_count -= 1;
                }
                removed += 1;
            }
        }
        removed
    }

    pub fn data_count(&self) -> usize {
        self.data_count
    }

    /// Number of committed lines.
    pub fn line_count(&self) -> usize {
        self.committed.len()
    }

    pub fn current_line(&self) -> &DisplayLine {
        &self.current
    }

    /// Committed lines plus the in-progress line if it holds anything.
    pub fn to_lines(&self) -> Vec<DisplayLine> {
        let mut lines: Vec<DisplayLine> = self.committed.iter().cloned().collect();
        if !self.current.is_empty() {
            lines.push(self.current.clone());
        }
        lines
    }

    pub fn to_elements(&self) -> Vec<DisplayElement> {
        self.committed
            .iter()
            .chain(std::iter::once(&self.current))
            .flat_map(|line| line.iter().cloned())
            .collect()
    }
}
