use crate::element::Direction;
use crate::repository::RepositoryKind;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// Bytes from one physical send or receive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub bytes: Vec<u8>,
    pub direction: Direction,
    pub timestamp: DateTime<Local>,
}

impl RawElement {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        direction: Direction,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            direction,
            timestamp,
        }
    }

    /// Stamped with the current local time.
    pub fn now(bytes: impl Into<Vec<u8>>, direction: Direction) -> Self {
        Self::new(bytes, direction, Local::now())
    }
}

/// The raw log a transport retains, replayed by a terminal reload.
pub trait RetainedLog {
    /// Retained elements of one direction, or of both for `Bidir`, oldest
    /// first.
    fn retained(&self, which: RepositoryKind) -> Vec<RawElement>;
}

fn matches(which: RepositoryKind, direction: Direction) -> bool {
    which == RepositoryKind::Bidir || which == RepositoryKind::from(direction)
}

impl RetainedLog for [RawElement] {
    fn retained(&self, which: RepositoryKind) -> Vec<RawElement> {
        self.iter()
            .filter(|raw| matches(which, raw.direction))
            .cloned()
            .collect()
    }
}

impl RetainedLog for Vec<RawElement> {
    fn retained(&self, which: RepositoryKind) -> Vec<RawElement> {
        self.as_slice().retained(which)
    }
}

/// Capacity bounded raw log with a view per repository, each evicting its
/// oldest element independently.
#[derive(Debug, Clone)]
pub struct RawRepository {
    capacity: usize,
    tx: VecDeque<RawElement>,
    bidir: VecDeque<RawElement>,
    rx: VecDeque<RawElement>,
}

impl RawRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tx: VecDeque::new(),
            bidir: VecDeque::new(),
            rx: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, raw: RawElement) {
        let capacity = self.capacity;
        let bounded_push = |queue: &mut VecDeque<RawElement>, raw: RawElement| {
            if capacity == 0 {
                return;
            }
            if queue.len() == capacity {
                queue.pop_front();
            }
            queue.push_back(raw);
        };
        match raw.direction {
            Direction::Tx => bounded_push(&mut self.tx, raw.clone()),
            Direction::Rx => bounded_push(&mut self.rx, raw.clone()),
        }
        bounded_push(&mut self.bidir, raw);
    }

    pub fn len(&self, which: RepositoryKind) -> usize {
        self.queue(which).len()
    }

    pub fn is_empty(&self) -> bool {
        self.bidir.is_empty() && self.tx.is_empty() && self.rx.is_empty()
    }

    pub fn clear(&mut self, which: RepositoryKind) {
        match which {
            RepositoryKind::Tx => self.tx.clear(),
            RepositoryKind::Bidir => self.bidir.clear(),
            RepositoryKind::Rx => self.rx.clear(),
        }
    }

    fn queue(&self, which: RepositoryKind) -> &VecDeque<RawElement> {
        match which {
            RepositoryKind::Tx => &self.tx,
            RepositoryKind::Bidir => &self.bidir,
            RepositoryKind::Rx => &self.rx,
        }
    }
}

impl RetainedLog for RawRepository {
    fn retained(&self, which: RepositoryKind) -> Vec<RawElement> {
        self.queue(which).iter().cloned().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn views_are_bounded_independently() {
        let mut log = RawRepository::new(2);
        log.push(RawElement::now(*b"t1", Direction::Tx));
        log.push(RawElement::now(*b"r1", Direction::Rx));
        log.push(RawElement::now(*b"r2", Direction::Rx));
        assert_eq!(log.len(RepositoryKind::Tx), 1);
        assert_eq!(log.len(RepositoryKind::Rx), 2);
        let bidir: Vec<Vec<u8>> = log
            .retained(RepositoryKind::Bidir)
            .into_iter()
            .map(|raw| raw.bytes)
            .collect();
        assert_eq!(bidir, vec![b"r1".to_vec(), b"r2".to_vec()]);
    }

    #[test]
    fn slices_filter_by_direction() {
        let log = vec![
            RawElement::now(*b"a", Direction::Tx),
            RawElement::now(*b"b", Direction::Rx),
        ];
        assert_eq!(log.retained(RepositoryKind::Rx).len(), 1);
        assert_eq!(log.retained(RepositoryKind::Bidir).len(), 2);
    }
}
