//! Push based delivery of terminal events.
//!
//! Events are collected while the terminal state is locked and dispatched to
//! observers after the lock is released, so an observer may query the
//! terminal from within a callback.

use crate::element::{DisplayElement, DisplayLine};
use crate::repository::RepositoryKind;
use std::sync::Arc;

pub type ObserverId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// Elements appended to a repository while processing one raw element.
    ElementsProcessed {
        repository: RepositoryKind,
        elements: Vec<DisplayElement>,
    },
    /// Lines completed while processing one raw element.
    LinesProcessed {
        repository: RepositoryKind,
        lines: Vec<DisplayLine>,
    },
    /// The in-progress line lost elements delivered by an earlier raw
    /// element, because they turned out to be part of the EOL sequence.
    /// Fired before the raw element's other events.
    CurrentLineReplaced {
        repository: RepositoryKind,
        line: DisplayLine,
    },
    RepositoryCleared(RepositoryKind),
    RepositoryReloaded(RepositoryKind),
}

impl TerminalEvent {
    pub fn repository(&self) -> RepositoryKind {
        match self {
            TerminalEvent::ElementsProcessed { repository, .. }
            | TerminalEvent::LinesProcessed { repository, .. }
            | TerminalEvent::CurrentLineReplaced { repository, .. } => *repository,
            TerminalEvent::RepositoryCleared(repository)
            | TerminalEvent::RepositoryReloaded(repository) => *repository,
        }
    }
}

/// Receives terminal events. Every method defaults to a no-op.
///
/// Observers are called on whichever thread triggered the events.
pub trait TerminalObserver: Send + Sync {
    fn on_elements(&self, _repository: RepositoryKind, _elements: &[DisplayElement]) {}

    fn on_lines(&self, _repository: RepositoryKind, _lines: &[DisplayLine]) {}

    fn on_repository_reset(&self, _event: &TerminalEvent) {}

    /// Called for every event, after the specific method.
    fn on_event(&self, _event: &TerminalEvent) {}
}

pub(crate) struct ObserverEntry {
    pub id: ObserverId,
    pub observer: Arc<dyn TerminalObserver>,
}

pub(crate) fn dispatch(observer: &dyn TerminalObserver, event: &TerminalEvent) {
    match event {
        TerminalEvent::ElementsProcessed {
            repository,
            elements,
        } => observer.on_elements(*repository, elements),
        TerminalEvent::LinesProcessed { repository, lines } => {
            observer.on_lines(*repository, lines)
        }
        TerminalEvent::CurrentLineReplaced { .. }
        | TerminalEvent::RepositoryCleared(_)
        | TerminalEvent::RepositoryReloaded(_) => observer.on_repository_reset(event),
    }
    observer.on_event(event);
}
