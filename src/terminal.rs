use crate::element::{Direction, DisplayElement, DisplayLine, ElementKind};
use crate::framing::{Framing, LineEnd, LineFraming, TerminalMode};
use crate::line_state::{BidirLineState, LinePosition, LineState};
use crate::observer::{self, ObserverEntry, ObserverId, TerminalEvent, TerminalObserver};
use crate::raw::{RawElement, RetainedLog};
use crate::repository::{DisplayRepository, RepositoryKind};
use crate::settings::{Changes, ParsedSequences, TerminalSettings};
use anyhow::Result;
use chrono::{DateTime, Local};
use log::{debug, trace, warn};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Whether processing notifies observers. Reload replays without
/// notifications and reports one aggregated event per repository instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    Live,
    Reload,
}

#[derive(Debug, Clone)]
struct Repositories {
    tx: DisplayRepository,
    bidir: DisplayRepository,
    rx: DisplayRepository,
}

impl Repositories {
    fn new(settings: &TerminalSettings) -> Self {
        Self {
            tx: DisplayRepository::new(settings.buffers.tx_lines),
            bidir: DisplayRepository::new(settings.buffers.bidir_lines),
            rx: DisplayRepository::new(settings.buffers.rx_lines),
        }
    }

    fn get(&self, which: RepositoryKind) -> &DisplayRepository {
        match which {
            RepositoryKind::Tx => &self.tx,
            RepositoryKind::Bidir => &self.bidir,
            RepositoryKind::Rx => &self.rx,
        }
    }

    fn get_mut(&mut self, which: RepositoryKind) -> &mut DisplayRepository {
        match which {
            RepositoryKind::Tx => &mut self.tx,
            RepositoryKind::Bidir => &mut self.bidir,
            RepositoryKind::Rx => &mut self.rx,
        }
    }
}

/// What processing one raw element produced, per repository.
struct ChunkOutput {
    direction: Direction,
    elements: Vec<DisplayElement>,
    bidir_elements: Vec<DisplayElement>,
    lines: Vec<DisplayLine>,
    bidir_lines: Vec<DisplayLine>,
    replaced: Vec<TerminalEvent>,
}

impl ChunkOutput {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            elements: Vec::new(),
            bidir_elements: Vec::new(),
            lines: Vec::new(),
            bidir_lines: Vec::new(),
            replaced: Vec::new(),
        }
    }

    fn into_events(self) -> Vec<TerminalEvent> {
        let own = RepositoryKind::from(self.direction);
        let mut events = self.replaced;
        if !self.elements.is_empty() {
            events.push(TerminalEvent::ElementsProcessed {
                repository: own,
                elements: self.elements,
            });
        }
        if !self.bidir_elements.is_empty() {
            events.push(TerminalEvent::ElementsProcessed {
                repository: RepositoryKind::Bidir,
                elements: self.bidir_elements,
            });
        }
        if !self.lines.is_empty() {
            events.push(TerminalEvent::LinesProcessed {
                repository: own,
                lines: self.lines,
            });
        }
        if !self.bidir_lines.is_empty() {
            events.push(TerminalEvent::LinesProcessed {
                repository: RepositoryKind::Bidir,
                lines: self.bidir_lines,
            });
        }
        events
    }
}

fn format_time_stamp(timestamp: &DateTime<Local>) -> String {
    timestamp.format("(%H:%M:%S%.3f)").to_string()
}

/// All mutable state of a terminal. Only ever touched behind the lock in
/// [`Terminal`], one raw element at a time.
pub struct TerminalCore {
    framing: Framing,
    settings: TerminalSettings,
    sequences: ParsedSequences,
    lines: [LineState; 2],
    bidir: BidirLineState,
    repositories: Repositories,
    shut_down: bool,
}

impl TerminalCore {
    pub fn new(mode: TerminalMode, settings: TerminalSettings) -> Result<Self> {
        let sequences = settings.parse()?;
        let framing = Framing::for_mode(mode);
        let lines = Self::line_states(&framing, &settings, &sequences);
        Ok(Self {
            framing,
            repositories: Repositories::new(&settings),
            settings,
            sequences,
            lines,
            bidir: BidirLineState::default(),
            shut_down: false,
        })
    }

    fn line_states(
        framing: &Framing,
        settings: &TerminalSettings,
        sequences: &ParsedSequences,
    ) -> [LineState; 2] {
        [Direction::Tx, Direction::Rx].map(|direction| {
            LineState::new(framing.break_sequence(direction, sequences), settings.encoding)
        })
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    pub fn mode(&self) -> TerminalMode {
        self.framing.mode()
    }

    pub fn repository(&self, which: RepositoryKind) -> &DisplayRepository {
        self.repositories.get(which)
    }

    pub fn line_state(&self, direction: Direction) -> &LineState {
        &self.lines[direction.index()]
    }

    /// Drops in-flight decoding and framing of both directions. Repository
    /// contents are kept.
    pub fn reset_line_states(&mut self) {
        self.lines = Self::line_states(&self.framing, &self.settings, &self.sequences);
        self.bidir = BidirLineState::default();
    }

    /// Applies new settings. Nothing changes if any byte sequence fails to
    /// parse.
    pub fn reconfigure(&mut self, settings: TerminalSettings) -> Result<Changes> {
        let sequences = settings
            .parse()
            .inspect_err(|e| warn!("Rejected terminal settings: {e:#}"))?;
        let changes = self.settings.changes(&settings);
        self.settings = settings;
        self.sequences = sequences;
        if changes.contains(Changes::CAPACITY) {
            for which in RepositoryKind::ALL {
                let lines = self.settings.buffers.lines(which);
                self.repositories.get_mut(which).set_line_capacity(lines);
            }
        }
        if changes.contains(Changes::LINE_STATE) {
            self.reset_line_states();
        }
        debug!("Reconfigured terminal: {changes:?}");
        Ok(changes)
    }

    pub fn clear(&mut self, which: RepositoryKind) -> TerminalEvent {
        debug!("Clearing {which} repository");
        self.repositories.get_mut(which).clear();
        TerminalEvent::RepositoryCleared(which)
    }

    /// Clears every repository and replays the retained log through freshly
    /// reset line states.
    pub fn reload(&mut self, log: &dyn RetainedLog) -> Vec<TerminalEvent> {
        let retained = log.retained(RepositoryKind::Bidir);
        debug!("Reloading terminal from {} raw elements", retained.len());
        self.reset_line_states();
        let mut events: Vec<TerminalEvent> =
            RepositoryKind::ALL.map(|which| self.clear(which)).to_vec();
        for raw in &retained {
            self.process(raw, ReplayMode::Reload);
        }
        events.extend(RepositoryKind::ALL.map(TerminalEvent::RepositoryReloaded));
        debug!(
            "Reload complete: {} Tx, {} Bidir, {} Rx lines",
            self.repositories.tx.line_count(),
            self.repositories.bidir.line_count(),
            self.repositories.rx.line_count()
        );
        events
    }

    /// Processes one raw element and returns the events to notify, which is
    /// always empty when replaying.
    pub fn process(&mut self, raw: &RawElement, mode: ReplayMode) -> Vec<TerminalEvent> {
        trace!("Processing {} {} bytes ({mode:?})", raw.bytes.len(), raw.direction);
        let direction = raw.direction;
        let mut out = ChunkOutput::new(direction);
        self.lines[direction.index()].emitted_in_chunk = 0;

        if let Some(previous) = self.bidir.change_to(direction) {
            if self.settings.direction_line_break {
                self.break_bidir_line(previous, &mut out);
            }
        }
        for byte in &raw.bytes {
            self.process_byte(*byte, direction, &raw.timestamp, &mut out);
        }

        match mode {
            ReplayMode::Live => out.into_events(),
            ReplayMode::Reload => Vec::new(),
        }
    }

    fn process_byte(
        &mut self,
        byte: u8,
        direction: Direction,
        timestamp: &DateTime<Local>,
        out: &mut ChunkOutput,
    ) {
        let index = direction.index();
        if self.lines[index].position == LinePosition::Begin {
            self.lines[index].position = LinePosition::Data;
            if self.settings.show_time_stamp {
                let time_stamp = format_time_stamp(timestamp);
                self.emit(DisplayElement::time_stamp(direction, time_stamp), direction, out);
                self.emit(DisplayElement::left_margin(direction), direction, out);
            }
        }

        let decoded = self
            .framing
            .decode_byte(&mut self.lines[index], byte, direction, &self.settings);
        let separated = self.settings.radix(direction).is_separated();
        for element in decoded {
            if element.kind() == ElementKind::NoData {
                continue;
            }
            if separated && element.is_data() && self.lines[index].accumulated.data_count() > 0 {
                self.emit(DisplayElement::space(direction), direction, out);
            }
            self.emit(element, direction, out);
        }

        let state = &mut self.lines[index];
        state.eol.enqueue(byte);
        state.byte_count += 1;
        if let LineEnd::Complete { trim } = self.framing.frame(state, &self.settings) {
            state.position = LinePosition::End;
            self.finalize_line(direction, trim, out);
        }
    }

    /// Routes an element to the direction's line, its repository and the
    /// merged repository in one step.
    fn emit(&mut self, element: DisplayElement, direction: Direction, out: &mut ChunkOutput) {
        self.repositories
            .get_mut(direction.into())
            .enqueue(element.clone());
        self.repositories.bidir.enqueue(element.clone());
        out.elements.push(element.clone());
        out.bidir_elements.push(element.clone());
        self.lines[direction.index()].push(element);
    }

    fn line_tail(&self, direction: Direction, data_count: usize) -> Vec<DisplayElement> {
        let mut tail = Vec::with_capacity(3);
        if self.settings.show_length {
            tail.push(DisplayElement::right_margin(direction));
            tail.push(DisplayElement::line_length(direction, data_count));
        }
        tail.push(DisplayElement::line_break(direction));
        tail
    }

    fn finalize_line(&mut self, direction: Direction, trim: usize, out: &mut ChunkOutput) {
        let own = RepositoryKind::from(direction);
        let state = &mut self.lines[direction.index()];
        let span = if trim == 0 { 0 } else { state.trailing_span(trim) };
        let in_chunk = state.truncate_tail(span);
        let mut line = std::mem::take(&mut state.accumulated);
        let split = state.split_in_bidir;
        state.reset();

        if span > 0 {
            out.elements.truncate(out.elements.len() - in_chunk);
            out.bidir_elements.truncate(out.bidir_elements.len() - in_chunk);
            for which in [own, RepositoryKind::Bidir] {
                let repository = self.repositories.get_mut(which);
                if repository.retract(direction, span) > in_chunk {
                    out.replaced.push(TerminalEvent::CurrentLineReplaced {
                        repository: which,
                        line: repository.current_line().clone(),
                    });
                }
            }
        }

        let tail = self.line_tail(direction, line.data_count());
        trace!("{direction} line complete with {} data elements", line.data_count());

        for element in &tail {
            self.repositories.get_mut(own).enqueue(element.clone());
            out.elements.push(element.clone());
        }
        line.extend(tail.iter().cloned());
        out.lines.push(line);

        // A line split on a talker change may already be closed in the
        // merged view.
        let bidir = &mut self.repositories.bidir;
        if split && !bidir.current_line().has_direction(direction) {
            return;
        }
        let mut merged = bidir.current_line().clone();
        merged.extend(tail.iter().cloned());
        for element in tail {
            bidir.enqueue(element.clone());
            out.bidir_elements.push(element);
        }
        out.bidir_lines.push(merged);
    }

    /// Closes the merged view's line of the previous talker, leaving the
    /// per-direction line state alone.
    fn break_bidir_line(&mut self, previous: Direction, out: &mut ChunkOutput) {
        let pending = &self.lines[previous.index()].accumulated;
        if pending.is_empty() || !self.repositories.bidir.current_line().has_direction(previous) {
            return;
        }
        let tail = self.line_tail(previous, self.repositories.bidir.current_line().data_count());
        let bidir = &mut self.repositories.bidir;
        let mut line = bidir.current_line().clone();
        line.extend(tail.iter().cloned());
        for element in tail {
            bidir.enqueue(element.clone());
            out.bidir_elements.push(element);
        }
        out.bidir_lines.push(line);
        self.lines[previous.index()].split_in_bidir = true;
        trace!("Direction changed, closed {previous} line in Bidir");
    }
}

/// Thread-safe display processing terminal.
///
/// Every entry point takes the same lock for its whole duration, so raw
/// elements arriving from a sending thread and a receiving thread never
/// interleave, and settings changes and reloads never interleave with
/// either. Observers are notified after the lock is released.
pub struct Terminal {
    core: Mutex<TerminalCore>,
    observers: RwLock<Vec<ObserverEntry>>,
    next_observer_id: AtomicU64,
}

impl Terminal {
    pub fn new(mode: TerminalMode, settings: TerminalSettings) -> Result<Self> {
        Ok(Self {
            core: Mutex::new(TerminalCore::new(mode, settings)?),
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
        })
    }

    pub fn text(settings: TerminalSettings) -> Result<Self> {
        Self::new(TerminalMode::Text, settings)
    }

    pub fn binary(settings: TerminalSettings) -> Result<Self> {
        Self::new(TerminalMode::Binary, settings)
    }

    fn lock(&self) -> MutexGuard<'_, TerminalCore> {
        let core = self.core.lock();
        assert!(!core.shut_down, "terminal used after shutdown");
        core
    }

    /// Releases the terminal. Any later call panics.
    pub fn shutdown(&self) {
        let mut core = self.lock();
        core.shut_down = true;
        debug!("Terminal shut down");
    }

    pub fn add_observer(&self, observer: Arc<dyn TerminalObserver>) -> ObserverId {
        let id = self.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.observers.write().push(ObserverEntry { id, observer });
        id
    }

    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|entry| entry.id != id);
        observers.len() != before
    }

    fn notify(&self, events: &[TerminalEvent]) {
        if events.is_empty() {
            return;
        }
        let observers: Vec<Arc<dyn TerminalObserver>> = self
            .observers
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.observer))
            .collect();
        for event in events {
            for entry in &observers {
                observer::dispatch(entry.as_ref(), event);
            }
        }
    }

    pub fn mode(&self) -> TerminalMode {
        self.lock().mode()
    }

    pub fn settings(&self) -> TerminalSettings {
        self.lock().settings().clone()
    }

    pub fn process_raw_element(&self, raw: &RawElement) {
        let events = self.lock().process(raw, ReplayMode::Live);
        self.notify(&events);
    }

    /// Entry point for transports.
    pub fn deliver(&self, bytes: &[u8], direction: Direction, timestamp: DateTime<Local>) {
        self.process_raw_element(&RawElement::new(bytes, direction, timestamp));
    }

    /// Applies new settings without reloading. When the returned changes
    /// require it, the caller is expected to [`reload`](Self::reload).
    pub fn reconfigure(&self, settings: TerminalSettings) -> Result<Changes> {
        self.lock().reconfigure(settings)
    }

    /// Applies new settings and, if they affect how content is rendered,
    /// reloads from `log` under the same lock.
    pub fn apply_settings(
        &self,
        settings: TerminalSettings,
        log: &dyn RetainedLog,
    ) -> Result<Changes> {
        let (changes, events) = {
            let mut core = self.lock();
            let changes = core.reconfigure(settings)?;
            let events = if changes.requires_reload() {
                core.reload(log)
            } else {
                Vec::new()
            };
            (changes, events)
        };
        self.notify(&events);
        Ok(changes)
    }

    pub fn reload(&self, log: &dyn RetainedLog) {
        let events = self.lock().reload(log);
        self.notify(&events);
    }

    pub fn clear(&self, which: RepositoryKind) {
        let event = self.lock().clear(which);
        self.notify(&[event]);
    }

    pub fn clear_all(&self) {
        let events: Vec<TerminalEvent> = {
            let mut core = self.lock();
            RepositoryKind::ALL.map(|which| core.clear(which)).to_vec()
        };
        self.notify(&events);
    }

    pub fn data_count(&self, which: RepositoryKind) -> usize {
        self.lock().repository(which).data_count()
    }

    pub fn line_count(&self, which: RepositoryKind) -> usize {
        self.lock().repository(which).line_count()
    }

    pub fn display_elements(&self, which: RepositoryKind) -> Vec<DisplayElement> {
        self.lock().repository(which).to_elements()
    }

    pub fn display_lines(&self, which: RepositoryKind) -> Vec<DisplayLine> {
        self.lock().repository(which).to_lines()
    }

    pub fn current_line(&self, which: RepositoryKind) -> DisplayLine {
        self.lock().repository(which).current_line().clone()
    }
}
