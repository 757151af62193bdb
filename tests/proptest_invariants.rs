//! Invariants that must hold for any input:
//!
//! 1. The EOL window reflects exactly the last N bytes.
//! 2. Repository data counts match a full traversal.
//! 3. Shrinking capacity keeps the newest lines.
//! 4. Reload reproduces what live processing displayed.
//! 5. A trimmed EOL leaves no separator behind in any radix.

use chrono::Local;
use proptest::prelude::*;
use terminal_display::{
    Direction, DisplayElement, DisplayLine, DisplayRepository, ElementKind, EolQueue, Origin, Radix,
    RawElement, RepositoryKind, Terminal, TerminalSettings,
};

fn data(direction: Direction, byte: u8) -> DisplayElement {
    DisplayElement::data(
        Origin {
            bytes: vec![byte],
            direction,
        },
        char::from(byte).to_string(),
    )
}

fn direction(tx: bool) -> Direction {
    if tx {
        Direction::Tx
    } else {
        Direction::Rx
    }
}

#[derive(Debug, Clone)]
enum RepositoryOp {
    Data(bool),
    Space(bool),
    LineBreak,
    Capacity(usize),
    Retract(bool, usize),
}

fn repository_op() -> impl Strategy<Value = RepositoryOp> {
    prop_oneof![
        4 => any::<bool>().prop_map(RepositoryOp::Data),
        1 => any::<bool>().prop_map(RepositoryOp::Space),
        2 => Just(RepositoryOp::LineBreak),
        1 => (0usize..6).prop_map(RepositoryOp::Capacity),
        1 => (any::<bool>(), 0usize..4).prop_map(|(tx, n)| RepositoryOp::Retract(tx, n)),
    ]
}

/// Small alphabet so EOL sequences and multi-byte characters show up often.
fn chunk() -> impl Strategy<Value = (bool, Vec<u8>)> {
    let byte = prop::sample::select(vec![b'a', b'b', b' ', b'\r', b'\n', 0x1B, 0xC3, 0xA9]);
    (any::<bool>(), prop::collection::vec(byte, 0..10))
}

proptest! {
    #[test]
    fn eol_window_reflects_last_bytes(
        target in prop::collection::vec(any::<u8>(), 1..4),
        input in prop::collection::vec(prop::sample::select(vec![0u8, 1, 2]), 0..32),
    ) {
        let mut queue = EolQueue::new(target.clone());
        for byte in &input {
            queue.enqueue(*byte);
        }
        let n = target.len();
        let expected = input.len() >= n && input[input.len() - n..] == target[..];
        prop_assert_eq!(queue.matches(), expected);
    }

    #[test]
    fn data_count_matches_traversal(ops in prop::collection::vec(repository_op(), 0..80)) {
        let mut repository = DisplayRepository::new(3);
        for op in ops {
            match op {
                RepositoryOp::Data(tx) => repository.enqueue(data(direction(tx), b'x')),
                RepositoryOp::Space(tx) => repository.enqueue(DisplayElement::space(direction(tx))),
                RepositoryOp::LineBreak => {
                    repository.enqueue(DisplayElement::line_break(Direction::Rx))
                }
                RepositoryOp::Capacity(n) => repository.set_line_capacity(n),
                RepositoryOp::Retract(tx, n) => {
                    repository.retract(direction(tx), n);
                }
            }
            let traversed = repository.to_elements().iter().filter(|e| e.is_data()).count();
            prop_assert_eq!(repository.data_count(), traversed);
            prop_assert!(repository.line_count() <= repository.capacity());
        }
    }

    #[test]
    fn shrinking_keeps_newest_lines(k in 1usize..12, j_seed in any::<usize>()) {
        let j = j_seed % k;
        let mut repository = DisplayRepository::new(k);
        for i in 0..k {
            repository.enqueue(data(Direction::Rx, b'0' + (i % 10) as u8));
            repository.enqueue(DisplayElement::line_break(Direction::Rx));
        }
        let before = repository.to_lines();
        repository.set_line_capacity(j);
        prop_assert_eq!(repository.line_count(), j);
        prop_assert_eq!(repository.to_lines(), before[k - j..].to_vec());
        prop_assert_eq!(repository.data_count(), j);
    }

    #[test]
    fn reload_reproduces_live_output(
        chunks in prop::collection::vec(chunk(), 0..24),
        show_eol in any::<bool>(),
        direction_line_break in any::<bool>(),
        radix in prop::sample::select(vec![Radix::String, Radix::Char, Radix::Hex]),
    ) {
        let mut settings = TerminalSettings {
            show_eol,
            direction_line_break,
            ..TerminalSettings::default()
        };
        settings.set_radix(radix);
        let terminal = Terminal::text(settings).unwrap();
        let mut log = Vec::new();
        for (tx, bytes) in chunks {
            let raw = RawElement::new(bytes, direction(tx), Local::now());
            terminal.process_raw_element(&raw);
            log.push(raw);
        }
        for which in RepositoryKind::ALL {
            let traversed = terminal.display_elements(which).iter().filter(|e| e.is_data()).count();
            prop_assert_eq!(terminal.data_count(which), traversed);
        }

        let live: Vec<Vec<DisplayLine>> =
            RepositoryKind::ALL.map(|w| terminal.display_lines(w)).to_vec();
        for line in live.iter().flatten() {
            let kinds: Vec<ElementKind> = line.iter().map(|e| e.kind()).collect();
            if let [.., before, ElementKind::LineBreak] = kinds[..] {
                prop_assert_ne!(before, ElementKind::Space, "{:?}", line.text());
            }
        }

        terminal.reload(&log);
        let reloaded: Vec<Vec<DisplayLine>> =
            RepositoryKind::ALL.map(|w| terminal.display_lines(w)).to_vec();
        prop_assert_eq!(live, reloaded);
    }
}
