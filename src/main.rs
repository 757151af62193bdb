/*
monitor <command> [args...]

Runs the command on a PTY and shows the conversation as completed lines
    Output of the command is Rx, lines typed on stdin are Tx
    Lines starting with ':' are commands instead
        :radix <bin|oct|dec|hex|char|string>
        :timestamps on|off
        :length on|off
        :clear
Logs go to monitor.log since stdout is the display
*/
use anyhow::{bail, Result};
use crossterm::style::Stylize;
use log::{info, LevelFilter};
use parking_lot::Mutex;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use simplelog::{Config, WriteLogger};
use std::fs::File;
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use terminal_display::{
    parse_sequence, Direction, DisplayLine, RawElement, RawRepository, RepositoryKind, Terminal,
    TerminalEvent, TerminalObserver, TerminalSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const RETAINED_ELEMENTS: usize = 10_000;

fn print_line(line: &DisplayLine) {
    let text = line.text();
    let direction = line.iter().find_map(|element| element.direction());
    match direction {
        Some(Direction::Tx) => println!("{}", text.as_str().blue()),
        Some(Direction::Rx) => println!("{}", text.as_str().green()),
        None => println!("{text}"),
    }
}

/// Prints every line the merged view completes.
struct Printer;

impl TerminalObserver for Printer {
    fn on_lines(&self, repository: RepositoryKind, lines: &[DisplayLine]) {
        if repository == RepositoryKind::Bidir {
            lines.iter().for_each(print_line);
        }
    }

    fn on_repository_reset(&self, event: &TerminalEvent) {
        if event.repository() != RepositoryKind::Bidir {
            return;
        }
        if let TerminalEvent::RepositoryCleared(_) = event {
            println!("{}", "-- cleared --".dark_grey());
        }
    }
}

fn deliver(terminal: &Terminal, log: &Mutex<RawRepository>, raw: RawElement) {
    log.lock().push(raw.clone());
    terminal.process_raw_element(&raw);
}

fn parse_flag(flag: &str) -> Result<bool> {
    match flag {
        "on" => Ok(true),
        "off" => Ok(false),
        other => bail!("expected on or off, got {other:?}"),
    }
}

fn handle_command(terminal: &Terminal, log: &Mutex<RawRepository>, command: &str) -> Result<()> {
    let mut settings = terminal.settings();
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("radix"), Some(radix)) => settings.set_radix(radix.parse()?),
        (Some("timestamps"), Some(flag)) => settings.show_time_stamp = parse_flag(flag)?,
        (Some("length"), Some(flag)) => settings.show_length = parse_flag(flag)?,
        (Some("clear"), None) => {
            let mut log = log.lock();
            for which in RepositoryKind::ALL {
                log.clear(which);
            }
            terminal.clear_all();
            return Ok(());
        }
        _ => bail!("unknown command :{command}"),
    }

    let changes = terminal.apply_settings(settings, &*log.lock())?;
    info!("Applied {changes:?}");
    if changes.requires_reload() {
        println!("{}", "-- reloaded --".dark_grey());
        terminal
            .display_lines(RepositoryKind::Bidir)
            .iter()
            .for_each(print_line);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(program) = args.next() else {
        bail!("usage: monitor <command> [args...]");
    };
    WriteLogger::init(LevelFilter::Debug, Config::default(), File::create("monitor.log")?)?;

    let pair = native_pty_system().openpty(PtySize {
        rows: 24,
        cols: 80,
        pixel_width: 0,
        pixel_height: 0,
    })?;
    let mut command = CommandBuilder::new(&program);
    command.args(args);
    let mut child = pair.slave.spawn_command(command)?;
    drop(pair.slave);
    let mut reader = pair.master.try_clone_reader()?;
    let mut writer = pair.master.take_writer()?;
    info!("Spawned {program}");

    // A PTY ends lines with CRLF on output but expects a bare CR on input.
    let mut settings = TerminalSettings::default();
    let tx = settings.direction_mut(Direction::Tx);
    tx.eol = "<CR>".into();
    let tx_eol = parse_sequence(&tx.eol)?;
    let terminal = Terminal::text(settings)?;
    terminal.add_observer(Arc::new(Printer));
    let log = Mutex::new(RawRepository::new(RETAINED_ELEMENTS));

    // Plain thread so a blocked read never holds up runtime shutdown.
    let (sender, mut received) = mpsc::unbounded_channel::<Vec<u8>>();
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if sender.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            chunk = received.recv() => match chunk {
                Some(bytes) => deliver(&terminal, &log, RawElement::now(bytes, Direction::Rx)),
                None => break,
            },
            line = stdin.next_line() => match line? {
                Some(line) => match line.strip_prefix(':') {
                    Some(command) => {
                        if let Err(e) = handle_command(&terminal, &log, command) {
                            eprintln!("{e:#}");
                        }
                    }
                    None => {
                        let mut bytes = line.into_bytes();
                        bytes.extend_from_slice(&tx_eol);
                        writer.write_all(&bytes)?;
                        deliver(&terminal, &log, RawElement::now(bytes, Direction::Tx));
                    }
                },
                None => break,
            },
        }
    }

    match child.try_wait()? {
        Some(status) => info!("{program} exited: {status:?}"),
        None => info!("stdin closed while {program} is still running"),
    }
    terminal.shutdown();
    Ok(())
}
