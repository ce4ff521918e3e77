//! Commit confirmation prompt.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};

const PROMPT: &str = "✨ Would you like to proceed with this commit message? [y/N] ";

/// Guard that disables raw mode on drop.
struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Asks whether to commit. Anything but an explicit yes declines.
///
/// On a terminal a single key press answers; otherwise one line is read
/// from `reader`. `is_terminal` and `reader` are injected so tests can
/// drive the prompt without blocking on real stdin.
pub fn confirm_commit(is_terminal: bool, reader: &mut dyn BufRead) -> Result<bool> {
    if is_terminal {
        read_key_answer()
    } else {
        read_line_answer(reader)
    }
}

fn read_key_answer() -> Result<bool> {
    eprint!("{PROMPT}");
    io::stderr().flush()?;

    enable_raw_mode()?;
    let _guard = RawModeGuard;

    loop {
        let Event::Key(key_event) = event::read()? else {
            continue;
        };
        if key_event.kind != KeyEventKind::Press {
            continue;
        }

        let answer = match key_event.code {
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => false,
            KeyCode::Char(c) => is_yes(&c.to_string()),
            KeyCode::Enter | KeyCode::Esc => false,
            _ => continue,
        };

        eprint!("{}\r\n", if answer { "y" } else { "n" });
        io::stderr().flush()?;
        return Ok(answer);
    }
}

fn read_line_answer(reader: &mut dyn BufRead) -> Result<bool> {
    eprint!("{PROMPT}");
    io::stderr().flush()?;

    let mut input = String::new();
    let bytes = reader.read_line(&mut input)?;
    if bytes == 0 {
        eprintln!();
        return Ok(false);
    }
    Ok(is_yes(&input))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
