//! Colored terminal output.

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Semantic color of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Failures.
    Error,
    /// Overrides and other notices.
    Warning,
    /// Headings around the preview.
    Info,
    /// Hints and secondary text.
    Detail,
    /// Completed actions.
    Success,
    /// Uncolored text.
    Plain,
}

impl Tone {
    fn color_spec(self) -> ColorSpec {
        let mut color = ColorSpec::new();
        match self {
            Self::Error => {
                color.set_fg(Some(Color::Red));
            }
            Self::Warning => {
                color.set_fg(Some(Color::Yellow));
            }
            Self::Info => {
                color.set_fg(Some(Color::Cyan));
            }
            Self::Detail => {
                color.set_fg(Some(Color::Cyan)).set_intense(true);
            }
            Self::Success => {
                color.set_fg(Some(Color::Green));
            }
            Self::Plain => {}
        }
        color
    }
}

/// Writes `text` in the color of `tone`, then resets.
pub fn write_toned<W: WriteColor + ?Sized>(out: &mut W, tone: Tone, text: &str) -> io::Result<()> {
    out.set_color(&tone.color_spec())?;
    write!(out, "{text}")?;
    out.reset()
}

/// Stdout stream, colored only when attached to a terminal.
pub fn stdout() -> StandardStream {
    StandardStream::stdout(color_choice(io::stdout().is_terminal()))
}

/// Stderr stream, colored only when attached to a terminal.
pub fn stderr() -> StandardStream {
    StandardStream::stderr(color_choice(io::stderr().is_terminal()))
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
