//! Diff shaping: bounds each file's diff in line count and line width
//! before it is embedded in a prompt.

use tracing::{debug, warn};

/// Line inserted between the head and tail of a truncated diff.
pub const TRUNCATION_MARKER: &str = "...[truncated]...";

/// Suffix appended to every line shortened by the width cap.
pub const ELLIPSIS: &str = "...";

/// Smallest non-zero number of lines kept at each end of a diff.
pub const MIN_LINES_EACH_END: usize = 3;

/// Bounds a diff to a number of lines at each end and a maximum line width.
///
/// A `max_lines_each_end` of 0 keeps every line; a `max_line_width` of 0
/// keeps every column. Values of 1 to 3 for `max_lines_each_end` are
/// clamped to [`MIN_LINES_EACH_END`] and the clamp is reported through
/// [`DiffShaper::warning`].
#[derive(Debug, Clone)]
pub struct DiffShaper {
    max_lines_each_end: usize,
    max_line_width: usize,
    warning: Option<String>,
}

impl DiffShaper {
    /// Creates a shaper, clamping `max_lines_each_end` when it is too small
    /// to keep a diff readable.
    pub fn new(max_lines_each_end: usize, max_line_width: usize) -> Self {
        let (effective, warning) = if (1..MIN_LINES_EACH_END).contains(&max_lines_each_end) {
            let message = format!(
                "truncate_lines={max_lines_each_end} is too small, using {MIN_LINES_EACH_END} lines of context at each end"
            );
            warn!("{message}");
            (MIN_LINES_EACH_END, Some(message))
        } else {
            (max_lines_each_end, None)
        };

        Self {
            max_lines_each_end: effective,
            max_line_width,
            warning,
        }
    }

    /// Number of lines kept at each end after clamping.
    pub fn max_lines_each_end(&self) -> usize {
        self.max_lines_each_end
    }

    /// Maximum characters per line (0 = unlimited).
    pub fn max_line_width(&self) -> usize {
        self.max_line_width
    }

    /// Warning produced while clamping the configuration, if any.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Shapes one diff.
    ///
    /// A single trailing newline is preserved and does not count as a line.
    pub fn shape(&self, diff: &str) -> String {
        let (body, trailing_newline) = match diff.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (diff, false),
        };

        let lines: Vec<String> = body.split('\n').map(|line| self.cap_width(line)).collect();
        let n = self.max_lines_each_end;

        let mut shaped = if n == 0 || lines.len() <= 2 * n + 1 {
            lines.join("\n")
        } else {
            debug!(
                total_lines = lines.len(),
                kept_each_end = n,
                "Truncating diff"
            );
            let mut kept: Vec<&str> = Vec::with_capacity(2 * n + 1);
            kept.extend(lines[..n].iter().map(String::as_str));
            kept.push(TRUNCATION_MARKER);
            kept.extend(lines[lines.len() - n..].iter().map(String::as_str));
            kept.join("\n")
        };

        if trailing_newline {
            shaped.push('\n');
        }
        shaped
    }

    /// Cuts a line to the width cap, appending [`ELLIPSIS`] when shortened.
    fn cap_width(&self, line: &str) -> String {
        if self.max_line_width == 0 {
            return line.to_string();
        }

        match line.char_indices().nth(self.max_line_width) {
            Some((cut, _)) => format!("{}{ELLIPSIS}", &line[..cut]),
            None => line.to_string(),
        }
    }
}

/// One-shot form of [`DiffShaper::shape`].
pub fn shape_diff(diff: &str, max_lines_each_end: usize, max_line_width: usize) -> String {
    DiffShaper::new(max_lines_each_end, max_line_width).shape(diff)
}
