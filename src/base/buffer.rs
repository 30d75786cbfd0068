//! Read access to the host editor's buffer text.
//!
//! The engine never owns the document; the host supplies text through this
//! trait when validating restored blocks. [`TextBuffer`] is a plain
//! line-vector implementation used by tests and by hosts that hand over a
//! full snapshot of the document.

use super::position::{Position, Span};

/// Read-only view of the buffer, 1-based coordinates, character columns.
pub trait BufferView {
    fn line_count(&self) -> u32;

    /// Text of the given 1-based line, without the trailing newline.
    fn line(&self, line: u32) -> Option<&str>;

    /// The buffer substring at `span`, or `None` if the span is out of
    /// bounds. Lines are joined with `\n`.
    fn slice(&self, span: Span) -> Option<String> {
        if span.end < span.start {
            return None;
        }
        if span.start.line == span.end.line {
            let line = self.line(span.start.line)?;
            return slice_columns(line, span.start.column, span.end.column);
        }
        let mut out = String::new();
        let first = self.line(span.start.line)?;
        out.push_str(&slice_columns(first, span.start.column, first.chars().count() as u32 + 1)?);
        for ln in span.start.line + 1..span.end.line {
            out.push('\n');
            out.push_str(self.line(ln)?);
        }
        let last = self.line(span.end.line)?;
        out.push('\n');
        out.push_str(&slice_columns(last, 1, span.end.column)?);
        Some(out)
    }
}

fn slice_columns(line: &str, start_col: u32, end_col: u32) -> Option<String> {
    if start_col < 1 || end_col < start_col {
        return None;
    }
    let len = line.chars().count() as u32;
    if end_col > len + 1 {
        return None;
    }
    Some(
        line.chars()
            .skip(start_col as usize - 1)
            .take((end_col - start_col) as usize)
            .collect(),
    )
}

/// An owned text buffer, used in tests and by snapshot-based hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Apply a replace-edit, splicing `inserted` over `span`.
    ///
    /// Mirrors what the host editor does to its own model; tests drive the
    /// engine and this buffer with the same edits to keep them in step.
    pub fn apply(&mut self, span: Span, inserted: &str) {
        let start_idx = (span.start.line - 1) as usize;
        let end_idx = (span.end.line - 1) as usize;
        let prefix: String = self.lines[start_idx]
            .chars()
            .take(span.start.column as usize - 1)
            .collect();
        let suffix: String = self.lines[end_idx]
            .chars()
            .skip(span.end.column as usize - 1)
            .collect();

        let mut new_lines: Vec<String> = inserted.split('\n').map(str::to_owned).collect();
        new_lines[0] = format!("{prefix}{}", new_lines[0]);
        let last = new_lines.len() - 1;
        new_lines[last] = format!("{}{suffix}", new_lines[last]);

        self.lines.splice(start_idx..=end_idx, new_lines);
    }
}

impl BufferView for TextBuffer {
    fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    fn line(&self, line: u32) -> Option<&str> {
        self.lines.get(line as usize - 1).map(String::as_str)
    }
}
