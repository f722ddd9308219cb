use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The script the location points into.
    pub file: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Location {
    pub fn new(file: String, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    /// Location of the first non-blank character of `text`, which is line
    /// `line` of `file`.
    pub fn of_line(file: &str, line: usize, text: &str) -> Self {
        let indent = text.len() - text.trim_start().len();
        Self {
            file: file.to_string(),
            line,
            column: indent + 1,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    /// Span covering the trimmed content of a single source line.
    pub fn of_line(file: &str, line: usize, text: &str) -> Self {
        let start = Location::of_line(file, line, text);
        let end = Location {
            file: file.to_string(),
            line,
            column: text.trim_end().len() + 1,
        };
        Self { start, end }
    }

    /// Width in columns when the span stays on one line.
    pub fn width(&self) -> usize {
        if self.start.line == self.end.line {
            self.end.column.saturating_sub(self.start.column)
        } else {
            0
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
