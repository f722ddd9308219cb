// Diagnostics for compilation runs.
// Turns `SeaErrorExt` errors into serializable reports that can be printed
// with a source snippet or exported as JSON.

use console::Style;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use crate::error::{ErrorKind, Level, SeaErrorExt};
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
}

impl From<Level> for Severity {
    fn from(level: Level) -> Self {
        match level {
            Level::Critical => Severity::Fatal,
            Level::Error => Severity::Error,
            Level::Warning => Severity::Warning,
            Level::Info => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Fatal => "FATAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

/// Stable error code for programmatic handling.
///
/// # Examples
/// ```
/// use sealang_core::reports::{ErrorCode, E_TYPE_MISMATCH};
/// assert_eq!(E_TYPE_MISMATCH.as_str(), "E_103");
/// assert_eq!(ErrorCode::new(7).to_string(), "E_7");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u32);

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCode {
    pub fn new(code: u32) -> Self {
        ErrorCode(code)
    }

    pub fn as_str(&self) -> String {
        format!("E_{}", self.0)
    }
}

pub const E_UNDEFINED_VARIABLE: ErrorCode = ErrorCode(101);
pub const E_UNKNOWN_TYPE: ErrorCode = ErrorCode(102);
pub const E_TYPE_MISMATCH: ErrorCode = ErrorCode(103);
pub const E_INVALID_LITERAL: ErrorCode = ErrorCode(104);
pub const E_STRUCTURAL: ErrorCode = ErrorCode(105);
pub const E_UNSUPPORTED: ErrorCode = ErrorCode(106);
pub const E_SYNTAX: ErrorCode = ErrorCode(107);
pub const E_IO: ErrorCode = ErrorCode(108);
pub const E_CONFIG: ErrorCode = ErrorCode(109);

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UndefinedVariable => E_UNDEFINED_VARIABLE,
            ErrorKind::UnknownType => E_UNKNOWN_TYPE,
            ErrorKind::TypeMismatch => E_TYPE_MISMATCH,
            ErrorKind::InvalidLiteral => E_INVALID_LITERAL,
            ErrorKind::Structural => E_STRUCTURAL,
            ErrorKind::UnsupportedConstruct => E_UNSUPPORTED,
            ErrorKind::Syntax => E_SYNTAX,
            ErrorKind::Io => E_IO,
            ErrorKind::Config => E_CONFIG,
        }
    }
}

/// A single diagnostic: what went wrong, where, and who noticed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub message: String,
    pub severity: Severity,
    pub kind: String,
    pub issuer: String,
    pub location: Option<Location>,
    /// Width of the offending text on its line, for the caret.
    pub width: usize,
    pub code: Option<ErrorCode>,
    pub suggestion: Option<String>,
}

impl Report {
    pub fn new(message: &str, severity: Severity, location: Option<Location>) -> Self {
        Report {
            message: message.to_string(),
            severity,
            kind: String::new(),
            issuer: String::new(),
            location,
            width: 0,
            code: None,
            suggestion: None,
        }
    }

    pub fn from_error(error: &dyn SeaErrorExt) -> Self {
        let kind = error.kind();
        Report {
            message: error.message(),
            severity: error.level().into(),
            kind: kind.name().to_string(),
            issuer: error.issuer(),
            location: error.location(),
            width: error.span().map(|s| s.width()).unwrap_or(0),
            code: Some(kind.into()),
            suggestion: suggestion_for(kind),
        }
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    // minimal LSP-like diagnostic
    pub fn to_lsp_diagnostic(&self) -> serde_json::Value {
        let range = match &self.location {
            Some(loc) => json!({
                "start": { "line": loc.line.saturating_sub(1), "character": loc.column.saturating_sub(1) },
                "end": { "line": loc.line.saturating_sub(1), "character": loc.column.saturating_sub(1) + self.width }
            }),
            None => json!(null),
        };
        json!({
            "severity": match self.severity {
                Severity::Fatal | Severity::Error => 1,
                Severity::Warning => 2,
                Severity::Info => 3,
            },
            "code": self.code.map(|c| c.as_str()),
            "source": "sealang",
            "message": self.message,
            "range": range,
        })
    }

    /// Styled report with the offending source line and a caret under it.
    /// `source` is the content of the file the location points into.
    pub fn pretty_with_source(&self, source: &str) -> String {
        let header = Style::new().bold().red();
        let sev = match self.severity {
            Severity::Fatal => Style::new().on_red().white().bold(),
            Severity::Error => Style::new().red().bold(),
            Severity::Warning => Style::new().yellow().bold(),
            Severity::Info => Style::new().blue().bold(),
        };

        let mut out = String::new();
        let code = self.code.map(|c| format!(" {}", c)).unwrap_or_default();
        out.push_str(&format!(
            "{} {}\n",
            sev.apply_to(format!("[{}{}]", self.severity, code)),
            header.apply_to(format!("{}: {}", self.kind, self.message))
        ));

        if let Some(loc) = &self.location {
            out.push_str(&format!(" --> {}:{}:{}\n", loc.file, loc.line, loc.column));
            if let Some(line_str) = source.lines().nth(loc.line.saturating_sub(1)) {
                out.push_str(&format!(" {:4} | {}\n", loc.line, line_str));
                let caret = format!(
                    "      | {}{}",
                    " ".repeat(loc.column.saturating_sub(1)),
                    "^".repeat(self.width.max(1))
                );
                out.push_str(&format!("{}\n", Style::new().green().apply_to(caret)));
            }
        }

        if let Some(s) = &self.suggestion {
            out.push_str(&format!(
                "{}\n",
                Style::new().cyan().apply_to(format!("Suggestion: {}", s))
            ));
        }
        out
    }
}

fn suggestion_for(kind: ErrorKind) -> Option<String> {
    let hint = match kind {
        ErrorKind::UndefinedVariable => "declare the variable before using it, e.g. `Int x = 0`",
        ErrorKind::UnknownType => {
            "known types are String, Int, Boolean, Array<T>, Map<T>, Hash and Scalar"
        }
        ErrorKind::Structural => "check that every `{` has a matching `}`",
        _ => return None,
    };
    Some(hint.to_string())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc = match &self.location {
            Some(l) => format!(" at {}:{}:{}", l.file, l.line, l.column),
            None => String::new(),
        };
        match &self.code {
            Some(code) => write!(f, "[{}]{} ({}): {}", self.severity, loc, code, self.message),
            None => write!(f, "[{}]{}: {}", self.severity, loc, self.message),
        }
    }
}

impl Error for Report {}

/// Aggregates reports across files, dropping exact duplicates.
#[derive(Debug, Clone, Default)]
pub struct ReportCollector {
    pub reports: Vec<Report>,
    seen: HashSet<(String, Option<String>, Option<usize>)>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, r: Report) {
        let key = (
            r.message.clone(),
            r.location.as_ref().map(|l| l.file.clone()),
            r.location.as_ref().map(|l| l.line),
        );
        if self.seen.insert(key) {
            self.reports.push(r);
        }
    }

    pub fn push_error(&mut self, error: &dyn SeaErrorExt) {
        self.push(Report::from_error(error));
    }

    pub fn extend(&mut self, others: impl IntoIterator<Item = Report>) {
        for r in others {
            self.push(r);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn has_errors(&self) -> bool {
        self.reports
            .iter()
            .any(|r| matches!(r.severity, Severity::Error | Severity::Fatal))
    }

    /// (fatal, error, warning, info)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let (mut f, mut e, mut w, mut i) = (0, 0, 0, 0);
        for r in &self.reports {
            match r.severity {
                Severity::Fatal => f += 1,
                Severity::Error => e += 1,
                Severity::Warning => w += 1,
                Severity::Info => i += 1,
            }
        }
        (f, e, w, i)
    }

    /// 1 when anything failed, 0 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() { 1 } else { 0 }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.reports)
    }

    pub fn to_lsp_array(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for r in &self.reports {
            let file = r
                .location
                .as_ref()
                .map(|l| l.file.clone())
                .unwrap_or_else(|| "<unknown>".to_string());
            let entry = map.entry(file).or_insert_with(|| json!([]));
            if let serde_json::Value::Array(arr) = entry {
                arr.push(r.to_lsp_diagnostic());
            }
        }
        serde_json::Value::Object(map)
    }
}
