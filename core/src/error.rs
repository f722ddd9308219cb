use std::fmt;

use crate::location::{Location, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

/// The failure taxonomy of a compilation run.
///
/// Every variant is fatal for the run that produced it: the driver stops at
/// the first error and nothing is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A name was referenced that no live scope binds.
    UndefinedVariable,
    /// A primitive kind that the type registry does not know.
    UnknownType,
    /// A routine result or reference is not assignable to the declared kind.
    TypeMismatch,
    /// A literal whose shape the target kind cannot hold.
    InvalidLiteral,
    /// Appending to a closed block, popping the root scope, cyclic insertion.
    Structural,
    /// No construct matches a line, or a staged construct was rendered.
    UnsupportedConstruct,
    /// A recognized line whose inner shape the grammar rejected.
    Syntax,
    Io,
    Config,
}

impl ErrorKind {
    /// Name used in diagnostics, matching the documented error taxonomy.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UndefinedVariable => "UndefinedVariableError",
            ErrorKind::UnknownType => "UnknownTypeError",
            ErrorKind::TypeMismatch => "TypeMismatchError",
            ErrorKind::InvalidLiteral => "InvalidLiteralError",
            ErrorKind::Structural => "StructuralError",
            ErrorKind::UnsupportedConstruct => "UnsupportedConstructError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Io => "IoError",
            ErrorKind::Config => "ConfigError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub trait SeaErrorExt {
    fn kind(&self) -> ErrorKind;
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
    fn span(&self) -> Option<Span>;
    fn location(&self) -> Option<Location>;
}

impl fmt::Debug for dyn SeaErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc_str = match self.location() {
            Some(loc) => format!("{}:{}:{}", loc.file, loc.line, loc.column),
            None => "unknown".to_string(),
        };
        let span_str = match self.span() {
            Some(span) => span.to_string(),
            None => "span:none".to_string(),
        };

        write!(
            f,
            "SEALANG | {} | {} | {} | {} | {} | {}",
            self.level(),
            self.kind(),
            loc_str,
            self.issuer(),
            span_str,
            self.message()
        )
    }
}

impl fmt::Display for dyn SeaErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(loc) => write!(f, "{}: {} (at {})", self.kind(), self.message(), loc),
            None => write!(f, "{}: {}", self.kind(), self.message()),
        }
    }
}

/// Error raised by the IR, scope, type and emitter layers.
#[derive(Debug, Clone)]
pub struct CompileError {
    kind: ErrorKind,
    level: Level,
    message: String,
    issuer: String,
    location: Option<Location>,
    span: Option<Span>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, issuer: impl Into<String>) -> Self {
        CompileError {
            kind,
            level: Level::Error,
            message: message.into(),
            issuer: issuer.into(),
            location: None,
            span: None,
        }
    }

    pub fn with(
        kind: ErrorKind,
        level: Level,
        message: String,
        issuer: String,
        location: Option<Location>,
        span: Option<Span>,
    ) -> Self {
        CompileError {
            kind,
            level,
            message,
            issuer,
            location,
            span,
        }
    }

    pub fn undefined_variable(name: &str, issuer: &str) -> Self {
        CompileError::new(
            ErrorKind::UndefinedVariable,
            format!("Undefined variable {}", name),
            issuer,
        )
    }

    pub fn unknown_type(name: &str, issuer: &str) -> Self {
        CompileError::new(
            ErrorKind::UnknownType,
            format!("Primitive type {} doesn't exist!", name),
            issuer,
        )
    }

    pub fn type_mismatch(message: impl Into<String>, issuer: &str) -> Self {
        CompileError::new(ErrorKind::TypeMismatch, message, issuer)
    }

    pub fn invalid_literal(message: impl Into<String>, issuer: &str) -> Self {
        CompileError::new(ErrorKind::InvalidLiteral, message, issuer)
    }

    pub fn structural(message: impl Into<String>, issuer: &str) -> Self {
        CompileError::new(ErrorKind::Structural, message, issuer)
    }

    pub fn unsupported(message: impl Into<String>, issuer: &str) -> Self {
        CompileError::new(ErrorKind::UnsupportedConstruct, message, issuer)
    }

    /// Attach a source location unless one is already recorded.
    pub fn at(mut self, location: Location, span: Option<Span>) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
            self.span = span;
        }
        self
    }

    pub fn get_kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: {} (at {}:{}:{})", self.kind, self.message, loc.file, loc.line, loc.column)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for CompileError {}

impl SeaErrorExt for CompileError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn level(&self) -> Level {
        self.level
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        self.issuer.clone()
    }

    fn span(&self) -> Option<Span> {
        self.span.clone()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

impl From<CompileError> for Box<dyn SeaErrorExt> {
    fn from(error: CompileError) -> Self {
        Box::new(error)
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
