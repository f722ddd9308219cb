use std::path::PathBuf;

use crate::error::{ErrorKind, Level, SeaErrorExt};

/// A source file handed to the compiler.
#[derive(Debug, Clone)]
pub struct Script {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

impl Script {
    pub fn new(path: PathBuf) -> Result<Self, Box<dyn SeaErrorExt>> {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Box::new(MissingScriptError {
                path: path.clone(),
                reason: e.to_string(),
            }) as Box<dyn SeaErrorExt>
        })?;
        Ok(Script {
            name,
            path,
            content,
        })
    }

    /// In-memory script, mostly useful for tests and tooling.
    pub fn from_source(name: &str, content: &str) -> Self {
        Script {
            name: name.to_string(),
            path: PathBuf::from(name),
            content: content.to_string(),
        }
    }

    /// File name without its extension; used to name the generated output.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.content
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .enumerate()
            .map(|(i, l)| (i + 1, l))
    }
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Script: {} at {:?}", self.name, self.path)
    }
}

#[derive(Debug, Clone)]
pub struct MissingScriptError {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for MissingScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Missing script at {:?}: {}", self.path, self.reason)
    }
}

impl std::error::Error for MissingScriptError {}

impl SeaErrorExt for MissingScriptError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Io
    }

    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        format!("Missing script at {:?}: {}", self.path, self.reason)
    }

    fn issuer(&self) -> String {
        "sealang.script".to_string()
    }

    fn span(&self) -> Option<crate::location::Span> {
        None
    }

    fn location(&self) -> Option<crate::location::Location> {
        None
    }
}
