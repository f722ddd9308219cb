//! file: core/src/config.rs
//! description: compiler configuration and `sealang.json` discovery.
//!
//! Every field has a default, so an empty JSON object is a valid
//! configuration. `load_from_file` parses, `validate` runs the basic sanity
//! checks, `discover` looks for `sealang.json` next to a script.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::ir::stmt::module_path;

pub const CONFIG_FILE_NAME: &str = "sealang.json";

fn default_tab_size() -> usize {
    2
}

fn default_extension() -> String {
    "pl".to_string()
}

pub fn default_dependencies() -> Vec<String> {
    [
        "strict",
        "warnings",
        "stdlib.util",
        "stdlib.array",
        "stdlib.hashmap",
        "stdlib.integer",
        "stdlib.string",
        "stdlib.boolean",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "default_tab_size")]
    pub tab_size: usize,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Compile as a module: allows `package` and ends the file with `1;`.
    #[serde(default)]
    pub module: bool,
    #[serde(default = "default_dependencies")]
    pub default_dependencies: Vec<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            tab_size: default_tab_size(),
            extension: default_extension(),
            module: false,
            default_dependencies: default_dependencies(),
            output_dir: None,
        }
    }
}

fn config_error(message: String) -> CompileError {
    CompileError::new(ErrorKind::Config, message, "sealang.config")
}

impl CompilerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CompileResult<CompilerConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("read {}: {}", path.display(), e)))?;
        let config: CompilerConfig = serde_json::from_str(&raw)
            .map_err(|e| config_error(format!("parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// `sealang.json` in `dir`, if there is one.
    pub fn discover<P: AsRef<Path>>(dir: P) -> CompileResult<Option<CompilerConfig>> {
        let candidate = dir.as_ref().join(CONFIG_FILE_NAME);
        if !candidate.is_file() {
            return Ok(None);
        }
        CompilerConfig::load_from_file(&candidate).map(Some)
    }

    pub fn validate(&self) -> CompileResult<()> {
        if self.tab_size == 0 || self.tab_size > 8 {
            return Err(config_error(format!(
                "tab_size must be between 1 and 8, got {}",
                self.tab_size
            )));
        }
        let ext = self.extension.trim();
        if ext.is_empty() || ext.contains('.') || ext.contains('/') {
            return Err(config_error(format!(
                "extension '{}' must be a bare file extension",
                self.extension
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for dep in &self.default_dependencies {
            module_path(dep).map_err(|e| config_error(format!("default_dependencies: {}", e)))?;
            if !seen.insert(dep.as_str()) {
                return Err(config_error(format!("duplicate default dependency '{}'", dep)));
            }
        }
        Ok(())
    }
}
