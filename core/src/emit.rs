//! file: core/src/emit.rs
//! description: render, re-indent and write a compiled file.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::ir::{BlockId, BlockKind, IrArena, Renderer};

/// Last line of every module file.
pub const MODULE_TERMINATOR: &str = "1;";

pub struct Emitter<'a> {
    arena: &'a IrArena,
    tab_size: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(arena: &'a IrArena, tab_size: usize) -> Self {
        Emitter { arena, tab_size }
    }

    pub fn render(&self, root: BlockId) -> CompileResult<String> {
        Renderer::new(self.arena).render(root)
    }

    pub fn format(&self, text: &str) -> String {
        format_code(text, self.tab_size)
    }

    /// Rendered and formatted text of a File block, with the module
    /// terminator when the file is a module.
    pub fn text(&self, file: BlockId) -> CompileResult<String> {
        let BlockKind::File(info) = self.arena.block(file)?.kind() else {
            return Err(CompileError::structural(
                format!("Block {} is not a file", file),
                "sealang.emit.text",
            ));
        };
        let mut text = self.render(file)?;
        if info.is_module {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(MODULE_TERMINATOR);
            text.push('\n');
        }
        Ok(self.format(&text))
    }

    /// Write `<dir>/<file name>.<extension>`. The text is rendered in full
    /// before anything touches the disk, and lands through a temp file.
    pub fn write(&self, file: BlockId, dir: &Path, extension: &str) -> CompileResult<PathBuf> {
        let name = match self.arena.block(file)?.kind() {
            BlockKind::File(info) => info.name.clone(),
            other => {
                return Err(CompileError::structural(
                    format!("Cannot write a {} block as a file", other.label()),
                    "sealang.emit.write",
                ));
            }
        };
        let text = self.text(file)?;
        let target = dir.join(format!("{}.{}", name, extension));
        write_atomic(&target, &text)?;
        info!("wrote {} ({} bytes)", target.display(), text.len());
        Ok(target)
    }
}

fn io_error(target: &Path, err: impl std::fmt::Display) -> CompileError {
    CompileError::new(
        ErrorKind::Io,
        format!("Failed to write {}: {}", target.display(), err),
        "sealang.emit.write",
    )
}

pub fn write_atomic(target: &Path, text: &str) -> CompileResult<()> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| io_error(target, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| io_error(target, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| io_error(target, e))?;
    tmp.flush().map_err(|e| io_error(target, e))?;
    tmp.persist(target).map_err(|e| io_error(target, e.error))?;
    Ok(())
}

/// Re-indent `text` by brace depth. Leading whitespace is discarded first,
/// so formatting formatted text changes nothing.
pub fn format_code(text: &str, tab_size: usize) -> String {
    let tab = " ".repeat(tab_size);
    let mut depth: usize = 0;
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.push(String::new());
            continue;
        }
        let braces = scan_braces(trimmed);
        let level = depth.saturating_sub(braces.leading_closes);
        depth = (depth + braces.opens).saturating_sub(braces.closes);
        lines.push(format!("{}{}", tab.repeat(level), trimmed));
    }
    lines.join("\n")
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Braces {
    opens: usize,
    closes: usize,
    /// `}` seen before the first `{` of the line.
    leading_closes: usize,
}

fn scan_braces(line: &str) -> Braces {
    let mut braces = Braces::default();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in line.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => braces.opens += 1,
            '}' => {
                braces.closes += 1;
                if braces.opens == 0 {
                    braces.leading_closes += 1;
                }
            }
            _ => {}
        }
    }
    braces
}
