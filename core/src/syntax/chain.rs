//! file: core/src/syntax/chain.rs
//! description: method-chain tokenizer.
//!
//! Splits `.add(1).push("a, b").size()` into `(method, raw args)` pairs.
//! The tokenizer is a plain iterator over a borrowed string: cloning it or
//! calling `restart` scans the same chain again from the beginning.

use crate::error::{CompileError, CompileResult, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodInvocation<'a> {
    pub method: &'a str,
    /// Text between the parentheses, `None` when they were omitted.
    pub args: Option<&'a str>,
}

impl<'a> MethodInvocation<'a> {
    pub fn arguments(&self) -> CompileResult<Vec<&'a str>> {
        match self.args {
            Some(args) => split_args(args),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodChain<'a> {
    src: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> MethodChain<'a> {
    pub fn new(src: &'a str) -> Self {
        MethodChain {
            src,
            pos: 0,
            failed: false,
        }
    }

    pub fn restart(&mut self) {
        self.pos = 0;
        self.failed = false;
    }

    pub fn source(&self) -> &'a str {
        self.src
    }

    /// Every invocation, or the first tokenizer error.
    pub fn invocations(&self) -> CompileResult<Vec<MethodInvocation<'a>>> {
        self.clone().collect()
    }

    fn error(&mut self, message: String) -> Option<CompileResult<MethodInvocation<'a>>> {
        self.failed = true;
        Some(Err(CompileError::new(
            ErrorKind::Syntax,
            message,
            "sealang.syntax.chain",
        )))
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }
}

impl<'a> Iterator for MethodChain<'a> {
    type Item = CompileResult<MethodInvocation<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.skip_whitespace();
        let rest = &self.src[self.pos..];
        if rest.is_empty() {
            return None;
        }
        let Some(after_dot) = rest.strip_prefix('.') else {
            return self.error(format!("Expected '.' before method call at '{}'", rest));
        };

        let name_len = after_dot
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_alphanumeric() || c == '_') || (i == 0 && c.is_ascii_digit()))
            .map(|(i, _)| i)
            .unwrap_or(after_dot.len());
        if name_len == 0 {
            return self.error(format!("Expected a method name at '{}'", rest));
        }
        let method = &after_dot[..name_len];
        self.pos += 1 + name_len;

        let rest = &self.src[self.pos..];
        if !rest.starts_with('(') {
            return Some(Ok(MethodInvocation { method, args: None }));
        }
        match closing_paren(rest) {
            Some(close) => {
                let args = &rest[1..close];
                self.pos += close + 1;
                Some(Ok(MethodInvocation {
                    method,
                    args: Some(args),
                }))
            }
            None => self.error(format!("Unbalanced parentheses in call to {}", method)),
        }
    }
}

/// Byte index of the `)` matching the `(` at index 0.
fn closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
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
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (c == ')').then_some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split raw call arguments on top-level commas. Blank text is an empty
/// argument list; an empty argument between commas is an error.
pub fn split_args(raw: &str) -> CompileResult<Vec<&str>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
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
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(raw[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(raw[start..].trim());
    if args.iter().any(|a| a.is_empty()) {
        return Err(CompileError::new(
            ErrorKind::Syntax,
            format!("Empty argument in '({})'", raw.trim()),
            "sealang.syntax.chain.split_args",
        ));
    }
    Ok(args)
}
