//! file: core/src/syntax/mod.rs
//! description: line classification.
//!
//! `classify` decides which construct a single source line is and extracts
//! its captures. It is stateless: scoping and name resolution are the
//! driver's business.

pub mod chain;
pub mod construct;
pub mod rules;

use pest::Parser;

pub use chain::{MethodChain, MethodInvocation, split_args};
pub use construct::{Construct, Param, TypeSpec, ValueExpr};
pub use rules::{LineParser, Rule};

use crate::error::{CompileError, CompileResult};

pub fn classify(line: &str) -> CompileResult<Construct> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Construct::Blank);
    }
    if trimmed.starts_with("//") {
        return Ok(Construct::Comment);
    }

    let mut pairs = LineParser::parse(Rule::line, line).map_err(|e| {
        CompileError::unsupported(
            format!(
                "No construct matches '{}' (expected near column {})",
                trimmed,
                match e.line_col {
                    pest::error::LineColLocation::Pos((_, col)) => col,
                    pest::error::LineColLocation::Span((_, col), _) => col,
                }
            ),
            "sealang.syntax.classify",
        )
    })?;
    let line_pair = rules::fetch_next_pair(&mut pairs, "line")?;
    match line_pair
        .into_inner()
        .find(|p| p.as_rule() != Rule::EOI)
    {
        Some(statement) => construct::parse_statement(statement),
        None => Ok(Construct::Comment),
    }
}
