use pest_derive::Parser;

use crate::error::{CompileError, CompileResult, ErrorKind};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct LineParser;

pub(crate) type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// Keyword tokens carry no data and are skipped when walking a statement.
pub(crate) fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_import
            | Rule::kw_from
            | Rule::kw_package
            | Rule::kw_sub
            | Rule::kw_return
            | Rule::kw_if
            | Rule::kw_elif
            | Rule::kw_else
            | Rule::kw_for
            | Rule::kw_in
            | Rule::kw_try
            | Rule::kw_signal
            | Rule::kw_print
            | Rule::kw_exit
            | Rule::kw_argv
    )
}

/// Inner pairs of `pair`, keywords filtered out.
pub(crate) fn inner<'a>(pair: Pair<'a>) -> impl Iterator<Item = Pair<'a>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

pub(crate) fn fetch_next_pair<'a>(
    pairs: &mut impl Iterator<Item = Pair<'a>>,
    context: &str,
) -> CompileResult<Pair<'a>> {
    pairs.next().ok_or_else(|| {
        CompileError::new(
            ErrorKind::Syntax,
            format!("Expected more inner pairs in {} but found none.", context),
            "sealang.syntax.rules.fetch_next_pair",
        )
    })
}

/// Column (1-based) at which `pair` starts within its line.
pub(crate) fn column_of(pair: &Pair) -> usize {
    pair.as_span().start_pos().line_col().1
}

pub(crate) fn unexpected(pair: &Pair, context: &str) -> CompileError {
    CompileError::new(
        ErrorKind::Syntax,
        format!(
            "Unexpected {:?} at column {} in {}",
            pair.as_rule(),
            column_of(pair),
            context
        ),
        "sealang.syntax.rules",
    )
}
