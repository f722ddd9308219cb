//! file: core/src/syntax/construct.rs
//! description: recognized line constructs and their extraction from pest pairs.

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::ir::{Branch, Literal};
use crate::syntax::rules::{Pair, Rule, fetch_next_pair, inner, unexpected};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    pub name: String,
    pub template: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: Option<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    Literal(Literal),
    Reference(String),
    RoutineCall { name: String, args: Vec<ValueExpr> },
    /// `receiver` followed by the raw chain text, e.g. `.size()`.
    MethodCall { receiver: String, chain: String },
    /// `argv()`
    Argv,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Construct {
    Blank,
    Comment,
    OpenScope,
    CloseScope,
    Import {
        module: String,
        symbols: Option<Vec<String>>,
    },
    Package {
        module: String,
    },
    Declare {
        kind: TypeSpec,
        name: String,
        value: ValueExpr,
    },
    Assign {
        name: String,
        value: ValueExpr,
    },
    MethodChain {
        receiver: String,
        chain: String,
    },
    Routine {
        name: Option<String>,
        params: Vec<Param>,
        returns: Option<TypeSpec>,
    },
    Return {
        values: Vec<ValueExpr>,
    },
    Condition {
        branch: Branch,
        value: Option<ValueExpr>,
    },
    Loop {
        element: String,
        iterable: String,
    },
    Try,
    /// `signal INT {` or `signal INT(sig) {`.
    Signal {
        name: String,
        param: Option<String>,
    },
    Print {
        value: Option<ValueExpr>,
    },
    Exit {
        code: i32,
    },
}

impl Construct {
    pub fn label(&self) -> &'static str {
        match self {
            Construct::Blank => "blank",
            Construct::Comment => "comment",
            Construct::OpenScope => "open-scope",
            Construct::CloseScope => "close-scope",
            Construct::Import { .. } => "import",
            Construct::Package { .. } => "package",
            Construct::Declare { .. } => "declare",
            Construct::Assign { .. } => "assign",
            Construct::MethodChain { .. } => "method-chain",
            Construct::Routine { .. } => "routine",
            Construct::Return { .. } => "return",
            Construct::Condition { .. } => "condition",
            Construct::Loop { .. } => "loop",
            Construct::Try => "try",
            Construct::Signal { .. } => "signal",
            Construct::Print { .. } => "print",
            Construct::Exit { .. } => "exit",
        }
    }
}

pub(crate) fn parse_statement(pair: Pair) -> CompileResult<Construct> {
    let rule = pair.as_rule();
    let context = format!("{:?}", rule);
    let mut parts = inner(pair.clone());
    match rule {
        Rule::open_scope => Ok(Construct::OpenScope),
        Rule::close_scope => Ok(Construct::CloseScope),
        Rule::import_stmt => {
            let list = fetch_next_pair(&mut parts, &context)?;
            let module = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let symbols = match list.as_rule() {
                Rule::import_all => None,
                Rule::import_list => Some(inner(list).map(|p| p.as_str().to_string()).collect()),
                _ => return Err(unexpected(&list, &context)),
            };
            Ok(Construct::Import { module, symbols })
        }
        Rule::package_stmt => Ok(Construct::Package {
            module: fetch_next_pair(&mut parts, &context)?.as_str().to_string(),
        }),
        Rule::routine_stmt => {
            let mut name = None;
            let mut params = Vec::new();
            let mut returns = None;
            for part in parts {
                match part.as_rule() {
                    Rule::ident => name = Some(part.as_str().to_string()),
                    Rule::params => {
                        for param in inner(part) {
                            params.push(parse_param(param)?);
                        }
                    }
                    Rule::returns => {
                        let spec = fetch_next_pair(&mut inner(part), "returns")?;
                        returns = Some(parse_type_spec(spec)?);
                    }
                    _ => return Err(unexpected(&part, &context)),
                }
            }
            Ok(Construct::Routine {
                name,
                params,
                returns,
            })
        }
        Rule::return_stmt => Ok(Construct::Return {
            values: parts.map(parse_value).collect::<CompileResult<_>>()?,
        }),
        Rule::if_stmt | Rule::elif_stmt => {
            let branch = if rule == Rule::if_stmt {
                Branch::If
            } else {
                Branch::Elif
            };
            let value = parse_value(fetch_next_pair(&mut parts, &context)?)?;
            Ok(Construct::Condition {
                branch,
                value: Some(value),
            })
        }
        Rule::else_stmt => Ok(Construct::Condition {
            branch: Branch::Else,
            value: None,
        }),
        Rule::loop_stmt => {
            let element = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let iterable = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            Ok(Construct::Loop { element, iterable })
        }
        Rule::try_stmt => Ok(Construct::Try),
        Rule::signal_stmt => {
            let name = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let param = parts.next().map(|p| p.as_str().to_string());
            Ok(Construct::Signal { name, param })
        }
        Rule::print_stmt => Ok(Construct::Print {
            value: parts.next().map(parse_value).transpose()?,
        }),
        Rule::exit_stmt => {
            let code = match parts.next() {
                Some(number) => number.as_str().parse::<i32>().map_err(|_| {
                    CompileError::new(
                        ErrorKind::Syntax,
                        format!("Exit code {} is not an integer", number.as_str()),
                        "sealang.syntax.construct.exit",
                    )
                })?,
                None => 0,
            };
            Ok(Construct::Exit { code })
        }
        Rule::declaration => {
            let kind = parse_type_spec(fetch_next_pair(&mut parts, &context)?)?;
            let name = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let value = parse_value(fetch_next_pair(&mut parts, &context)?)?;
            Ok(Construct::Declare { kind, name, value })
        }
        Rule::assignment => {
            let name = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let value = parse_value(fetch_next_pair(&mut parts, &context)?)?;
            Ok(Construct::Assign { name, value })
        }
        Rule::method_stmt => {
            let receiver = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            let chain = fetch_next_pair(&mut parts, &context)?.as_str().to_string();
            Ok(Construct::MethodChain { receiver, chain })
        }
        _ => Err(unexpected(&pair, "statement")),
    }
}

fn parse_type_spec(pair: Pair) -> CompileResult<TypeSpec> {
    let mut parts = inner(pair);
    let name = fetch_next_pair(&mut parts, "type")?.as_str().to_string();
    let template = parts.next().map(|p| p.as_str().to_string());
    Ok(TypeSpec { name, template })
}

fn parse_param(pair: Pair) -> CompileResult<Param> {
    let parts: Vec<Pair> = inner(pair).collect();
    match parts.as_slice() {
        [name] => Ok(Param {
            name: name.as_str().to_string(),
            kind: None,
        }),
        [spec, name] => Ok(Param {
            name: name.as_str().to_string(),
            kind: Some(parse_type_spec(spec.clone())?),
        }),
        _ => Err(CompileError::new(
            ErrorKind::Syntax,
            "Malformed routine parameter",
            "sealang.syntax.construct.param",
        )),
    }
}

pub(crate) fn parse_value(pair: Pair) -> CompileResult<ValueExpr> {
    let pair = match pair.as_rule() {
        Rule::value => fetch_next_pair(&mut inner(pair), "value")?,
        _ => pair,
    };
    match pair.as_rule() {
        Rule::literal => Ok(ValueExpr::Literal(parse_literal(pair)?)),
        Rule::argv_value => Ok(ValueExpr::Argv),
        Rule::reference => Ok(ValueExpr::Reference(pair.as_str().trim().to_string())),
        Rule::routine_call => {
            let mut parts = inner(pair);
            let name = fetch_next_pair(&mut parts, "routine call")?
                .as_str()
                .to_string();
            let args = parts.map(parse_value).collect::<CompileResult<_>>()?;
            Ok(ValueExpr::RoutineCall { name, args })
        }
        Rule::method_value => {
            let mut parts = inner(pair);
            let receiver = fetch_next_pair(&mut parts, "method call")?
                .as_str()
                .to_string();
            let chain = fetch_next_pair(&mut parts, "method call")?
                .as_str()
                .to_string();
            Ok(ValueExpr::MethodCall { receiver, chain })
        }
        _ => Err(unexpected(&pair, "value")),
    }
}

pub(crate) fn parse_literal(pair: Pair) -> CompileResult<Literal> {
    let pair = match pair.as_rule() {
        Rule::literal => fetch_next_pair(&mut inner(pair), "literal")?,
        _ => pair,
    };
    match pair.as_rule() {
        Rule::string => {
            let body = fetch_next_pair(&mut inner(pair), "string")?;
            Ok(Literal::Str(unescape(body.as_str())))
        }
        Rule::number => Ok(Literal::Number(pair.as_str().to_string())),
        Rule::boolean => Ok(Literal::Bool(pair.as_str() == "true")),
        Rule::undef => Ok(Literal::Undef),
        Rule::list => Ok(Literal::List(
            inner(pair)
                .map(parse_literal)
                .collect::<CompileResult<_>>()?,
        )),
        Rule::object => {
            let mut fields = Vec::new();
            for field in inner(pair) {
                let mut parts = inner(field);
                let key = fetch_next_pair(&mut parts, "object field")?;
                let key = match key.as_rule() {
                    Rule::string => unescape(
                        fetch_next_pair(&mut inner(key), "object key")?.as_str(),
                    ),
                    _ => key.as_str().to_string(),
                };
                let value = parse_literal(fetch_next_pair(&mut parts, "object field")?)?;
                fields.push((key, value));
            }
            Ok(Literal::Object(fields))
        }
        _ => Err(unexpected(&pair, "literal")),
    }
}

/// Resolve backslash escapes of a quoted source string.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
