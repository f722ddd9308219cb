//! file: core/src/ir/render.rs
//! description: IR to Perl text.
//!
//! `Renderer` walks a block tree depth-first and concatenates the text of
//! every element. Indentation is not its concern; `emit::format_code` takes
//! care of that afterwards.

use crate::error::{CompileError, CompileResult};
use crate::ir::arena::{BlockId, Element, IrArena};
use crate::ir::block::{BlockKind, Branch};
use crate::ir::method::{Argument, MethodCall, Receiver};
use crate::ir::stmt::{ReturnStatement, ReturnValue, SignalHandler, Statement};
use crate::ir::value::{Literal, Primitive, RoutineCall, ValueRef, ValueSource};
use crate::types::{Compat, PrimitiveKind as K, TypeEntry};

pub struct Renderer<'a> {
    arena: &'a IrArena,
}

impl<'a> Renderer<'a> {
    pub fn new(arena: &'a IrArena) -> Self {
        Renderer { arena }
    }

    pub fn render(&self, root: BlockId) -> CompileResult<String> {
        self.render_block(root)
    }

    pub fn render_block(&self, id: BlockId) -> CompileResult<String> {
        let block = self.arena.block(id)?;
        match block.kind() {
            BlockKind::File(_) => self.render_body(id),
            BlockKind::Plain => {
                if block.is_empty() {
                    Ok(String::new())
                } else {
                    Ok(format!("{{\n{}}};\n", self.render_body(id)?))
                }
            }
            BlockKind::Routine(_) => Ok(format!("{};\n", self.routine_expr(id)?)),
            BlockKind::Condition(condition) => {
                let body = self.render_body(id)?;
                match (condition.branch(), condition.expr()) {
                    (Branch::Else, _) | (_, None) => Ok(format!("else {{\n{}}}\n", body)),
                    (branch, Some(expr)) => {
                        Ok(format!("{} ({}) {{\n{}}}\n", branch.keyword(), expr, body))
                    }
                }
            }
            BlockKind::ArrayLoop(lp) => {
                let counter = lp.counter.name().unwrap_or_default();
                let length = lp.length.name().unwrap_or_default();
                Ok(format!(
                    "{{\n{}{}while (${}->valueOf() < ${}) {{\n{}{}${}->add(1);\n}};\n}};\n",
                    self.render_constructor(&lp.counter, false)?,
                    self.render_constructor(&lp.length, false)?,
                    counter,
                    length,
                    self.render_constructor(&lp.element, false)?,
                    self.render_body(id)?,
                    counter,
                ))
            }
            BlockKind::MapLoop(lp) => Err(CompileError::unsupported(
                format!(
                    "Looping over map {} is not implemented yet",
                    lp.map.name
                ),
                "sealang.ir.render.map_loop",
            )),
            BlockKind::Evaluation(evaluation) => Ok(format!(
                "eval {{\n{}}};\n{}",
                self.render_body(id)?,
                self.render_block(evaluation.catch)?
            )),
        }
    }

    fn render_body(&self, id: BlockId) -> CompileResult<String> {
        let mut out = String::new();
        for element in self.arena.block(id)?.elements() {
            out.push_str(&self.render_element(element)?);
        }
        Ok(out)
    }

    /// `sub name {\n...}` without the statement terminator.
    fn routine_expr(&self, id: BlockId) -> CompileResult<String> {
        let BlockKind::Routine(routine) = self.arena.block(id)?.kind() else {
            return Err(CompileError::structural(
                format!("Block {} is not a routine", id),
                "sealang.ir.render.routine",
            ));
        };
        let body = self.render_body(id)?;
        Ok(match routine.name() {
            Some(name) => format!("sub {} {{\n{}}}", name, body),
            None => format!("sub {{\n{}}}", body),
        })
    }

    pub fn render_element(&self, element: &Element) -> CompileResult<String> {
        match element {
            Element::Text(text) => Ok(text.clone()),
            Element::Block(id) => self.render_block(*id),
            Element::Value(node) => self.render_constructor(node, false),
            Element::Method(call) => Ok(format!("{};\n", self.render_method(call)?)),
            Element::Statement(statement) => self.render_statement(statement),
        }
    }

    pub fn render_statement(&self, statement: &Statement) -> CompileResult<String> {
        match statement {
            Statement::Dependency(dep) => Ok(dep.render()),
            Statement::Binding(binding) => Ok(binding.render()),
            Statement::Return(ret) => self.render_return(ret),
            Statement::Print(print) => Ok(print.render()),
            Statement::Assign(assign) => Ok(format!(
                "{} = {};\n",
                assign.target().variable(),
                self.render_constructor(assign.value(), true)?
            )),
            Statement::Signal(handler) => self.render_signal(handler),
            Statement::Exit(code) => Ok(format!("exit({});\n", code)),
            Statement::Package(package) => Ok(format!("package {};\n", package)),
        }
    }

    fn render_return(&self, ret: &ReturnStatement) -> CompileResult<String> {
        let mut values = Vec::with_capacity(ret.values().len());
        for value in ret.values() {
            values.push(match value {
                ReturnValue::Node(node) => match node.name() {
                    Some(name) => format!("${}", name),
                    None => self.render_constructor(node, true)?,
                },
                ReturnValue::Raw(text) => text.clone(),
            });
        }
        Ok(match (ret.is_multiple(), values.as_slice()) {
            (true, _) => format!("return ({});\n", values.join(",")),
            (false, []) => "return;\n".to_string(),
            (false, [single, ..]) => format!("return {};\n", single),
        })
    }

    fn render_signal(&self, handler: &SignalHandler) -> CompileResult<String> {
        let routine = handler.routine();
        let named = match self.arena.block(routine)?.kind() {
            BlockKind::Routine(r) => r.name().map(|n| n.to_string()),
            _ => None,
        };
        match named {
            Some(name) => Ok(format!("$SIG{{{}}} = \\&{};\n", handler.signal(), name)),
            None => Ok(format!(
                "$SIG{{{}}} = {};\n",
                handler.signal(),
                self.routine_expr(routine)?
            )),
        }
    }

    pub fn render_method(&self, call: &MethodCall) -> CompileResult<String> {
        let receiver = match call.receiver() {
            Receiver::Value(r) => r.variable(),
            Receiver::Call(inner) => self.render_method(inner)?,
        };
        Ok(format!(
            "{}->{}({})",
            receiver,
            call.method(),
            self.render_args(call.args())?
        ))
    }

    fn render_args(&self, args: &[Argument]) -> CompileResult<String> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(match arg {
                Argument::Bound(r) => r.accessor(),
                Argument::Inline(node) => self.render_constructor(node, true)?,
                Argument::Raw(text) => text.clone(),
            });
        }
        Ok(out.join(", "))
    }

    /// `name(args)`, or an immediately invoked `sub {...}` when anonymous.
    pub fn render_call(&self, call: &RoutineCall) -> CompileResult<String> {
        let args = self.render_args(&call.args)?;
        Ok(match &call.name {
            Some(name) => format!("{}({})", name, args),
            None => format!("{}->({})", self.routine_expr(call.routine)?, args),
        })
    }

    /// A value node as a declaration (`my $x = ...;\n`) or, when `inline`
    /// is set, as a bare expression.
    pub fn render_constructor(&self, node: &Primitive, inline: bool) -> CompileResult<String> {
        let expr = match node.source() {
            ValueSource::Literal(lit) => lower_literal(node.entry(), node.template(), lit)?,
            ValueSource::Reference(r) => lower_reference(node, r)?,
            ValueSource::Routine(call) => {
                let invoke = self.render_call(call)?;
                if node.casts_to_scalar() {
                    format!("{}->valueOf()", invoke)
                } else {
                    invoke
                }
            }
            ValueSource::Method(call) => self.render_method(call)?,
            ValueSource::Argv => lower_argv(node)?,
        };
        match (inline, node.name()) {
            (false, Some(name)) => Ok(format!("my ${} = {};\n", name, expr)),
            (false, None) => Ok(format!("{};\n", expr)),
            (true, _) => Ok(expr),
        }
    }
}

/// `@ARGV` as an Array; elements are wrapped for `Array<String>`.
fn lower_argv(node: &Primitive) -> CompileResult<String> {
    match (node.kind(), node.template_kind()) {
        (K::Array, Some(K::Scalar) | None) => Ok(format!("{}->new(@ARGV)", node.class())),
        (K::Array, Some(K::String)) => Ok(format!(
            "{}->new(map {{ stdlib::string->new($_) }} @ARGV)",
            node.class()
        )),
        _ => Err(CompileError::type_mismatch(
            format!(
                "Command line arguments cannot initialize {}.{}",
                node.kind(),
                node.display_name()
            ),
            "sealang.ir.render.argv",
        )),
    }
}

fn lower_reference(node: &Primitive, r: &ValueRef) -> CompileResult<String> {
    let compat = node.accepts_reference(r);
    let lowered = match (node.kind(), compat) {
        (_, Compat::Incompatible) => None,
        (K::String | K::Integer | K::Boolean, Compat::Exact) => {
            Some(format!("{}->new(${}->valueOf())", node.class(), r.name))
        }
        (K::String | K::Integer | K::Boolean, Compat::CastScalar) => None,
        (K::Scalar, Compat::Exact) => Some(format!("${}", r.name)),
        (K::Scalar, Compat::CastScalar) => Some(format!("${}->valueOf()", r.name)),
        (K::Array | K::Map, Compat::Exact) => Some(format!("${}->clone()", r.name)),
        (K::Array | K::Map, Compat::CastScalar) => None,
        (K::Hash, Compat::Exact) => Some(format!("{{ %{{${}}} }}", r.name)),
        (K::Hash, Compat::CastScalar) => None,
    };
    lowered.ok_or_else(|| {
        CompileError::type_mismatch(
            format!(
                "Cannot assign {} {} to variable {}.{}",
                r.describe(),
                r.name,
                node.kind(),
                node.display_name()
            ),
            "sealang.ir.render.reference",
        )
    })
}

fn invalid(entry: &TypeEntry, lit: &Literal) -> CompileError {
    CompileError::invalid_literal(
        format!(
            "A {} literal cannot initialize a value of type {}",
            lit.shape(),
            entry.surface
        ),
        "sealang.ir.render.literal",
    )
}

/// Literal initializer of a value of kind `entry`.
pub fn lower_literal(
    entry: &TypeEntry,
    template: Option<&TypeEntry>,
    lit: &Literal,
) -> CompileResult<String> {
    let class = entry.class;
    match lit {
        Literal::Str(s) => match entry.kind {
            K::String => Ok(format!("{}->new({})", class, perl_quote(s))),
            K::Scalar => Ok(perl_quote(s)),
            K::Integer | K::Boolean | K::Array | K::Map | K::Hash => Err(invalid(entry, lit)),
        },
        Literal::Number(n) => match entry.kind {
            K::String => Ok(format!("{}->new({})", class, perl_quote(n))),
            K::Integer if lit.is_integral() => Ok(format!("{}->new({})", class, n)),
            K::Integer => Err(CompileError::invalid_literal(
                format!("{} is not an integer", n),
                "sealang.ir.render.literal",
            )),
            K::Scalar => Ok(n.clone()),
            K::Boolean | K::Array | K::Map | K::Hash => Err(invalid(entry, lit)),
        },
        Literal::Bool(b) => match entry.kind {
            K::Boolean => Ok(format!("{}->new({})", class, perl_bool(*b))),
            K::String | K::Integer | K::Scalar | K::Array | K::Map | K::Hash => {
                Err(invalid(entry, lit))
            }
        },
        Literal::List(items) => match entry.kind {
            K::Array => {
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    elements.push(lower_element(template, item)?);
                }
                Ok(format!("{}->new({})", class, elements.join(",")))
            }
            K::String | K::Integer | K::Boolean | K::Scalar | K::Map | K::Hash => {
                Err(invalid(entry, lit))
            }
        },
        Literal::Object(fields) => match entry.kind {
            K::Hash => lower_object(None, fields),
            K::Map => Ok(format!("{}->new({})", class, lower_object(template, fields)?)),
            K::String | K::Integer | K::Boolean | K::Scalar | K::Array => {
                Err(invalid(entry, lit))
            }
        },
        Literal::Undef => match entry.kind {
            K::Scalar => Ok("undef".to_string()),
            K::Hash => Ok("{}".to_string()),
            K::String | K::Integer | K::Boolean | K::Array | K::Map => {
                Ok(format!("{}->new()", class))
            }
        },
    }
}

/// One element of an Array or Map literal. Leaves go through the element
/// kind's constructor unless the template is `scalar`.
fn lower_element(template: Option<&TypeEntry>, lit: &Literal) -> CompileResult<String> {
    let entry = match template {
        Some(entry) if entry.kind != K::Scalar => entry,
        _ => return Ok(native_literal(lit)),
    };
    match lit {
        Literal::List(items) => {
            let mut elements = Vec::with_capacity(items.len());
            for item in items {
                elements.push(lower_element(template, item)?);
            }
            Ok(format!("[{}]", elements.join(",")))
        }
        Literal::Object(fields) => lower_object(template, fields),
        leaf => lower_literal(entry, None, leaf),
    }
}

fn lower_object(template: Option<&TypeEntry>, fields: &[(String, Literal)]) -> CompileResult<String> {
    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        pairs.push(format!("{} => {}", perl_key(key), lower_element(template, value)?));
    }
    Ok(format!("{{{}}}", pairs.join(",")))
}

/// Plain Perl literal, no standard library wrapping.
pub fn native_literal(lit: &Literal) -> String {
    match lit {
        Literal::Str(s) => perl_quote(s),
        Literal::Number(n) => n.clone(),
        Literal::Bool(b) => perl_bool(*b).to_string(),
        Literal::List(items) => format!(
            "[{}]",
            items.iter().map(native_literal).collect::<Vec<_>>().join(",")
        ),
        Literal::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(k, v)| format!("{} => {}", perl_key(k), native_literal(v)))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Literal::Undef => "undef".to_string(),
    }
}

fn perl_bool(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

fn perl_key(key: &str) -> String {
    let mut chars = key.chars();
    let bare = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if bare { key.to_string() } else { perl_quote(key) }
}

/// Double-quoted Perl string; interpolation sigils are escaped.
pub fn perl_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            '@' => out.push_str("\\@"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
