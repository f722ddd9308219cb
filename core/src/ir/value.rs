//! file: core/src/ir/value.rs
//! description: value nodes (typed declarations and anonymous values).
//!
//! A `Primitive` pairs a registry kind with where its value comes from:
//! a literal, another named node, the result of a routine or the result of
//! a method call. Construction runs the assignability checks so a node that
//! exists is always well typed; rendering lives in `ir::render`.

use crate::error::{CompileError, CompileResult};
use crate::ir::arena::BlockId;
use crate::ir::method::{Argument, MethodCall};
use crate::ir::render;
use crate::types::{Compat, PrimitiveKind, TypeEntry, TypeRegistry};

/// Literal values as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    /// Kept verbatim so `1.50` renders as written.
    Number(String),
    Bool(bool),
    List(Vec<Literal>),
    Object(Vec<(String, Literal)>),
    Undef,
}

impl Literal {
    pub fn str(s: &str) -> Self {
        Literal::Str(s.to_string())
    }

    pub fn int(n: i64) -> Self {
        Literal::Number(n.to_string())
    }

    pub fn is_integral(&self) -> bool {
        match self {
            Literal::Number(n) => {
                let digits = n.strip_prefix('-').unwrap_or(n);
                !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Literal::Str(_) => "string",
            Literal::Number(_) => "number",
            Literal::Bool(_) => "boolean",
            Literal::List(_) => "list",
            Literal::Object(_) => "object",
            Literal::Undef => "undef",
        }
    }
}

/// A by-name handle on a bound node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRef {
    pub name: String,
    pub kind: PrimitiveKind,
    /// Element kind of an Array or Map node.
    pub template: Option<PrimitiveKind>,
}

impl ValueRef {
    pub fn new(name: &str, kind: PrimitiveKind) -> Self {
        ValueRef {
            name: name.to_string(),
            kind,
            template: None,
        }
    }

    pub fn with_template(mut self, template: PrimitiveKind) -> Self {
        self.template = Some(template);
        self
    }

    /// Handle on a named node. Anonymous nodes have nothing to refer to.
    pub fn of(node: &Primitive) -> CompileResult<Self> {
        match node.name() {
            Some(name) => Ok(ValueRef {
                name: name.to_string(),
                kind: node.kind(),
                template: node.template_kind(),
            }),
            None => Err(CompileError::structural(
                "Anonymous value cannot be referenced by name",
                "sealang.ir.value",
            )),
        }
    }

    /// `array<string>` style description for error messages.
    pub fn describe(&self) -> String {
        describe(self.kind, self.template)
    }

    pub fn variable(&self) -> String {
        format!("${}", self.name)
    }

    /// The expression handing this node's value to someone else: the inner
    /// value for wrapped scalars, a copy for containers.
    pub fn accessor(&self) -> String {
        match self.kind {
            PrimitiveKind::String | PrimitiveKind::Integer | PrimitiveKind::Boolean => {
                format!("${}->valueOf()", self.name)
            }
            PrimitiveKind::Array | PrimitiveKind::Map => format!("${}->clone()", self.name),
            PrimitiveKind::Hash | PrimitiveKind::Scalar => format!("${}", self.name),
        }
    }
}

pub(crate) fn describe(kind: PrimitiveKind, template: Option<PrimitiveKind>) -> String {
    match template {
        Some(t) if kind.is_container() => format!("{}<{}>", kind, t),
        _ => kind.to_string(),
    }
}

/// How many values a closed routine hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    /// `None` marks a raw expression whose kind is unknown.
    Single(Option<PrimitiveKind>),
    Multiple(Vec<Option<PrimitiveKind>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnInfo {
    pub arity: Arity,
}

/// A snapshot of a routine taken when its result is used as a value.
#[derive(Debug, Clone)]
pub struct RoutineCall {
    pub routine: BlockId,
    pub name: Option<String>,
    pub returns: Option<ReturnInfo>,
    pub args: Vec<Argument>,
}

impl RoutineCall {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous routine")
    }
}

#[derive(Debug, Clone)]
pub enum ValueSource {
    Literal(Literal),
    Reference(ValueRef),
    Routine(RoutineCall),
    Method(MethodCall),
    /// The script's command line arguments (`@ARGV`).
    Argv,
}

#[derive(Debug, Clone)]
pub struct Primitive {
    entry: TypeEntry,
    name: Option<String>,
    template: Option<TypeEntry>,
    source: ValueSource,
    cast_scalar: bool,
}

impl Primitive {
    /// Build a node from surface type names, e.g. `("Array", Some("Int"))`.
    pub fn construct(
        registry: &TypeRegistry,
        kind: &str,
        name: Option<&str>,
        template: Option<&str>,
        source: ValueSource,
    ) -> CompileResult<Self> {
        let kind = registry.lookup(kind)?.kind;
        let template = match template {
            Some(t) => Some(registry.lookup_template(t)?),
            None => None,
        };
        Primitive::of_kind(registry, kind, name, template, source)
    }

    pub fn of_kind(
        registry: &TypeRegistry,
        kind: PrimitiveKind,
        name: Option<&str>,
        template: Option<PrimitiveKind>,
        source: ValueSource,
    ) -> CompileResult<Self> {
        let entry = registry.entry(kind).clone();
        let template = match (kind.is_container(), template) {
            (true, Some(t)) if t.is_template() => Some(registry.entry(t).clone()),
            (true, Some(t)) => {
                return Err(CompileError::unknown_type(
                    &format!("{} (not allowed as an element template)", t),
                    "sealang.ir.value",
                ));
            }
            (true, None) => Some(registry.entry(PrimitiveKind::Scalar).clone()),
            (false, Some(t)) => {
                return Err(CompileError::unknown_type(
                    &format!("{}<{}>", entry.surface, registry.entry(t).surface),
                    "sealang.ir.value",
                ));
            }
            (false, None) => None,
        };

        let mut node = Primitive {
            entry,
            name: name.map(|n| n.to_string()),
            template,
            source,
            cast_scalar: false,
        };
        node.cast_scalar = node.check_source()?;
        Ok(node)
    }

    pub fn string(registry: &TypeRegistry, name: Option<&str>, value: &str) -> CompileResult<Self> {
        Primitive::of_kind(
            registry,
            PrimitiveKind::String,
            name,
            None,
            ValueSource::Literal(Literal::str(value)),
        )
    }

    pub fn integer(registry: &TypeRegistry, name: Option<&str>, value: i64) -> CompileResult<Self> {
        Primitive::of_kind(
            registry,
            PrimitiveKind::Integer,
            name,
            None,
            ValueSource::Literal(Literal::int(value)),
        )
    }

    pub fn boolean(registry: &TypeRegistry, name: Option<&str>, value: bool) -> CompileResult<Self> {
        Primitive::of_kind(
            registry,
            PrimitiveKind::Boolean,
            name,
            None,
            ValueSource::Literal(Literal::Bool(value)),
        )
    }

    pub fn array(
        registry: &TypeRegistry,
        name: Option<&str>,
        template: Option<PrimitiveKind>,
        items: Vec<Literal>,
    ) -> CompileResult<Self> {
        Primitive::of_kind(
            registry,
            PrimitiveKind::Array,
            name,
            template,
            ValueSource::Literal(Literal::List(items)),
        )
    }

    /// A parameter or loop element: bound by name, never rendered as a
    /// declaration of its own.
    pub fn placeholder(registry: &TypeRegistry, name: &str, kind: PrimitiveKind) -> Self {
        let template = kind
            .is_container()
            .then(|| registry.entry(PrimitiveKind::Scalar).clone());
        Primitive {
            entry: registry.entry(kind).clone(),
            name: Some(name.to_string()),
            template,
            source: ValueSource::Literal(Literal::Undef),
            cast_scalar: false,
        }
    }

    /// Returns whether the value must be unwrapped into a scalar.
    fn check_source(&self) -> CompileResult<bool> {
        let issuer = "sealang.ir.value.construct";
        match &self.source {
            ValueSource::Literal(lit) => {
                render::lower_literal(&self.entry, self.template.as_ref(), lit)?;
                Ok(false)
            }
            ValueSource::Reference(r) => match self.accepts_reference(r) {
                Compat::Exact => Ok(false),
                Compat::CastScalar => Ok(true),
                Compat::Incompatible => Err(CompileError::type_mismatch(
                    format!(
                        "Cannot assign {} {} to variable {}.{}",
                        r.describe(),
                        r.name,
                        describe(self.kind(), self.template_kind()),
                        self.display_name()
                    ),
                    issuer,
                )),
            },
            ValueSource::Routine(call) => self.check_routine(call),
            ValueSource::Method(_) => Ok(false),
            ValueSource::Argv => match (self.kind(), self.template_kind()) {
                (PrimitiveKind::Array, Some(PrimitiveKind::Scalar | PrimitiveKind::String)) => {
                    Ok(false)
                }
                _ => Err(CompileError::type_mismatch(
                    format!(
                        "Command line arguments only fill an Array or Array<String>, not {}.{}",
                        self.kind(),
                        self.display_name()
                    ),
                    issuer,
                )),
            },
        }
    }

    /// Compatibility of a named node flowing into this one. Containers also
    /// need matching element kinds unless this one holds plain scalars.
    pub fn accepts_reference(&self, r: &ValueRef) -> Compat {
        let compat = self.kind().accepts(r.kind);
        if compat != Compat::Exact || !self.kind().is_container() {
            return compat;
        }
        let target = self.template_kind().unwrap_or(PrimitiveKind::Scalar);
        let source = r.template.unwrap_or(PrimitiveKind::Scalar);
        if target == PrimitiveKind::Scalar || target == source {
            Compat::Exact
        } else {
            Compat::Incompatible
        }
    }

    fn check_routine(&self, call: &RoutineCall) -> CompileResult<bool> {
        let issuer = "sealang.ir.value.construct";
        let Some(returns) = &call.returns else {
            return Err(CompileError::type_mismatch(
                format!(
                    "Cannot assign undefined value from {} to variable {}.{}",
                    call.display_name(),
                    self.kind(),
                    self.display_name()
                ),
                issuer,
            ));
        };
        let invalid = || {
            CompileError::type_mismatch(
                format!(
                    "Invalid returned type from {} for variable {}.{}",
                    call.display_name(),
                    self.kind(),
                    self.display_name()
                ),
                issuer,
            )
        };
        match (&returns.arity, self.kind()) {
            (Arity::Multiple(_), PrimitiveKind::Array) => Ok(false),
            (Arity::Multiple(_), _) => Err(CompileError::type_mismatch(
                format!(
                    "Cannot assign multiple values from {} to variable {}.{}",
                    call.display_name(),
                    self.kind(),
                    self.display_name()
                ),
                issuer,
            )),
            (Arity::Single(None), _) => Err(invalid()),
            (Arity::Single(Some(kind)), target) => match target.accepts(*kind) {
                Compat::Exact => Ok(false),
                Compat::CastScalar => Ok(true),
                Compat::Incompatible => Err(invalid()),
            },
        }
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.entry.kind
    }

    pub fn entry(&self) -> &TypeEntry {
        &self.entry
    }

    pub fn class(&self) -> &'static str {
        self.entry.class
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn template(&self) -> Option<&TypeEntry> {
        self.template.as_ref()
    }

    pub fn template_kind(&self) -> Option<PrimitiveKind> {
        self.template.as_ref().map(|t| t.kind)
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    pub fn casts_to_scalar(&self) -> bool {
        self.cast_scalar
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }
}
