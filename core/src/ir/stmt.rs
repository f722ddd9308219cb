//! file: core/src/ir/stmt.rs
//! description: statement elements of a block.
//!
//! Statements render to a single Perl statement each. The ones that change
//! the shape of their parent (`Return` closes it, `Dependency` moves to the
//! file header) are handled by `IrArena::append`.

use std::fmt;

use crate::error::{CompileError, CompileResult};
use crate::ir::arena::BlockId;
use crate::ir::value::{Arity, Primitive, ValueRef};
use crate::types::PrimitiveKind;

#[derive(Debug, Clone)]
pub enum Statement {
    Dependency(Dependency),
    Binding(ParameterBinding),
    Return(ReturnStatement),
    Print(Print),
    Assign(Assignment),
    Signal(SignalHandler),
    Exit(i32),
    Package(String),
}

/// `use A::B;` or `use A::B qw(x y);`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    module: String,
    symbols: Option<Vec<String>>,
}

impl Dependency {
    /// `path` may be dotted (`stdlib.string`) or already use `::`.
    pub fn new(path: &str, symbols: Option<Vec<String>>) -> CompileResult<Self> {
        let module = module_path(path)?;
        Ok(Dependency {
            module,
            symbols: symbols.filter(|s| !s.is_empty()),
        })
    }

    pub fn everything(path: &str) -> CompileResult<Self> {
        Dependency::new(path, None)
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn symbols(&self) -> Option<&[String]> {
        self.symbols.as_deref()
    }

    pub fn render(&self) -> String {
        match &self.symbols {
            Some(symbols) => format!("use {} qw({});\n", self.module, symbols.join(" ")),
            None => format!("use {};\n", self.module),
        }
    }
}

/// Converts `a.b.c` into `a::b::c`, rejecting empty or malformed segments.
pub fn module_path(path: &str) -> CompileResult<String> {
    let normalized = path.trim().replace('.', "::");
    let valid = !normalized.is_empty()
        && normalized.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(CompileError::new(
            crate::error::ErrorKind::Syntax,
            format!("Invalid module path '{}'", path.trim()),
            "sealang.ir.stmt.module_path",
        ));
    }
    Ok(normalized)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// `my ($a, $b) = @_;`
    Destructure,
    /// `my $a = shift;` per parameter.
    Shift,
}

/// A routine parameter. Callers hand over plain values, so a typed
/// parameter is wrapped back into its class on entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub wrap: Option<&'static str>,
}

impl Parameter {
    pub fn plain(name: &str) -> Self {
        Parameter {
            name: name.to_string(),
            wrap: None,
        }
    }

    pub fn wrapped(name: &str, class: &'static str) -> Self {
        Parameter {
            name: name.to_string(),
            wrap: Some(class),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    params: Vec<Parameter>,
    mode: BindingMode,
}

impl ParameterBinding {
    pub fn new(params: Vec<Parameter>, mode: BindingMode) -> Self {
        ParameterBinding { params, mode }
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn render(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }
        match self.mode {
            BindingMode::Destructure => {
                let vars: Vec<String> = self.params.iter().map(|p| format!("${}", p.name)).collect();
                let mut out = format!("my ({}) = @_;\n", vars.join(", "));
                for param in &self.params {
                    if let Some(class) = param.wrap {
                        out.push_str(&format!("${0} = {1}->new(${0});\n", param.name, class));
                    }
                }
                out
            }
            BindingMode::Shift => self
                .params
                .iter()
                .map(|p| match p.wrap {
                    Some(class) => format!("my ${} = {}->new(shift);\n", p.name, class),
                    None => format!("my ${} = shift;\n", p.name),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ReturnValue {
    Node(Primitive),
    /// A raw expression; its kind is unknown.
    Raw(String),
}

impl ReturnValue {
    pub fn kind(&self) -> Option<PrimitiveKind> {
        match self {
            ReturnValue::Node(node) => Some(node.kind()),
            ReturnValue::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    values: Vec<ReturnValue>,
    multiple: bool,
}

impl ReturnStatement {
    pub fn single(value: ReturnValue) -> Self {
        ReturnStatement {
            values: vec![value],
            multiple: false,
        }
    }

    pub fn multiple(values: Vec<ReturnValue>) -> Self {
        ReturnStatement {
            values,
            multiple: true,
        }
    }

    /// A bare `return;`.
    pub fn empty() -> Self {
        ReturnStatement {
            values: Vec::new(),
            multiple: false,
        }
    }

    pub fn values(&self) -> &[ReturnValue] {
        &self.values
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn arity(&self) -> Arity {
        if self.multiple {
            Arity::Multiple(self.values.iter().map(ReturnValue::kind).collect())
        } else {
            Arity::Single(self.values.first().and_then(ReturnValue::kind))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintMessage {
    Value(ValueRef),
    Raw(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Print {
    message: PrintMessage,
    newline: bool,
}

impl Print {
    pub fn new(message: PrintMessage, newline: bool) -> Self {
        Print { message, newline }
    }

    pub fn line(message: PrintMessage) -> Self {
        Print::new(message, true)
    }

    pub fn render(&self) -> String {
        let message = match &self.message {
            PrintMessage::Value(r) => r.accessor(),
            PrintMessage::Raw(text) => text.clone(),
            PrintMessage::Empty => String::new(),
        };
        match (message.is_empty(), self.newline) {
            (true, true) => "print(\"\\n\");\n".to_string(),
            (true, false) => "print(\"\");\n".to_string(),
            (false, true) => format!("print({}.\"\\n\");\n", message),
            (false, false) => format!("print({});\n", message),
        }
    }
}

/// `$x = <value>;` on an already declared node.
#[derive(Debug, Clone)]
pub struct Assignment {
    target: ValueRef,
    value: Primitive,
}

impl Assignment {
    pub fn new(target: &Primitive, value: Primitive) -> CompileResult<Self> {
        if !value.is_anonymous() {
            return Err(CompileError::structural(
                format!(
                    "Assigned value for {} must be anonymous",
                    target.display_name()
                ),
                "sealang.ir.stmt.assign",
            ));
        }
        Ok(Assignment {
            target: ValueRef::of(target)?,
            value,
        })
    }

    pub fn target(&self) -> &ValueRef {
        &self.target
    }

    pub fn value(&self) -> &Primitive {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Chld,
    Die,
    Int,
    Alrm,
    Hup,
}

impl Signal {
    /// Accepts `INT` or `SIGINT`, any case.
    pub fn parse(name: &str) -> CompileResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);
        match bare {
            "CHLD" => Ok(Signal::Chld),
            "DIE" | "__DIE__" => Ok(Signal::Die),
            "INT" => Ok(Signal::Int),
            "ALRM" => Ok(Signal::Alrm),
            "HUP" => Ok(Signal::Hup),
            _ => Err(CompileError::unsupported(
                format!("Signal {} is not supported", name.trim()),
                "sealang.ir.stmt.signal",
            )),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Signal::Chld => "CHLD",
            Signal::Die => "__DIE__",
            Signal::Int => "INT",
            Signal::Alrm => "ALRM",
            Signal::Hup => "HUP",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// `$SIG{INT} = sub {...};` or `$SIG{INT} = \&handler;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalHandler {
    signal: Signal,
    routine: BlockId,
}

impl SignalHandler {
    pub fn new(signal: Signal, routine: BlockId) -> Self {
        SignalHandler { signal, routine }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn routine(&self) -> BlockId {
        self.routine
    }
}
