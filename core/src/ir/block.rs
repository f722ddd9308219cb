//! file: core/src/ir/block.rs
//! description: the kinds of IR blocks and their per-kind state.

use crate::error::{CompileError, CompileResult};
use crate::ir::arena::BlockId;
use crate::ir::stmt::{BindingMode, ReturnStatement};
use crate::ir::value::{Arity, Primitive, ReturnInfo, ValueRef};
use crate::types::PrimitiveKind;

#[derive(Debug, Clone)]
pub enum BlockKind {
    Plain,
    File(FileInfo),
    Routine(Routine),
    Condition(Condition),
    ArrayLoop(ArrayLoop),
    MapLoop(MapLoop),
    Evaluation(Evaluation),
}

impl BlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Plain => "block",
            BlockKind::File(_) => "file",
            BlockKind::Routine(_) => "routine",
            BlockKind::Condition(_) => "condition",
            BlockKind::ArrayLoop(_) => "array-loop",
            BlockKind::MapLoop(_) => "map-loop",
            BlockKind::Evaluation(_) => "evaluation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub is_module: bool,
    /// Set once the default preamble has been appended.
    pub header_done: bool,
    pub package: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Routine {
    name: Option<String>,
    params: Vec<String>,
    mode: BindingMode,
    declared: Option<PrimitiveKind>,
    returns: Option<ReturnInfo>,
}

impl Routine {
    pub fn new(
        name: Option<&str>,
        params: Vec<String>,
        mode: BindingMode,
        declared: Option<PrimitiveKind>,
    ) -> Self {
        Routine {
            name: name.map(|n| n.to_string()),
            params,
            mode,
            declared,
            returns: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous routine")
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    pub fn declared(&self) -> Option<PrimitiveKind> {
        self.declared
    }

    pub fn returns(&self) -> Option<&ReturnInfo> {
        self.returns.as_ref()
    }

    /// Record what the closing return hands back, checking it against the
    /// declared kind when there is one.
    pub(crate) fn close(&mut self, ret: &ReturnStatement) -> CompileResult<()> {
        let arity = ret.arity();
        if let Some(declared) = self.declared {
            let ok = match &arity {
                Arity::Multiple(_) => declared == PrimitiveKind::Array,
                Arity::Single(Some(kind)) => {
                    declared.accepts(*kind) != crate::types::Compat::Incompatible
                }
                Arity::Single(None) => false,
            };
            if !ok {
                return Err(CompileError::type_mismatch(
                    format!(
                        "Routine {} is declared to return {} but its return does not match",
                        self.display_name(),
                        declared
                    ),
                    "sealang.ir.block.routine",
                ));
            }
        }
        self.returns = Some(ReturnInfo { arity });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    If,
    Elif,
    Else,
}

impl Branch {
    pub fn keyword(&self) -> &'static str {
        match self {
            Branch::If => "if",
            Branch::Elif => "elsif",
            Branch::Else => "else",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Value(ValueRef),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    branch: Branch,
    expr: Option<String>,
}

impl Condition {
    pub fn new(branch: Branch, expr: Option<ConditionExpr>) -> CompileResult<Self> {
        let issuer = "sealang.ir.block.condition";
        let expr = match (branch, expr) {
            (Branch::Else, None) => None,
            (Branch::Else, Some(_)) => {
                return Err(CompileError::structural(
                    "An else branch takes no condition",
                    issuer,
                ));
            }
            (_, None) => {
                return Err(CompileError::structural(
                    format!("A {} branch needs a condition", branch.keyword()),
                    issuer,
                ));
            }
            (_, Some(ConditionExpr::Value(r))) => Some(truthy(&r)),
            (_, Some(ConditionExpr::Raw(text))) => Some(normalize_raw(&text)),
        };
        Ok(Condition { branch, expr })
    }

    pub fn branch(&self) -> Branch {
        self.branch
    }

    pub fn expr(&self) -> Option<&str> {
        self.expr.as_deref()
    }
}

fn truthy(r: &ValueRef) -> String {
    match r.kind {
        PrimitiveKind::Scalar | PrimitiveKind::Hash => format!("${}", r.name),
        PrimitiveKind::Array | PrimitiveKind::Map => format!("${}->size() > 0", r.name),
        PrimitiveKind::String | PrimitiveKind::Integer | PrimitiveKind::Boolean => {
            format!("${}->valueOf() == 1", r.name)
        }
    }
}

fn normalize_raw(text: &str) -> String {
    text.replacen(';', "", 1).replacen('\n', "", 1).trim().to_string()
}

/// Lowered as a counted `while` over `$array->size()`.
#[derive(Debug, Clone)]
pub struct ArrayLoop {
    pub array: ValueRef,
    /// `my $__iN = stdlib::integer->new(0);`
    pub counter: Primitive,
    /// `my $__lenN = $array->size();`
    pub length: Primitive,
    /// `my $x = $array->get($__iN->valueOf());`
    pub element: Primitive,
}

/// Iteration over a Map. Accepted while building, refused when rendering.
#[derive(Debug, Clone)]
pub struct MapLoop {
    pub map: ValueRef,
    pub element: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Companion block rendered right after the `eval`.
    pub catch: BlockId,
}
