//! file: core/src/ir/mod.rs
//! description: intermediate representation of a compilation unit.
//!
//! Blocks live in an `IrArena` and are addressed by `BlockId`. Each block
//! holds an ordered list of `Element`s: verbatim text, nested blocks, value
//! nodes, method calls and statements. `render` turns a block tree into
//! Perl source text.

pub mod arena;
pub mod block;
pub mod method;
pub mod render;
pub mod stmt;
pub mod value;

pub use arena::{Block, BlockId, Element, IrArena};
pub use block::{
    ArrayLoop, BlockKind, Branch, Condition, ConditionExpr, Evaluation, FileInfo, MapLoop, Routine,
};
pub use method::{Argument, MethodCall, Receiver};
pub use render::Renderer;
pub use stmt::{
    Assignment, BindingMode, Dependency, Parameter, ParameterBinding, Print, PrintMessage, ReturnStatement,
    ReturnValue, Signal, SignalHandler, Statement,
};
pub use value::{Arity, Literal, Primitive, ReturnInfo, RoutineCall, ValueRef, ValueSource};
