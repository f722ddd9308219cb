//! file: core/src/ir/arena.rs
//! description: block storage and the structural append rules.
//!
//! Every block of a compilation unit is owned by one `IrArena`; blocks refer
//! to each other by `BlockId`. `append` is the single entry point that
//! mutates a block's element list and is where the structural invariants
//! (closed blocks, single root, no cycles, header placement) are enforced.

use std::fmt;

use crate::error::{CompileError, CompileResult};
use crate::ir::block::{
    ArrayLoop, BlockKind, Branch, Condition, ConditionExpr, Evaluation, FileInfo, MapLoop, Routine,
};
use crate::ir::method::{Argument, MethodCall};
use crate::ir::stmt::{
    BindingMode, Dependency, Parameter, ParameterBinding, Print, PrintMessage, Statement,
};
use crate::ir::value::{Primitive, RoutineCall, ValueRef, ValueSource};
use crate::types::{PrimitiveKind, TypeRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum Element {
    Text(String),
    Block(BlockId),
    Value(Primitive),
    Method(MethodCall),
    Statement(Statement),
}

#[derive(Debug, Clone)]
pub struct Block {
    kind: BlockKind,
    elements: Vec<Element>,
    closed: bool,
    root: Option<BlockId>,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Block {
            kind,
            elements: Vec::new(),
            closed: false,
            root: None,
        }
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn root(&self) -> Option<BlockId> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IrArena {
    blocks: Vec<Block>,
    next_fresh: usize,
}

impl IrArena {
    pub fn new() -> Self {
        IrArena::default()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn alloc(&mut self, kind: BlockKind) -> BlockId {
        self.blocks.push(Block::new(kind));
        BlockId(self.blocks.len() - 1)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn block(&self, id: BlockId) -> CompileResult<&Block> {
        self.blocks.get(id.0).ok_or_else(|| unknown_block(id))
    }

    fn block_mut(&mut self, id: BlockId) -> CompileResult<&mut Block> {
        self.blocks.get_mut(id.0).ok_or_else(|| unknown_block(id))
    }

    /// A name no source identifier can collide with, e.g. `__i0`.
    pub fn fresh(&mut self, prefix: &str) -> String {
        let n = self.next_fresh;
        self.next_fresh += 1;
        format!("__{}{}", prefix, n)
    }

    /// Create a File block and append its default preamble. The header is
    /// closed afterwards, so later dependencies are hoisted to the front.
    pub fn new_file(
        &mut self,
        name: &str,
        is_module: bool,
        preamble: &[String],
    ) -> CompileResult<BlockId> {
        let id = self.alloc(BlockKind::File(FileInfo {
            name: name.to_string(),
            is_module,
            header_done: false,
            package: None,
        }));
        for dep in preamble {
            self.append(id, Element::Statement(Statement::Dependency(Dependency::everything(dep)?)))?;
        }
        if let BlockKind::File(info) = &mut self.block_mut(id)?.kind {
            info.header_done = true;
        }
        Ok(id)
    }

    pub fn new_plain(&mut self) -> BlockId {
        self.alloc(BlockKind::Plain)
    }

    /// Routine block with its parameter binding already in place.
    pub fn new_routine(
        &mut self,
        name: Option<&str>,
        params: Vec<Parameter>,
        mode: BindingMode,
        declared: Option<PrimitiveKind>,
    ) -> CompileResult<BlockId> {
        let names = params.iter().map(|p| p.name.clone()).collect();
        let binding = ParameterBinding::new(params, mode);
        let id = self.alloc(BlockKind::Routine(Routine::new(name, names, mode, declared)));
        if !binding.params().is_empty() {
            self.append(id, Element::Statement(Statement::Binding(binding)))?;
        }
        Ok(id)
    }

    pub fn new_condition(
        &mut self,
        branch: Branch,
        expr: Option<ConditionExpr>,
    ) -> CompileResult<BlockId> {
        let condition = Condition::new(branch, expr)?;
        Ok(self.alloc(BlockKind::Condition(condition)))
    }

    /// Loop over an Array node. Returns the loop block and the element node
    /// bound at the start of each iteration.
    pub fn new_array_loop(
        &mut self,
        registry: &TypeRegistry,
        array: &Primitive,
        element: &str,
    ) -> CompileResult<(BlockId, Primitive)> {
        if array.kind() != PrimitiveKind::Array {
            return Err(CompileError::type_mismatch(
                format!(
                    "Cannot loop over {} {}: only arrays can be iterated by index",
                    array.kind(),
                    array.display_name()
                ),
                "sealang.ir.arena.array_loop",
            ));
        }
        let array_ref = ValueRef::of(array)?;
        let counter_name = self.fresh("i");
        let length_name = self.fresh("len");

        let counter = Primitive::integer(registry, Some(&counter_name), 0)?;
        let length = Primitive::of_kind(
            registry,
            PrimitiveKind::Scalar,
            Some(&length_name),
            None,
            ValueSource::Method(MethodCall::on(array_ref.clone(), "size", Vec::new())),
        )?;
        let item_kind = array.template_kind().unwrap_or(PrimitiveKind::Scalar);
        let item = Primitive::of_kind(
            registry,
            item_kind,
            Some(element),
            None,
            ValueSource::Method(MethodCall::on(
                array_ref.clone(),
                "get",
                vec![Argument::Bound(ValueRef::of(&counter)?)],
            )),
        )?;

        let id = self.alloc(BlockKind::ArrayLoop(ArrayLoop {
            array: array_ref,
            counter,
            length,
            element: item.clone(),
        }));
        Ok((id, item))
    }

    pub fn new_map_loop(&mut self, map: &Primitive, element: &str) -> CompileResult<BlockId> {
        if map.kind() != PrimitiveKind::Map {
            return Err(CompileError::type_mismatch(
                format!(
                    "Cannot loop over {} {} as a map",
                    map.kind(),
                    map.display_name()
                ),
                "sealang.ir.arena.map_loop",
            ));
        }
        Ok(self.alloc(BlockKind::MapLoop(MapLoop {
            map: ValueRef::of(map)?,
            element: element.to_string(),
        })))
    }

    /// `eval` block plus its catch block, which prints the trapped error.
    pub fn new_evaluation(&mut self) -> CompileResult<BlockId> {
        let catch = self.new_condition(Branch::If, Some(ConditionExpr::Raw("$@".to_string())))?;
        self.append(
            catch,
            Element::Statement(Statement::Print(Print::line(PrintMessage::Raw(
                "$@".to_string(),
            )))),
        )?;
        let id = self.alloc(BlockKind::Evaluation(Evaluation { catch }));
        self.block_mut(catch)?.root = Some(id);
        Ok(id)
    }

    /// Snapshot a routine for use as a value source.
    pub fn routine_call(&self, routine: BlockId, args: Vec<Argument>) -> CompileResult<RoutineCall> {
        match &self.block(routine)?.kind {
            BlockKind::Routine(r) => Ok(RoutineCall {
                routine,
                name: r.name().map(|n| n.to_string()),
                returns: r.returns().cloned(),
                args,
            }),
            other => Err(CompileError::structural(
                format!("Block {} is a {}, not a routine", routine, other.label()),
                "sealang.ir.arena.routine_call",
            )),
        }
    }

    /// Is `ancestor` on the root chain of `id` (or `id` itself)?
    pub fn is_ancestor(&self, ancestor: BlockId, id: BlockId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.get(current).and_then(|b| b.root);
        }
        false
    }

    pub fn append(&mut self, parent: BlockId, element: Element) -> CompileResult<()> {
        let issuer = "sealang.ir.arena.append";
        if self.block(parent)?.closed {
            return Err(CompileError::structural(
                format!(
                    "Block {} is closed. Impossible to add new element!",
                    parent
                ),
                issuer,
            ));
        }

        match element {
            Element::Block(child) => {
                if child == parent {
                    return Ok(());
                }
                let child_block = self.block(child)?;
                if matches!(child_block.kind, BlockKind::File(_)) {
                    return Err(CompileError::structural(
                        "A file block cannot be nested",
                        issuer,
                    ));
                }
                match child_block.root {
                    Some(root) if root == parent => return Ok(()),
                    Some(root) => {
                        return Err(CompileError::structural(
                            format!("Block {} already belongs to block {}", child, root),
                            issuer,
                        ));
                    }
                    None => {}
                }
                if self.is_ancestor(child, parent) {
                    return Err(CompileError::structural(
                        format!("Block {} is an ancestor of block {}", child, parent),
                        issuer,
                    ));
                }
                self.block_mut(child)?.root = Some(parent);
                self.block_mut(parent)?.elements.push(Element::Block(child));
            }
            Element::Statement(Statement::Dependency(dep)) => {
                let block = self.block_mut(parent)?;
                match &block.kind {
                    BlockKind::File(info) if info.header_done => {
                        block.elements.insert(0, Element::Statement(Statement::Dependency(dep)));
                    }
                    BlockKind::File(_) => {
                        block.elements.push(Element::Statement(Statement::Dependency(dep)));
                    }
                    other => {
                        return Err(CompileError::structural(
                            format!("Cannot add a dependency to a {} block", other.label()),
                            issuer,
                        ));
                    }
                }
            }
            Element::Statement(Statement::Return(ret)) => {
                let block = self.block_mut(parent)?;
                if let BlockKind::Routine(routine) = &mut block.kind {
                    routine.close(&ret)?;
                }
                block.elements.push(Element::Statement(Statement::Return(ret)));
                block.closed = true;
            }
            Element::Statement(Statement::Package(package)) => {
                let block = self.block_mut(parent)?;
                match &mut block.kind {
                    BlockKind::File(info) if info.is_module => {
                        info.package = Some(package.clone());
                        block.elements.push(Element::Statement(Statement::Package(package)));
                    }
                    _ => {
                        return Err(CompileError::structural(
                            "A package can only be declared at the top of a module file",
                            issuer,
                        ));
                    }
                }
            }
            Element::Statement(Statement::Signal(handler)) => {
                let routine = handler.routine();
                match &self.block(routine)?.kind {
                    BlockKind::Routine(_) => {}
                    other => {
                        return Err(CompileError::structural(
                            format!("Signal handler must be a routine, got a {}", other.label()),
                            issuer,
                        ));
                    }
                }
                if routine == parent || self.is_ancestor(routine, parent) {
                    return Err(CompileError::structural(
                        "A signal handler cannot be installed inside itself",
                        issuer,
                    ));
                }
                if self.block(routine)?.root.is_none() {
                    self.block_mut(routine)?.root = Some(parent);
                }
                self.block_mut(parent)?
                    .elements
                    .push(Element::Statement(Statement::Signal(handler)));
            }
            other => self.block_mut(parent)?.elements.push(other),
        }
        Ok(())
    }

    fn dump_block(&self, f: &mut fmt::Formatter<'_>, id: BlockId, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        let Some(block) = self.get(id) else {
            return writeln!(f, "{}<missing {}>", pad, id);
        };
        let closed = if block.closed { " closed" } else { "" };
        writeln!(f, "{}{} {}{}", pad, id, block.kind.label(), closed)?;
        if let BlockKind::Evaluation(e) = &block.kind {
            writeln!(f, "{}  catch:", pad)?;
            self.dump_block(f, e.catch, depth + 2)?;
        }
        for element in &block.elements {
            match element {
                Element::Text(t) => writeln!(f, "{}  text {:?}", pad, t)?,
                Element::Block(child) => self.dump_block(f, *child, depth + 1)?,
                Element::Value(v) => writeln!(
                    f,
                    "{}  value {} {}",
                    pad,
                    v.kind(),
                    v.display_name()
                )?,
                Element::Method(m) => {
                    writeln!(f, "{}  call {}.{}", pad, m.root_name(), m.method())?
                }
                Element::Statement(s) => writeln!(f, "{}  {}", pad, statement_label(s))?,
            }
        }
        Ok(())
    }
}

fn statement_label(statement: &Statement) -> String {
    match statement {
        Statement::Dependency(d) => format!("use {}", d.module()),
        Statement::Binding(b) => format!("bind ({})", b.names().join(", ")),
        Statement::Return(r) => format!("return x{}", r.values().len()),
        Statement::Print(_) => "print".to_string(),
        Statement::Assign(a) => format!("assign {}", a.target().name),
        Statement::Signal(s) => format!("signal {} -> {}", s.signal(), s.routine()),
        Statement::Exit(code) => format!("exit {}", code),
        Statement::Package(p) => format!("package {}", p),
    }
}

fn unknown_block(id: BlockId) -> CompileError {
    CompileError::structural(
        format!("Unknown block {}", id),
        "sealang.ir.arena",
    )
}

/// Tree dump of every block reachable from a root (`--dump ir`).
pub struct ArenaDump<'a> {
    pub arena: &'a IrArena,
    pub root: BlockId,
}

impl fmt::Display for ArenaDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.arena.dump_block(f, self.root, 0)
    }
}

impl IrArena {
    pub fn dump(&self, root: BlockId) -> ArenaDump<'_> {
        ArenaDump { arena: self, root }
    }
}
