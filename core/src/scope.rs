//! file: core/src/scope.rs
//! description: the lexical scope stack.
//!
//! Each live scope owns a variable table, a routine table and exactly one IR
//! block. New elements always land in the block of the innermost scope;
//! popping a scope merges its block into the parent's block. The stack never
//! becomes empty: the root scope is bound to the File block.

use std::collections::HashMap;
use std::fmt;

use log::{debug, warn};

use crate::error::{CompileError, CompileResult};
use crate::ir::{
    BlockId, BlockKind, Dependency, Element, IrArena, Primitive, Signal, SignalHandler, Statement,
};
use crate::types::TypeRegistry;

/// Position of a scope: the root is `[0]`, a child appends its ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopePath(Vec<usize>);

impl ScopePath {
    pub fn root() -> Self {
        ScopePath(vec![0])
    }

    pub fn child(&self, ordinal: usize) -> Self {
        let mut path = self.0.clone();
        path.push(ordinal);
        ScopePath(path)
    }

    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Block,
    Signal(Signal),
}

#[derive(Debug)]
struct Scope {
    path: ScopePath,
    block: BlockId,
    variables: HashMap<String, Primitive>,
    routines: HashMap<String, BlockId>,
    children: usize,
    merge: Merge,
}

impl Scope {
    fn new(path: ScopePath, block: BlockId, merge: Merge) -> Self {
        Scope {
            path,
            block,
            variables: HashMap::new(),
            routines: HashMap::new(),
            children: 0,
            merge,
        }
    }
}

pub struct ScopeStack<'r> {
    registry: &'r TypeRegistry,
    arena: IrArena,
    file: BlockId,
    scopes: Vec<Scope>,
}

impl<'r> ScopeStack<'r> {
    /// Root scope bound to a fresh File block carrying `preamble`.
    pub fn new(
        registry: &'r TypeRegistry,
        file_name: &str,
        is_module: bool,
        preamble: &[String],
    ) -> CompileResult<Self> {
        let mut arena = IrArena::new();
        let file = arena.new_file(file_name, is_module, preamble)?;
        Ok(ScopeStack {
            registry,
            arena,
            file,
            scopes: vec![Scope::new(ScopePath::root(), file, Merge::Block)],
        })
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn arena(&self) -> &IrArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut IrArena {
        &mut self.arena
    }

    pub fn file(&self) -> BlockId {
        self.file
    }

    fn top(&self) -> &Scope {
        // `scopes` is never empty: pop refuses to remove the root.
        &self.scopes[self.scopes.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn path(&self) -> ScopePath {
        self.top().path.clone()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn is_root(&self) -> bool {
        self.scopes.len() == 1
    }

    pub fn current_block(&self) -> BlockId {
        self.top().block
    }

    /// Open a plain scope.
    pub fn push(&mut self) -> ScopePath {
        let block = self.arena.new_plain();
        self.open(block, Merge::Block)
    }

    /// Open a scope bound to a fresh block of the given kind.
    pub fn push_block(&mut self, kind: BlockKind) -> CompileResult<ScopePath> {
        if matches!(kind, BlockKind::File(_)) {
            return Err(CompileError::structural(
                "A file block cannot open a nested scope",
                "sealang.scope.push_block",
            ));
        }
        let block = self.arena.alloc(kind);
        Ok(self.open(block, Merge::Block))
    }

    /// Open a scope bound to a block already built in the arena.
    pub fn enter(&mut self, block: BlockId) -> CompileResult<ScopePath> {
        let existing = self.arena.block(block)?;
        if existing.root().is_some() || matches!(existing.kind(), BlockKind::File(_)) {
            return Err(CompileError::structural(
                format!("Block {} is already attached and cannot open a scope", block),
                "sealang.scope.enter",
            ));
        }
        Ok(self.open(block, Merge::Block))
    }

    /// Open a scope whose routine block is installed as a signal handler
    /// when the scope closes.
    pub fn enter_signal(&mut self, signal: Signal, routine: BlockId) -> CompileResult<ScopePath> {
        if !matches!(self.arena.block(routine)?.kind(), BlockKind::Routine(_)) {
            return Err(CompileError::structural(
                "A signal handler scope needs a routine block",
                "sealang.scope.enter_signal",
            ));
        }
        Ok(self.open(routine, Merge::Signal(signal)))
    }

    fn open(&mut self, block: BlockId, merge: Merge) -> ScopePath {
        let parent = self.top_mut();
        let ordinal = parent.children;
        parent.children += 1;
        let path = parent.path.child(ordinal);
        debug!("open scope {} ({})", path, block);
        self.scopes.push(Scope::new(path.clone(), block, merge));
        path
    }

    /// Close the innermost scope and merge its block into the parent block.
    pub fn pop(&mut self) -> CompileResult<ScopePath> {
        if self.is_root() {
            return Err(CompileError::structural(
                "Cannot close the root scope: no scope is open",
                "sealang.scope.pop",
            ));
        }
        let scope = self.top();
        let (block, merge) = (scope.block, scope.merge);
        let parent = self.scopes[self.scopes.len() - 2].block;
        match merge {
            Merge::Block => self.arena.append(parent, Element::Block(block))?,
            Merge::Signal(signal) => self.arena.append(
                parent,
                Element::Statement(Statement::Signal(SignalHandler::new(signal, block))),
            )?,
        }
        if let Some(closed) = self.scopes.pop() {
            debug!("close scope {} ({})", closed.path, closed.block);
        }
        Ok(self.path())
    }

    /// Bind `name` in the current scope and append the node to its block.
    pub fn declare(&mut self, name: &str, node: Primitive) -> CompileResult<ScopePath> {
        let block = self.current_block();
        self.arena.append(block, Element::Value(node.clone()))?;
        self.bind(name, node);
        Ok(self.path())
    }

    /// Bind without emitting anything (parameters, loop elements).
    pub fn bind(&mut self, name: &str, node: Primitive) {
        if self.scopes.len() > 1
            && self.scopes[..self.scopes.len() - 1]
                .iter()
                .any(|s| s.variables.contains_key(name))
        {
            warn!("{} shadows an outer variable of the same name", name);
        }
        self.top_mut().variables.insert(name.to_string(), node);
    }

    /// Innermost binding of `name`.
    pub fn resolve(&self, name: &str) -> Option<&Primitive> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.variables.get(name))
    }

    pub fn require(&self, name: &str) -> CompileResult<&Primitive> {
        self.resolve(name)
            .ok_or_else(|| CompileError::undefined_variable(name, "sealang.scope.resolve"))
    }

    pub fn declare_routine(&mut self, name: &str, routine: BlockId) {
        self.top_mut().routines.insert(name.to_string(), routine);
    }

    pub fn resolve_routine(&self, name: &str) -> Option<BlockId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.routines.get(name).copied())
    }

    pub fn append(&mut self, element: Element) -> CompileResult<()> {
        let block = self.current_block();
        self.arena.append(block, element)
    }

    /// Dependencies always go to the File, whatever scope is open.
    pub fn import(&mut self, dependency: Dependency) -> CompileResult<()> {
        debug!("import {}", dependency.module());
        self.arena
            .append(self.file, Element::Statement(Statement::Dependency(dependency)))
    }

    pub fn set_package(&mut self, package: String) -> CompileResult<()> {
        self.arena
            .append(self.file, Element::Statement(Statement::Package(package)))
    }

    /// Hand the arena back once every scope is closed.
    pub fn finish(self) -> CompileResult<(IrArena, BlockId)> {
        if !self.is_root() {
            return Err(CompileError::structural(
                format!(
                    "{} scope(s) still open at end of input (innermost {})",
                    self.depth(),
                    self.path()
                ),
                "sealang.scope.finish",
            ));
        }
        Ok((self.arena, self.file))
    }
}
