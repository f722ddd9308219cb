//! file: core/src/compiler.rs
//! description: the compilation driver.
//!
//! Feeds every line of a `Script` through the classifier and applies the
//! resulting construct to a `ScopeStack`. Any error stops the run at the
//! line that caused it; nothing is written unless the whole file compiled
//! and rendered.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::CompilerConfig;
use crate::emit::Emitter;
use crate::error::{CompileError, CompileResult, SeaErrorExt};
use crate::ir::{
    Argument, Assignment, BindingMode, BlockId, Branch, ConditionExpr, Dependency, Element,
    IrArena, Literal, MethodCall, Parameter, Primitive, Print, PrintMessage, Renderer, ReturnStatement,
    ReturnValue, Signal, Statement, ValueRef, ValueSource, render::native_literal, render::perl_quote,
};
use crate::location::{Location, Span};
use crate::scope::ScopeStack;
use crate::script::Script;
use crate::syntax::{self, Construct, MethodChain, Param, TypeSpec, ValueExpr};
use crate::types::{PrimitiveKind, TypeRegistry};

/// A compiled file: the IR arena and its File block.
#[derive(Debug)]
pub struct Compilation {
    pub name: String,
    pub arena: IrArena,
    pub root: BlockId,
    tab_size: usize,
}

impl Compilation {
    pub fn emitter(&self) -> Emitter<'_> {
        Emitter::new(&self.arena, self.tab_size)
    }

    /// Unformatted render of the File block.
    pub fn render(&self) -> CompileResult<String> {
        self.emitter().render(self.root)
    }

    /// Final text, as it would be written.
    pub fn text(&self) -> CompileResult<String> {
        self.emitter().text(self.root)
    }

    pub fn write(&self, dir: &Path, extension: &str) -> CompileResult<PathBuf> {
        self.emitter().write(self.root, dir, extension)
    }

    pub fn dump_ir(&self) -> String {
        self.arena.dump(self.root).to_string()
    }
}

pub struct Compiler {
    config: CompilerConfig,
    registry: TypeRegistry,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new(CompilerConfig::default())
    }
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        Compiler {
            config,
            registry: TypeRegistry::standard(),
        }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn compile(&self, script: &Script) -> Result<Compilation, Box<dyn SeaErrorExt>> {
        let name = script.stem();
        let mut stack = ScopeStack::new(
            &self.registry,
            &name,
            self.config.module,
            &self.config.default_dependencies,
        )?;
        stack.append(Element::Text("\n".to_string()))?;

        let mut last_line = 0;
        for (number, text) in script.lines() {
            last_line = number;
            let located = |e: CompileError| {
                e.at(
                    Location::of_line(&script.name, number, text),
                    Some(Span::of_line(&script.name, number, text)),
                )
            };
            let construct = syntax::classify(text).map_err(located)?;
            debug!("{}:{} {}", script.name, number, construct.label());
            self.apply(&mut stack, construct).map_err(located)?;
        }

        let (arena, root) = stack.finish().map_err(|e| {
            e.at(Location::new(script.name.clone(), last_line, 1), None)
        })?;
        info!("compiled {} ({} lines, {} blocks)", script.name, last_line, arena.len());
        Ok(Compilation {
            name,
            arena,
            root,
            tab_size: self.config.tab_size,
        })
    }

    /// Compile and write `<out_dir>/<stem>.<extension>`.
    pub fn build(&self, script: &Script, out_dir: &Path) -> Result<PathBuf, Box<dyn SeaErrorExt>> {
        let compilation = self.compile(script)?;
        Ok(compilation.write(out_dir, &self.config.extension)?)
    }

    fn apply(&self, stack: &mut ScopeStack, construct: Construct) -> CompileResult<()> {
        match construct {
            Construct::Blank => stack.append(Element::Text("\n".to_string())),
            Construct::Comment => Ok(()),
            Construct::OpenScope => {
                stack.push();
                Ok(())
            }
            Construct::CloseScope => stack.pop().map(|_| ()),
            Construct::Import { module, symbols } => {
                stack.import(Dependency::new(&module, symbols)?)
            }
            Construct::Package { module } => {
                stack.set_package(crate::ir::stmt::module_path(&module)?)
            }
            Construct::Declare { kind, name, value } => {
                let node = self.build_value(stack, &kind, Some(&name), value)?;
                debug!("declare {} {}", node.kind(), name);
                stack.declare(&name, node).map(|_| ())
            }
            Construct::Assign { name, value } => {
                let target = stack.require(&name)?.clone();
                let source = self.value_source(stack, value)?;
                let node = Primitive::of_kind(
                    &self.registry,
                    target.kind(),
                    None,
                    target.template_kind(),
                    source,
                )?;
                debug!("reassign {} ({})", name, target.kind());
                stack.append(Element::Statement(Statement::Assign(Assignment::new(
                    &target, node,
                )?)))
            }
            Construct::MethodChain { receiver, chain } => {
                let target = ValueRef::of(stack.require(&receiver)?)?;
                for invocation in MethodChain::new(&chain) {
                    let invocation = invocation?;
                    let args = self.raw_arguments(stack, &invocation.arguments()?);
                    stack.append(Element::Method(MethodCall::on(
                        target.clone(),
                        invocation.method,
                        args,
                    )))?;
                }
                Ok(())
            }
            Construct::Routine {
                name,
                params,
                returns,
            } => self.open_routine(stack, name, params, returns),
            Construct::Return { values } => {
                let mut returned = Vec::with_capacity(values.len());
                for value in values {
                    returned.push(self.return_value(stack, value)?);
                }
                let statement = match returned.len() {
                    0 => ReturnStatement::empty(),
                    1 => ReturnStatement::single(returned.remove(0)),
                    _ => ReturnStatement::multiple(returned),
                };
                stack.append(Element::Statement(Statement::Return(statement)))
            }
            Construct::Condition { branch, value } => {
                let expr = match value {
                    Some(ValueExpr::Reference(name)) => {
                        Some(ConditionExpr::Value(ValueRef::of(stack.require(&name)?)?))
                    }
                    Some(other) => Some(ConditionExpr::Raw(self.inline_expr(stack, other)?)),
                    None => None,
                };
                if branch != Branch::If {
                    self.check_branch_follows_condition(stack, branch)?;
                }
                let block = stack.arena_mut().new_condition(branch, expr)?;
                stack.enter(block).map(|_| ())
            }
            Construct::Loop { element, iterable } => {
                let collection = stack.require(&iterable)?.clone();
                match collection.kind() {
                    PrimitiveKind::Map => {
                        let block = stack.arena_mut().new_map_loop(&collection, &element)?;
                        stack.enter(block)?;
                        let item = Primitive::placeholder(
                            &self.registry,
                            &element,
                            collection.template_kind().unwrap_or(PrimitiveKind::Scalar),
                        );
                        stack.bind(&element, item);
                    }
                    _ => {
                        let (block, item) =
                            stack
                                .arena_mut()
                                .new_array_loop(&self.registry, &collection, &element)?;
                        stack.enter(block)?;
                        stack.bind(&element, item);
                    }
                }
                Ok(())
            }
            Construct::Try => {
                let block = stack.arena_mut().new_evaluation()?;
                stack.enter(block).map(|_| ())
            }
            Construct::Signal { name, param } => {
                let signal = Signal::parse(&name)?;
                let params = param.iter().map(|p| Parameter::plain(p)).collect();
                let routine =
                    stack
                        .arena_mut()
                        .new_routine(None, params, BindingMode::Shift, None)?;
                stack.enter_signal(signal, routine)?;
                if let Some(param) = &param {
                    let node = Primitive::placeholder(&self.registry, param, PrimitiveKind::Scalar);
                    stack.bind(param, node);
                }
                Ok(())
            }
            Construct::Print { value } => {
                let message = match value {
                    None => PrintMessage::Empty,
                    Some(ValueExpr::Reference(name)) => {
                        PrintMessage::Value(ValueRef::of(stack.require(&name)?)?)
                    }
                    Some(ValueExpr::Literal(Literal::Str(s) | Literal::Number(s))) => {
                        PrintMessage::Raw(perl_quote(&s))
                    }
                    Some(other) => PrintMessage::Raw(self.inline_expr(stack, other)?),
                };
                stack.append(Element::Statement(Statement::Print(Print::line(message))))
            }
            Construct::Exit { code } => stack.append(Element::Statement(Statement::Exit(code))),
        }
    }

    /// `elif`/`else` must directly follow an `if`/`elif` block of the same
    /// scope.
    fn check_branch_follows_condition(&self, stack: &ScopeStack, branch: Branch) -> CompileResult<()> {
        let arena = stack.arena();
        let previous = arena
            .block(stack.current_block())?
            .elements()
            .iter()
            .rev()
            .find(|e| !matches!(e, Element::Text(_)));
        let follows = match previous {
            Some(Element::Block(id)) => matches!(
                arena.block(*id)?.kind(),
                crate::ir::BlockKind::Condition(c) if c.branch() != Branch::Else
            ),
            _ => false,
        };
        if follows {
            Ok(())
        } else {
            Err(CompileError::structural(
                format!("{} without a preceding if", branch.keyword()),
                "sealang.compiler.condition",
            ))
        }
    }

    fn open_routine(
        &self,
        stack: &mut ScopeStack,
        name: Option<String>,
        params: Vec<Param>,
        returns: Option<TypeSpec>,
    ) -> CompileResult<()> {
        let declared = match &returns {
            Some(spec) => Some(self.registry.lookup(&spec.name)?.kind),
            None => None,
        };
        let mut bindings = Vec::with_capacity(params.len());
        let mut parameters = Vec::with_capacity(params.len());
        for param in &params {
            let (kind, template) = match &param.kind {
                Some(spec) => {
                    let kind = self.registry.lookup(&spec.name)?.kind;
                    let template = match &spec.template {
                        Some(t) => Some(self.registry.lookup_template(t)?),
                        None => None,
                    };
                    (kind, template)
                }
                None => (PrimitiveKind::Scalar, None),
            };
            let node = Primitive::of_kind(
                &self.registry,
                kind,
                Some(&param.name),
                template,
                ValueSource::Literal(Literal::Undef),
            )?;
            parameters.push(if kind.casts_to_scalar() {
                Parameter::wrapped(&param.name, self.registry.class_of(kind))
            } else {
                Parameter::plain(&param.name)
            });
            bindings.push((param.name.clone(), node));
        }

        let block = stack.arena_mut().new_routine(
            name.as_deref(),
            parameters,
            BindingMode::Destructure,
            declared,
        )?;
        if let Some(name) = &name {
            stack.declare_routine(name, block);
        }
        stack.enter(block)?;
        for (param, node) in bindings {
            stack.bind(&param, node);
        }
        debug!("routine {}", name.as_deref().unwrap_or("<anonymous>"));
        Ok(())
    }

    fn build_value(
        &self,
        stack: &ScopeStack,
        kind: &TypeSpec,
        name: Option<&str>,
        value: ValueExpr,
    ) -> CompileResult<Primitive> {
        let entry = self.registry.lookup(&kind.name)?;
        let template = match &kind.template {
            Some(t) => Some(self.registry.lookup_template(t)?),
            None => None,
        };
        let source = self.value_source(stack, value)?;
        Primitive::of_kind(&self.registry, entry.kind, name, template, source)
    }

    fn value_source(&self, stack: &ScopeStack, value: ValueExpr) -> CompileResult<ValueSource> {
        match value {
            ValueExpr::Literal(lit) => Ok(ValueSource::Literal(lit)),
            ValueExpr::Argv => Ok(ValueSource::Argv),
            ValueExpr::Reference(name) => {
                Ok(ValueSource::Reference(ValueRef::of(stack.require(&name)?)?))
            }
            ValueExpr::RoutineCall { name, args } => {
                let routine = stack
                    .resolve_routine(&name)
                    .ok_or_else(|| CompileError::undefined_variable(&name, "sealang.compiler.call"))?;
                let args = self.call_arguments(stack, args)?;
                Ok(ValueSource::Routine(stack.arena().routine_call(routine, args)?))
            }
            ValueExpr::MethodCall { receiver, chain } => {
                let receiver = ValueRef::of(stack.require(&receiver)?)?;
                let mut call: Option<MethodCall> = None;
                for invocation in MethodChain::new(&chain) {
                    let invocation = invocation?;
                    let args = self.raw_arguments(stack, &invocation.arguments()?);
                    call = Some(match call {
                        None => MethodCall::on(receiver.clone(), invocation.method, args),
                        Some(previous) => previous.then(invocation.method, args),
                    });
                }
                call.map(ValueSource::Method).ok_or_else(|| {
                    CompileError::unsupported(
                        format!("Empty method chain on {}", receiver.name),
                        "sealang.compiler.method",
                    )
                })
            }
        }
    }

    /// Arguments of a routine call.
    fn call_arguments(&self, stack: &ScopeStack, args: Vec<ValueExpr>) -> CompileResult<Vec<Argument>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            out.push(match arg {
                ValueExpr::Reference(name) => Argument::Bound(ValueRef::of(stack.require(&name)?)?),
                ValueExpr::Literal(lit) => Argument::Raw(native_literal(&lit)),
                other => Argument::Raw(self.inline_expr(stack, other)?),
            });
        }
        Ok(out)
    }

    /// Method arguments are raw text; a bare name bound in scope becomes a
    /// reference to that node.
    fn raw_arguments(&self, stack: &ScopeStack, args: &[&str]) -> Vec<Argument> {
        args.iter()
            .map(|arg| {
                if is_identifier(arg) {
                    if let Some(node) = stack.resolve(arg) {
                        if let Ok(bound) = ValueRef::of(node) {
                            return Argument::Bound(bound);
                        }
                    }
                }
                Argument::raw(arg)
            })
            .collect()
    }

    fn return_value(&self, stack: &ScopeStack, value: ValueExpr) -> CompileResult<ReturnValue> {
        match value {
            ValueExpr::Reference(name) => Ok(ReturnValue::Node(stack.require(&name)?.clone())),
            ValueExpr::Literal(lit) => Ok(ReturnValue::Raw(native_literal(&lit))),
            other => Ok(ReturnValue::Raw(self.inline_expr(stack, other)?)),
        }
    }

    /// Render a value as an inline expression of unknown kind.
    fn inline_expr(&self, stack: &ScopeStack, value: ValueExpr) -> CompileResult<String> {
        let renderer = Renderer::new(stack.arena());
        match value {
            ValueExpr::Literal(lit) => Ok(native_literal(&lit)),
            ValueExpr::Argv => Ok(format!(
                "{}->new(@ARGV)",
                self.registry.class_of(PrimitiveKind::Array)
            )),
            ValueExpr::Reference(name) => Ok(ValueRef::of(stack.require(&name)?)?.accessor()),
            ValueExpr::RoutineCall { name, args } => {
                let routine = stack
                    .resolve_routine(&name)
                    .ok_or_else(|| CompileError::undefined_variable(&name, "sealang.compiler.call"))?;
                let args = self.call_arguments(stack, args)?;
                renderer.render_call(&stack.arena().routine_call(routine, args)?)
            }
            method @ ValueExpr::MethodCall { .. } => match self.value_source(stack, method)? {
                ValueSource::Method(call) => renderer.render_method(&call),
                _ => Err(CompileError::unsupported(
                    "Expected a method call",
                    "sealang.compiler.inline_expr",
                )),
            },
        }
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
