use crate::error::CompileResult;
use crate::ir::value::{Primitive, ValueRef};

/// One argument of a routine or method call.
#[derive(Debug, Clone)]
pub enum Argument {
    /// A bound node, passed through its accessor.
    Bound(ValueRef),
    /// An anonymous node, rendered inline.
    Inline(Box<Primitive>),
    /// Verbatim text.
    Raw(String),
}

impl Argument {
    pub fn raw(text: &str) -> Self {
        Argument::Raw(text.trim().to_string())
    }
}

#[derive(Debug, Clone)]
pub enum Receiver {
    Value(ValueRef),
    /// The result of a previous call in the same chain.
    Call(Box<MethodCall>),
}

/// `$receiver->method(args)`.
#[derive(Debug, Clone)]
pub struct MethodCall {
    receiver: Receiver,
    method: String,
    args: Vec<Argument>,
}

impl MethodCall {
    pub fn new(receiver: &Primitive, method: &str, args: Vec<Argument>) -> CompileResult<Self> {
        Ok(MethodCall {
            receiver: Receiver::Value(ValueRef::of(receiver)?),
            method: method.to_string(),
            args,
        })
    }

    pub fn on(receiver: ValueRef, method: &str, args: Vec<Argument>) -> Self {
        MethodCall {
            receiver: Receiver::Value(receiver),
            method: method.to_string(),
            args,
        }
    }

    /// Call `method` on the result of `self`.
    pub fn then(self, method: &str, args: Vec<Argument>) -> Self {
        MethodCall {
            receiver: Receiver::Call(Box::new(self)),
            method: method.to_string(),
            args,
        }
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Name of the node at the head of the chain.
    pub fn root_name(&self) -> &str {
        match &self.receiver {
            Receiver::Value(r) => &r.name,
            Receiver::Call(inner) => inner.root_name(),
        }
    }
}
