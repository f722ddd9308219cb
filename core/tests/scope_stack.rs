use sealang_core::ir::{Element, Literal, Primitive, ValueSource};
use sealang_core::{ErrorKind, PrimitiveKind, ScopeStack, TypeRegistry, config::default_dependencies};

fn int(registry: &TypeRegistry, name: &str, value: i64) -> Primitive {
    Primitive::integer(registry, Some(name), value).expect("integer node")
}

#[test]
fn pop_at_root_is_structural_error() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &default_dependencies()).expect("stack");
    let err = stack.pop().expect_err("root pop must fail");
    assert_eq!(err.get_kind(), ErrorKind::Structural);

    // one push allows exactly one pop
    stack.push();
    stack.push();
    assert!(stack.pop().is_ok());
    assert!(stack.pop().is_ok());
    assert!(stack.is_root());
    assert!(stack.pop().is_err(), "third pop went past the root");
}

#[test]
fn scope_paths_follow_push_order() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    assert_eq!(stack.path().to_string(), "0");
    assert_eq!(stack.push().to_string(), "0.0");
    assert_eq!(stack.push().to_string(), "0.0.0");
    assert_eq!(stack.pop().expect("pop").to_string(), "0.0");
    assert_eq!(stack.push().to_string(), "0.0.1");
    assert_eq!(stack.depth(), 2);
}

#[test]
fn popped_block_merges_into_parent_and_bindings_die() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    stack.push();
    let inner = stack.current_block();
    stack.declare("x", int(&registry, "x", 1)).expect("declare");
    assert!(stack.resolve("x").is_some());

    stack.pop().expect("pop");
    assert!(stack.resolve("x").is_none(), "x leaked out of its scope");

    let file = stack.arena().block(stack.file()).expect("file block");
    assert!(
        matches!(file.elements().last(), Some(Element::Block(id)) if *id == inner),
        "inner block was not merged into the file"
    );
    let merged = stack.arena().block(inner).expect("inner block");
    assert_eq!(merged.elements().len(), 1);
    assert_eq!(merged.root(), Some(stack.file()));
}

#[test]
fn inner_declaration_shadows_outer() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    stack.declare("v", int(&registry, "v", 1)).expect("outer");
    stack.push();
    let shadow = Primitive::string(&registry, Some("v"), "s").expect("string");
    stack.declare("v", shadow).expect("inner");
    assert_eq!(stack.resolve("v").map(|n| n.kind()), Some(PrimitiveKind::String));
    stack.pop().expect("pop");
    assert_eq!(stack.resolve("v").map(|n| n.kind()), Some(PrimitiveKind::Integer));
}

#[test]
fn same_scope_redeclaration_overwrites() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    stack.declare("v", int(&registry, "v", 1)).expect("first");
    let again = Primitive::of_kind(
        &registry,
        PrimitiveKind::Scalar,
        Some("v"),
        None,
        ValueSource::Literal(Literal::str("x")),
    )
    .expect("scalar");
    stack.declare("v", again).expect("second");
    assert_eq!(stack.resolve("v").map(|n| n.kind()), Some(PrimitiveKind::Scalar));
}

#[test]
fn require_reports_undefined_variable() {
    let registry = TypeRegistry::standard();
    let stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    let err = stack.require("ghost").expect_err("ghost is not declared");
    assert_eq!(err.get_kind(), ErrorKind::UndefinedVariable);
}

#[test]
fn finish_refuses_open_scopes() {
    let registry = TypeRegistry::standard();
    let mut stack = ScopeStack::new(&registry, "t", false, &[]).expect("stack");
    stack.push();
    let err = stack.finish().expect_err("an open scope must be reported");
    assert_eq!(err.get_kind(), ErrorKind::Structural);
}
