use sealang_core::ir::{IrArena, Literal, Primitive, Renderer, ValueRef, ValueSource};
use sealang_core::{ErrorKind, PrimitiveKind, TypeRegistry};

fn render(node: &Primitive) -> String {
    let arena = IrArena::new();
    Renderer::new(&arena)
        .render_constructor(node, false)
        .expect("render")
}

fn literal(kind: &str, template: Option<&str>, lit: Literal) -> Result<Primitive, ErrorKind> {
    let registry = TypeRegistry::standard();
    Primitive::construct(&registry, kind, Some("v"), template, ValueSource::Literal(lit))
        .map_err(|e| e.get_kind())
}

#[test]
fn int_literal_is_wrapped_verbatim() {
    let registry = TypeRegistry::standard();
    for n in [0_i64, 5, -17, 4096] {
        let node = Primitive::integer(&registry, Some("x"), n).expect("integer");
        let text = render(&node);
        assert_eq!(text, format!("my $x = stdlib::integer->new({});\n", n));

        // the wrapped literal reads back as the same number
        let inner = text
            .trim_start_matches("my $x = stdlib::integer->new(")
            .trim_end_matches(");\n");
        assert_eq!(inner.parse::<i64>().expect("number"), n);
    }
}

#[test]
fn scalar_literals_by_kind() {
    let cases = [
        ("String", Literal::str("hi"), "my $v = stdlib::string->new(\"hi\");\n"),
        ("String", Literal::int(3), "my $v = stdlib::string->new(\"3\");\n"),
        ("Boolean", Literal::Bool(true), "my $v = stdlib::boolean->new(1);\n"),
        ("Boolean", Literal::Bool(false), "my $v = stdlib::boolean->new(0);\n"),
        ("Scalar", Literal::str("a$b"), "my $v = \"a\\$b\";\n"),
        ("Scalar", Literal::Number("2.5".to_string()), "my $v = 2.5;\n"),
        ("Scalar", Literal::Undef, "my $v = undef;\n"),
        ("Int", Literal::Undef, "my $v = stdlib::integer->new();\n"),
        ("Hash", Literal::Undef, "my $v = {};\n"),
    ];
    for (kind, lit, expected) in cases {
        let node = literal(kind, None, lit).expect("valid literal");
        assert_eq!(render(&node), expected, "kind {}", kind);
    }
}

#[test]
fn mismatched_literal_shapes_are_rejected() {
    let cases = [
        ("Int", Literal::str("five")),
        ("Int", Literal::Number("1.5".to_string())),
        ("Boolean", Literal::int(1)),
        ("String", Literal::Bool(true)),
        ("Scalar", Literal::List(vec![Literal::int(1)])),
        ("Hash", Literal::List(vec![])),
        ("Array", Literal::Object(vec![])),
    ];
    for (kind, lit) in cases {
        let err = literal(kind, None, lit.clone()).expect_err("literal must be refused");
        assert_eq!(err, ErrorKind::InvalidLiteral, "{} <- {:?}", kind, lit);
    }
}

#[test]
fn array_elements_go_through_the_template_constructor() {
    let registry = TypeRegistry::standard();
    let node = Primitive::array(
        &registry,
        Some("xs"),
        Some(PrimitiveKind::Integer),
        vec![Literal::int(1), Literal::int(2), Literal::int(3)],
    )
    .expect("array");
    assert_eq!(
        render(&node),
        "my $xs = stdlib::array->new(stdlib::integer->new(1),stdlib::integer->new(2),stdlib::integer->new(3));\n"
    );
}

#[test]
fn untemplated_array_uses_native_elements() {
    let node = literal(
        "Array",
        None,
        Literal::List(vec![
            Literal::str("a"),
            Literal::Bool(true),
            Literal::List(vec![Literal::int(1)]),
        ]),
    )
    .expect("array");
    assert_eq!(node.template_kind(), Some(PrimitiveKind::Scalar));
    assert_eq!(render(&node), "my $v = stdlib::array->new(\"a\",1,[1]);\n");
}

#[test]
fn map_and_hash_objects() {
    let fields = vec![
        ("a".to_string(), Literal::int(1)),
        ("two words".to_string(), Literal::int(2)),
    ];
    let map = literal("Map", Some("Int"), Literal::Object(fields.clone())).expect("map");
    assert_eq!(
        render(&map),
        "my $v = stdlib::hashmap->new({a => stdlib::integer->new(1),\"two words\" => stdlib::integer->new(2)});\n"
    );
    let hash = literal("Hash", None, Literal::Object(fields)).expect("hash");
    assert_eq!(render(&hash), "my $v = {a => 1,\"two words\" => 2};\n");
}

#[test]
fn template_on_a_non_container_is_unknown_type() {
    let err = literal("Int", Some("String"), Literal::int(1)).expect_err("Int<String>");
    assert_eq!(err, ErrorKind::UnknownType);
    let err = literal("Array", Some("Hash"), Literal::List(vec![])).expect_err("Array<Hash>");
    assert_eq!(err, ErrorKind::UnknownType);
    let err = literal("Float", None, Literal::int(1)).expect_err("Float");
    assert_eq!(err, ErrorKind::UnknownType);
}

#[test]
fn references_follow_the_compatibility_table() {
    let registry = TypeRegistry::standard();
    let from = |target: PrimitiveKind, source: PrimitiveKind| {
        Primitive::of_kind(
            &registry,
            target,
            Some("t"),
            None,
            ValueSource::Reference(ValueRef::new("s", source)),
        )
    };

    let node = from(PrimitiveKind::String, PrimitiveKind::String).expect("exact");
    assert_eq!(render(&node), "my $t = stdlib::string->new($s->valueOf());\n");

    let node = from(PrimitiveKind::Scalar, PrimitiveKind::Integer).expect("cast");
    assert!(node.casts_to_scalar());
    assert_eq!(render(&node), "my $t = $s->valueOf();\n");

    let node = from(PrimitiveKind::Array, PrimitiveKind::Array).expect("clone");
    assert_eq!(render(&node), "my $t = $s->clone();\n");

    let node = from(PrimitiveKind::Hash, PrimitiveKind::Hash).expect("copy");
    assert_eq!(render(&node), "my $t = { %{$s} };\n");

    let err = from(PrimitiveKind::Integer, PrimitiveKind::String).expect_err("mismatch");
    assert_eq!(err.get_kind(), ErrorKind::TypeMismatch);
    let err = from(PrimitiveKind::Integer, PrimitiveKind::Scalar).expect_err("no reverse cast");
    assert_eq!(err.get_kind(), ErrorKind::TypeMismatch);
}

#[test]
fn container_references_compare_element_kinds() {
    let registry = TypeRegistry::standard();
    let from = |target: Option<PrimitiveKind>, source: ValueRef| {
        Primitive::of_kind(
            &registry,
            PrimitiveKind::Array,
            Some("t"),
            target,
            ValueSource::Reference(source),
        )
    };
    let strings = ValueRef::new("s", PrimitiveKind::Array).with_template(PrimitiveKind::String);

    let node = from(Some(PrimitiveKind::String), strings.clone()).expect("same elements");
    assert_eq!(render(&node), "my $t = $s->clone();\n");
    from(None, strings.clone()).expect("scalar elements take anything");

    let err = from(Some(PrimitiveKind::Integer), strings).expect_err("strings into Array<Int>");
    assert_eq!(err.get_kind(), ErrorKind::TypeMismatch);
    assert!(err.to_string().contains("array<string>"), "{}", err);

    let untyped = ValueRef::new("s", PrimitiveKind::Array);
    let err = from(Some(PrimitiveKind::Boolean), untyped).expect_err("unknown elements");
    assert_eq!(err.get_kind(), ErrorKind::TypeMismatch);
}

#[test]
fn anonymous_nodes_render_inline() {
    let registry = TypeRegistry::standard();
    let node = Primitive::string(&registry, None, "q\"uote").expect("string");
    let arena = IrArena::new();
    let text = Renderer::new(&arena)
        .render_constructor(&node, true)
        .expect("render");
    assert_eq!(text, "stdlib::string->new(\"q\\\"uote\")");
}
