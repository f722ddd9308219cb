use sealang_core::ErrorKind;
use sealang_core::ir::{Branch, Literal};
use sealang_core::syntax::{Construct, MethodChain, Param, TypeSpec, ValueExpr, classify, split_args};

fn parse(line: &str) -> Construct {
    classify(line).unwrap_or_else(|e| panic!("'{}' did not classify: {}", line, e))
}

#[test]
fn blank_and_comment_lines() {
    assert_eq!(parse(""), Construct::Blank);
    assert_eq!(parse("    \t"), Construct::Blank);
    assert_eq!(parse("   // note { }"), Construct::Comment);
}

#[test]
fn declarations_with_templates() {
    assert_eq!(
        parse("  Array<Int> xs = [1, 2]"),
        Construct::Declare {
            kind: TypeSpec {
                name: "Array".to_string(),
                template: Some("Int".to_string()),
            },
            name: "xs".to_string(),
            value: ValueExpr::Literal(Literal::List(vec![Literal::int(1), Literal::int(2)])),
        }
    );
    match parse("Map<String> m = {a: \"x\", \"b c\" => 'y'}") {
        Construct::Declare {
            value: ValueExpr::Literal(Literal::Object(fields)),
            ..
        } => {
            assert_eq!(
                fields,
                vec![
                    ("a".to_string(), Literal::str("x")),
                    ("b c".to_string(), Literal::str("y")),
                ]
            );
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn literal_values() {
    let value = |line: &str| match parse(line) {
        Construct::Declare { value, .. } => value,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(value("Scalar s = \"a\\nb\""), ValueExpr::Literal(Literal::str("a\nb")));
    assert_eq!(value("Scalar s = -2.50"), ValueExpr::Literal(Literal::Number("-2.50".to_string())));
    assert_eq!(value("Boolean b = false"), ValueExpr::Literal(Literal::Bool(false)));
    assert_eq!(value("Scalar s = null"), ValueExpr::Literal(Literal::Undef));
    assert_eq!(value("Scalar s = other"), ValueExpr::Reference("other".to_string()));
    assert_eq!(
        value("Int n = add(1, x)"),
        ValueExpr::RoutineCall {
            name: "add".to_string(),
            args: vec![
                ValueExpr::Literal(Literal::int(1)),
                ValueExpr::Reference("x".to_string()),
            ],
        }
    );
    assert_eq!(value("Array args = argv()"), ValueExpr::Argv);
    assert_eq!(value("Scalar s = argv"), ValueExpr::Reference("argv".to_string()));
    assert_eq!(
        value("Int n = argvx()"),
        ValueExpr::RoutineCall {
            name: "argvx".to_string(),
            args: vec![],
        }
    );
    assert_eq!(
        value("Int n = xs.get(0).add(1)"),
        ValueExpr::MethodCall {
            receiver: "xs".to_string(),
            chain: ".get(0).add(1)".to_string(),
        }
    );
}

#[test]
fn statements() {
    assert_eq!(parse("{"), Construct::OpenScope);
    assert_eq!(parse("  }"), Construct::CloseScope);
    assert_eq!(
        parse("import {a, b} from module.sub"),
        Construct::Import {
            module: "module.sub".to_string(),
            symbols: Some(vec!["a".to_string(), "b".to_string()]),
        }
    );
    assert_eq!(
        parse("import * from stdlib::util"),
        Construct::Import {
            module: "stdlib::util".to_string(),
            symbols: None,
        }
    );
    assert_eq!(
        parse("sub add(Int a, b) -> Int {"),
        Construct::Routine {
            name: Some("add".to_string()),
            params: vec![
                Param {
                    name: "a".to_string(),
                    kind: Some(TypeSpec {
                        name: "Int".to_string(),
                        template: None,
                    }),
                },
                Param {
                    name: "b".to_string(),
                    kind: None,
                },
            ],
            returns: Some(TypeSpec {
                name: "Int".to_string(),
                template: None,
            }),
        }
    );
    assert_eq!(
        parse("sub () {"),
        Construct::Routine {
            name: None,
            params: vec![],
            returns: None,
        }
    );
    assert_eq!(parse("return"), Construct::Return { values: vec![] });
    assert_eq!(
        parse("elif ready {"),
        Construct::Condition {
            branch: Branch::Elif,
            value: Some(ValueExpr::Reference("ready".to_string())),
        }
    );
    assert_eq!(
        parse("else {"),
        Construct::Condition {
            branch: Branch::Else,
            value: None,
        }
    );
    assert_eq!(
        parse("for item in items {"),
        Construct::Loop {
            element: "item".to_string(),
            iterable: "items".to_string(),
        }
    );
    assert_eq!(parse("try {"), Construct::Try);
    assert_eq!(
        parse("signal SIGINT {"),
        Construct::Signal {
            name: "SIGINT".to_string(),
            param: None,
        }
    );
    assert_eq!(
        parse("signal HUP(sig) {"),
        Construct::Signal {
            name: "HUP".to_string(),
            param: Some("sig".to_string()),
        }
    );
    assert_eq!(parse("print()"), Construct::Print { value: None });
    assert_eq!(parse("exit"), Construct::Exit { code: 0 });
    assert_eq!(parse("exit(2)"), Construct::Exit { code: 2 });
    assert_eq!(
        parse("counter = 4"),
        Construct::Assign {
            name: "counter".to_string(),
            value: ValueExpr::Literal(Literal::int(4)),
        }
    );
    assert_eq!(
        parse("xs.push(\"a, b\").sort()"),
        Construct::MethodChain {
            receiver: "xs".to_string(),
            chain: ".push(\"a, b\").sort()".to_string(),
        }
    );
}

#[test]
fn keywords_need_a_word_boundary() {
    // `printer` is an identifier, not `print er`
    assert_eq!(
        parse("printer = 1"),
        Construct::Assign {
            name: "printer".to_string(),
            value: ValueExpr::Literal(Literal::int(1)),
        }
    );
}

#[test]
fn unknown_lines_are_unsupported() {
    for line in ["what is this", "Int x =", "sub f(", "for x in {"] {
        let err = classify(line).expect_err("must not classify");
        assert_eq!(err.get_kind(), ErrorKind::UnsupportedConstruct, "{}", line);
    }
}

#[test]
fn chain_yields_method_and_raw_args() {
    let chain = MethodChain::new(".add(1).push(\"x)\", [1, 2]).size");
    let calls = chain.invocations().expect("chain");
    let pairs: Vec<(&str, Option<&str>)> = calls.iter().map(|c| (c.method, c.args)).collect();
    assert_eq!(
        pairs,
        vec![
            ("add", Some("1")),
            ("push", Some("\"x)\", [1, 2]")),
            ("size", None),
        ]
    );
    assert_eq!(calls[1].arguments().expect("args"), vec!["\"x)\"", "[1, 2]"]);
    assert!(calls[2].arguments().expect("no parens").is_empty());
}

#[test]
fn chain_is_restartable() {
    let mut chain = MethodChain::new(".a().b(1)");
    let first: Vec<_> = chain.by_ref().map(|c| c.expect("call").method).collect();
    assert_eq!(first, vec!["a", "b"]);
    assert!(chain.next().is_none(), "exhausted chain yielded more");

    chain.restart();
    let second: Vec<_> = chain.map(|c| c.expect("call").method).collect();
    assert_eq!(first, second);
}

#[test]
fn chain_stops_at_the_first_error() {
    let mut chain = MethodChain::new(".ok().broken(1");
    assert!(matches!(chain.next(), Some(Ok(call)) if call.method == "ok"));
    let err = chain.next().expect("error item").expect_err("unbalanced");
    assert_eq!(err.get_kind(), ErrorKind::Syntax);
    assert!(chain.next().is_none());
}

#[test]
fn split_args_respects_nesting_and_quotes() {
    fn split(raw: &str) -> Vec<&str> {
        split_args(raw).expect("split")
    }
    assert_eq!(split("1, 'a,b', [2, 3], {k: 4}"), vec!["1", "'a,b'", "[2, 3]", "{k: 4}"]);
    assert_eq!(split(" "), Vec::<&str>::new());
    assert_eq!(split("f(a, b), c"), vec!["f(a, b)", "c"]);
}

#[test]
fn empty_arguments_are_rejected() {
    for raw in ["1,,2", "1,", ",1", " , "] {
        let err = split_args(raw).expect_err("empty argument accepted");
        assert_eq!(err.get_kind(), ErrorKind::Syntax, "{:?}", raw);
    }
    let chain = MethodChain::new(".push(1,,2)");
    let calls = chain.invocations().expect("the chain itself is balanced");
    assert!(calls[0].arguments().is_err());
}
