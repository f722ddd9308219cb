use std::fs;

use sealang_core::emit::write_atomic;
use sealang_core::ir::{
    BindingMode, Element, IrArena, Parameter, ParameterBinding, Renderer, Signal, SignalHandler,
    Statement,
};
use sealang_core::{Compiler, ErrorKind, SeaErrorExt, Script, format_code};

#[test]
fn format_indents_by_brace_depth() {
    let text = "sub f {\nif (1) {\nx();\n}\n};\n";
    assert_eq!(
        format_code(text, 2),
        "sub f {\n  if (1) {\n    x();\n  }\n};\n"
    );
    assert_eq!(
        format_code(text, 4),
        "sub f {\n    if (1) {\n        x();\n    }\n};\n"
    );
}

#[test]
fn format_is_idempotent() {
    let samples = [
        "sub f {\nif (1) {\nx();\n}\n};\n",
        "    {\n  my $a = 1;\n        };\n",
        "if (a) {\nx;\n} else {\ny;\n}",
        "$SIG{INT} = sub {\nexit(0);\n};\n\n\nprint(\"}\");\n",
        "",
    ];
    for sample in samples {
        let once = format_code(sample, 2);
        assert_eq!(format_code(&once, 2), once, "not idempotent for {:?}", sample);
    }
}

#[test]
fn format_ignores_braces_inside_strings() {
    let text = "if (x) {\nprint(\"{\");\nprint('}}');\n}\ny();";
    assert_eq!(
        format_code(text, 2),
        "if (x) {\n  print(\"{\");\n  print('}}');\n}\ny();"
    );
}

#[test]
fn closing_and_reopening_line_stays_at_outer_level() {
    assert_eq!(
        format_code("if (a) {\nx;\n} else {\ny;\n}", 2),
        "if (a) {\n  x;\n} else {\n  y;\n}"
    );
}

#[test]
fn blank_lines_stay_empty() {
    assert_eq!(format_code("{\n   \nx;\n};", 2), "{\n\n  x;\n};");
}

#[test]
fn write_lands_next_to_the_requested_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out_dir = dir.path().join("nested").join("out");
    let script = Script::from_source("hello.sea", "String s = \"hi\"\nprint s");
    let compiler = Compiler::default();
    let written = compiler.build(&script, &out_dir).expect("build");

    assert_eq!(written, out_dir.join("hello.pl"));
    let on_disk = fs::read_to_string(&written).expect("read output");
    let expected = compiler.compile(&script).expect("compile").text().expect("text");
    assert_eq!(on_disk, expected);
    assert!(on_disk.ends_with("my $s = stdlib::string->new(\"hi\");\nprint($s->valueOf().\"\\n\");\n"));
}

#[test]
fn failed_render_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let script = Script::from_source("bad.sea", "Map m = {}\nfor v in m {\n}");
    let err = Compiler::default()
        .build(&script, dir.path())
        .expect_err("map loops cannot be rendered");
    assert_eq!(err.kind(), ErrorKind::UnsupportedConstruct);
    assert!(!dir.path().join("bad.pl").exists(), "partial output left behind");
    let leftovers = fs::read_dir(dir.path()).expect("read dir").count();
    assert_eq!(leftovers, 0, "temporary files left behind");
}

#[test]
fn atomic_write_replaces_existing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("x.pl");
    fs::write(&target, "old contents that are longer than the new ones").expect("seed");
    write_atomic(&target, "new\n").expect("write");
    assert_eq!(fs::read_to_string(&target).expect("read"), "new\n");
}

#[test]
fn named_signal_handler_renders_as_reference() {
    let mut arena = IrArena::new();
    let file = arena.new_file("t", false, &[]).expect("file");
    let handler = arena
        .new_routine(Some("on_hup"), vec![Parameter::plain("sig")], BindingMode::Shift, None)
        .expect("routine");
    arena.append(file, Element::Block(handler)).expect("attach routine");
    arena
        .append(
            file,
            Element::Statement(Statement::Signal(SignalHandler::new(Signal::Hup, handler))),
        )
        .expect("install handler");

    let text = Renderer::new(&arena).render(file).expect("render");
    assert_eq!(text, "sub on_hup {\nmy $sig = shift;\n};\n$SIG{HUP} = \\&on_hup;\n");
}

#[test]
fn typed_parameters_are_wrapped_in_both_binding_modes() {
    let params = vec![
        Parameter::wrapped("n", "stdlib::integer"),
        Parameter::plain("rest"),
    ];
    assert_eq!(
        ParameterBinding::new(params.clone(), BindingMode::Destructure).render(),
        "my ($n, $rest) = @_;\n$n = stdlib::integer->new($n);\n"
    );
    assert_eq!(
        ParameterBinding::new(params, BindingMode::Shift).render(),
        "my $n = stdlib::integer->new(shift);\nmy $rest = shift;\n"
    );
    assert_eq!(ParameterBinding::new(Vec::new(), BindingMode::Destructure).render(), "");
}

#[test]
fn signal_names_are_allow_listed() {
    assert_eq!(Signal::parse("int").expect("int"), Signal::Int);
    assert_eq!(Signal::parse("SIGCHLD").expect("chld"), Signal::Chld);
    assert_eq!(Signal::parse("__DIE__").expect("die").key(), "__DIE__");
    assert_eq!(Signal::parse("ALRM").expect("alrm"), Signal::Alrm);
    for name in ["TERM", "USR1", ""] {
        let err = Signal::parse(name).expect_err("not allowed");
        assert_eq!(err.get_kind(), ErrorKind::UnsupportedConstruct, "{:?}", name);
    }
}

#[test]
fn handler_cannot_be_installed_inside_itself() {
    let mut arena = IrArena::new();
    let file = arena.new_file("t", false, &[]).expect("file");
    let handler = arena
        .new_routine(None, Vec::new(), BindingMode::Shift, None)
        .expect("routine");
    arena.append(file, Element::Block(handler)).expect("attach");
    let err = arena
        .append(
            handler,
            Element::Statement(Statement::Signal(SignalHandler::new(Signal::Int, handler))),
        )
        .expect_err("self install");
    assert_eq!(err.get_kind(), ErrorKind::Structural);
}

#[test]
fn block_cycles_and_second_parents_are_refused() {
    let mut arena = IrArena::new();
    let file = arena.new_file("t", false, &[]).expect("file");
    let outer = arena.new_plain();
    let inner = arena.new_plain();
    arena.append(file, Element::Block(outer)).expect("outer");
    arena.append(outer, Element::Block(inner)).expect("inner");

    // re-adding to the same parent is a no-op
    arena.append(outer, Element::Block(inner)).expect("same parent");
    assert_eq!(arena.block(outer).expect("outer").elements().len(), 1);

    let err = arena.append(file, Element::Block(inner)).expect_err("second parent");
    assert_eq!(err.get_kind(), ErrorKind::Structural);

    let loose = arena.new_plain();
    arena.append(inner, Element::Block(loose)).expect("loose");
    let err = arena.append(loose, Element::Block(file)).expect_err("file nesting");
    assert_eq!(err.get_kind(), ErrorKind::Structural);
}

#[test]
fn dependencies_only_attach_to_files() {
    let mut arena = IrArena::new();
    let block = arena.new_plain();
    let dep = sealang_core::ir::Dependency::everything("a.b").expect("dep");
    let err = arena
        .append(block, Element::Statement(Statement::Dependency(dep)))
        .expect_err("plain block");
    assert_eq!(err.get_kind(), ErrorKind::Structural);
}
