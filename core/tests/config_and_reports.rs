use std::fs;

use sealang_core::config::{CONFIG_FILE_NAME, default_dependencies};
use sealang_core::reports::{E_STRUCTURAL, E_UNDEFINED_VARIABLE, Report, ReportCollector, Severity};
use sealang_core::{CompilerConfig, ErrorKind, compile_source, generate_error_report};

#[test]
fn empty_json_object_is_the_default_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "{}").expect("write config");
    let config = CompilerConfig::load_from_file(&path).expect("load");
    assert_eq!(config, CompilerConfig::default());
    assert_eq!(config.tab_size, 2);
    assert_eq!(config.extension, "pl");
    assert_eq!(config.default_dependencies, default_dependencies());
}

#[test]
fn discover_reads_the_file_next_to_the_script() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(CompilerConfig::discover(dir.path()).expect("discover").is_none());

    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "tab_size": 4, "module": true, "default_dependencies": ["strict"] }"#,
    )
    .expect("write config");
    let config = CompilerConfig::discover(dir.path())
        .expect("discover")
        .expect("config present");
    assert_eq!(config.tab_size, 4);
    assert!(config.module);
    assert_eq!(config.default_dependencies, vec!["strict".to_string()]);
}

#[test]
fn invalid_configs_are_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cases = [
        r#"{ "tab_size": 0 }"#,
        r#"{ "tab_size": 12 }"#,
        r#"{ "extension": ".pl" }"#,
        r#"{ "default_dependencies": ["strict", "strict"] }"#,
        r#"{ "default_dependencies": ["not a module"] }"#,
        r#"{ "tab_size": "two" }"#,
        "not json",
    ];
    for (i, raw) in cases.iter().enumerate() {
        let path = dir.path().join(format!("case{}.json", i));
        fs::write(&path, raw).expect("write");
        let err = CompilerConfig::load_from_file(&path).expect_err("invalid config accepted");
        assert_eq!(err.get_kind(), ErrorKind::Config, "case {}", raw);
    }
    let err = CompilerConfig::load_from_file(dir.path().join("missing.json")).expect_err("missing");
    assert_eq!(err.get_kind(), ErrorKind::Config);
}

#[test]
fn report_from_compile_error_keeps_location_and_code() {
    let err = compile_source("r.sea", "Int a = 1\n  print nope").expect_err("undefined");
    let report = Report::from_error(err.as_ref());
    assert_eq!(report.code, Some(E_UNDEFINED_VARIABLE));
    assert_eq!(report.kind, "UndefinedVariableError");
    assert_eq!(report.severity, Severity::Error);
    let location = report.location.clone().expect("location");
    assert_eq!((location.line, location.column), (2, 3));
    assert_eq!(report.width, "print nope".len());
    assert!(report.suggestion.is_some());

    let pretty = report.pretty_with_source("Int a = 1\n  print nope");
    assert!(pretty.contains("r.sea:2:3"), "{}", pretty);
    assert!(pretty.contains("print nope"), "{}", pretty);

    let line = generate_error_report(err.as_ref());
    assert!(line.starts_with("SEALANG | ERROR | UndefinedVariableError | r.sea:2:3"), "{}", line);
}

#[test]
fn collector_dedupes_and_sets_exit_code() {
    let mut collector = ReportCollector::new();
    assert_eq!(collector.exit_code(), 0);

    let err = compile_source("c.sea", "}").expect_err("root pop");
    collector.push_error(err.as_ref());
    collector.push_error(err.as_ref());
    assert_eq!(collector.len(), 1);
    assert_eq!(collector.reports[0].code, Some(E_STRUCTURAL));
    assert_eq!(collector.counts(), (0, 1, 0, 0));
    assert_eq!(collector.exit_code(), 1);

    collector.push(Report::new("just saying", Severity::Info, None));
    assert_eq!(collector.len(), 2);

    let json: serde_json::Value =
        serde_json::from_str(&collector.to_json().expect("json")).expect("parse json");
    assert_eq!(json.as_array().map(|a| a.len()), Some(2));
    assert_eq!(json[0]["kind"], "StructuralError");

    let lsp = collector.to_lsp_array();
    assert!(lsp.get("c.sea").is_some(), "{}", lsp);
    assert!(lsp.get("<unknown>").is_some(), "{}", lsp);
}
