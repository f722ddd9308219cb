use std::fs;
use std::path::Path;

use assert_cmd::Command;

fn sealang() -> Command {
    Command::cargo_bin("sealang").expect("sealang binary")
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("write source");
}

#[test]
fn build_writes_perl_into_output_dir() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write(src.path(), "hello.sea", "String s = \"hi\"\nprint s\n");

    let output = sealang()
        .arg("build")
        .arg(src.path().join("hello.sea"))
        .arg("-o")
        .arg(out.path())
        .output()
        .expect("run sealang");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let text = fs::read_to_string(out.path().join("hello.pl")).expect("output file");
    assert!(text.starts_with("use strict;\nuse warnings;\n"), "{}", text);
    assert!(text.contains("my $s = stdlib::string->new(\"hi\");\n"), "{}", text);
    assert!(!src.path().join("hello.pl").exists());
}

#[test]
fn build_defaults_to_the_script_directory() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "lib.sea", "Int a = 1\n");
    sealang()
        .arg("build")
        .arg(src.path().join("lib.sea"))
        .assert()
        .success();
    assert!(src.path().join("lib.pl").is_file());
}

#[test]
fn check_reports_errors_and_writes_nothing() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "bad.sea", "Int a = 1\nprint ghost\n");

    let output = sealang()
        .arg("check")
        .arg(src.path().join("bad.sea"))
        .output()
        .expect("run sealang");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("UndefinedVariableError"), "{}", stderr);
    assert!(stderr.contains("print ghost"), "{}", stderr);
    assert!(!src.path().join("bad.pl").exists());
}

#[test]
fn json_messages_list_files_and_reports() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "ok.sea", "Int a = 1\n");
    write(src.path(), "bad.sea", "}\n");

    let pattern = src.path().join("*.sea");
    let output = sealang()
        .args(["check", "--message-format", "json"])
        .arg(pattern.to_string_lossy().to_string())
        .output()
        .expect("run sealang");
    assert_eq!(output.status.code(), Some(1));

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json on stdout");
    let files = doc["files"].as_array().expect("files array");
    assert_eq!(files.len(), 2);
    assert_eq!(files.iter().filter(|f| f["ok"] == true).count(), 1);
    let reports = doc["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["kind"], "StructuralError");
    assert_eq!(reports[0]["location"]["file"], "bad.sea");
}

#[test]
fn dump_text_prints_the_generated_code() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "d.sea", "Boolean b = true\n");
    let output = sealang()
        .args(["build", "--dump", "text"])
        .arg(src.path().join("d.sea"))
        .output()
        .expect("run sealang");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("my $b = stdlib::boolean->new(1);"), "{}", stdout);
}

#[test]
fn module_flag_and_config_file() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "Lib.sea", "package my.lib\nScalar v = 1\n{\nScalar w = 2\n}\n");
    write(src.path(), "sealang.json", r#"{ "extension": "pm", "tab_size": 4 }"#);

    sealang()
        .arg("build")
        .arg("--module")
        .arg(src.path().join("Lib.sea"))
        .assert()
        .success();
    let text = fs::read_to_string(src.path().join("Lib.pm")).expect("module output");
    assert!(text.contains("package my::lib;\n"), "{}", text);
    assert!(text.ends_with("\n1;\n"), "{}", text);
    assert!(text.contains("\n    my $w = 2;\n"), "tab_size from sealang.json ignored:\n{}", text);
}

#[test]
fn missing_input_fails() {
    let src = tempfile::tempdir().expect("tempdir");
    sealang()
        .arg("check")
        .arg(src.path().join("nope.sea"))
        .assert()
        .code(1);
    sealang()
        .arg("check")
        .arg(src.path().join("*.none").to_string_lossy().to_string())
        .assert()
        .code(1);
}

#[test]
fn verbose_build_logs_written_files() {
    let src = tempfile::tempdir().expect("tempdir");
    write(src.path(), "hello.sea", "Int a = 1\n");

    let output = sealang()
        .env_remove("RUST_LOG")
        .arg("build")
        .arg("-v")
        .arg(src.path().join("hello.sea"))
        .output()
        .expect("run sealang");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("INFO"), "{}", stderr);
    assert!(stderr.contains("hello.pl"), "{}", stderr);

    let quiet = sealang()
        .env_remove("RUST_LOG")
        .arg("check")
        .arg(src.path().join("hello.sea"))
        .output()
        .expect("run sealang");
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("INFO"));
}
