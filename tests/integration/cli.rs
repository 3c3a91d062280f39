mod common;
use common::{erlscope, source_dir};

use std::io::Write;
use std::process::{Output, Stdio};

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = erlscope()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn free_vars_text() {
    let out = run_with_stdin(&["free-vars"], "X = Y + 1, foo(X, Z)");
    assert_eq!(stdout(&out), "Y\nZ\n");
}

#[test]
fn free_vars_json() {
    let out = run_with_stdin(&["free-vars", "--format", "json"], "{B, A}");
    let value: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(value, serde_json::json!(["A", "B"]));
}

#[test]
fn free_vars_from_file() {
    let dir = source_dir(&[("snippet.erl", "lists:map(F, L)")]);
    let out = erlscope().arg("free-vars").arg(dir.path().join("snippet.erl")).output().unwrap();
    assert_eq!(stdout(&out), "F\nL\n");
}

#[test]
fn parse_error_exits_nonzero() {
    let out = run_with_stdin(&["free-vars"], "X = ");
    assert!(!out.status.success());
    assert!(!out.stderr.is_empty());
}

#[test]
fn parse_pretty_prints_forms() {
    let out = run_with_stdin(&["parse"], "f(X)->X+1.");
    assert_eq!(stdout(&out), "f(X) ->\n    X + 1.\n");
}

#[test]
fn parse_expr_mode() {
    let out = run_with_stdin(&["parse", "--expr"], "A=B");
    assert_eq!(stdout(&out), "begin\n    A = B\nend\n");
}

#[test]
fn tokens_with_start_line() {
    let out = run_with_stdin(&["tokens", "--start-line", "10"], "a\nb.");
    assert_eq!(stdout(&out), "   10  a\n   11  b\n   11  .\n");
}

#[test]
fn tokens_start_line_zero_rejected() {
    let out = erlscope().args(["tokens", "--start-line", "0"]).output().unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("start-line"));
}

#[test]
fn tokens_at_last_line_number() {
    let out = run_with_stdin(&["tokens", "--start-line", "4294967295"], "a,\nb");
    assert_eq!(stdout(&out), "4294967295  a\n4294967295  ,\n4294967295  b\n");
}

#[test]
fn split_prints_partitions() {
    let dir = source_dir(&[("m.erl", "a() -> 1.\nb() -> 2.\n")]);
    let out = erlscope()
        .args(["split", "m", "b", "0", "--dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    let text = stdout(&out);
    assert!(text.contains("%% before (1 declarations)"), "{text}");
    assert!(text.contains("%% matched (1 declarations)\nb() ->"), "{text}");
    assert!(text.contains("%% after (0 declarations)"), "{text}");
}

#[test]
fn split_not_found_exits_nonzero() {
    let dir = source_dir(&[("m.erl", "a() -> 1.\n")]);
    let out = erlscope()
        .args(["split", "m", "zz", "3", "--dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no function zz/3"));
}

#[test]
fn config_file_sets_format() {
    let dir = source_dir(&[("erlscope.toml", "[output]\nformat = \"json\"\n")]);
    let out = erlscope()
        .arg("--config")
        .arg(dir.path().join("erlscope.toml"))
        .arg("free-vars")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            child.stdin.take().unwrap().write_all(b"Q")?;
            child.wait_with_output()
        })
        .unwrap();
    assert_eq!(stdout(&out).trim(), "[\n  \"Q\"\n]");
}

#[test]
fn flag_overrides_config() {
    let dir = source_dir(&[("erlscope.toml", "[output]\nformat = \"json\"\n")]);
    let config = dir.path().join("erlscope.toml");
    let out = run_with_stdin(&["--config", config.to_str().unwrap(), "--format", "text", "free-vars"], "Q");
    assert_eq!(stdout(&out), "Q\n");
}
