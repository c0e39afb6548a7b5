//! End-to-end scenarios driven against the built `oclc` binary, each one
//! a source program run to its process exit with stdout/stderr captured.

use std::io::Write;
use std::process::Command;

fn run(source: &str) -> (i32, String, String) {
    let mut file = tempfile::Builder::new().suffix(".ocl").tempfile().unwrap();
    write!(file, "{}", source).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_oclc"))
        .arg(file.path())
        .output()
        .expect("failed to run oclc");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

#[test]
fn arithmetic_and_print() {
    let (code, stdout, _) = run("func int main() { print(1 + 2 * 3); return 0; }");
    assert_eq!(stdout, "7\n");
    assert_eq!(code, 0);
}

#[test]
fn control_flow_while_loop() {
    let (code, stdout, _) = run(
        "func int main() { Let i:Int = 0; while (i < 3) { print(i); i = i + 1; } return 0; }",
    );
    assert_eq!(stdout, "0\n1\n2\n");
    assert_eq!(code, 0);
}

#[test]
fn recursive_fibonacci() {
    let (code, stdout, _) = run(
        "func int fib(n:Int) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); } \
         func int main() { print(fib(10)); return 0; }",
    );
    assert_eq!(stdout, "55\n");
    assert_eq!(code, 0);
}

#[test]
fn string_reassignment_ownership_regression() {
    let (code, stdout, _) = run(
        r#"func int main() { Let s:String = "hello"; s = s + " world"; print(s); return 0; }"#,
    );
    assert_eq!(stdout, "hello world\n");
    assert_eq!(code, 0);
}

#[test]
fn return_of_a_borrowed_local_regression() {
    let (code, stdout, _) = run(
        r#"func String greet() { Let s:String = "hi"; return s; } func int main() { print(greet()); return 0; }"#,
    );
    assert_eq!(stdout, "hi\n");
    assert_eq!(code, 0);
}

#[test]
fn failed_assertion_halts_with_message_and_exit_one() {
    let (code, _, stderr) = run(r#"assert(false, "bad")"#);
    assert_eq!(code, 1);
    assert!(stderr.contains("ASSERTION FAILED: bad"));
}

#[test]
fn printf_format_specifiers() {
    let (code, stdout, _) = run(r#"printf("%d %s %b\n", 42, "x", true)"#);
    assert_eq!(stdout, "42 x true\n");
    assert_eq!(code, 0);
}

#[test]
fn time_flag_prints_report_to_stderr() {
    let mut file = tempfile::Builder::new().suffix(".ocl").tempfile().unwrap();
    write!(file, "return 0").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_oclc"))
        .arg("--time")
        .arg(file.path())
        .output()
        .expect("failed to run oclc");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[time]"));
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn missing_file_reports_error_and_exits_one() {
    let output = Command::new(env!("CARGO_BIN_EXE_oclc"))
        .arg("/nonexistent/path/does-not-exist.ocl")
        .output()
        .expect("failed to run oclc");
    assert_eq!(output.status.code(), Some(1));
}
