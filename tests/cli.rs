use std::{
    io::Write,
    process::{Command, Output, Stdio},
};

fn run_shell(script: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_minsh"))
        .env("MINSH_PROMPT", "never")
        .env("MINSH_CONFIG", "/nonexistent/minsh.toml")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(script.as_bytes())
        .unwrap();

    child.wait_with_output().unwrap()
}

fn stdout(script: &str) -> String {
    let output = run_shell(script);
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn runs_each_line() {
    assert_eq!(stdout("echo one\necho two\n"), "one\ntwo\n");
}

#[test]
fn runs_pipelines() {
    assert_eq!(stdout("seq 4 | head -n 2\n"), "1\n2\n");
    assert_eq!(stdout("seq 4 | head -n 2 | tail -n 1\n"), "2\n");
}

#[test]
fn last_line_without_newline() {
    assert_eq!(stdout("echo tail"), "tail\n");
}

#[test]
fn blank_lines_are_skipped() {
    assert_eq!(stdout("\n   \n|\necho ok\n"), "ok\n");
}

#[test]
fn exit_keyword_stops_reading() {
    assert_eq!(stdout("echo before\nexit\necho after\n"), "before\n");
    assert_eq!(stdout("echo before\necho exit now\necho after\n"), "before\n");
}

#[test]
fn launch_failure_is_reported_and_shell_continues() {
    let out = stdout("/nonexistent/minsh-program\necho still here\n");
    assert_eq!(
        out,
        "minsh: /nonexistent/minsh-program: No such file or directory\nstill here\n"
    );
}
