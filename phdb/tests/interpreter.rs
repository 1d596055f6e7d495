// Copyright 2022 Oxide Computer Company

//! End-to-end runs of the interpreter binary: stdin in, stdout/stderr and
//! exit status out.

use std::io::Write;
use std::process::{Command, Stdio};

struct Run {
    stdout: String,
    stderr: String,
    ok: bool,
}

fn interpret(input: &str) -> Run {
    let mut child = Command::new(env!("CARGO_BIN_EXE_phdb"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn interpreter");
    child
        .stdin
        .as_mut()
        .expect("child stdin")
        .write_all(input.as_bytes())
        .expect("write input");
    let output = child.wait_with_output().expect("wait for interpreter");
    Run {
        stdout: String::from_utf8(output.stdout).expect("utf8 stdout"),
        stderr: String::from_utf8(output.stderr).expect("utf8 stderr"),
        ok: output.status.success(),
    }
}

#[test]
fn forward_lookup() {
    let run = interpret("NEW a 123>456 12345?");
    assert_eq!(run.stdout, "45645\n");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn reverse_lookup() {
    let run = interpret("NEW a 123>456 1>2 ?2");
    assert_eq!(run.stdout, "1\n2\n");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn removed_redirects_stop_applying() {
    let run = interpret("NEW a 5>6 DEL 5 5?");
    assert_eq!(run.stdout, "5\n");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn new_database_starts_empty() {
    let run = interpret("NEW a 5>6 NEW b 5?");
    assert_eq!(run.stdout, "5\n");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn comments_are_skipped() {
    let run = interpret("NEW a 12>34 $$ comment $$ 12?");
    assert_eq!(run.stdout, "34\n");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn non_digit_redirect_operands_fail_at_the_operator() {
    let run = interpret("NEW a foo>bar");
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "ERROR > 10\n");
    assert!(!run.ok);
}

#[test]
fn empty_input_exits_cleanly() {
    let run = interpret("");
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "");
    assert!(run.ok);
}

#[test]
fn whitespace_only_input_exits_cleanly() {
    let run = interpret(" \n\t  ");
    assert!(run.ok);
    assert_eq!(run.stderr, "");
}

#[test]
fn stray_byte_reports_its_offset() {
    let run = interpret("NEW a\n@");
    assert_eq!(run.stderr, "ERROR 7\n");
    assert!(!run.ok);
}

#[test]
fn truncated_command_reports_eof() {
    let run = interpret("NEW a 12>");
    assert_eq!(run.stderr, "ERROR EOF\n");
    assert!(!run.ok);
}

#[test]
fn unterminated_comment_reports_eof() {
    let run = interpret("NEW a $$ never closed");
    assert_eq!(run.stderr, "ERROR EOF\n");
    assert!(!run.ok);
}

#[test]
fn lookup_with_no_database_fails() {
    let run = interpret("1>2");
    assert_eq!(run.stderr, "ERROR > 2\n");
    assert!(!run.ok);
}

#[test]
fn deleting_unknown_database_fails() {
    let run = interpret("NEW a DEL b");
    assert_eq!(run.stderr, "ERROR DEL 7\n");
    assert!(!run.ok);
}

#[test]
fn rebinding_updates_lookups() {
    let run = interpret("NEW a 1>2 1>3 19? ?29");
    assert_eq!(run.stdout, "39\n29\n");
    assert!(run.ok);
}

#[test]
fn execution_stops_at_the_first_error() {
    let run = interpret("NEW a DEL b 1>2 1?");
    assert_eq!(run.stdout, "");
    assert_eq!(run.stderr, "ERROR DEL 7\n");
    assert!(!run.ok);
}

#[test]
fn databases_are_independent() {
    let run = interpret("NEW a 1>2 NEW b 1>3 1? NEW a 1?");
    assert_eq!(run.stdout, "3\n2\n");
    assert!(run.ok);
}
