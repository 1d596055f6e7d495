// Copyright 2022 Oxide Computer Company

//! The interpreter driver: reads commands, keeps the table of named
//! databases and the current selection, and prints results.

use clap::Parser;
use phfwd::engine::PhoneForward;
use phfwd::error::Error;
use phfwd::parser::{Command, Op};
use phfwd::scanner::Scanner;
use phfwd::symtab::SymbolTable;
use std::io::{Read, Write};

#[derive(Parser, Default)]
#[command(version, about = "Phone-forwarding database interpreter")]
pub struct Opts {
    /// Show each token as it is scanned.
    #[arg(long)]
    pub show_tokens: bool,

    /// Show each command as it is recognised.
    #[arg(long)]
    pub show_commands: bool,
}

/// Runs the interpreter over an injected byte stream, writing lookup
/// results to `output`. On failure the returned error is the one
/// diagnostic line to print; the caller decides the exit status.
pub fn run<R: Read, W: Write>(input: R, output: &mut W, opts: &Opts) -> Result<(), Error> {
    let mut scanner = Scanner::new(input);
    scanner.show_tokens = opts.show_tokens;
    let mut parser = phfwd::parser::Parser::new(scanner);
    let result = interpret(&mut parser, output, opts);
    result.map_err(|e| diagnose(e, parser.at_eof()))
}

/// An allocation failure outranks everything; after that, an input that
/// ran dry mid-command reports end-of-input rather than a plain syntax
/// offset.
fn diagnose(e: Error, at_eof: bool) -> Error {
    match e {
        Error::OutOfMemory => Error::OutOfMemory,
        _ if at_eof => Error::UnexpectedEof,
        e => e,
    }
}

fn op_name(op: &Op) -> &'static str {
    match op {
        Op::Switch(_) => "NEW",
        Op::Delete(_) | Op::Remove(_) => "DEL",
        Op::Get(_) | Op::Rev(_) => "?",
        Op::Add(_, _) => ">",
        Op::End => "",
    }
}

fn interpret<R: Read, W: Write>(
    parser: &mut phfwd::parser::Parser<R>,
    output: &mut W,
    opts: &Opts,
) -> Result<(), Error> {
    let mut table: SymbolTable<PhoneForward> =
        SymbolTable::new().ok_or(Error::OutOfMemory)?;
    let mut current: Option<String> = None;

    loop {
        let cmd = parser.next_command()?;
        if opts.show_commands {
            println!("{:?}", cmd);
        }
        let Command { op, op_offset } = cmd;
        let exec = || Error::Exec { op: op_name(&op), offset: op_offset };

        match &op {
            Op::End => break,

            Op::Switch(name) => {
                if table.get(name).is_none() {
                    let engine = PhoneForward::new().ok_or(Error::OutOfMemory)?;
                    if !table.insert(name, engine) {
                        return Err(Error::OutOfMemory);
                    }
                    log::debug!("created database {name}");
                }
                current = Some(name.clone());
            }

            Op::Delete(name) => {
                if table.remove(name).is_none() {
                    return Err(exec());
                }
                log::debug!("deleted database {name}");
                if current.as_deref() == Some(name.as_str()) {
                    current = None;
                }
            }

            Op::Add(src, dst) => {
                let db = current_db(&mut table, &current).ok_or_else(exec)?;
                if !db.add(src, dst) {
                    return Err(exec());
                }
            }

            Op::Remove(prefix) => {
                let db = current_db(&mut table, &current).ok_or_else(exec)?;
                db.remove(prefix);
            }

            Op::Get(key) => {
                let db = current_db(&mut table, &current).ok_or_else(exec)?;
                let numbers = db.get(key).ok_or(Error::OutOfMemory)?;
                match numbers.get(0) {
                    Some(number) => {
                        let _ = writeln!(output, "{}", number);
                    }
                    None => return Err(exec()),
                }
            }

            Op::Rev(key) => {
                let db = current_db(&mut table, &current).ok_or_else(exec)?;
                let numbers = db.reverse(key).ok_or(Error::OutOfMemory)?;
                if numbers.is_empty() {
                    return Err(exec());
                }
                for number in numbers.iter() {
                    let _ = writeln!(output, "{}", number);
                }
            }
        }
    }

    table.for_each(|name, _| log::debug!("dropping database {name}"));
    Ok(())
}

fn current_db<'a>(
    table: &'a mut SymbolTable<PhoneForward>,
    current: &Option<String>,
) -> Option<&'a mut PhoneForward> {
    table.get_mut(current.as_deref()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(input: &str) -> (String, Result<(), Error>) {
        let mut out = Vec::new();
        let result = run(input.as_bytes(), &mut out, &Opts::default());
        (String::from_utf8(out).expect("utf8 output"), result)
    }

    #[test]
    fn forwards_and_looks_up() {
        let (out, result) = drive("NEW a 123>456 12345?");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "45645\n");
    }

    #[test]
    fn reverse_prints_each_number() {
        let (out, result) = drive("NEW a 123>456 1>2 ?2");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn empty_input_succeeds_silently() {
        let (out, result) = drive("");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "");
    }

    #[test]
    fn command_with_no_database_selected() {
        let (_, result) = drive("1>2");
        assert_eq!(result, Err(Error::Exec { op: ">", offset: 2 }));
        let (_, result) = drive("5?");
        assert_eq!(result, Err(Error::Exec { op: "?", offset: 2 }));
        let (_, result) = drive("DEL 5");
        assert_eq!(result, Err(Error::Exec { op: "DEL", offset: 1 }));
    }

    #[test]
    fn deleting_a_database_drops_its_state() {
        let (out, result) = drive("NEW a 5>6 NEW b DEL a NEW a 5?");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "5\n");
    }

    #[test]
    fn deleting_the_current_database_deselects_it() {
        let (_, result) = drive("NEW a DEL a 1>2");
        assert_eq!(result, Err(Error::Exec { op: ">", offset: 14 }));
    }

    #[test]
    fn deleting_an_unknown_database_fails() {
        let (_, result) = drive("NEW a DEL b");
        assert_eq!(result, Err(Error::Exec { op: "DEL", offset: 7 }));
    }

    #[test]
    fn switching_back_keeps_state() {
        let (out, result) = drive("NEW a 5>6 NEW b 5>7 NEW a 59?");
        assert_eq!(result, Ok(()));
        assert_eq!(out, "69\n");
    }

    #[test]
    fn non_digit_operands_fail_at_the_redirect() {
        let (_, result) = drive("NEW a foo>bar");
        assert_eq!(result, Err(Error::Exec { op: ">", offset: 10 }));
    }

    #[test]
    fn syntax_error_reports_the_offending_offset() {
        let (_, result) = drive("NEW a @");
        assert_eq!(result, Err(Error::Syntax { offset: 7 }));
    }

    #[test]
    fn truncated_command_reports_eof() {
        let (_, result) = drive("NEW a 12>");
        assert_eq!(result, Err(Error::UnexpectedEof));
    }
}
