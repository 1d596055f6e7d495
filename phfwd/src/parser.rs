//! One-token-lookahead recogniser for the command language.
//!
//! Operand slots that the engine validates itself accept any word, number
//! or identifier alike, so `foo>bar` is recognised as a redirect command
//! and fails at execution time rather than here. Only the `NEW` operand is
//! restricted to identifiers, since database names never look like
//! numbers.

use crate::error::Error;
use crate::scanner::{Kind, Scanner};
use std::io::Read;

#[derive(Debug)]
pub enum Op {
    /// Select a database, creating it if needed.
    Switch(String),

    /// Destroy a database.
    Delete(String),

    /// Install a redirect in the current database.
    Add(String, String),

    /// Erase redirects by source prefix in the current database.
    Remove(String),

    /// Forward lookup in the current database.
    Get(String),

    /// Reverse lookup in the current database.
    Rev(String),

    /// End of input.
    End,
}

#[derive(Debug)]
pub struct Command {
    pub op: Op,

    /// Byte offset of the operator token.
    pub op_offset: u64,
}

pub struct Parser<R: Read> {
    scanner: Scanner<R>,
}

impl<R: Read> Parser<R> {
    pub fn new(scanner: Scanner<R>) -> Self {
        Parser { scanner }
    }

    /// Whether the underlying input has run out. Used to tell an
    /// unterminated command from an ordinary syntax error.
    pub fn at_eof(&self) -> bool {
        self.scanner.at_eof()
    }

    pub fn next_command(&mut self) -> Result<Command, Error> {
        let t = self.scanner.next_token();
        match t.kind {
            Kind::Eof => Ok(Command { op: Op::End, op_offset: t.beg }),

            Kind::New => {
                let t2 = self.scanner.next_token();
                match t2.kind {
                    Kind::Ident(name) => {
                        Ok(Command { op: Op::Switch(name), op_offset: t.beg })
                    }
                    other => Err(mismatch(other, t2.beg)),
                }
            }

            Kind::Del => {
                let t2 = self.scanner.next_token();
                match t2.kind {
                    Kind::Ident(name) => {
                        Ok(Command { op: Op::Delete(name), op_offset: t.beg })
                    }
                    Kind::Number(prefix) => {
                        Ok(Command { op: Op::Remove(prefix), op_offset: t.beg })
                    }
                    other => Err(mismatch(other, t2.beg)),
                }
            }

            Kind::Query => {
                let t2 = self.scanner.next_token();
                match t2.kind {
                    Kind::Number(key) | Kind::Ident(key) => {
                        Ok(Command { op: Op::Rev(key), op_offset: t.beg })
                    }
                    other => Err(mismatch(other, t2.beg)),
                }
            }

            Kind::Number(word) | Kind::Ident(word) => {
                let t2 = self.scanner.next_token();
                match t2.kind {
                    Kind::Redir => {
                        let t3 = self.scanner.next_token();
                        match t3.kind {
                            Kind::Number(dst) | Kind::Ident(dst) => Ok(Command {
                                op: Op::Add(word, dst),
                                op_offset: t2.beg,
                            }),
                            other => Err(mismatch(other, t3.beg)),
                        }
                    }
                    Kind::Query => Ok(Command { op: Op::Get(word), op_offset: t2.beg }),
                    other => Err(mismatch(other, t2.beg)),
                }
            }

            Kind::OutOfMemory => Err(Error::OutOfMemory),
            Kind::Unknown | Kind::Redir => Err(Error::Syntax { offset: t.beg }),
        }
    }
}

/// An operand slot held something unexpected; the allocation-failure token
/// keeps its meaning, everything else is a syntax error at the offending
/// token.
fn mismatch(kind: Kind, offset: u64) -> Error {
    match kind {
        Kind::OutOfMemory => Error::OutOfMemory,
        _ => Error::Syntax { offset },
    }
}
