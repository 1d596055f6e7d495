// Copyright 2022 Oxide Computer Company

use colored::Colorize;
use std::fmt;

/// Interpreter diagnostics. Each variant renders as the single line the
/// driver prints to stderr before exiting with a failure status. The
/// severity word is highlighted on a terminal; piped output stays plain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An allocation was refused somewhere along the way.
    OutOfMemory,

    /// The input ended in the middle of a command.
    UnexpectedEof,

    /// A token that no command shape allows, at this 1-based byte offset.
    Syntax { offset: u64 },

    /// A well-formed command failed to execute; `op` is the operator it
    /// was invoked with and `offset` the operator's byte offset.
    Exec { op: &'static str, offset: u64 },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = "ERROR".bright_red();
        match self {
            Error::OutOfMemory => write!(f, "{} OOM", severity),
            Error::UnexpectedEof => write!(f, "{} EOF", severity),
            Error::Syntax { offset } => write!(f, "{} {}", severity, offset),
            Error::Exec { op, offset } => write!(f, "{} {} {}", severity, op, offset),
        }
    }
}

impl std::error::Error for Error {}
