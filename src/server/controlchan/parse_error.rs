//! Command-parsing errors, separated from [`super::error::ControlChanError`]
//! the way `libunftp` separates `ParseError` from `ControlChanError` (the
//! latter wraps the former via `From`).

use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("unknown command: {command}")]
    UnknownCommand { command: String },
    #[error("invalid command (missing or malformed parameter)")]
    InvalidCommand,
    #[error("non-UTF8 byte in command line")]
    InvalidUtf8,
    #[error("command line exceeded the 4096 byte limit")]
    LineTooLong,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind) -> Self {
        ParseError { kind }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }
}
