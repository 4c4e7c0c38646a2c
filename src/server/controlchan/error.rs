//! ControlChanError (spec.md §7 ProtocolError taxonomy).
//!
//! Grounded on `libunftp`'s `ControlChanError`/`ControlChanErrorKind`
//! (`server/controlchan/error.rs`), which wraps a `failure::Context` around
//! a `Fail`-derived kind enum. `failure` (and its `fehler` throw!-macro
//! helper) is unmaintained; this crate keeps the same two-part shape —
//! opaque `ControlChanError` wrapping a `ControlChanErrorKind`, with a
//! `kind()` accessor — built on `thiserror` instead, the direct successor
//! the rest of the example pack also reaches for.

use super::parse_error::{ParseError, ParseErrorKind};
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ControlChanErrorKind {
    #[error("I/O error on the control channel")]
    IoError,
    #[error("failed to parse command")]
    ParseError,
    #[error("internal server error")]
    InternalServerError,
    #[error("authentication backend error")]
    AuthenticationError,
    #[error("non-UTF8 character in command")]
    Utf8Error,
    #[error("unknown command: {command}")]
    UnknownCommand { command: String },
    #[error("invalid command (invalid parameter)")]
    InvalidCommand,
    #[error("command line exceeded 4096 bytes")]
    LineTooLong,
    #[error("control channel idle timeout elapsed")]
    ControlChannelTimeout,
}

#[derive(Debug, Error)]
#[error("{kind}")]
pub struct ControlChanError {
    kind: ControlChanErrorKind,
    #[source]
    source: Option<std::io::Error>,
}

impl ControlChanError {
    pub fn new(kind: ControlChanErrorKind) -> Self {
        ControlChanError { kind, source: None }
    }

    pub fn kind(&self) -> &ControlChanErrorKind {
        &self.kind
    }
}

impl From<ControlChanErrorKind> for ControlChanError {
    fn from(kind: ControlChanErrorKind) -> Self {
        ControlChanError::new(kind)
    }
}

impl From<std::io::Error> for ControlChanError {
    fn from(err: std::io::Error) -> Self {
        ControlChanError {
            kind: ControlChanErrorKind::IoError,
            source: Some(err),
        }
    }
}

impl From<ParseError> for ControlChanError {
    fn from(err: ParseError) -> Self {
        match err.kind().clone() {
            ParseErrorKind::UnknownCommand { command } => ControlChanErrorKind::UnknownCommand { command }.into(),
            ParseErrorKind::InvalidUtf8 => ControlChanErrorKind::Utf8Error.into(),
            ParseErrorKind::InvalidCommand => ControlChanErrorKind::InvalidCommand.into(),
            ParseErrorKind::LineTooLong => ControlChanErrorKind::LineTooLong.into(),
        }
    }
}
