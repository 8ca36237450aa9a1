//! Error types of the control client.
//!
//! `ChannelError` describes what went wrong on the wire for a single exchange,
//! `Error` is what the sequencer and the binary see: it names the failing
//! operation and keeps the channel error as its source.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single request/reply exchange.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("no reply received within the reply timeout")]
    Timeout,
    #[error("connection closed by the control endpoint")]
    Closed,
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("message {0} is not known to the control endpoint")]
    UnknownMessage(String),
    #[error("reply {message} returned error code {retval}")]
    Retval { message: &'static str, retval: i32 },
}

impl ChannelError {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        ChannelError::Malformed(what.into())
    }
}

/// Errors surfaced by the connection and the control operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("connecting to {} failed: {source}", .path.display())]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: ChannelError,
    },
    #[error("compatibility check failed for {} message(s): {}", .incompatible.len(), .incompatible.join(", "))]
    CompatibilityMismatch { incompatible: Vec<String> },
    #[error("invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{call} failed: {source}")]
    ControlCallFailed {
        call: &'static str,
        #[source]
        source: ChannelError,
    },
}

impl Error {
    pub(crate) fn invalid_address(input: &str, reason: impl ToString) -> Self {
        Error::InvalidAddress {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn call(call: &'static str) -> impl FnOnce(ChannelError) -> Self {
        move |source| Error::ControlCallFailed { call, source }
    }
}
