//! Errors of the XDP classifier loader.
//!
//! The libbpf and netlink plumbing reports `std::io::Error`; it is converted
//! into one of these variants at the module edge, naming the resource that
//! failed.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("interface {0:?} not found")]
    InterfaceNotFound(String),
    #[error("attaching {what} failed: {source}")]
    ResourceAttachFailed {
        what: String,
        #[source]
        source: io::Error,
    },
    #[error("map {map:?}: {field} size is {actual} bytes, expected {expected}")]
    LayoutMismatch {
        map: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid IPv4 address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },
    #[error("writing to map {map:?} failed: {source}")]
    TableWriteFailed {
        map: String,
        #[source]
        source: io::Error,
    },
    #[error("reading map {map:?} failed: {source}")]
    TableReadFailed {
        map: String,
        #[source]
        source: io::Error,
    },
    #[error("netlink request failed: {0}")]
    Netlink(#[source] io::Error),
}

impl Error {
    pub(crate) fn attach(what: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let what = what.into();
        move |source| Error::ResourceAttachFailed { what, source }
    }
}
