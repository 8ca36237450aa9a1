//! # Request/Reply Channel Abstraction
//!
//! ## Purpose
//!
//! Describes the binary API messages and the conduit used to exchange them,
//! independently of the transport. The sequencer only talks to `Channel`, which
//! lets it run against the unix-socket transport or a scripted test double.
//!
//! ## How it works
//!
//! Every message type carries its name and CRC as associated constants; the
//! pair identifies the message in the endpoint's message table. A `Request`
//! names its single `Reply` type, a `Dump` names the `Details` record type it
//! streams back. Streams are lazy iterators ending at the transport's
//! terminator.
//!
//! ## Main components
//!
//! - `Message`, `Request`, `Dump`, `Reply`: message traits.
//! - `MessageRef`: name/CRC pair used for compatibility checks.
//! - `Channel`: request/reply and request/stream-of-replies conduit.

use crate::error::{ChannelError, Error};
use bytes::{Bytes, BytesMut};

/// A message of the binary API.
pub trait Message: Sized + 'static {
    const NAME: &'static str;
    const CRC: &'static str;

    /// Key of the message in the endpoint's message table.
    fn name_crc() -> String {
        format!("{}_{}", Self::NAME, Self::CRC)
    }
}

/// A request answered by exactly one reply.
pub trait Request: Message {
    type Reply: Reply;

    /// Writes the body, everything after the common request header.
    fn encode(&self, buf: &mut BytesMut);
}

/// A request answered by a stream of detail records.
pub trait Dump: Message {
    type Details: Reply;

    fn encode(&self, buf: &mut BytesMut);
}

/// A reply or detail record.
pub trait Reply: Message {
    /// Reads the body, everything after the common reply header.
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError>;

    /// Status code reported by the endpoint, `0` on success.
    fn retval(&self) -> i32 {
        0
    }
}

/// Turns a non-zero `retval` into `ChannelError::Retval`.
pub fn check_retval<R: Reply>(reply: R) -> Result<R, ChannelError> {
    match reply.retval() {
        0 => Ok(reply),
        retval => Err(ChannelError::Retval {
            message: R::NAME,
            retval,
        }),
    }
}

/// Name and CRC of a message, as listed in a message group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageRef {
    pub name: &'static str,
    pub crc: &'static str,
}

impl MessageRef {
    pub const fn of<M: Message>() -> Self {
        MessageRef {
            name: M::NAME,
            crc: M::CRC,
        }
    }

    pub fn name_crc(&self) -> String {
        format!("{}_{}", self.name, self.crc)
    }
}

/// Lazy sequence of detail records.
pub type ReplyStream<'a, D> = Box<dyn Iterator<Item = Result<D, ChannelError>> + 'a>;

/// Request/reply conduit to the control endpoint.
pub trait Channel {
    /// Sends `req` and waits for its reply. A reply carrying a non-zero
    /// `retval` is reported as `ChannelError::Retval`.
    fn send_request<R: Request>(&mut self, req: &R) -> Result<R::Reply, ChannelError>;

    /// Sends `req` and returns the stream of detail records it produces.
    fn send_multi_request<D: Dump>(
        &mut self,
        req: &D,
    ) -> Result<ReplyStream<'_, D::Details>, ChannelError>;

    /// Verifies that the endpoint knows every message of `messages` under the
    /// same CRC.
    fn check_compatibility(&self, messages: &[MessageRef]) -> Result<(), Error>;
}
