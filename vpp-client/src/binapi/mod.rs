//! # Binary API Message Definitions
//!
//! ## Purpose
//!
//! Wire layouts of the messages this client exchanges with the forwarding
//! plane, grouped the way the endpoint groups them (`memclnt`, `vpe`,
//! `interface`, `ip`, `gre`). Only the messages actually issued by the client
//! are described.
//!
//! ## How it works
//!
//! Each message is a plain struct implementing `Request`, `Dump` or `Reply`
//! from the `channel` module. Bodies are packed big-endian fields written with
//! `bytes::BufMut` and read back with the bounds-checked helpers of `wire`.
//! The CRCs identify the message revision the layouts were written for; the
//! compatibility check compares them with the endpoint's message table.
//!
//! ## Main components
//!
//! - `ALL_MESSAGES` of every group, used by `Channel::check_compatibility`.

macro_rules! message {
    ($ty:ty, $name:literal, $crc:literal) => {
        impl $crate::channel::Message for $ty {
            const NAME: &'static str = $name;
            const CRC: &'static str = $crc;
        }
    };
}

/// A reply carrying nothing but its status code.
macro_rules! retval_reply {
    ($(#[$meta:meta])* $ty:ident, $name:literal, $crc:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $ty {
            pub retval: i32,
        }

        message!($ty, $name, $crc);

        impl $crate::channel::Reply for $ty {
            fn decode(buf: &mut ::bytes::Bytes) -> Result<Self, $crate::error::ChannelError> {
                Ok($ty {
                    retval: $crate::wire::get_i32(buf)?,
                })
            }

            fn retval(&self) -> i32 {
                self.retval
            }
        }
    };
}

pub mod gre;
pub mod interface;
pub mod ip;
pub mod memclnt;
pub mod vpe;
