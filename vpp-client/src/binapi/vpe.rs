//! Version and system time queries.

use crate::channel::{MessageRef, Reply, Request};
use crate::error::ChannelError;
use crate::wire;
use bytes::{Bytes, BytesMut};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShowVersion;

message!(ShowVersion, "show_version", "51077d14");

impl Request for ShowVersion {
    type Reply = ShowVersionReply;

    fn encode(&self, _buf: &mut BytesMut) {}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShowVersionReply {
    pub retval: i32,
    pub program: String,
    pub version: String,
    pub build_date: String,
    pub build_directory: String,
}

message!(ShowVersionReply, "show_version_reply", "c919bde1");

impl Reply for ShowVersionReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(ShowVersionReply {
            retval: wire::get_i32(buf)?,
            program: wire::get_fixed_string(buf, 32)?,
            version: wire::get_fixed_string(buf, 32)?,
            build_date: wire::get_fixed_string(buf, 32)?,
            build_directory: wire::get_fixed_string(buf, 256)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShowVpeSystemTime;

message!(ShowVpeSystemTime, "show_vpe_system_time", "51077d14");

impl Request for ShowVpeSystemTime {
    type Reply = ShowVpeSystemTimeReply;

    fn encode(&self, _buf: &mut BytesMut) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShowVpeSystemTimeReply {
    pub retval: i32,
    /// Seconds since the epoch.
    pub vpe_system_time: f64,
}

message!(ShowVpeSystemTimeReply, "show_vpe_system_time_reply", "7ffd8193");

impl Reply for ShowVpeSystemTimeReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(ShowVpeSystemTimeReply {
            retval: wire::get_i32(buf)?,
            vpe_system_time: wire::get_f64(buf)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

pub const ALL_MESSAGES: &[MessageRef] = &[
    MessageRef::of::<ShowVersion>(),
    MessageRef::of::<ShowVersionReply>(),
    MessageRef::of::<ShowVpeSystemTime>(),
    MessageRef::of::<ShowVpeSystemTimeReply>(),
];
