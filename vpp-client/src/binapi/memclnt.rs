//! Session management messages: socket client registration and control ping.

use crate::channel::{MessageRef, Reply, Request};
use crate::error::ChannelError;
use crate::wire;
use bytes::{BufMut as _, Bytes, BytesMut};

/// Registers the client and asks for the message table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SockclntCreate {
    pub name: String,
}

message!(SockclntCreate, "sockclnt_create", "455fb9c4");

impl Request for SockclntCreate {
    type Reply = SockclntCreateReply;

    fn encode(&self, buf: &mut BytesMut) {
        wire::put_fixed_string(buf, &self.name, 64);
    }
}

/// One entry of the negotiated message table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageTableEntry {
    pub index: u16,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SockclntCreateReply {
    pub response: i32,
    pub index: u32,
    pub message_table: Vec<MessageTableEntry>,
}

message!(SockclntCreateReply, "sockclnt_create_reply", "35166268");

impl Reply for SockclntCreateReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        let response = wire::get_i32(buf)?;
        let index = wire::get_u32(buf)?;
        let count = wire::get_u16(buf)?;
        let mut message_table = Vec::with_capacity(count as usize);
        for _ in 0..count {
            message_table.push(MessageTableEntry {
                index: wire::get_u16(buf)?,
                name: wire::get_fixed_string(buf, 64)?,
            });
        }
        Ok(SockclntCreateReply {
            response,
            index,
            message_table,
        })
    }

    fn retval(&self) -> i32 {
        self.response
    }
}

/// Unregisters the client identified by `index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SockclntDelete {
    pub index: u32,
}

message!(SockclntDelete, "sockclnt_delete", "8ac76db6");

impl Request for SockclntDelete {
    type Reply = SockclntDeleteReply;

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.index);
    }
}

retval_reply!(SockclntDeleteReply, "sockclnt_delete_reply", "8f38b1ee");

/// Sent after every dump; its reply terminates the detail stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlPing;

message!(ControlPing, "control_ping", "51077d14");

impl Request for ControlPing {
    type Reply = ControlPingReply;

    fn encode(&self, _buf: &mut BytesMut) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlPingReply {
    pub retval: i32,
    pub client_index: u32,
    pub vpe_pid: u32,
}

message!(ControlPingReply, "control_ping_reply", "f6b0b8ca");

impl Reply for ControlPingReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(ControlPingReply {
            retval: wire::get_i32(buf)?,
            client_index: wire::get_u32(buf)?,
            vpe_pid: wire::get_u32(buf)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

pub const ALL_MESSAGES: &[MessageRef] = &[
    MessageRef::of::<SockclntDelete>(),
    MessageRef::of::<SockclntDeleteReply>(),
    MessageRef::of::<ControlPing>(),
    MessageRef::of::<ControlPingReply>(),
];
