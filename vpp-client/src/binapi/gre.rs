//! GRE tunnel creation.

use crate::channel::{MessageRef, Reply, Request};
use crate::error::ChannelError;
use crate::types::{Address, InterfaceIndex};
use crate::wire;
use bytes::{BufMut as _, Bytes, BytesMut};

/// `gre_tunnel_type`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum GreTunnelType {
    #[default]
    L3 = 0,
    Teb = 1,
    Erspan = 2,
}

/// `tunnel_mode`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum TunnelMode {
    #[default]
    PointToPoint = 0,
    MultiPoint = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreTunnel {
    pub tunnel_type: GreTunnelType,
    pub mode: TunnelMode,
    pub flags: u8,
    pub session_id: u16,
    /// `u32::MAX` asks the endpoint to number the instance itself.
    pub instance: u32,
    pub outer_table_id: u32,
    pub sw_if_index: InterfaceIndex,
    pub src: Address,
    pub dst: Address,
}

impl GreTunnel {
    /// L3 point-to-point tunnel with automatic instance numbering.
    pub fn point_to_point(src: Address, dst: Address) -> Self {
        GreTunnel {
            tunnel_type: GreTunnelType::L3,
            mode: TunnelMode::PointToPoint,
            flags: 0,
            session_id: 0,
            instance: u32::MAX,
            outer_table_id: 0,
            sw_if_index: InterfaceIndex::UNSET,
            src,
            dst,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreTunnelAddDel {
    pub is_add: bool,
    pub tunnel: GreTunnel,
}

message!(GreTunnelAddDel, "gre_tunnel_add_del", "a27d7f17");

impl Request for GreTunnelAddDel {
    type Reply = GreTunnelAddDelReply;

    fn encode(&self, buf: &mut BytesMut) {
        let t = &self.tunnel;
        wire::put_bool(buf, self.is_add);
        buf.put_u8(t.tunnel_type as u8);
        buf.put_u8(t.mode as u8);
        buf.put_u8(t.flags);
        buf.put_u16(t.session_id);
        buf.put_u32(t.instance);
        buf.put_u32(t.outer_table_id);
        t.sw_if_index.encode(buf);
        t.src.encode(buf);
        t.dst.encode(buf);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GreTunnelAddDelReply {
    pub retval: i32,
    pub sw_if_index: InterfaceIndex,
}

message!(GreTunnelAddDelReply, "gre_tunnel_add_del_reply", "5383d31f");

impl Reply for GreTunnelAddDelReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(GreTunnelAddDelReply {
            retval: wire::get_i32(buf)?,
            sw_if_index: InterfaceIndex::decode(buf)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

pub const ALL_MESSAGES: &[MessageRef] = &[
    MessageRef::of::<GreTunnelAddDel>(),
    MessageRef::of::<GreTunnelAddDelReply>(),
];
