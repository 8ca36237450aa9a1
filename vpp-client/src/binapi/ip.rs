//! IP address listing and route installation.

use crate::channel::{Dump, MessageRef, Reply, Request};
use crate::error::ChannelError;
use crate::types::{Address, AddressFamily, InterfaceIndex, Prefix};
use crate::wire;
use bytes::{BufMut as _, Bytes, BytesMut};
use std::fmt;

/// Lists the IPv4 or IPv6 addresses configured on one interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpAddressDump {
    pub sw_if_index: InterfaceIndex,
    pub is_ipv6: bool,
}

message!(IpAddressDump, "ip_address_dump", "2d033de4");

impl Dump for IpAddressDump {
    type Details = IpAddressDetails;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        wire::put_bool(buf, self.is_ipv6);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpAddressDetails {
    pub sw_if_index: InterfaceIndex,
    pub prefix: Prefix,
}

message!(IpAddressDetails, "ip_address_details", "ee29b797");

impl Reply for IpAddressDetails {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(IpAddressDetails {
            sw_if_index: InterfaceIndex::decode(buf)?,
            prefix: Prefix::decode(buf)?,
        })
    }
}

impl fmt::Display for IpAddressDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ifIndex: {})", self.prefix, self.sw_if_index)
    }
}

/// `fib_path_nh_proto`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum FibPathNhProto {
    Ip4 = 0,
    Ip6 = 1,
}

impl From<AddressFamily> for FibPathNhProto {
    fn from(af: AddressFamily) -> Self {
        match af {
            AddressFamily::Ip4 => FibPathNhProto::Ip4,
            AddressFamily::Ip6 => FibPathNhProto::Ip6,
        }
    }
}

const FIB_PATH_MAX_LABELS: usize = 16;
// is_uniform: u8, label: u32, ttl: u8, exp: u8
const FIB_MPLS_LABEL_LEN: usize = 7;

/// One forwarding path of a route. Label stacks are never used here and are
/// always encoded empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FibPath {
    pub sw_if_index: InterfaceIndex,
    pub table_id: u32,
    pub rpf_id: u32,
    pub weight: u8,
    pub preference: u8,
    pub path_type: u32,
    pub flags: u32,
    pub proto: FibPathNhProto,
    pub next_hop: Address,
}

impl FibPath {
    /// Normal path through `next_hop`, optionally pinned to an egress
    /// interface, weight 1.
    pub fn via(next_hop: Address, sw_if_index: Option<InterfaceIndex>) -> Self {
        FibPath {
            sw_if_index: InterfaceIndex::or_unset(sw_if_index),
            table_id: 0,
            rpf_id: 0,
            weight: 1,
            preference: 0,
            path_type: 0,
            flags: 0,
            proto: next_hop.family().into(),
            next_hop,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        buf.put_u32(self.table_id);
        buf.put_u32(self.rpf_id);
        buf.put_u8(self.weight);
        buf.put_u8(self.preference);
        buf.put_u32(self.path_type);
        buf.put_u32(self.flags);
        buf.put_u32(self.proto as u32);
        self.next_hop.encode_union(buf);
        // via_label, obj_id, classify_table_index
        buf.put_u32(0);
        buf.put_u32(0);
        buf.put_u32(0);
        buf.put_u8(0);
        buf.put_bytes(0, FIB_PATH_MAX_LABELS * FIB_MPLS_LABEL_LEN);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpRoute {
    pub table_id: u32,
    pub stats_index: u32,
    pub prefix: Prefix,
    pub paths: Vec<FibPath>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpRouteAddDel {
    pub is_add: bool,
    pub is_multipath: bool,
    pub route: IpRoute,
}

message!(IpRouteAddDel, "ip_route_add_del", "b8ecfe0d");

impl Request for IpRouteAddDel {
    type Reply = IpRouteAddDelReply;

    fn encode(&self, buf: &mut BytesMut) {
        wire::put_bool(buf, self.is_add);
        wire::put_bool(buf, self.is_multipath);
        buf.put_u32(self.route.table_id);
        buf.put_u32(self.route.stats_index);
        self.route.prefix.encode(buf);
        buf.put_u8(self.route.paths.len() as u8);
        for path in &self.route.paths {
            path.encode(buf);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IpRouteAddDelReply {
    pub retval: i32,
    pub stats_index: u32,
}

message!(IpRouteAddDelReply, "ip_route_add_del_reply", "1992deab");

impl Reply for IpRouteAddDelReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(IpRouteAddDelReply {
            retval: wire::get_i32(buf)?,
            stats_index: wire::get_u32(buf)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

pub const ALL_MESSAGES: &[MessageRef] = &[
    MessageRef::of::<IpAddressDump>(),
    MessageRef::of::<IpAddressDetails>(),
    MessageRef::of::<IpRouteAddDel>(),
    MessageRef::of::<IpRouteAddDelReply>(),
];
