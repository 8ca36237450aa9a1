//! Interface messages: enumeration, admin status, MAC, MTU, addresses and
//! loopback creation.

use crate::channel::{Dump, MessageRef, Reply, Request};
use crate::error::ChannelError;
use crate::types::{IfStatusFlags, InterfaceIndex, MacAddress, Prefix};
use crate::wire;
use bytes::{BufMut as _, Bytes, BytesMut};
use std::fmt;

/// Creates a loopback interface; an all-zero MAC lets the endpoint pick one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreateLoopback {
    pub mac_address: MacAddress,
}

message!(CreateLoopback, "create_loopback", "42bb5d22");

impl Request for CreateLoopback {
    type Reply = CreateLoopbackReply;

    fn encode(&self, buf: &mut BytesMut) {
        self.mac_address.encode(buf);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateLoopbackReply {
    pub retval: i32,
    pub sw_if_index: InterfaceIndex,
}

message!(CreateLoopbackReply, "create_loopback_reply", "5383d31f");

impl Reply for CreateLoopbackReply {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        Ok(CreateLoopbackReply {
            retval: wire::get_i32(buf)?,
            sw_if_index: InterfaceIndex::decode(buf)?,
        })
    }

    fn retval(&self) -> i32 {
        self.retval
    }
}

/// Lists interfaces; `InterfaceIndex::UNSET` lists all of them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwInterfaceDump {
    pub sw_if_index: InterfaceIndex,
    pub name_filter: Option<String>,
}

impl Default for SwInterfaceDump {
    fn default() -> Self {
        SwInterfaceDump {
            sw_if_index: InterfaceIndex::UNSET,
            name_filter: None,
        }
    }
}

message!(SwInterfaceDump, "sw_interface_dump", "aa610c27");

impl Dump for SwInterfaceDump {
    type Details = SwInterfaceDetails;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        wire::put_bool(buf, self.name_filter.is_some());
        wire::put_string(buf, self.name_filter.as_deref().unwrap_or_default());
    }
}

/// One interface as reported by `sw_interface_dump`. Sub-interface, tag
/// rewrite and bridge fields are read past but not kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwInterfaceDetails {
    pub sw_if_index: InterfaceIndex,
    pub sup_sw_if_index: InterfaceIndex,
    pub l2_address: MacAddress,
    pub flags: IfStatusFlags,
    pub if_type: u32,
    pub link_duplex: u32,
    pub link_speed: u32,
    pub link_mtu: u16,
    pub mtu: [u32; 4],
    pub interface_name: String,
    pub interface_dev_type: String,
    pub tag: String,
}

message!(SwInterfaceDetails, "sw_interface_details", "6c221fc7");

// sub_id .. i_sid: 4+1+2+2+4 + 4*4 + 2+6+6+2+4
const SW_INTERFACE_DETAILS_SKIPPED: usize = 13 + 16 + 20;

impl Reply for SwInterfaceDetails {
    fn decode(buf: &mut Bytes) -> Result<Self, ChannelError> {
        let sw_if_index = InterfaceIndex::decode(buf)?;
        let sup_sw_if_index = InterfaceIndex::decode(buf)?;
        let l2_address = MacAddress::decode(buf)?;
        let flags = IfStatusFlags(wire::get_u32(buf)?);
        let if_type = wire::get_u32(buf)?;
        let link_duplex = wire::get_u32(buf)?;
        let link_speed = wire::get_u32(buf)?;
        let link_mtu = wire::get_u16(buf)?;
        let mut mtu = [0u32; 4];
        for m in mtu.iter_mut() {
            *m = wire::get_u32(buf)?;
        }
        wire::skip(buf, SW_INTERFACE_DETAILS_SKIPPED)?;
        Ok(SwInterfaceDetails {
            sw_if_index,
            sup_sw_if_index,
            l2_address,
            flags,
            if_type,
            link_duplex,
            link_speed,
            link_mtu,
            mtu,
            interface_name: wire::get_fixed_string(buf, 64)?,
            interface_dev_type: wire::get_fixed_string(buf, 64)?,
            tag: wire::get_fixed_string(buf, 64)?,
        })
    }
}

impl fmt::Display for SwInterfaceDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (ifIndex: {}, mac: {}, mtu: {}, {})",
            self.interface_name, self.sw_if_index, self.l2_address, self.link_mtu, self.flags
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwInterfaceSetFlags {
    pub sw_if_index: InterfaceIndex,
    pub flags: IfStatusFlags,
}

message!(SwInterfaceSetFlags, "sw_interface_set_flags", "f5aec1b8");

impl Request for SwInterfaceSetFlags {
    type Reply = SwInterfaceSetFlagsReply;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        buf.put_u32(self.flags.0);
    }
}

retval_reply!(SwInterfaceSetFlagsReply, "sw_interface_set_flags_reply", "e8d4e804");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwInterfaceSetMacAddress {
    pub sw_if_index: InterfaceIndex,
    pub mac_address: MacAddress,
}

message!(SwInterfaceSetMacAddress, "sw_interface_set_mac_address", "c536e7eb");

impl Request for SwInterfaceSetMacAddress {
    type Reply = SwInterfaceSetMacAddressReply;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        self.mac_address.encode(buf);
    }
}

retval_reply!(
    SwInterfaceSetMacAddressReply,
    "sw_interface_set_mac_address_reply",
    "e8d4e804"
);

/// Per-protocol MTUs: L3, IPv4, IPv6, MPLS. Zero leaves a protocol unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwInterfaceSetMtu {
    pub sw_if_index: InterfaceIndex,
    pub mtu: [u32; 4],
}

message!(SwInterfaceSetMtu, "sw_interface_set_mtu", "5cbe85e5");

impl Request for SwInterfaceSetMtu {
    type Reply = SwInterfaceSetMtuReply;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        for mtu in self.mtu {
            buf.put_u32(mtu);
        }
    }
}

retval_reply!(SwInterfaceSetMtuReply, "sw_interface_set_mtu_reply", "e8d4e804");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwInterfaceAddDelAddress {
    pub sw_if_index: InterfaceIndex,
    pub is_add: bool,
    pub del_all: bool,
    pub prefix: Prefix,
}

message!(SwInterfaceAddDelAddress, "sw_interface_add_del_address", "5463d73b");

impl Request for SwInterfaceAddDelAddress {
    type Reply = SwInterfaceAddDelAddressReply;

    fn encode(&self, buf: &mut BytesMut) {
        self.sw_if_index.encode(buf);
        wire::put_bool(buf, self.is_add);
        wire::put_bool(buf, self.del_all);
        self.prefix.encode(buf);
    }
}

retval_reply!(
    SwInterfaceAddDelAddressReply,
    "sw_interface_add_del_address_reply",
    "e8d4e804"
);

pub const ALL_MESSAGES: &[MessageRef] = &[
    MessageRef::of::<CreateLoopback>(),
    MessageRef::of::<CreateLoopbackReply>(),
    MessageRef::of::<SwInterfaceDump>(),
    MessageRef::of::<SwInterfaceDetails>(),
    MessageRef::of::<SwInterfaceSetFlags>(),
    MessageRef::of::<SwInterfaceSetFlagsReply>(),
    MessageRef::of::<SwInterfaceSetMacAddress>(),
    MessageRef::of::<SwInterfaceSetMacAddressReply>(),
    MessageRef::of::<SwInterfaceSetMtu>(),
    MessageRef::of::<SwInterfaceSetMtuReply>(),
    MessageRef::of::<SwInterfaceAddDelAddress>(),
    MessageRef::of::<SwInterfaceAddDelAddressReply>(),
];
