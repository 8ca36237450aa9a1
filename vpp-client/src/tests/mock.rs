#![cfg(test)]

use crate::binapi::gre::{GreTunnelAddDel, GreTunnelAddDelReply};
use crate::binapi::interface::{
    CreateLoopback, CreateLoopbackReply, SwInterfaceAddDelAddress, SwInterfaceAddDelAddressReply,
    SwInterfaceDetails, SwInterfaceDump, SwInterfaceSetFlags, SwInterfaceSetFlagsReply,
    SwInterfaceSetMacAddress, SwInterfaceSetMacAddressReply, SwInterfaceSetMtu,
    SwInterfaceSetMtuReply,
};
use crate::binapi::ip::{IpAddressDetails, IpAddressDump, IpRouteAddDel, IpRouteAddDelReply};
use crate::binapi::vpe::{ShowVersion, ShowVersionReply, ShowVpeSystemTime, ShowVpeSystemTimeReply};
use crate::channel::{Channel, Dump, Message, MessageRef, ReplyStream, Request, check_retval};
use crate::error::{ChannelError, Error};
use crate::types::{IfStatusFlags, InterfaceIndex, MacAddress, Prefix};
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::collections::{HashMap, HashSet};

pub const LOOPBACK: InterfaceIndex = InterfaceIndex::new(5);
pub const TUNNEL: InterfaceIndex = InterfaceIndex::new(7);

type Canned = Box<dyn Fn() -> Box<dyn Any>>;

/// Scripted `Channel`: answers from canned replies and remembers every
/// request it was given, in order, together with its encoded body.
#[derive(Default)]
pub struct MockChannel {
    pub sent: Vec<(&'static str, Bytes)>,
    replies: HashMap<&'static str, Canned>,
    details: HashMap<&'static str, Canned>,
    failing: HashSet<&'static str>,
    unknown: Vec<MessageRef>,
}

impl MockChannel {
    /// A channel answering every request of the example sequence.
    pub fn vpp() -> Self {
        let mut ch = MockChannel::default();
        ch.reply::<ShowVersion>(ShowVersionReply {
            retval: 0,
            program: "vpe".to_string(),
            version: "24.10-release".to_string(),
            build_date: "2024-10-30T10:00:00".to_string(),
            build_directory: "/w/workspace".to_string(),
        });
        ch.reply::<ShowVpeSystemTime>(ShowVpeSystemTimeReply {
            retval: 0,
            vpe_system_time: 1_730_000_000.5,
        });
        ch.reply::<CreateLoopback>(CreateLoopbackReply {
            retval: 0,
            sw_if_index: LOOPBACK,
        });
        ch.reply::<SwInterfaceSetMacAddress>(SwInterfaceSetMacAddressReply::default());
        ch.reply::<SwInterfaceAddDelAddress>(SwInterfaceAddDelAddressReply::default());
        ch.reply::<IpRouteAddDel>(IpRouteAddDelReply {
            retval: 0,
            stats_index: 3,
        });
        ch.reply::<SwInterfaceSetFlags>(SwInterfaceSetFlagsReply::default());
        ch.reply::<SwInterfaceSetMtu>(SwInterfaceSetMtuReply::default());
        ch.reply::<GreTunnelAddDel>(GreTunnelAddDelReply {
            retval: 0,
            sw_if_index: TUNNEL,
        });
        ch.details::<SwInterfaceDump>(vec![local0(), ethernet(1)]);
        ch.details::<IpAddressDump>(vec![IpAddressDetails {
            sw_if_index: InterfaceIndex::new(1),
            prefix: Prefix::parse_host("172.93.110.120/24").unwrap(),
        }]);
        ch
    }

    pub fn reply<R: Request>(&mut self, reply: R::Reply)
    where
        R::Reply: Clone,
    {
        self.replies
            .insert(R::NAME, Box::new(move || Box::new(reply.clone()) as Box<dyn Any>));
    }

    pub fn details<D: Dump>(&mut self, records: Vec<D::Details>)
    where
        D::Details: Clone,
    {
        self.details
            .insert(D::NAME, Box::new(move || Box::new(records.clone()) as Box<dyn Any>));
    }

    /// Makes every later `M` request fail with a non-zero retval.
    pub fn fail<M: Message>(&mut self) {
        self.failing.insert(M::NAME);
    }

    pub fn unknown(&mut self, message: MessageRef) {
        self.unknown.push(message);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.sent.iter().map(|(name, _)| *name).collect()
    }

    /// Encoded bodies of every `M` sent so far.
    pub fn bodies<M: Message>(&self) -> Vec<Bytes> {
        self.sent
            .iter()
            .filter(|(name, _)| *name == M::NAME)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record<M: Message>(&mut self, encode: impl FnOnce(&mut BytesMut)) -> Result<(), ChannelError> {
        let mut body = BytesMut::new();
        encode(&mut body);
        self.sent.push((M::NAME, body.freeze()));
        if self.failing.contains(M::NAME) {
            return Err(ChannelError::Retval {
                message: M::NAME,
                retval: -1,
            });
        }
        Ok(())
    }
}

impl Channel for MockChannel {
    fn send_request<R: Request>(&mut self, req: &R) -> Result<R::Reply, ChannelError> {
        self.record::<R>(|buf| req.encode(buf))?;
        let canned = self.replies.get(R::NAME).ok_or(ChannelError::Timeout)?;
        let reply = canned()
            .downcast::<R::Reply>()
            .map_err(|_| ChannelError::malformed(format!("canned reply of {}", R::NAME)))?;
        check_retval(*reply)
    }

    fn send_multi_request<D: Dump>(
        &mut self,
        req: &D,
    ) -> Result<ReplyStream<'_, D::Details>, ChannelError> {
        self.record::<D>(|buf| req.encode(buf))?;
        let records = match self.details.get(D::NAME) {
            Some(canned) => *canned()
                .downcast::<Vec<D::Details>>()
                .map_err(|_| ChannelError::malformed(format!("canned details of {}", D::NAME)))?,
            None => Vec::new(),
        };
        Ok(Box::new(records.into_iter().map(Ok)))
    }

    fn check_compatibility(&self, messages: &[MessageRef]) -> Result<(), Error> {
        let incompatible: Vec<String> = messages
            .iter()
            .filter(|m| self.unknown.contains(m))
            .map(MessageRef::name_crc)
            .collect();
        if incompatible.is_empty() {
            Ok(())
        } else {
            Err(Error::CompatibilityMismatch { incompatible })
        }
    }
}

pub fn interface(index: u32, name: &str) -> SwInterfaceDetails {
    SwInterfaceDetails {
        sw_if_index: InterfaceIndex::new(index),
        sup_sw_if_index: InterfaceIndex::new(index),
        l2_address: MacAddress::default(),
        flags: IfStatusFlags::default(),
        if_type: 0,
        link_duplex: 0,
        link_speed: 0,
        link_mtu: 0,
        mtu: [0; 4],
        interface_name: name.to_string(),
        interface_dev_type: String::new(),
        tag: String::new(),
    }
}

pub fn local0() -> SwInterfaceDetails {
    interface(0, "local0")
}

pub fn ethernet(index: u32) -> SwInterfaceDetails {
    SwInterfaceDetails {
        l2_address: MacAddress([0xbc, 0x24, 0x11, 0x2c, 0xbd, 0x9a]),
        flags: IfStatusFlags::ADMIN_UP,
        link_mtu: 1500,
        mtu: [1500, 0, 0, 0],
        interface_dev_type: "dpdk".to_string(),
        ..interface(index, &format!("GigabitEthernet0/{index}/0"))
    }
}
