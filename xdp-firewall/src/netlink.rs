//! # Interface Lookup over Netlink
//!
//! ## Purpose
//!
//! Resolves the network interface the classifier is attached to. The loader
//! is configured with an interface name; the kernel hook needs its index.
//!
//! ## How it works
//!
//! A `RTM_GETLINK` dump is sent on a raw `NETLINK_ROUTE` socket. The generic
//! `netlink` function sends the request and hands every message of the
//! (possibly multi-part) answer to a parsing closure; `get_links` turns each
//! `NewLink` message into a `Link`.
//!
//! ## Main components
//!
//! - `netlink()`: request/dump message loop.
//! - `get_links()`, `link_by_name()`: interface queries.
//! - `Link`: index, name, MTU and hardware address of an interface.

use crate::error::Error;
use netlink_packet_core::{
    NLM_F_DUMP, NLM_F_REQUEST, NetlinkDeserializable, NetlinkMessage, NetlinkPayload,
    NetlinkSerializable,
};
use netlink_packet_route::RouteNetlinkMessage;
use netlink_packet_route::link::{LinkAttribute, LinkMessage};
use netlink_sys::{Socket, SocketAddr};
use std::io;

/// A network interface as reported by the kernel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link {
    pub if_index: u32,
    pub name: String,
    pub mtu: u32,
    /// All zeros for links without a 6-byte hardware address.
    pub mac: [u8; 6],
}

/// Sends a dump request and collects what `f` extracts from every message of
/// the answer.
pub fn netlink<T, F, R>(mut req: NetlinkMessage<T>, f: F) -> Result<Vec<R>, io::Error>
where
    T: NetlinkSerializable + NetlinkDeserializable,
    F: Fn(NetlinkMessage<T>) -> Result<Option<R>, io::Error>,
{
    let mut socket = Socket::new(netlink_sys::constants::NETLINK_ROUTE)?;
    socket.bind(&SocketAddr::new(0, 0))?;
    req.header.flags = NLM_F_REQUEST | NLM_F_DUMP;
    req.finalize();
    let mut send_buf = vec![0u8; req.buffer_len()];
    req.serialize(&mut send_buf);
    if socket.send(&send_buf, 0)? != send_buf.len() {
        return Err(io::Error::other("short write of netlink request"));
    }

    let mut result = Vec::new();
    loop {
        let (recv_buf, _) = socket.recv_from_full()?;
        let mut view = &recv_buf[..];
        while !view.is_empty() {
            let msg = NetlinkMessage::<T>::deserialize(view).map_err(io::Error::other)?;
            let len = msg.header.length as usize;
            if len == 0 || len > view.len() {
                return Err(io::Error::other("malformed netlink message length"));
            }
            match msg.payload {
                NetlinkPayload::Done(_) => return Ok(result),
                NetlinkPayload::Error(ref e) => {
                    return Err(io::Error::other(format!("netlink error: {e:?}")));
                }
                _ => {
                    if let Some(r) = f(msg)? {
                        result.push(r);
                    }
                }
            }
            view = &view[len..];
        }
    }
}

/// Lists every interface of the current network namespace.
pub fn get_links() -> Result<Vec<Link>, Error> {
    let req = NetlinkMessage::from(RouteNetlinkMessage::GetLink(LinkMessage::default()));
    netlink(req, |msg| match msg.payload {
        NetlinkPayload::InnerMessage(RouteNetlinkMessage::NewLink(ref link_msg)) => {
            let mut link = Link {
                if_index: link_msg.header.index,
                ..Default::default()
            };
            for attr in link_msg.attributes.iter() {
                match attr {
                    LinkAttribute::IfName(name) => link.name = name.to_string(),
                    LinkAttribute::Mtu(mtu) => link.mtu = *mtu,
                    LinkAttribute::Address(mac) if mac.len() == 6 => {
                        link.mac.copy_from_slice(mac);
                    }
                    _ => {}
                }
            }
            Ok(Some(link))
        }
        _ => Ok(None),
    })
    .map_err(Error::Netlink)
}

/// Finds the interface called `name`.
pub fn link_by_name(name: &str) -> Result<Link, Error> {
    get_links()?
        .into_iter()
        .find(|link| link.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}
