//! # Control API Value Types
//!
//! ## Purpose
//!
//! Strongly typed values shared by the binary API messages: interface handles,
//! IP addresses and prefixes, hardware addresses and interface status flags.
//!
//! ## How it works
//!
//! Text input is parsed with `std::net`, `ipnet` and `eui48`; every parse
//! failure becomes `Error::InvalidAddress` so that the caller can reject the
//! input before anything is sent to the control endpoint. Each type knows its
//! packed big-endian wire layout.
//!
//! ## Main components
//!
//! - `InterfaceIndex`: newtype handle with the all-ones `UNSET` sentinel.
//! - `Address`: `V4` / `V6` tagged variant, encoded as family + 16-byte union.
//! - `Prefix`: address with prefix length.
//! - `MacAddress`, `IfStatusFlags`.

use crate::error::{ChannelError, Error};
use crate::wire;
use bytes::{Buf, BufMut as _, BytesMut};
use ipnet::IpNet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Opaque interface handle assigned by the forwarding plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceIndex(u32);

impl InterfaceIndex {
    /// All ones: "no interface", "any interface" or "pick one for me",
    /// depending on the message. Never returned for a real interface.
    pub const UNSET: InterfaceIndex = InterfaceIndex(u32::MAX);

    pub const fn new(index: u32) -> Self {
        InterfaceIndex(index)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }

    /// Maps an optional handle onto the wire value, `None` becoming `UNSET`.
    pub fn or_unset(index: Option<InterfaceIndex>) -> InterfaceIndex {
        index.unwrap_or(Self::UNSET)
    }

    pub(crate) fn encode(self, buf: &mut BytesMut) {
        buf.put_u32(self.0);
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ChannelError> {
        wire::get_u32(buf).map(InterfaceIndex)
    }
}

impl fmt::Display for InterfaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            f.write_str("unset")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Address family tag as carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressFamily {
    Ip4 = 0,
    Ip6 = 1,
}

/// An IP address as the control API sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Address {
    V4([u8; 4]),
    V6([u8; 16]),
}

impl Address {
    /// Parses a textual IPv4 or IPv6 address.
    pub fn parse(text: &str) -> Result<Self, Error> {
        text.trim()
            .parse::<IpAddr>()
            .map(Address::from)
            .map_err(|e| Error::invalid_address(text, e))
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Address::V4(_) => AddressFamily::Ip4,
            Address::V6(_) => AddressFamily::Ip6,
        }
    }

    pub fn octets(&self) -> &[u8] {
        match self {
            Address::V4(octets) => octets,
            Address::V6(octets) => octets,
        }
    }

    /// Writes the 16-byte address union; IPv4 occupies the first four bytes.
    pub(crate) fn encode_union(&self, buf: &mut BytesMut) {
        let octets = self.octets();
        buf.put_slice(octets);
        buf.put_bytes(0, 16 - octets.len());
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.family() as u8);
        self.encode_union(buf);
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ChannelError> {
        let af = wire::get_u8(buf)?;
        let un = wire::get_array::<16>(buf)?;
        match af {
            0 => Ok(Address::V4([un[0], un[1], un[2], un[3]])),
            1 => Ok(Address::V6(un)),
            other => Err(ChannelError::malformed(format!(
                "unknown address family {other}"
            ))),
        }
    }
}

impl From<IpAddr> for Address {
    /// IPv4-mapped IPv6 addresses are canonicalised to `V4`.
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Address::V4(v4.octets()),
            IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
                Some(v4) => Address::V4(v4.octets()),
                None => Address::V6(v6.octets()),
            },
        }
    }
}

impl From<Address> for IpAddr {
    fn from(addr: Address) -> Self {
        match addr {
            Address::V4(octets) => IpAddr::V4(Ipv4Addr::from(octets)),
            Address::V6(octets) => IpAddr::V6(Ipv6Addr::from(octets)),
        }
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    /// Accepts a raw address of exactly 4 or 16 bytes.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        match bytes.len() {
            4 => Ok(Address::V4([bytes[0], bytes[1], bytes[2], bytes[3]])),
            16 => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(bytes);
                Ok(Address::from(IpAddr::V6(Ipv6Addr::from(octets))))
            }
            n => Err(Error::invalid_address(
                &format!("{bytes:02x?}"),
                format!("expected 4 or 16 bytes, got {n}"),
            )),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", IpAddr::from(*self))
    }
}

/// Address with prefix length (`address_with_prefix` / `prefix` on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub address: Address,
    pub len: u8,
}

impl Prefix {
    /// Parses CIDR text keeping the host part, e.g. an interface address
    /// `10.10.10.1/30`.
    pub fn parse_host(text: &str) -> Result<Self, Error> {
        let net = parse_cidr(text)?;
        Ok(Self::from_net(net.addr(), net.prefix_len()))
    }

    /// Parses CIDR text and masks it to its network address, e.g. a route
    /// destination `103.195.102.92/24` becomes `103.195.102.0/24`.
    pub fn parse_network(text: &str) -> Result<Self, Error> {
        let net = parse_cidr(text)?;
        Ok(Self::from_net(net.network(), net.prefix_len()))
    }

    fn from_net(addr: IpAddr, len: u8) -> Self {
        match (addr, Address::from(addr)) {
            // Only a prefix covering the whole ::ffff:0:0/96 block is IPv4.
            (IpAddr::V6(v6), Address::V4(_)) if len < 96 => Prefix {
                address: Address::V6(v6.octets()),
                len,
            },
            (IpAddr::V6(_), address @ Address::V4(_)) => Prefix {
                address,
                len: len - 96,
            },
            (_, address) => Prefix { address, len },
        }
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        self.address.encode(buf);
        buf.put_u8(self.len);
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ChannelError> {
        let address = Address::decode(buf)?;
        let len = wire::get_u8(buf)?;
        Ok(Prefix { address, len })
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.len)
    }
}

fn parse_cidr(text: &str) -> Result<IpNet, Error> {
    text.trim()
        .parse::<IpNet>()
        .map_err(|e| Error::invalid_address(text, e))
}

/// 48-bit hardware address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Parses `bc:24:11:2c:bd:9a` style text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        eui48::MacAddress::parse_str(text.trim())
            .map(|mac| MacAddress(mac.to_array()))
            .map_err(|e| Error::invalid_address(text, format!("{e:?}")))
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.0);
    }

    pub(crate) fn decode(buf: &mut impl Buf) -> Result<Self, ChannelError> {
        wire::get_array::<6>(buf).map(MacAddress)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// `if_status_flags` bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IfStatusFlags(pub u32);

impl IfStatusFlags {
    pub const ADMIN_UP: IfStatusFlags = IfStatusFlags(1);
    pub const LINK_UP: IfStatusFlags = IfStatusFlags(2);

    /// `ADMIN_UP` when `up`, no flags otherwise.
    pub fn admin(up: bool) -> Self {
        if up { Self::ADMIN_UP } else { Self::default() }
    }

    pub fn contains(self, other: IfStatusFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Display for IfStatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let admin = if self.contains(Self::ADMIN_UP) { "up" } else { "down" };
        let link = if self.contains(Self::LINK_UP) { "up" } else { "down" };
        write!(f, "admin {admin}, link {link}")
    }
}
