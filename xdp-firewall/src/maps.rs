//! # Classifier Tables Shared with the XDP Program
//!
//! ## Purpose
//!
//! User-space view of the maps exported by the classifier object: the
//! destination table (`ipv4_destination_map`) keyed by IPv4 address and the
//! single-slot packet counter (`pkt_count`).
//!
//! ## How it works
//!
//! Keys and values are `#[repr(C)]` plain-old-data types whose sizes are
//! asserted at compile time and checked again against the loaded object when
//! a map handle is taken. `BpfMap` performs the element syscalls through
//! `libbpf-sys`. Callers go through the `ClassifierTable` and
//! `PacketCounter` traits so that the population and polling logic also runs
//! against in-memory doubles.
//!
//! ## Main components
//!
//! - `Ipv4Key`, `DestinationInfo`, `DestUsage`, `ActionType`: table layout.
//! - `BpfMap`: typed handle on one map of a `LoadedProgram`.
//! - `ClassifierTable`, `PacketCounter`: access traits.
//! - `populate()`: writes the configured entries.

use crate::error::Error;
use crate::xdp_prog::LoadedProgram;
use static_assertions::assert_eq_size;
use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::mem::{MaybeUninit, size_of};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Types that can be copied byte for byte into and out of a BPF map.
///
/// # Safety
/// Implementors must be `#[repr(C)]` or `#[repr(transparent)]`, contain no
/// padding and be valid for every bit pattern.
pub unsafe trait Pod: Copy + 'static {}

unsafe impl Pod for u32 {}
unsafe impl Pod for u64 {}

/// IPv4 address in network byte order, as the XDP program reads it from the
/// packet header.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4Key([u8; 4]);

unsafe impl Pod for Ipv4Key {}

impl Ipv4Key {
    /// Parses dotted-decimal text.
    pub fn parse(text: &str) -> Result<Self, Error> {
        text.trim()
            .parse::<Ipv4Addr>()
            .map(Ipv4Key::from)
            .map_err(|e| Error::InvalidAddress {
                input: text.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn octets(&self) -> [u8; 4] {
        self.0
    }

    /// Key of the address whose big-endian integer form is `addr`.
    pub fn from_be_u32(addr: u32) -> Self {
        Ipv4Key(addr.to_be_bytes())
    }
}

impl From<Ipv4Key> for u32 {
    fn from(key: Ipv4Key) -> Self {
        u32::from_be_bytes(key.0)
    }
}

impl From<Ipv4Addr> for Ipv4Key {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Key(addr.octets())
    }
}

impl From<Ipv4Key> for Ipv4Addr {
    fn from(key: Ipv4Key) -> Self {
        Ipv4Addr::from(key.0)
    }
}

impl fmt::Display for Ipv4Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv4Addr::from(*self), f)
    }
}

/// `enum dst_usage`
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DestUsage(pub u32);

impl DestUsage {
    pub const LOCAL_MACHINE: DestUsage = DestUsage(0);
    pub const TUNNEL_HOST: DestUsage = DestUsage(1);
    pub const TUNNEL_FORWARD: DestUsage = DestUsage(2);
    pub const FACILITY: DestUsage = DestUsage(3);

    const NAMES: [(&'static str, DestUsage); 4] = [
        ("local-machine", Self::LOCAL_MACHINE),
        ("tunnel-host", Self::TUNNEL_HOST),
        ("tunnel-forward", Self::TUNNEL_FORWARD),
        ("facility", Self::FACILITY),
    ];
}

/// `enum action`
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ActionType(pub u32);

impl ActionType {
    pub const ALLOW: ActionType = ActionType(0);
    pub const BLOCK: ActionType = ActionType(1);
    pub const RATE_LIMIT: ActionType = ActionType(2);

    const NAMES: [(&'static str, ActionType); 3] = [
        ("allow", Self::ALLOW),
        ("block", Self::BLOCK),
        ("rate-limit", Self::RATE_LIMIT),
    ];
}

macro_rules! named_enum {
    ($ty:ident, $what:literal) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::NAMES
                    .iter()
                    .find(|(name, _)| *name == s)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| {
                        let known: Vec<_> = $ty::NAMES.iter().map(|(name, _)| *name).collect();
                        format!("unknown {} {s:?}, expected one of {}", $what, known.join(", "))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match $ty::NAMES.iter().find(|(_, value)| value == self) {
                    Some((name, _)) => f.write_str(name),
                    None => write!(f, "{}({})", $what, self.0),
                }
            }
        }
    };
}

named_enum!(DestUsage, "usage");
named_enum!(ActionType, "action");

/// Value of the destination table, `struct destination_info`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DestinationInfo {
    pub usage: DestUsage,
    pub default_action: ActionType,
    pub rx_bytes: u32,
    pub rx_pkts: u32,
    pub tx_bytes: u32,
    pub tx_pkts: u32,
}

unsafe impl Pod for DestinationInfo {}

assert_eq_size!(Ipv4Key, u32);
assert_eq_size!(DestinationInfo, [u8; 24]);

impl DestinationInfo {
    /// A fresh entry with zeroed counters.
    pub fn new(usage: DestUsage, default_action: ActionType) -> Self {
        DestinationInfo {
            usage,
            default_action,
            ..Default::default()
        }
    }
}

/// Typed handle on a map of a loaded program. Key and value sizes were
/// checked against the object when the handle was taken.
pub struct BpfMap<'a, K, V> {
    map: *mut libbpf_sys::bpf_map,
    name: String,
    _marker: PhantomData<(&'a LoadedProgram, K, V)>,
}

impl<K: Pod, V: Pod> BpfMap<'_, K, V> {
    /// # Safety
    /// `map` must belong to an object outliving the handle, with key and
    /// value sizes of `K` and `V`.
    pub(crate) unsafe fn new(map: *mut libbpf_sys::bpf_map, name: &str) -> Self {
        BpfMap {
            map,
            name: name.to_string(),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update(&self, key: &K, value: &V) -> Result<(), Error> {
        let ret = unsafe {
            libbpf_sys::bpf_map__update_elem(
                self.map,
                key as *const K as *const libc::c_void,
                size_of::<K>() as libbpf_sys::size_t,
                value as *const V as *const libc::c_void,
                size_of::<V>() as libbpf_sys::size_t,
                libbpf_sys::BPF_ANY as u64,
            )
        };
        if ret < 0 {
            return Err(Error::TableWriteFailed {
                map: self.name.clone(),
                source: io::Error::from_raw_os_error(-ret),
            });
        }
        Ok(())
    }

    /// `None` when the key is absent.
    pub fn lookup(&self, key: &K) -> Result<Option<V>, Error> {
        let mut value = MaybeUninit::<V>::zeroed();
        let ret = unsafe {
            libbpf_sys::bpf_map__lookup_elem(
                self.map,
                key as *const K as *const libc::c_void,
                size_of::<K>() as libbpf_sys::size_t,
                value.as_mut_ptr() as *mut libc::c_void,
                size_of::<V>() as libbpf_sys::size_t,
                0,
            )
        };
        match ret {
            0 => Ok(Some(unsafe { value.assume_init() })),
            e if e == -libc::ENOENT => Ok(None),
            e => Err(Error::TableReadFailed {
                map: self.name.clone(),
                source: io::Error::from_raw_os_error(-e),
            }),
        }
    }
}

/// The destination classification table.
pub trait ClassifierTable {
    /// Inserts or replaces the entry of `key`.
    fn insert(&mut self, key: Ipv4Key, info: DestinationInfo) -> Result<(), Error>;

    fn lookup(&self, key: Ipv4Key) -> Result<Option<DestinationInfo>, Error>;
}

impl ClassifierTable for BpfMap<'_, Ipv4Key, DestinationInfo> {
    fn insert(&mut self, key: Ipv4Key, info: DestinationInfo) -> Result<(), Error> {
        self.update(&key, &info)
    }

    fn lookup(&self, key: Ipv4Key) -> Result<Option<DestinationInfo>, Error> {
        BpfMap::lookup(self, &key)
    }
}

/// Source of the total packet count.
pub trait PacketCounter {
    fn read(&self) -> Result<u64, Error>;
}

impl PacketCounter for BpfMap<'_, u32, u64> {
    /// The counter lives in slot 0; an empty slot reads as zero.
    fn read(&self) -> Result<u64, Error> {
        Ok(self.lookup(&0)?.unwrap_or(0))
    }
}

/// A destination entry as configured: address text, usage and action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub address: String,
    pub usage: DestUsage,
    pub action: ActionType,
}

impl FromStr for Entry {
    type Err = String;

    /// `ADDRESS=USAGE[:ACTION]`, the action defaulting to `allow`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, rest) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ADDRESS=USAGE[:ACTION], got {s:?}"))?;
        let (usage, action) = match rest.split_once(':') {
            Some((usage, action)) => (usage.parse()?, action.parse()?),
            None => (rest.parse()?, ActionType::ALLOW),
        };
        Ok(Entry {
            address: address.to_string(),
            usage,
            action,
        })
    }
}

/// Writes every entry into `table`, later entries replacing earlier ones
/// with the same address. Stops at the first failure.
pub fn populate(table: &mut impl ClassifierTable, entries: &[Entry]) -> Result<(), Error> {
    for entry in entries {
        let key = Ipv4Key::parse(&entry.address)?;
        table.insert(key, DestinationInfo::new(entry.usage, entry.action))?;
        log::info!(
            "destination {key}: usage {}, action {}",
            entry.usage,
            entry.action
        );
    }
    Ok(())
}
