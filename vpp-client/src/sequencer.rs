//! # Control Operations and Request Sequencer
//!
//! ## Purpose
//!
//! The control operations of the example client (version query, interface
//! listing, MAC/MTU/status changes, address and route installation, tunnel
//! creation) and the ordered sequence that exercises them.
//!
//! ## How it works
//!
//! Every operation validates and parses its text input first, so malformed
//! input fails with `Error::InvalidAddress` before any request is sent. It
//! then issues one request (or one dump) on the `Channel` and maps a failed
//! exchange to `Error::ControlCallFailed` naming the operation.
//!
//! `run_sequence` calls the operations in order. Most failures are recorded in
//! the caller's `ErrorLog` and the sequence continues. Steps depending on a
//! handle that could not be obtained are skipped. Setting the administrative
//! status is sequence-critical: its failure is returned and nothing else runs.
//!
//! ## Main components
//!
//! - Operation functions (`show_version`, `list_interfaces`, `add_route`, ...).
//! - `ErrorLog`: caller-owned accumulator of non-fatal errors.
//! - `run_sequence`, `SequenceReport`: the example sequence and its outcome.

use crate::binapi::gre::{GreTunnel, GreTunnelAddDel};
use crate::binapi::interface::{
    CreateLoopback, SwInterfaceAddDelAddress, SwInterfaceDetails, SwInterfaceDump,
    SwInterfaceSetFlags, SwInterfaceSetMacAddress, SwInterfaceSetMtu,
};
use crate::binapi::ip::{FibPath, IpAddressDetails, IpAddressDump, IpRoute, IpRouteAddDel};
use crate::binapi::vpe::{ShowVersion, ShowVersionReply, ShowVpeSystemTime};
use crate::channel::{Channel, ReplyStream};
use crate::config::Scenario;
use crate::error::Error;
use crate::types::{Address, IfStatusFlags, InterfaceIndex, MacAddress, Prefix};
use std::fmt;

/// Queries the forwarding plane's version.
pub fn show_version(ch: &mut impl Channel) -> Result<ShowVersionReply, Error> {
    let reply = ch
        .send_request(&ShowVersion)
        .map_err(Error::call("retrieving version"))?;
    log::info!("VPP version: {:?} ({})", reply.version, reply.build_date);
    Ok(reply)
}

/// Queries the forwarding plane's clock, in seconds since the epoch.
pub fn show_system_time(ch: &mut impl Channel) -> Result<f64, Error> {
    let reply = ch
        .send_request(&ShowVpeSystemTime)
        .map_err(Error::call("retrieving system time"))?;
    log::info!("system time: {}", reply.vpe_system_time);
    Ok(reply.vpe_system_time)
}

/// Creates a loopback interface. `None` lets the endpoint pick the MAC.
pub fn create_loopback(
    ch: &mut impl Channel,
    mac: Option<&str>,
) -> Result<InterfaceIndex, Error> {
    let mac_address = mac.map(MacAddress::parse).transpose()?.unwrap_or_default();
    let reply = ch
        .send_request(&CreateLoopback { mac_address })
        .map_err(Error::call("creating loopback"))?;
    log::info!("loopback created: {}", reply.sw_if_index);
    Ok(reply.sw_if_index)
}

/// Lists interfaces, all of them when `index` is `None`.
pub fn list_interfaces(
    ch: &mut impl Channel,
    index: Option<InterfaceIndex>,
) -> Result<Vec<SwInterfaceDetails>, Error> {
    let req = SwInterfaceDump {
        sw_if_index: InterfaceIndex::or_unset(index),
        name_filter: None,
    };
    let stream = ch
        .send_multi_request(&req)
        .map_err(Error::call("listing interfaces"))?;
    let interfaces = drain(stream, "listing interfaces", |iface| {
        println!(" - interface: {iface}")
    })?;
    log::info!("listed {} interface(s)", interfaces.len());
    Ok(interfaces)
}

/// Lists the IPv4 (or IPv6) addresses of one interface.
pub fn list_ip_addresses(
    ch: &mut impl Channel,
    index: InterfaceIndex,
    ipv6: bool,
) -> Result<Vec<IpAddressDetails>, Error> {
    let req = IpAddressDump {
        sw_if_index: index,
        is_ipv6: ipv6,
    };
    let stream = ch
        .send_multi_request(&req)
        .map_err(Error::call("listing IP addresses"))?;
    drain(stream, "listing IP addresses", |addr| {
        println!(" - IP address: {addr}")
    })
}

/// Collects a detail stream, handing each record to `each` as it arrives.
/// Records seen before a failure have already been passed on.
pub(crate) fn drain<T>(
    stream: ReplyStream<'_, T>,
    call: &'static str,
    mut each: impl FnMut(&T),
) -> Result<Vec<T>, Error> {
    let mut records = Vec::new();
    for record in stream {
        let record = record.map_err(Error::call(call))?;
        each(&record);
        records.push(record);
    }
    Ok(records)
}

pub fn set_interface_mac(
    ch: &mut impl Channel,
    index: InterfaceIndex,
    mac: &str,
) -> Result<(), Error> {
    let mac_address = MacAddress::parse(mac)?;
    ch.send_request(&SwInterfaceSetMacAddress {
        sw_if_index: index,
        mac_address,
    })
    .map_err(Error::call("setting MAC address"))?;
    log::info!("MAC address set: {mac_address} for interface {index}");
    Ok(())
}

/// Sets or clears the admin-up flag.
pub fn set_interface_status(
    ch: &mut impl Channel,
    index: InterfaceIndex,
    up: bool,
) -> Result<(), Error> {
    ch.send_request(&SwInterfaceSetFlags {
        sw_if_index: index,
        flags: IfStatusFlags::admin(up),
    })
    .map_err(Error::call("setting interface flags"))?;
    log::info!(
        "interface {index} status set to {}",
        if up { "UP" } else { "DOWN" }
    );
    Ok(())
}

/// Sets the L3 MTU of an interface.
pub fn set_interface_mtu(
    ch: &mut impl Channel,
    index: InterfaceIndex,
    mtu: u32,
) -> Result<(), Error> {
    if mtu == 0 {
        return Err(Error::InvalidArgument("MTU must be positive".to_string()));
    }
    ch.send_request(&SwInterfaceSetMtu {
        sw_if_index: index,
        mtu: [mtu, 0, 0, 0],
    })
    .map_err(Error::call("setting MTU"))?;
    log::info!("MTU set: {mtu} for interface {index}");
    Ok(())
}

/// Adds `cidr` (host address and prefix length) to an interface.
pub fn add_interface_address(
    ch: &mut impl Channel,
    index: InterfaceIndex,
    cidr: &str,
) -> Result<(), Error> {
    let prefix = Prefix::parse_host(cidr)?;
    ch.send_request(&SwInterfaceAddDelAddress {
        sw_if_index: index,
        is_add: true,
        del_all: false,
        prefix,
    })
    .map_err(Error::call("adding IP address"))?;
    log::info!("IP address {prefix} added to interface {index}");
    Ok(())
}

/// Installs a single-path route to `destination` via `next_hop`, through
/// `egress` when given.
pub fn add_route(
    ch: &mut impl Channel,
    destination: &str,
    next_hop: &str,
    egress: Option<InterfaceIndex>,
) -> Result<(), Error> {
    let prefix = Prefix::parse_network(destination)?;
    let next_hop = Address::parse(next_hop)?;
    let req = IpRouteAddDel {
        is_add: true,
        is_multipath: false,
        route: IpRoute {
            table_id: 0,
            stats_index: 0,
            prefix,
            paths: vec![FibPath::via(next_hop, egress)],
        },
    };
    ch.send_request(&req).map_err(Error::call("adding IP route"))?;
    match egress {
        Some(index) => log::info!("route added: {prefix} via {next_hop} through interface {index}"),
        None => log::info!("route added: {prefix} via {next_hop}"),
    }
    Ok(())
}

/// Creates a point-to-point GRE tunnel and returns its interface.
pub fn create_gre_tunnel(
    ch: &mut impl Channel,
    src: &str,
    dst: &str,
) -> Result<InterfaceIndex, Error> {
    let src_addr = Address::parse(src)?;
    let dst_addr = Address::parse(dst)?;
    let reply = ch
        .send_request(&GreTunnelAddDel {
            is_add: true,
            tunnel: GreTunnel::point_to_point(src_addr, dst_addr),
        })
        .map_err(Error::call("creating GRE tunnel"))?;
    log::info!(
        "GRE tunnel created: src {src_addr} dst {dst_addr} (interface {})",
        reply.sw_if_index
    );
    Ok(reply.sw_if_index)
}

/// Creates a GRE tunnel and brings it administratively up. Either failure is
/// returned as is; nothing is recorded or skipped.
pub fn setup_gre_tunnel(
    ch: &mut impl Channel,
    src: &str,
    dst: &str,
) -> Result<InterfaceIndex, Error> {
    let tunnel = create_gre_tunnel(ch, src, dst)?;
    set_interface_status(ch, tunnel, true)?;
    Ok(tunnel)
}

/// A non-fatal error together with what was being done.
#[derive(Debug)]
pub struct LoggedError {
    pub context: &'static str,
    pub error: Error,
}

impl fmt::Display for LoggedError {
    /// A failed call already names its operation, so only its cause follows
    /// the context.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Error::ControlCallFailed { source, .. } => write!(f, "{}: {source}", self.context),
            error => write!(f, "{}: {error}", self.context),
        }
    }
}

/// Non-fatal errors collected during a run, owned by the caller.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<LoggedError>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, context: &'static str, error: Error) {
        let entry = LoggedError { context, error };
        log::error!("{entry}");
        self.entries.push(entry);
    }

    /// Records the error of `result`, if any, and passes the value on.
    pub fn check<T>(&mut self, context: &'static str, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.record(context, error);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoggedError> {
        self.entries.iter()
    }
}

/// Steps of `run_sequence` that can be skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    InterfaceSetup,
    TunnelAddress,
    TunnelActivation,
    TunnelRoute,
}

/// What a completed (non-fatal) run produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub interface: Option<InterfaceIndex>,
    pub tunnel: Option<InterfaceIndex>,
    pub skipped: Vec<Step>,
}

/// Runs the example sequence against `ch`.
///
/// Non-fatal errors go to `errors`. Returns `Err` only when setting the
/// administrative status fails, in which case the remaining steps are not
/// attempted.
pub fn run_sequence(
    ch: &mut impl Channel,
    scenario: &Scenario,
    errors: &mut ErrorLog,
) -> Result<SequenceReport, Error> {
    let mut report = SequenceReport::default();

    errors.check("retrieving version", show_version(ch));
    errors.check("retrieving system time", show_system_time(ch));
    errors.check("listing interfaces", list_interfaces(ch, None));

    let interface = if scenario.create_loopback {
        errors.check("creating loopback", create_loopback(ch, None))
    } else {
        Some(scenario.interface)
    };
    report.interface = interface;

    match interface {
        Some(index) => {
            errors.check("setting MAC address", set_interface_mac(ch, index, &scenario.mac));
            errors.check(
                "adding IP address",
                add_interface_address(ch, index, &scenario.address),
            );
            errors.check("listing IP addresses", list_ip_addresses(ch, index, false));
            errors.check(
                "adding IP route",
                add_route(ch, &scenario.default_route, &scenario.gateway, None),
            );
            set_interface_status(ch, index, true)?;
            errors.check("setting MTU", set_interface_mtu(ch, index, scenario.mtu));
        }
        None => {
            log::warn!("no interface to configure, skipping interface setup");
            report.skipped.push(Step::InterfaceSetup);
        }
    }

    let tunnel_steps = [Step::TunnelAddress, Step::TunnelActivation, Step::TunnelRoute];

    let Some(tunnel) = errors.check(
        "creating GRE tunnel",
        create_gre_tunnel(ch, &scenario.tunnel_src, &scenario.tunnel_dst),
    ) else {
        report.skipped.extend(tunnel_steps);
        return Ok(report);
    };
    report.tunnel = Some(tunnel);

    if errors
        .check(
            "adding IP address to tunnel",
            add_interface_address(ch, tunnel, &scenario.tunnel_address),
        )
        .is_none()
    {
        report.skipped.extend(&tunnel_steps[1..]);
        return Ok(report);
    }

    set_interface_status(ch, tunnel, true)?;

    errors.check(
        "adding route via GRE tunnel",
        add_route(
            ch,
            &scenario.tunnel_route,
            &scenario.tunnel_next_hop,
            Some(tunnel),
        ),
    );

    Ok(report)
}
