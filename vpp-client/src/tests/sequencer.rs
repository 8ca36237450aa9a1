#![cfg(test)]

use super::mock::{LOOPBACK, MockChannel, TUNNEL};
use crate::binapi::gre::GreTunnelAddDel;
use crate::binapi::interface::{
    CreateLoopback, SwInterfaceAddDelAddress, SwInterfaceDump, SwInterfaceSetFlags,
    SwInterfaceSetMacAddress, SwInterfaceSetMtu,
};
use crate::binapi::ip::{IpAddressDump, IpRouteAddDel};
use crate::config::Scenario;
use crate::channel::ReplyStream;
use crate::error::{ChannelError, Error};
use crate::sequencer::{self, ErrorLog, Step};
use crate::types::InterfaceIndex;

const ETH1: InterfaceIndex = InterfaceIndex::new(1);

// ip_route_add_del body: is_add, is_multipath, table_id, stats_index, then the prefix
const ROUTE_PREFIX_AT: usize = 1 + 1 + 4 + 4;
// followed by n_paths and the first path: sw_if_index, table_id, rpf_id, weight,
// preference, type, flags, proto, next hop union
const ROUTE_PATH_AT: usize = ROUTE_PREFIX_AT + 18 + 1;
const PATH_NEXT_HOP_AT: usize = 4 + 4 + 4 + 1 + 1 + 4 + 4 + 4;

#[test]
fn test_invalid_mac_makes_no_call() {
    let mut ch = MockChannel::vpp();
    let err = sequencer::set_interface_mac(&mut ch, ETH1, "bc:24:11:2c:bd").unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
    assert!(ch.sent.is_empty());
}

#[test]
fn test_invalid_addresses_make_no_call() {
    let mut ch = MockChannel::vpp();
    for cidr in ["172.93.110.120", "172.93.110.300/24", "10.0.0.1/33", "not an address"] {
        let err = sequencer::add_interface_address(&mut ch, ETH1, cidr).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { .. }), "{cidr}: {err}");
    }
    let err = sequencer::add_route(&mut ch, "103.195.102.92/24", "10.10.10", None).unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
    let err = sequencer::create_gre_tunnel(&mut ch, "172.93.110.120", "45.76.233").unwrap_err();
    assert!(matches!(err, Error::InvalidAddress { .. }), "{err}");
    assert!(ch.sent.is_empty());
}

#[test]
fn test_zero_mtu_is_rejected() {
    let mut ch = MockChannel::vpp();
    let err = sequencer::set_interface_mtu(&mut ch, ETH1, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)), "{err}");
    assert!(ch.sent.is_empty());
}

#[test]
fn test_failed_call_names_operation() {
    let mut ch = MockChannel::vpp();
    ch.fail::<SwInterfaceSetMtu>();
    match sequencer::set_interface_mtu(&mut ch, ETH1, 9000) {
        Err(Error::ControlCallFailed {
            call,
            source: ChannelError::Retval { retval, .. },
        }) => {
            assert_eq!(call, "setting MTU");
            assert_eq!(retval, -1);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_reply_is_a_timeout() {
    let mut ch = MockChannel::default();
    let err = sequencer::show_version(&mut ch).unwrap_err();
    assert!(matches!(
        err,
        Error::ControlCallFailed {
            source: ChannelError::Timeout,
            ..
        }
    ));
}

#[test]
fn test_empty_dump_is_empty_vec() {
    let mut ch = MockChannel::default();
    let interfaces = sequencer::list_interfaces(&mut ch, None).unwrap();
    assert!(interfaces.is_empty());
    let addresses = sequencer::list_ip_addresses(&mut ch, ETH1, false).unwrap();
    assert!(addresses.is_empty());
    assert_eq!(ch.names(), ["sw_interface_dump", "ip_address_dump"]);
}

#[test]
fn test_list_all_interfaces_uses_unset_index() {
    let mut ch = MockChannel::vpp();
    let interfaces = sequencer::list_interfaces(&mut ch, None).unwrap();
    assert_eq!(interfaces.len(), 2);
    assert_eq!(interfaces[1].interface_name, "GigabitEthernet0/1/0");
    let body = &ch.bodies::<SwInterfaceDump>()[0];
    assert_eq!(body[..4], [0xff; 4]);
}

#[test]
fn test_route_destination_is_masked() {
    let mut ch = MockChannel::vpp();
    sequencer::add_route(&mut ch, "103.195.102.92/24", "10.10.10.2", Some(TUNNEL)).unwrap();
    let body = &ch.bodies::<IpRouteAddDel>()[0];
    let prefix = &body[ROUTE_PREFIX_AT..ROUTE_PREFIX_AT + 18];
    assert_eq!(prefix[0], 0);
    assert_eq!(prefix[1..5], [103, 195, 102, 0]);
    assert_eq!(prefix[17], 24);
    assert_eq!(body[ROUTE_PREFIX_AT + 18], 1, "single path");
    let path = &body[ROUTE_PATH_AT..];
    assert_eq!(path[..4], TUNNEL.get().to_be_bytes());
    assert_eq!(path[12], 1, "weight");
    assert_eq!(path[PATH_NEXT_HOP_AT..PATH_NEXT_HOP_AT + 4], [10, 10, 10, 2]);
}

#[test]
fn test_default_route_has_no_egress() {
    let mut ch = MockChannel::vpp();
    sequencer::add_route(&mut ch, "0.0.0.0/0", "172.93.110.1", None).unwrap();
    let body = &ch.bodies::<IpRouteAddDel>()[0];
    assert_eq!(body[ROUTE_PATH_AT..ROUTE_PATH_AT + 4], [0xff; 4]);
}

#[test]
fn test_interface_address_keeps_host() {
    let mut ch = MockChannel::vpp();
    sequencer::add_interface_address(&mut ch, TUNNEL, "10.10.10.1/30").unwrap();
    let body = &ch.bodies::<SwInterfaceAddDelAddress>()[0];
    // sw_if_index, is_add, del_all, af, address
    assert_eq!(body[..4], TUNNEL.get().to_be_bytes());
    assert_eq!(body[4], 1);
    assert_eq!(body[7..11], [10, 10, 10, 1]);
    assert_eq!(body[23], 30);
}

#[test]
fn test_tunnel_scenario() {
    let mut ch = MockChannel::vpp();
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &Scenario::default(), &mut errors).unwrap();

    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(report.interface, Some(ETH1));
    assert_eq!(report.tunnel, Some(TUNNEL));
    assert!(report.skipped.is_empty());
    assert_eq!(
        ch.names(),
        [
            "show_version",
            "show_vpe_system_time",
            "sw_interface_dump",
            "sw_interface_set_mac_address",
            "sw_interface_add_del_address",
            "ip_address_dump",
            "ip_route_add_del",
            "sw_interface_set_flags",
            "sw_interface_set_mtu",
            "gre_tunnel_add_del",
            "sw_interface_add_del_address",
            "sw_interface_set_flags",
            "ip_route_add_del",
        ]
    );

    let gre = &ch.bodies::<GreTunnelAddDel>()[0];
    // is_add, type, mode, flags, session_id, instance, outer_table_id, sw_if_index
    assert_eq!(gre[..3], [1, 0, 0]);
    assert_eq!(gre[6..10], [0xff; 4], "automatic instance");
    assert_eq!(gre[19..23], [172, 93, 110, 120]);
    assert_eq!(gre[36..40], [45, 76, 233, 197]);

    let flags = ch.bodies::<SwInterfaceSetFlags>();
    assert_eq!(flags[1][..4], TUNNEL.get().to_be_bytes());
    assert_eq!(flags[1][4..8], 1u32.to_be_bytes(), "admin up");

    let routes = ch.bodies::<IpRouteAddDel>();
    assert_eq!(routes[1][ROUTE_PATH_AT..ROUTE_PATH_AT + 4], TUNNEL.get().to_be_bytes());
}

#[test]
fn test_admin_status_failure_is_fatal() {
    let mut ch = MockChannel::vpp();
    ch.fail::<SwInterfaceSetFlags>();
    let mut errors = ErrorLog::new();
    let err = sequencer::run_sequence(&mut ch, &Scenario::default(), &mut errors).unwrap_err();
    assert!(matches!(err, Error::ControlCallFailed { call: "setting interface flags", .. }));
    assert_eq!(ch.names().last(), Some(&"sw_interface_set_flags"));
    assert!(!ch.names().contains(&"sw_interface_set_mtu"));
    assert!(!ch.names().contains(&"gre_tunnel_add_del"));
    assert!(errors.is_empty());
}

#[test]
fn test_mtu_failure_continues() {
    let mut ch = MockChannel::vpp();
    ch.fail::<SwInterfaceSetMtu>();
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &Scenario::default(), &mut errors).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.iter().next().map(|e| e.context), Some("setting MTU"));
    assert_eq!(report.tunnel, Some(TUNNEL));
    assert_eq!(ch.names().last(), Some(&"ip_route_add_del"));
}

#[test]
fn test_recorded_errors_do_not_stop_sequence() {
    let mut ch = MockChannel::vpp();
    ch.fail::<SwInterfaceSetMacAddress>();
    ch.fail::<IpAddressDump>();
    let scenario = Scenario {
        gateway: "172.93.110".to_string(),
        ..Scenario::default()
    };
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &scenario, &mut errors).unwrap();
    let contexts: Vec<_> = errors.iter().map(|e| e.context).collect();
    assert_eq!(
        contexts,
        ["setting MAC address", "listing IP addresses", "adding IP route"]
    );
    assert_eq!(report.tunnel, Some(TUNNEL));
    assert_eq!(ch.bodies::<IpRouteAddDel>().len(), 1, "default route never sent");
}

#[test]
fn test_tunnel_failure_skips_dependent_steps() {
    let mut ch = MockChannel::vpp();
    ch.fail::<GreTunnelAddDel>();
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &Scenario::default(), &mut errors).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(report.tunnel, None);
    assert_eq!(
        report.skipped,
        [Step::TunnelAddress, Step::TunnelActivation, Step::TunnelRoute]
    );
    assert_eq!(ch.names().last(), Some(&"gre_tunnel_add_del"));
}

#[test]
fn test_tunnel_address_failure_skips_activation() {
    let mut ch = MockChannel::vpp();
    let scenario = Scenario {
        tunnel_address: "10.10.10.1/40".to_string(),
        ..Scenario::default()
    };
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &scenario, &mut errors).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(report.tunnel, Some(TUNNEL));
    assert_eq!(report.skipped, [Step::TunnelActivation, Step::TunnelRoute]);
    assert_eq!(ch.bodies::<SwInterfaceSetFlags>().len(), 1);
}

#[test]
fn test_loopback_feeds_interface_setup() {
    let mut ch = MockChannel::vpp();
    let scenario = Scenario {
        create_loopback: true,
        ..Scenario::default()
    };
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &scenario, &mut errors).unwrap();
    assert!(errors.is_empty());
    assert_eq!(report.interface, Some(LOOPBACK));
    let mac = &ch.bodies::<SwInterfaceSetMacAddress>()[0];
    assert_eq!(mac[..4], LOOPBACK.get().to_be_bytes());
    assert_eq!(mac[4..], [0xbc, 0x24, 0x11, 0x2c, 0xbd, 0x9a]);
    let loopback = &ch.bodies::<CreateLoopback>()[0];
    assert_eq!(loopback[..], [0; 6], "endpoint picks the MAC");
}

#[test]
fn test_loopback_failure_skips_interface_setup() {
    let mut ch = MockChannel::vpp();
    ch.fail::<CreateLoopback>();
    let scenario = Scenario {
        create_loopback: true,
        ..Scenario::default()
    };
    let mut errors = ErrorLog::new();
    let report = sequencer::run_sequence(&mut ch, &scenario, &mut errors).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(report.interface, None);
    assert_eq!(report.skipped, [Step::InterfaceSetup]);
    assert_eq!(report.tunnel, Some(TUNNEL));
    assert!(!ch.names().contains(&"sw_interface_set_mtu"));
    assert!(!ch.names().contains(&"ip_address_dump"));
}

#[test]
fn test_advisory_compatibility() {
    use crate::binapi::gre;
    use crate::channel::{Channel as _, MessageRef};

    let mut ch = MockChannel::vpp();
    assert!(ch.check_compatibility(gre::ALL_MESSAGES).is_ok());
    ch.unknown(MessageRef::of::<GreTunnelAddDel>());
    match ch.check_compatibility(gre::ALL_MESSAGES) {
        Err(Error::CompatibilityMismatch { incompatible }) => {
            assert_eq!(incompatible, ["gre_tunnel_add_del_a27d7f17"]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_dump_request_names() {
    let mut ch = MockChannel::vpp();
    sequencer::list_interfaces(&mut ch, Some(ETH1)).unwrap();
    sequencer::list_ip_addresses(&mut ch, ETH1, true).unwrap();
    assert_eq!(ch.bodies::<SwInterfaceDump>()[0][..4], 1u32.to_be_bytes());
    assert_eq!(ch.bodies::<IpAddressDump>()[0][..], [0, 0, 0, 1, 1]);
}

#[test]
fn test_stream_records_before_failure_are_seen() {
    let stream: ReplyStream<'_, u32> = Box::new(
        vec![Ok(1), Ok(2), Err(ChannelError::Timeout), Ok(3)].into_iter(),
    );
    let mut seen = Vec::new();
    let err = sequencer::drain(stream, "listing interfaces", |n| seen.push(*n)).unwrap_err();
    assert_eq!(seen, [1, 2]);
    match err {
        Error::ControlCallFailed { call, source } => {
            assert_eq!(call, "listing interfaces");
            assert!(matches!(source, ChannelError::Timeout));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_logged_call_failure_names_context_once() {
    let mut ch = MockChannel::vpp();
    ch.fail::<IpRouteAddDel>();
    let mut errors = ErrorLog::new();
    errors.check(
        "adding route via GRE tunnel",
        sequencer::add_route(&mut ch, "103.195.102.92/24", "10.10.10.2", Some(TUNNEL)),
    );
    errors.check("setting MTU", sequencer::set_interface_mtu(&mut ch, ETH1, 0));
    let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines[0],
        "adding route via GRE tunnel: reply ip_route_add_del returned error code -1"
    );
    assert_eq!(lines[1], "setting MTU: invalid argument: MTU must be positive");
}

#[test]
fn test_gre_tunnel_setup() {
    let mut ch = MockChannel::vpp();
    let tunnel = sequencer::setup_gre_tunnel(&mut ch, "192.168.1.1", "192.168.177.3").unwrap();
    assert_eq!(tunnel, TUNNEL);
    assert_eq!(ch.names(), ["gre_tunnel_add_del", "sw_interface_set_flags"]);
    let flags = &ch.bodies::<SwInterfaceSetFlags>()[0];
    assert_eq!(flags[..4], TUNNEL.get().to_be_bytes());
    assert_eq!(flags[4..8], 1u32.to_be_bytes());
}

#[test]
fn test_gre_tunnel_setup_stops_at_tunnel_failure() {
    let mut ch = MockChannel::vpp();
    ch.fail::<GreTunnelAddDel>();
    let err = sequencer::setup_gre_tunnel(&mut ch, "192.168.1.1", "192.168.177.3").unwrap_err();
    assert!(
        matches!(err, Error::ControlCallFailed { call: "creating GRE tunnel", .. }),
        "{err}"
    );
    assert_eq!(ch.names(), ["gre_tunnel_add_del"]);
}

#[test]
fn test_gre_tunnel_setup_activation_failure() {
    let mut ch = MockChannel::vpp();
    ch.fail::<SwInterfaceSetFlags>();
    let err = sequencer::setup_gre_tunnel(&mut ch, "192.168.1.1", "192.168.177.3").unwrap_err();
    assert!(
        matches!(err, Error::ControlCallFailed { call: "setting interface flags", .. }),
        "{err}"
    );
}
