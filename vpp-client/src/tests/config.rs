#![cfg(test)]

use crate::config::{Args, Scenario, TunnelArgs};
use crate::error::Error;
use crate::transport::DEFAULT_SOCKET;
use clap::Parser as _;
use std::path::Path;
use std::time::Duration;

#[test]
fn test_defaults_match_scenario() {
    let args = Args::try_parse_from(["simple-client"]).unwrap();
    assert_eq!(args.sock, Path::new(DEFAULT_SOCKET));
    assert_eq!(args.scenario(), Scenario::default());
    let options = args.connect_options().unwrap();
    assert_eq!(options.reply_timeout, Duration::from_secs(1));
    assert_eq!(options.client_name, "vpp-client");
}

#[test]
fn test_overrides() {
    let args = Args::try_parse_from([
        "simple-client",
        "--sock",
        "/tmp/api.sock",
        "--reply-timeout",
        "250ms",
        "--create-loopback",
        "--mtu",
        "9000",
        "--tunnel-dst",
        "192.0.2.1",
    ])
    .unwrap();
    let scenario = args.scenario();
    assert!(scenario.create_loopback);
    assert_eq!(scenario.mtu, 9000);
    assert_eq!(scenario.tunnel_dst, "192.0.2.1");
    assert_eq!(
        args.connect_options().unwrap().reply_timeout,
        Duration::from_millis(250)
    );
}

#[test]
fn test_bad_reply_timeout() {
    let args = Args::try_parse_from(["simple-client", "--reply-timeout", "soon"]).unwrap();
    assert!(matches!(
        args.connect_options(),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_tunnel_args() {
    let args = TunnelArgs::try_parse_from(["gre-tunnel"]).unwrap();
    assert_eq!(args.sock, Path::new(DEFAULT_SOCKET));
    assert_eq!((args.src.as_str(), args.dst.as_str()), ("192.168.1.1", "192.168.177.3"));
    assert_eq!(args.connect_options().unwrap().client_name, "gre-tunnel");

    let args =
        TunnelArgs::try_parse_from(["gre-tunnel", "--src", "10.0.0.1", "--dst", "10.0.0.2"]).unwrap();
    assert_eq!(args.dst, "10.0.0.2");
}
