//! Command line of the example client and the scenario it runs.

use crate::error::Error;
use crate::transport::{ConnectOptions, DEFAULT_SOCKET};
use crate::types::InterfaceIndex;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Configures a VPP instance over its binary API socket")]
pub struct Args {
    /// control socket of the forwarding plane
    #[clap(long, default_value = DEFAULT_SOCKET)]
    pub sock: PathBuf,

    /// how long to wait for a reply, like 1s or 500ms
    #[clap(long, default_value = "1s")]
    pub reply_timeout: String,

    /// name the client registers under
    #[clap(long, default_value = "vpp-client")]
    pub client_name: String,

    /// index of the pre-existing interface to configure
    #[clap(short, long, default_value_t = 1)]
    pub interface: u32,

    /// configure a freshly created loopback instead of --interface
    #[clap(long)]
    pub create_loopback: bool,

    /// hardware address to set on the interface
    #[clap(long, default_value = "bc:24:11:2c:bd:9a")]
    pub mac: String,

    /// interface address with prefix length
    #[clap(short, long, default_value = "172.93.110.120/24")]
    pub address: String,

    #[clap(long, default_value = "0.0.0.0/0")]
    pub default_route: String,

    /// next hop of the default route
    #[clap(short, long, default_value = "172.93.110.1")]
    pub gateway: String,

    #[clap(long, default_value_t = 1500)]
    pub mtu: u32,

    /// local GRE endpoint
    #[clap(long, default_value = "172.93.110.120")]
    pub tunnel_src: String,

    /// remote GRE endpoint
    #[clap(long, default_value = "45.76.233.197")]
    pub tunnel_dst: String,

    /// address of the tunnel interface
    #[clap(long, default_value = "10.10.10.1/30")]
    pub tunnel_address: String,

    /// destination routed through the tunnel
    #[clap(long, default_value = "103.195.102.92/24")]
    pub tunnel_route: String,

    #[clap(long, default_value = "10.10.10.2")]
    pub tunnel_next_hop: String,
}

fn connect_options(client_name: &str, reply_timeout: &str) -> Result<ConnectOptions, Error> {
    let timeout = humantime::parse_duration(reply_timeout)
        .map_err(|e| Error::InvalidArgument(format!("reply timeout {reply_timeout:?}: {e}")))?;
    Ok(ConnectOptions {
        client_name: client_name.to_string(),
        reply_timeout: timeout,
    })
}

impl Args {
    pub fn connect_options(&self) -> Result<ConnectOptions, Error> {
        connect_options(&self.client_name, &self.reply_timeout)
    }

    pub fn scenario(&self) -> Scenario {
        Scenario {
            interface: InterfaceIndex::new(self.interface),
            create_loopback: self.create_loopback,
            mac: self.mac.clone(),
            address: self.address.clone(),
            default_route: self.default_route.clone(),
            gateway: self.gateway.clone(),
            mtu: self.mtu,
            tunnel_src: self.tunnel_src.clone(),
            tunnel_dst: self.tunnel_dst.clone(),
            tunnel_address: self.tunnel_address.clone(),
            tunnel_route: self.tunnel_route.clone(),
            tunnel_next_hop: self.tunnel_next_hop.clone(),
        }
    }
}

/// Inputs of `sequencer::run_sequence`. Addresses stay textual so that their
/// validation is part of the operation using them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub interface: InterfaceIndex,
    pub create_loopback: bool,
    pub mac: String,
    pub address: String,
    pub default_route: String,
    pub gateway: String,
    pub mtu: u32,
    pub tunnel_src: String,
    pub tunnel_dst: String,
    pub tunnel_address: String,
    pub tunnel_route: String,
    pub tunnel_next_hop: String,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            interface: InterfaceIndex::new(1),
            create_loopback: false,
            mac: "bc:24:11:2c:bd:9a".to_string(),
            address: "172.93.110.120/24".to_string(),
            default_route: "0.0.0.0/0".to_string(),
            gateway: "172.93.110.1".to_string(),
            mtu: 1500,
            tunnel_src: "172.93.110.120".to_string(),
            tunnel_dst: "45.76.233.197".to_string(),
            tunnel_address: "10.10.10.1/30".to_string(),
            tunnel_route: "103.195.102.92/24".to_string(),
            tunnel_next_hop: "10.10.10.2".to_string(),
        }
    }
}

/// Command line of the tunnel-only client.
#[derive(Parser, Debug)]
#[command(version, about = "Creates a GRE tunnel on a VPP instance and brings it up")]
pub struct TunnelArgs {
    /// control socket of the forwarding plane
    #[clap(long, default_value = DEFAULT_SOCKET)]
    pub sock: PathBuf,

    #[clap(long, default_value = "1s")]
    pub reply_timeout: String,

    #[clap(long, default_value = "gre-tunnel")]
    pub client_name: String,

    /// local GRE endpoint
    #[clap(long, default_value = "192.168.1.1")]
    pub src: String,

    /// remote GRE endpoint
    #[clap(long, default_value = "192.168.177.3")]
    pub dst: String,
}

impl TunnelArgs {
    pub fn connect_options(&self) -> Result<ConnectOptions, Error> {
        connect_options(&self.client_name, &self.reply_timeout)
    }
}
