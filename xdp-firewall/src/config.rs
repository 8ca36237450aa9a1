//! Command line of the loader.

use crate::maps::Entry;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Attaches the XDP classifier to an interface and reports its packet counter"
)]
pub struct Args {
    /// interface to attach to
    #[clap(long, default_value = "eth0")]
    pub iface: String,

    /// compiled classifier object
    #[clap(long, default_value = "tunnel.o")]
    pub object: PathBuf,

    /// program section to attach
    #[clap(long, default_value = "xdp_sock_prog")]
    pub program: String,

    #[clap(long, default_value = "ipv4_destination_map")]
    pub dest_map: String,

    #[clap(long, default_value = "pkt_count")]
    pub counter_map: String,

    /// destination entry as ADDRESS=USAGE[:ACTION], repeatable
    #[clap(long = "entry", default_value = "103.195.102.92=tunnel-forward:allow")]
    pub entries: Vec<Entry>,

    /// how often to report the packet counter, like 1s or 500ms
    #[clap(long, default_value = "1s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,
}
