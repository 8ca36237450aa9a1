pub mod config;
pub mod error;
pub mod maps;
pub mod netlink;
pub mod poller;
pub mod xdp_prog;

mod tests;

pub use config::Args;
pub use error::Error;
pub use maps::{
    ActionType, BpfMap, ClassifierTable, DestUsage, DestinationInfo, Entry, Ipv4Key,
    PacketCounter, populate,
};
pub use poller::poll_packet_counter;
pub use xdp_prog::{LoadedProgram, attach_program};
