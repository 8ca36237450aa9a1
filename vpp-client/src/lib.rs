pub mod binapi;
pub mod channel;
pub mod config;
pub mod error;
pub mod sequencer;
pub mod transport;
pub mod types;
mod wire;

mod tests;

pub use channel::{Channel, MessageRef};
pub use config::{Args, Scenario, TunnelArgs};
pub use error::{ChannelError, Error};
pub use sequencer::{ErrorLog, SequenceReport, run_sequence, setup_gre_tunnel};
pub use transport::{ConnectOptions, Connection, DEFAULT_SOCKET, SocketChannel};
pub use types::{Address, InterfaceIndex, MacAddress, Prefix};
