//! Periodic report of the packet counter.

use crate::error::Error;
use crate::maps::PacketCounter;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// Reads `counter` every `period` until `token` is cancelled. The first read
/// happens one period after the call. A failed read ends the loop.
pub async fn poll_packet_counter(
    counter: &impl PacketCounter,
    period: Duration,
    token: CancellationToken,
) -> Result<(), Error> {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = 0u64;
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                log::debug!("packet counter polling stopped");
                return Ok(());
            }
            _ = ticker.tick() => {
                let count = counter.read()?;
                if count < last {
                    log::warn!("packet counter went back from {last} to {count}");
                }
                log::info!("received {count} packets");
                last = count;
            }
        }
    }
}
