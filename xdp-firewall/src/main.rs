use anyhow::Context as _;
use clap::Parser as _;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use xdp_firewall::maps::{DestinationInfo, Ipv4Key};
use xdp_firewall::{Args, netlink, poller, xdp_prog};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let missing = xdp_prog::check_capabilities();
    if !missing.is_empty() {
        log::warn!("missing capabilities {missing:?}, loading will likely fail");
    }

    let link = netlink::link_by_name(&args.iface)?;
    log::info!(
        "interface {} has index {}, mtu {}",
        link.name,
        link.if_index,
        link.mtu
    );
    match xdp_prog::xdp_features(link.if_index) {
        Ok(flags) => log::debug!("XDP features of {}: {flags:#x}", link.name),
        Err(e) => log::debug!("{e}"),
    }

    xdp_prog::remove_memlock_limit()?;
    let code = xdp_prog::read_object(&args.object)?;
    let prog = xdp_prog::attach_program(link.if_index, code, &args.program)
        .with_context(|| format!("loading {}", args.object.display()))?;

    let mut destinations = prog.map::<Ipv4Key, DestinationInfo>(&args.dest_map)?;
    let counter = prog.map::<u32, u64>(&args.counter_map)?;

    xdp_firewall::populate(&mut destinations, &args.entries)?;

    let token = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::spawn({
        let token = token.clone();
        async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => log::info!("interrupted"),
                _ = sigterm.recv() => log::info!("terminated"),
            }
            token.cancel();
        }
    });

    poller::poll_packet_counter(&counter, args.poll_interval, token).await?;
    Ok(())
}
