use anyhow::Context as _;
use clap::Parser as _;
use vpp_client::{Connection, TunnelArgs, setup_gre_tunnel};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = TunnelArgs::parse();
    let options = args.connect_options()?;

    let mut conn = Connection::connect(&args.sock, &options)
        .with_context(|| format!("connecting to {}", args.sock.display()))?;
    let result = setup_gre_tunnel(&mut conn.new_channel(), &args.src, &args.dst);
    conn.disconnect();

    let tunnel = result.context("tunnel setup failed")?;
    log::info!("GRE tunnel {tunnel} is up");
    Ok(())
}
