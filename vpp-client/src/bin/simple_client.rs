use anyhow::{Context as _, bail};
use clap::Parser as _;
use vpp_client::binapi::{gre, interface, ip, memclnt, vpe};
use vpp_client::{Args, Channel as _, Connection, ErrorLog, MessageRef, run_sequence};

/// Message groups whose absence makes the run pointless.
const REQUIRED: &[(&str, &[MessageRef])] = &[
    ("memclnt", memclnt::ALL_MESSAGES),
    ("vpe", vpe::ALL_MESSAGES),
];

/// Message groups checked for information only.
const ADVISORY: &[(&str, &[MessageRef])] = &[
    ("interface", interface::ALL_MESSAGES),
    ("ip", ip::ALL_MESSAGES),
    ("gre", gre::ALL_MESSAGES),
];

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = args.connect_options()?;

    log::info!("starting simple client example");

    let mut conn = Connection::connect(&args.sock, &options)
        .with_context(|| format!("connecting to {}", args.sock.display()))?;

    let mut errors = ErrorLog::new();
    let result = {
        let mut ch = conn.new_channel();

        for (group, messages) in REQUIRED {
            ch.check_compatibility(messages)
                .with_context(|| format!("{group} messages are not supported"))?;
        }
        for (group, messages) in ADVISORY {
            if let Err(e) = ch.check_compatibility(messages) {
                log::warn!("{group}: {e}");
            }
        }

        run_sequence(&mut ch, &args.scenario(), &mut errors)
    };
    conn.disconnect();

    let report = result.context("configuration aborted")?;
    log::debug!("{report:?}");

    if !errors.is_empty() {
        for (i, entry) in errors.iter().enumerate() {
            log::error!(" {}. {entry}", i + 1);
        }
        bail!("finished with {} errors", errors.len());
    }
    log::info!("finished successfully");
    Ok(())
}
