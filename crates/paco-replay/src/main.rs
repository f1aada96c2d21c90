//! Paco match replayer.
//!
//! Reads a JSON array of recorded matches, replays each one through a sync
//! session and logs how it ended. Exits with an error if any record can't be
//! replayed.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod record;
mod replay;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Records path from the first argument or env
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PACO_RECORDS").ok())
        .context("usage: paco-replay <records.json> (or set PACO_RECORDS)")?;

    let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let records = record::parse_records(&json).with_context(|| format!("parsing {}", path))?;
    info!(path = %path, records = records.len(), "Replaying matches");

    let mut failed = 0;
    for record in &records {
        if let Err(err) = replay::replay_record(record) {
            error!(%err, "Replay failed");
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} matches could not be replayed", failed, records.len());
    }
    info!("All matches replayed");
    Ok(())
}
