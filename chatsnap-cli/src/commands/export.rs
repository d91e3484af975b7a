//! `chatsnap export` - offline export of a time window

use std::path::PathBuf;

use anyhow::Result;
use chatsnap_core::Exporter;
use chrono::{DateTime, Utc};
use clap::Args;

#[derive(Args)]
pub struct ExportArgs {
    /// SQLite database to read from
    #[arg(long)]
    pub db: PathBuf,

    /// Export messages received at or after this instant (RFC 3339)
    #[arg(long)]
    pub since: DateTime<Utc>,

    /// Directory the snapshot is written into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Channel name used for logging only; the artifact name comes from
    /// the stored records
    #[arg(long, default_value = "")]
    pub channel: String,
}

pub fn run(args: ExportArgs) -> Result<()> {
    let store = super::open_store(Some(&args.db))?;
    let artifact = Exporter::new(store).export(&args.channel, args.since)?;
    let count = artifact.messages.len();
    let path = artifact.write_to(&args.out)?;
    println!("Exported {} messages to {}", count, path.display());
    Ok(())
}
