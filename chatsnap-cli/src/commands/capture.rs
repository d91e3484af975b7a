//! `chatsnap capture` - run one capture session until interrupted

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chatsnap_core::{CaptureSession, ExportError, RemoteSink, TwitchLinkFactory, strip_sigil};
use clap::Args;

#[derive(Args)]
pub struct CaptureArgs {
    /// Channel to capture (leading '#' optional)
    pub channel: String,

    /// SQLite database path; captures to an in-memory store when omitted
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Directory the exported snapshot is written into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Forward each message to this endpoint, best effort
    #[arg(long)]
    pub forward: Option<String>,
}

pub async fn run(args: CaptureArgs) -> Result<()> {
    let store = super::open_store(args.db.as_deref())?;
    let factory = Arc::new(TwitchLinkFactory::default());

    let mut session = CaptureSession::new(factory, store);
    if let Some(endpoint) = &args.forward {
        tracing::debug!(%endpoint, "forwarding captured messages");
        session = session.with_sink(RemoteSink::new(endpoint));
    }

    session.start(&args.channel).await?;
    println!(
        "Capturing #{}. Press Ctrl-C to stop and export.",
        strip_sigil(&args.channel)
    );

    tokio::signal::ctrl_c().await?;
    println!("Stopping...");

    match session.stop().await {
        Ok(Some(artifact)) => {
            let count = artifact.messages.len();
            let path = artifact.write_to(&args.out)?;
            println!("Exported {} messages to {}", count, path.display());
        }
        Ok(None) => println!("Session never became active; nothing to export."),
        Err(ExportError::Empty) => println!("No messages captured; nothing to export."),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
