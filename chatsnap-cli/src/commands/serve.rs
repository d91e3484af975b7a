//! `chatsnap serve` - run the remote store endpoints

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chatsnap_server::AppState;
use clap::Args;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8787;

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database path; serves an in-memory store when omitted
    #[arg(long)]
    pub db: Option<PathBuf>,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let store = super::open_store(args.db.as_deref())?;
    let state = Arc::new(AppState::new(store));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    chatsnap_server::serve(addr, state).await?;
    Ok(())
}
