use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "chatsnap", about = "Capture live chat and export a snapshot")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a channel until interrupted, then export
    Capture(commands::capture::CaptureArgs),
    /// Re-export a time window from an existing store
    Export(commands::export::ExportArgs),
    /// Serve the message store over HTTP
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Capture(args) => commands::capture::run(args).await,
        Commands::Export(args) => commands::export::run(args),
        Commands::Serve(args) => commands::serve::run(args).await,
    }
}
