//! Caudal CLI - open, inspect, and drive PCM streams from the shell.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caudal")]
#[command(author, version, about = "Caudal PCM framework CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known sample formats
    Formats(commands::formats::FormatsArgs),

    /// Open a stream and dump its negotiated setup and status
    Dump(commands::dump::DumpArgs),

    /// Play a WAV file into a named stream
    Play(commands::play::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Formats(args) => commands::formats::run(args),
        Commands::Dump(args) => commands::dump::run(args),
        Commands::Play(args) => commands::play::run(args),
    }
}
