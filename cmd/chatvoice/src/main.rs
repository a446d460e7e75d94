//! chatvoice - speak chat replies through chunked speech synthesis.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ChunkCommand, ConfigCommand, MergeCommand, SpeakCommand};

/// chatvoice - speak chat replies through chunked speech synthesis.
///
/// Long replies are split into chunks that are synthesized one after another
/// while earlier chunks already play, so audio starts quickly.
///
/// Configuration is stored in ~/.chatvoice/chatvoice/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "chatvoice")]
#[command(about = "Chunked speech playback for chat replies")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.chatvoice/chatvoice/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input file (conversation YAML/JSON or plain text)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Synthesize and play a reply into a PCM file
    Speak(SpeakCommand),
    /// Show how a text is split into chunks
    Chunk(ChunkCommand),
    /// Merge base64 PCM payloads
    Merge(MergeCommand),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Speak(cmd) => cmd.run(&cli).await,
        Commands::Chunk(cmd) => cmd.run(&cli).await,
        Commands::Merge(cmd) => cmd.run(&cli).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chatvoice", "chunk", "--text", "hi", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Chunk(_)));
    }
}
