//! Configuration management commands.

use clap::{Args, Subcommand};

use chatvoice_cli::Context as CliContext;
use chatvoice_speech::{DEFAULT_TTS_MODEL, DEFAULT_VOICE};

use super::{get_config, print_result, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to manage multiple API configurations,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.chatvoice/chatvoice/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// Gemini API key (required)
        #[arg(long)]
        api_key: String,
        /// API base URL
        #[arg(long)]
        base_url: Option<String>,
        /// Speech model
        #[arg(long)]
        model: Option<String>,
        /// Prebuilt voice name
        #[arg(long)]
        voice: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                api_key,
                base_url,
                model,
                voice,
                timeout,
            } => {
                let mut cfg = get_config(cli)?;
                let ctx = CliContext {
                    api_key: api_key.clone(),
                    base_url: base_url.clone().unwrap_or_default(),
                    model: model.clone().unwrap_or_default(),
                    voice: voice.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or(0),
                    ..Default::default()
                };
                cfg.add_context(name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                match cfg.get_current_context() {
                    Some(ctx) => print_result(cli, &ctx.masked()),
                    None => {
                        println!("No current context set");
                        Ok(())
                    }
                }
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;
                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<32} {}", "CURRENT", "NAME", "MODEL", "VOICE");
                for (name, ctx) in &cfg.contexts {
                    let current = if *name == cfg.current_context { "*" } else { "" };
                    let model = or_default(&ctx.model, DEFAULT_TTS_MODEL);
                    let voice = or_default(&ctx.voice, DEFAULT_VOICE);
                    println!("{:<8} {:<20} {:<32} {}", current, name, model, voice);
                }
                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                println!("Config file: {}", cfg.path().display());
                println!("Current context: {}", cfg.current_context);
                println!("Contexts: {}", cfg.contexts.len());

                for (name, ctx) in &cfg.contexts {
                    let ctx = ctx.masked();
                    println!("\n  {}:", name);
                    println!("    API Key: {}", ctx.api_key);
                    if !ctx.base_url.is_empty() {
                        println!("    Base URL: {}", ctx.base_url);
                    }
                    println!("    Model: {}", or_default(&ctx.model, DEFAULT_TTS_MODEL));
                    println!("    Voice: {}", or_default(&ctx.voice, DEFAULT_VOICE));
                    if ctx.timeout > 0 {
                        println!("    Timeout: {}s", ctx.timeout);
                    }
                    for (key, value) in &ctx.extra {
                        println!("    {}: {}", key, value);
                    }
                }
                Ok(())
            }
        }
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}
