//! Utility functions for CLI commands.

use chatvoice_cli::{Config, Context, Output, OutputFormat, load_config, read_text};

use crate::Cli;

const APP_NAME: &str = "chatvoice";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match (cfg.resolve_context(cli.context.as_deref()), cli.context.as_deref()) {
        (Some(ctx), _) => Ok(ctx.clone()),
        (None, None) => anyhow::bail!(
            "no context specified. Use -c flag or set a default context with 'chatvoice config use-context'"
        ),
        (None, Some(name)) => anyhow::bail!("context '{}' not found", name),
    }
}

/// Returns the text given inline, or read from the input file.
pub fn text_input(cli: &Cli, text: Option<&str>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text.to_string());
    }
    let path = require_input_file(cli)?;
    Ok(read_text(path)?)
}

/// Requires input file to be provided.
pub fn require_input_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))
}

/// Requires output file to be provided.
pub fn require_output_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.output
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("output file is required, use -o flag"))
}

/// Outputs result as JSON or YAML to stdout.
pub fn print_result<T: serde::Serialize>(cli: &Cli, result: &T) -> anyhow::Result<()> {
    Output::new(OutputFormat::from_json_flag(cli.json), None).write(result)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    chatvoice_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
    }
}
