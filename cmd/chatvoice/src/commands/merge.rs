//! Merge command: concatenate base64 PCM payloads.

use clap::Args;
use serde::Serialize;

use chatvoice_audio::Format;
use chatvoice_audio::pcm::{decode_pcm_bytes, merge_base64_pcm, try_merge_base64_pcm};
use chatvoice_cli::{Output, OutputFormat, read_text};

use super::{format_bytes, print_result, print_success, print_verbose};
use crate::Cli;

/// Merge base64 PCM files into one payload.
///
/// Without -o the merged payload is printed. With -o it is written to that
/// file, as base64 or, with --raw, as decoded PCM bytes.
#[derive(Args)]
pub struct MergeCommand {
    /// Files holding base64 PCM payloads, in playback order
    #[arg(required = true)]
    files: Vec<String>,

    /// Fail on undecodable input instead of keeping the first payload
    #[arg(long)]
    strict: bool,

    /// Write decoded PCM bytes instead of base64 (requires -o)
    #[arg(long)]
    raw: bool,
}

#[derive(Debug, Serialize)]
struct MergeSummary {
    parts: usize,
    output: String,
    bytes: u64,
    size: String,
    duration_secs: f64,
}

impl MergeCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let parts = self
            .files
            .iter()
            .map(|path| read_text(path).map(|s| s.trim().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        print_verbose(cli, &format!("Merging {} payloads", parts.len()));

        let merged = self.merge(&parts)?;

        let Some(output_path) = cli.output.as_deref() else {
            if self.raw {
                anyhow::bail!("--raw requires an output file, use -o flag");
            }
            println!("{}", merged);
            return Ok(());
        };

        let pcm = decode_pcm_bytes(&merged)?;
        let out = Output::new(OutputFormat::default(), None);
        if self.raw {
            out.write_binary(&pcm, output_path)?;
        } else {
            out.write_binary(merged.as_bytes(), output_path)?;
        }
        print_success(&format!("Merged {} payloads into {}", parts.len(), output_path));

        let bytes = pcm.len() as u64;
        print_result(
            cli,
            &MergeSummary {
                parts: parts.len(),
                output: output_path.to_string(),
                bytes,
                size: format_bytes(bytes),
                duration_secs: Format::MONO_24K.duration(bytes).as_secs_f64(),
            },
        )
    }

    fn merge(&self, parts: &[String]) -> anyhow::Result<String> {
        if self.strict {
            Ok(try_merge_base64_pcm(parts)?)
        } else {
            Ok(merge_base64_pcm(parts))
        }
    }
}
