//! Shared plumbing for the chatvoice command line.
//!
//! - [`config`]: named API contexts stored in `~/.chatvoice/<app>/config.yaml`
//! - [`input`]: YAML/JSON documents and plain text from files or stdin
//! - [`output`]: YAML/JSON result printing

pub mod config;
pub mod input;
pub mod output;

pub use config::{Config, Context, load_config, mask_api_key};
pub use input::{InputError, load_input, parse_input, read_text};
pub use output::{Output, OutputFormat, print_verbose};
