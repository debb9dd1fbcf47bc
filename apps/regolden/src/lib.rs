//! Regolden core library.
//!
//! This crate exposes programmatic APIs for rewriting test files in place
//! according to a table of regex find/replace rules loaded from TOML or YAML.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `discover`: Lazy enumeration of target files under a directory.
//! - `rules`: Rule compilation, eager validation, and `apply_rule`.
//! - `rewrite`: Per-file processing and run orchestration.
//! - `models`: Rule file schema and run report structs.
//! - `output`: Human/JSON printers.
//! - `utils`: Message prefixes, display paths, atomic writes.
//! - `error`: Error taxonomy.
pub mod cli;
pub mod config;
pub mod discover;
pub mod error;
pub mod models;
pub mod output;
pub mod rewrite;
pub mod rules;
pub mod utils;

pub use error::{Result, RewriteError};
pub use rewrite::{process_file, run, RunOptions};
pub use rules::{apply_rule, load_rules, Rule};

/// Install the tracing subscriber; `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "regolden=debug" } else { "regolden=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
