//! CLI argument definitions for the `hoard` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Hoard: replay actions through a store that persists its state.
#[derive(Parser, Debug)]
#[command(name = "hoard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// State file, overriding `storage.path` from the config.
    #[arg(short = 's', long = "state-file", global = true)]
    pub state_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dispatch each line of a JSON-lines file as an action, then print the
    /// resulting state once all saves have settled.
    Replay {
        /// File with one JSON action per line.
        actions: PathBuf,

        /// Pause between actions, in milliseconds.
        #[arg(long = "interval-ms", default_value_t = 0)]
        interval_ms: u64,

        /// Debounce window in milliseconds, overriding the config.
        #[arg(long = "debounce-ms")]
        debounce_ms: Option<u64>,
    },
    /// Print the persisted state.
    Show,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > HOARD_CONFIG env var > ~/.hoard/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("HOARD_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

fn default_config_path() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".hoard").join("config.toml");
    }
    PathBuf::from("config.toml")
}
