//! CLI argument definitions for the Switchboard binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use switchboard_core::types::Variant;

/// Switchboard - a multi-role dispatch and review service.
#[derive(Parser, Debug)]
#[command(name = "switchboard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Data directory for the history database and API token.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Role set to dispatch to (support, travel).
    #[arg(long = "variant")]
    pub variant: Option<Variant>,

    /// Use deterministic stub capabilities instead of a language model.
    #[arg(long = "mock")]
    pub mock: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SWITCHBOARD_CONFIG env var > ~/.switchboard/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("SWITCHBOARD_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SWITCHBOARD_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        self.port
            .or_else(|| port_from_env(std::env::var("SWITCHBOARD_PORT").ok()))
            .unwrap_or(config_port)
    }

    /// Data directory override, if given.
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

fn port_from_env(value: Option<String>) -> Option<u16> {
    value.and_then(|v| v.trim().parse::<u16>().ok())
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    home_dir()
        .map(|home| home.join(".switchboard").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
