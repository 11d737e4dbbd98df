pub mod config;
pub mod doctor;
pub mod watch;

use clap::{Parser, Subcommand};

/// agent-bridge — tails a coding agent's journal and mirrors it to a
/// tracker.
#[derive(Debug, Parser)]
#[command(name = "agent-bridge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a session's journal and stream activities to the tracker
    /// (default when no subcommand is given).
    Watch {
        /// Session id to watch. Overrides `[session].session_id`.
        #[arg(long)]
        session: Option<String>,
    },
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

/// Load the configuration from the path specified by `AB_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the path
/// that was used. Shared by `watch`, `doctor`, and `config` so the
/// loading logic lives in one place.
pub fn load_config() -> anyhow::Result<(ab_domain::config::Config, String)> {
    let config_path = std::env::var("AB_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        ab_domain::config::Config::default()
    };

    Ok((config, config_path))
}
