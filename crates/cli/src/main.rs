use clap::Parser;
use tracing_subscriber::EnvFilter;

use ab_cli::cli::{self, Cli, Command, ConfigCommand};
use ab_domain::config::ConfigSeverity;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        None => {
            init_tracing();
            let (config, _path) = cli::load_config()?;
            log_config_issues(&config);
            cli::watch::run(&config, None).await
        }
        Some(Command::Watch { session }) => {
            init_tracing();
            let (config, _path) = cli::load_config()?;
            log_config_issues(&config);
            cli::watch::run(&config, session).await
        }
        Some(Command::Doctor) => {
            let (config, config_path) = cli::load_config()?;
            let passed = cli::doctor::run(&config, &config_path).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            let valid = cli::config::validate(&config, &config_path);
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _path) = cli::load_config()?;
            cli::config::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("agent-bridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ab_engine=debug")),
        )
        .json()
        .init();
}

fn log_config_issues(config: &ab_domain::config::Config) {
    for issue in config.validate() {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
}
