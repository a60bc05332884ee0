#![warn(
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::style,
    clippy::pedantic
)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

mod config;
mod db;
mod fetch;
mod rpc;
mod subcommands;

use anyhow::bail;
use clap::Parser;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = parse_config()?;

    let pool = db::initialize(&config).await?;

    match &config.cli.subcommand {
        config::Subcommand::Init => subcommands::init()?,
        config::Subcommand::Sync => subcommands::sync(&config, &pool).await?,
        config::Subcommand::Once => subcommands::once(&config, &pool).await?,
        config::Subcommand::Rewind { level } => {
            subcommands::rewind(&pool, *level).await?;
        }
        config::Subcommand::Status => subcommands::status(&pool).await?,
        config::Subcommand::Lookup { id } => subcommands::lookup(&pool, id).await?,
        config::Subcommand::Values {
            table,
            column,
            prefix,
        } => {
            subcommands::values(&pool, table, column, prefix.as_deref()).await?;
        }
        config::Subcommand::Version => {
            subcommands::version();
        }
    }

    Ok(())
}

fn parse_config() -> anyhow::Result<Config> {
    let cli = config::Cli::parse();

    let file = if cli.config.is_file() {
        let config_str = std::fs::read_to_string(&cli.config)?;

        toml::from_str(&config_str)?
    } else {
        tracing::error!("Config file not found.");
        bail!("Missing config file.")
    };

    let config = Config::new(cli, file);

    tracing::debug!("Config loaded: {config:?}");

    Ok(config)
}
