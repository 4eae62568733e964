pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod lock;
pub mod maintenance;
pub mod models;
pub mod search;
pub mod state;

use std::process::ExitCode;

use anyhow::Context;
use cli::{
    CacheClearArgs, CacheWarmArgs, Cli, Commands, ReindexArgs, cmd_cache_clear, cmd_cache_warm,
    cmd_maintenance, cmd_query, cmd_reindex,
};
pub use config::Config;
use maintenance::{MaintenanceOptions, StdinConfirm};
use state::AppContext;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber; `RUST_LOG` overrides `general.log_level`.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Loads the config named by `--config`, or the first one found on the
/// default search paths.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<ExitCode> {
    let ctx = AppContext::from_config(config)
        .await
        .context("Failed to open the CMS database")?;
    info!(
        database = %ctx.config.general.database_path,
        cache_driver = %ctx.config.cache.driver,
        "cmsctl ready"
    );

    let json = cli.json;
    let result = match cli.command {
        Commands::Reindex {
            batch_size,
            types,
            dry_run,
            force,
        } => {
            let args = ReindexArgs {
                batch_size,
                types,
                dry_run,
                force,
            };
            cmd_reindex(&ctx, args, json, &StdinConfirm).await
        }

        Commands::Maintenance {
            action,
            days,
            force,
        } => {
            let options = MaintenanceOptions { days, force };
            cmd_maintenance(&ctx, &action, options, json, &StdinConfirm).await
        }

        Commands::CacheClear {
            components,
            tags,
            all,
            info,
            force,
        } => {
            let args = CacheClearArgs {
                components,
                tags,
                all,
                info,
                force,
            };
            cmd_cache_clear(&ctx, args, json, &StdinConfirm).await
        }

        Commands::CacheWarm {
            items,
            chunk,
            delay,
            force,
        } => {
            let args = CacheWarmArgs {
                items,
                chunk,
                delay,
                force,
            };
            cmd_cache_warm(&ctx, args, json).await
        }

        Commands::Query { terms, limit } => cmd_query(&ctx, &terms, limit, json).await,
    };

    result.or_else(|e| {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        Ok(ExitCode::FAILURE)
    })
}
