//! shellcache command-line entry point.
//!
//! Loads configuration, starts a worker against the configured store and
//! dispatches to a subcommand. Results are printed as JSON on stdout.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use shellcache_client::{FetchClient, FetchConfig, ProxyWorker};
use shellcache_core::{AppConfig, CacheDb, ProxySettings};
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info,shellcache_core=info,shellcache_client=info"),
        _ => EnvFilter::new("shellcache=debug,shellcache_core=debug,shellcache_client=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut config = AppConfig::load_from(cli.config.clone())?;
    if let Commands::Install(args) = &cli.command
        && args.wait
    {
        config.skip_waiting = false;
    }

    let settings = ProxySettings::from_config(&config)?;
    let cache = CacheDb::open(&config.db_path).await?;
    tracing::debug!("opened {}", config.db_path.display());

    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config))?);
    let proxy = ProxyWorker::new(settings.clone(), cache.clone(), network).await?.spawn();

    let output = match cli.command {
        Commands::Install(_) => commands::install(&proxy).await,
        Commands::Activate => commands::activate(&proxy).await,
        Commands::Fetch(args) => commands::fetch(&proxy, &settings, args).await,
        Commands::Version => commands::version(&proxy).await,
        Commands::Stores => commands::stores(&cache, &settings).await,
        Commands::Message(args) => commands::message(&proxy, args).await,
        Commands::Sync(args) => commands::sync(&proxy, args).await,
    };

    // also closes the cache
    proxy.shutdown().await?;

    println!("{}", serde_json::to_string_pretty(&output?)?);
    Ok(())
}
