//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// shellcache - offline-first caching proxy
///
/// Precaches an application shell and serves its requests network-first or
/// cache-first from versioned SQLite stores.
#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELLCACHE_CONFIG_FILE")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Precache the app shell into the current store
    Install(InstallArgs),

    /// Delete stale stores and record the current version as active
    Activate,

    /// Fetch a URL through the proxy
    Fetch(FetchArgs),

    /// Print the version reply the worker gives to GET_VERSION
    Version,

    /// List named stores
    Stores,

    /// Post a JSON message to the worker
    Message(MessageArgs),

    /// Deliver a background sync event
    Sync(SyncArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Stay installed instead of activating straight away
    #[arg(long)]
    pub wait: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL, or a path resolved against the configured origin
    pub url: String,

    /// Request destination (document, style, script, image, font, other)
    #[arg(short, long)]
    pub destination: Option<String>,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Include the response body in the output
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message payload as JSON, e.g. '{"type":"GET_VERSION"}'
    #[arg(value_parser = parse_json)]
    pub data: serde_json::Value,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Sync tag
    #[arg(default_value = "background-sync")]
    pub tag: String,
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from(["shellcache", "fetch", "/assets/index.css", "-d", "style", "-vv"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.url, "/assets/index.css");
                assert_eq!(args.destination.as_deref(), Some("style"));
                assert_eq!(args.method, "GET");
                assert!(!args.body);
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_parses_message_json() {
        let cli = Cli::parse_from(["shellcache", "message", r#"{"type":"SKIP_WAITING"}"#]);
        match cli.command {
            Commands::Message(args) => assert_eq!(args.data["type"], "SKIP_WAITING"),
            _ => panic!("expected Message command"),
        }
    }

    #[test]
    fn cli_rejects_bad_json() {
        assert!(Cli::try_parse_from(["shellcache", "message", "{nope"]).is_err());
    }

    #[test]
    fn cli_sync_default_tag() {
        let cli = Cli::parse_from(["shellcache", "sync"]);
        match cli.command {
            Commands::Sync(args) => assert_eq!(args.tag, "background-sync"),
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn cli_global_config_flag() {
        let cli = Cli::parse_from(["shellcache", "stores", "--config", "/tmp/shellcache.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/shellcache.toml")));
        assert!(matches!(cli.command, Commands::Stores));
    }
}
