//! Command line interface
//!
//! | Command | Description |
//! |---------|-------------|
//! | `bulwark probe` | Build every service and report the mode it selected |
//! | `bulwark config` | Print the effective configuration as TOML |

use bulwark_domain::error::Result;
use bulwark_infrastructure::AppContext;
use bulwark_infrastructure::config::loader::to_toml;
use bulwark_infrastructure::config::{AppConfig, ConfigLoader};
use bulwark_infrastructure::logging::init_logging;
use bulwark_providers::store::redact_url;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command line interface for Bulwark
#[derive(Parser, Debug)]
#[command(name = "bulwark")]
#[command(about = "Bulwark - Degradable cache, rate limiter and task queue")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Bulwark commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Probe the backing store and report each service's mode
    Probe {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Load configuration from `path` or the default locations
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let loader = match path {
        Some(path) => ConfigLoader::new().with_config_path(path),
        None => ConfigLoader::new(),
    };
    loader.load()
}

/// Run a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Config => {
            print!("{}", to_toml(&config)?);
            Ok(())
        }
        Command::Probe { json } => probe(config, json).await,
    }
}

async fn probe(config: AppConfig, json: bool) -> Result<()> {
    init_logging(&config.logging)?;
    let store = config
        .store
        .url()
        .map_or_else(|| "not configured".to_string(), redact_url);

    let context = AppContext::init(config).await?;
    let modes = context.modes();
    context.shutdown().await;

    if json {
        let report = serde_json::json!({ "store": store, "modes": modes });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("store:        {store}");
        println!("cache:        {}", modes.cache);
        println!("rate_limiter: {}", modes.rate_limiter);
        println!("task_queue:   {}", modes.task_queue);
    }
    Ok(())
}
