//! Command-line front end for cache policy configurations.
//!
//! Validates a TOML configuration and prints the artifacts derived from it.
//! Logs go to stderr; artifacts are printed as JSON on stdout.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use arc_swap::ArcSwap;
use clap::{Parser, Subcommand};
use serde::Serialize;

use edge_cache_policy::config::loader::read_config;
use edge_cache_policy::config::watcher::{apply_updates, ConfigWatcher};
use edge_cache_policy::config::{compile_configuration, Configuration, SharedConfiguration};
use edge_cache_policy::observability::init_logging;
use edge_cache_policy::render::{distribution_config, distributions, render_decision_tree};

#[derive(Parser)]
#[command(name = "edge-cache-policy")]
#[command(about = "Compile cache policy configurations into CDN, edge and middleware artifacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration and report every error
    Check { config: PathBuf },
    /// Print the policy governing a request
    Resolve {
        config: PathBuf,
        #[arg(long)]
        host: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
    /// Print CDN distribution configs
    Cdn {
        config: PathBuf,
        /// Only this backend
        #[arg(long)]
        backend: Option<String>,
    },
    /// Print the edge decision tree
    Tree { config: PathBuf },
    /// Recompile whenever the file changes
    Watch { config: PathBuf },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Commands::Check { config }
            | Commands::Resolve { config, .. }
            | Commands::Cdn { config, .. }
            | Commands::Tree { config }
            | Commands::Watch { config } => config.as_path(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let raw = read_config(cli.command.config_path())?;
    init_logging(&raw.observability)?;

    let config = match compile_configuration(&raw) {
        Ok(config) => config,
        Err(errors) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
            eprintln!("{} error(s) found", errors.len());
            return Ok(ExitCode::FAILURE);
        }
    };

    match cli.command {
        Commands::Check { .. } => {
            println!(
                "ok: {} backend(s), primary '{}'",
                config.len(),
                config.primary().id()
            );
        }
        Commands::Resolve { host, path, .. } => print_json(&config.resolve(&host, &path))?,
        Commands::Cdn { backend: None, .. } => print_json(&distributions(&config))?,
        Commands::Cdn {
            backend: Some(id), ..
        } => match config.backend(&id) {
            Some(backend) => print_json(&distribution_config(&config, backend))?,
            None => {
                eprintln!("error: unknown backend '{}'", id);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Tree { .. } => print_json(&render_decision_tree(&config))?,
        Commands::Watch { config: path } => watch(path, config).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn watch(path: PathBuf, config: Configuration) -> Result<(), Box<dyn std::error::Error>> {
    let shared: SharedConfiguration = Arc::new(ArcSwap::from_pointee(config));
    let (watcher, updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run()?;
    let apply = tokio::spawn(apply_updates(shared, updates));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Stopping config watcher");
    apply.abort();
    Ok(())
}
