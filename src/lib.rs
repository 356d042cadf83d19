pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

use clap::{Parser, Subcommand};
use commands::serve::{handle, serve, Request};
use commands::service::ShotService;
use commands::settings::{
    load_effective_settings, load_settings_from_disk, save_settings_to_disk, settings_patch,
};
use commands::watcher::start_data_watcher;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "courtlens")]
#[command(about = "Season shot distributions and multi-year zone trends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding shots_<year>.json files
    #[arg(short, long, value_name = "DIR", env = "COURTLENS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Override the cache database location
    #[arg(long, value_name = "FILE", env = "COURTLENS_CACHE_PATH")]
    pub cache_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(flatten)]
    Request(Request),

    /// Keep the service alive and answer one request per stdin line
    Serve {
        /// Drop cached seasons when their files change (also enabled by watchDataDir)
        #[arg(long)]
        watch: bool,
    },

    /// Print settings, or update them with --set KEY=VALUE
    Settings {
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

/// Run one CLI invocation. Returns the text to print, if any.
pub async fn run(cli: Cli) -> Result<Option<String>, String> {
    let Cli {
        command,
        data_dir,
        cache_path,
    } = cli;

    match command {
        Command::Settings { set } => settings_command(&data_dir, &set).map(Some),
        Command::Request(request) => {
            let service = build_service(&data_dir, cache_path)?.0;
            let response = handle(&service, &request)
                .await
                .map_err(|e| e.to_string())?;
            service.flush().await;
            serde_json::to_string_pretty(&response)
                .map(Some)
                .map_err(|e| format!("Failed to serialize output: {e}"))
        }
        Command::Serve { watch } => {
            let (service, watch_configured) = build_service(&data_dir, cache_path)?;
            if watch || watch_configured {
                start_data_watcher(&data_dir, Arc::clone(service.scheduler().cache()))?;
            }
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve(&service, stdin, tokio::io::stdout()).await?;
            Ok(None)
        }
    }
}

fn build_service(data_dir: &Path, cache_path: Option<PathBuf>) -> Result<(ShotService, bool), String> {
    let mut settings = load_effective_settings(data_dir)?;
    if let Some(cache_path) = cache_path {
        settings.cache_path = cache_path;
    }
    log::debug!("Effective settings: {settings:?}");

    let service = ShotService::from_settings(&settings).map_err(|e| e.to_string())?;
    Ok((service, settings.watch_data_dir))
}

fn settings_command(data_dir: &Path, assignments: &[String]) -> Result<String, String> {
    let settings = if assignments.is_empty() {
        load_settings_from_disk(data_dir)?
    } else {
        save_settings_to_disk(data_dir, settings_patch(assignments)?)?
    };
    serde_json::to_string_pretty(&settings).map_err(|e| format!("Failed to serialize settings: {e}"))
}
