pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::pipeline::{Dashboard, SnapshotCache};
use crate::providers::yahoo_finance::YahooFinanceProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Companies { json: bool },
    Chart { ticker: Option<String> },
    Countries,
    Prices,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Runs one command against a freshly loaded dashboard.
///
/// Every call builds its own [`SnapshotCache`], so repeated calls fetch again.
/// Callers that keep a [`Dashboard`] alive get cache hits from its `load`.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Market dashboard starting...");
    let config = load_config(config_path)?;

    let provider = Arc::new(YahooFinanceProvider::new(
        &config.providers.yahoo,
        config.retry,
    ));
    let dashboard = Dashboard::new(
        &config,
        provider.clone(),
        provider,
        Arc::new(SnapshotCache::new()),
    );

    let pb = cli::ui::new_progress_bar(dashboard.request_count() as u64);
    let loaded = dashboard.load(&|| pb.inc(1)).await;
    pb.finish_and_clear();
    let snapshot = loaded?;

    match command {
        AppCommand::Companies { json } => cli::companies::display(&snapshot.table, json)?,
        AppCommand::Chart { ticker } => {
            cli::chart::display(ticker.as_deref().unwrap_or(""), &snapshot.series)
        }
        AppCommand::Countries => cli::countries::display(&snapshot.country_statistics()?),
        AppCommand::Prices => cli::prices::display(&snapshot.last_prices),
    }
    Ok(())
}
