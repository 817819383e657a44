use crate::core::metrics::DEFAULT_LAST_N;
use crate::core::price::HistoryWindow;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_TICKERS: [&str; 10] = [
    "META", "AAPL", "MSFT", "TSLA", "AMZN", "SHEL", "NSRGY", "ROG.SW", "OR.PA", "AZN",
];

fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct YahooProviderConfig {
    pub base_url: String,
    /// Page visited once per session to obtain the cookie the crumb is bound to.
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            cookie_url: default_cookie_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub yahoo: YahooProviderConfig,
}

/// Retry policy for every outbound request.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first failure.
    pub retries: usize,
    /// Delay before the first retry; doubles on each further attempt.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            retries: 3,
            delay_ms: 500,
        }
    }
}

fn default_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|t| t.to_string()).collect()
}

fn default_last_prices() -> usize {
    DEFAULT_LAST_N
}

fn default_concurrency() -> usize {
    4
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,
    #[serde(default)]
    pub window: HistoryWindow,
    #[serde(default = "default_last_prices")]
    pub last_prices: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tickers: default_tickers(),
            window: HistoryWindow::default(),
            last_prices: default_last_prices(),
            concurrency: default_concurrency(),
            retry: RetryConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "tickerdash", "tickerdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            bail!("At least one ticker must be configured");
        }
        let mut seen = HashSet::new();
        for ticker in &self.tickers {
            if ticker.trim().is_empty() {
                bail!("Ticker symbols must not be blank");
            }
            if !seen.insert(ticker.as_str()) {
                bail!("Duplicate ticker in config: {}", ticker);
            }
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
tickers:
  - "TSLA"
  - "AAPL"
window: 3mo
last_prices: 5
concurrency: 2
retry:
  retries: 1
  delay_ms: 10
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.tickers, vec!["TSLA", "AAPL"]);
        assert_eq!(config.window, HistoryWindow::ThreeMonths);
        assert_eq!(config.last_prices, 5);
        assert_eq!(config.concurrency, 2);
        assert_eq!(
            config.retry,
            RetryConfig {
                retries: 1,
                delay_ms: 10
            }
        );
        assert_eq!(config.providers.yahoo.base_url, "http://example.com/yahoo");
        assert_eq!(config.providers.yahoo.cookie_url, "https://fc.yahoo.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.tickers.len(), 10);
        assert_eq!(config.tickers[0], "META");
        assert_eq!(config.window, HistoryWindow::OneMonth);
        assert_eq!(
            config.providers.yahoo.base_url,
            "https://query1.finance.yahoo.com"
        );
    }

    #[test]
    fn test_duplicate_tickers_rejected() {
        let config = AppConfig {
            tickers: vec!["AAPL".to_string(), "AAPL".to_string()],
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate ticker"));
    }

    #[test]
    fn test_empty_universe_rejected() {
        let config = AppConfig {
            tickers: vec![],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = AppConfig {
            concurrency: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_path_reports_bad_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "tickers: []\n").unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
    }
}
