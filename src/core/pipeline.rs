//! Fetch → derive → assemble driver for one dashboard run.
//!
//! A [`Dashboard`] performs one bulk history fetch and one metadata lookup per
//! ticker, derives every per-ticker statistic from the immutable result and
//! memoizes the whole [`DashboardSnapshot`] under the ticker universe and
//! history window it was computed for.
//!
//! History is fetched over [`HistoryWindow::fetch_window`] so the lagged
//! returns always have enough sessions; the monthly average and the chart
//! series only see the trailing configured window.
use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use crate::core::country::{CountryStatistic, aggregate_market_cap, country_statistics};
use crate::core::metadata::{CompanyProfile, MetadataProvider};
use crate::core::metrics;
use crate::core::price::{HistoryWindow, PriceHistoryProvider, PriceTable};
use crate::core::table::{CompanyColumns, CompanyTable};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Identity of a computed snapshot. Equal keys always yield equal snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DashboardKey {
    pub tickers: Vec<String>,
    pub window: HistoryWindow,
    pub last_prices: usize,
}

/// Everything one run produces, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub table: CompanyTable,
    pub series: BTreeMap<String, Vec<(NaiveDate, f64)>>,
    pub last_prices: BTreeMap<String, Vec<f64>>,
    pub profiles: Vec<(String, CompanyProfile)>,
}

impl DashboardSnapshot {
    /// Market cap by country, from the profiles fetched with the table.
    pub fn country_statistics(&self) -> Result<BTreeMap<String, CountryStatistic>> {
        let aggregate = aggregate_market_cap(
            self.profiles
                .iter()
                .map(|(ticker, profile)| (ticker.as_str(), profile)),
        )?;
        debug!(
            countries = aggregate.countries.len(),
            total_count = aggregate.total_count,
            "Aggregated market cap"
        );
        Ok(country_statistics(&aggregate))
    }
}

pub type SnapshotCache = Cache<DashboardKey, Arc<DashboardSnapshot>>;

/// Fetches the history of every ticker, at most `concurrency` at a time.
///
/// Fails with the first ticker whose fetch fails.
pub async fn fetch_price_table(
    provider: &dyn PriceHistoryProvider,
    tickers: &[String],
    window: HistoryWindow,
    concurrency: usize,
    progress: &(dyn Fn() + Send + Sync),
) -> Result<PriceTable> {
    let series: Vec<_> = stream::iter(tickers)
        .map(|ticker| async move {
            let series = provider
                .fetch_history(ticker, window)
                .await
                .with_context(|| format!("Failed to fetch price history for {ticker}"))?;
            progress();
            Ok::<_, anyhow::Error>(series)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;
    Ok(series.into_iter().collect())
}

/// Looks up the profile of every ticker, in ticker order.
pub async fn fetch_profiles(
    provider: &dyn MetadataProvider,
    tickers: &[String],
    concurrency: usize,
    progress: &(dyn Fn() + Send + Sync),
) -> Result<Vec<(String, CompanyProfile)>> {
    stream::iter(tickers)
        .map(|ticker| async move {
            let profile = provider
                .fetch_profile(ticker)
                .await
                .with_context(|| format!("Failed to fetch company profile for {ticker}"))?;
            progress();
            Ok::<_, anyhow::Error>((ticker.clone(), profile))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Derives a snapshot from already fetched data.
pub fn build_snapshot(
    table: &PriceTable,
    profiles: Vec<(String, CompanyProfile)>,
    tickers: &[String],
    window: HistoryWindow,
    last_n: usize,
) -> Result<DashboardSnapshot> {
    let recent = table.trailing(window);
    let columns = CompanyColumns {
        symbols: tickers.to_vec(),
        names: profiles
            .iter()
            .map(|(_, profile)| profile.long_name.clone())
            .collect(),
        last_dates: metrics::last_close_dates(table, tickers)?,
        last_closes: metrics::last_closes(table, tickers)?,
        returns_1d: metrics::returns_1d(table, tickers)?,
        returns_1w: metrics::returns_1w(table, tickers)?,
        returns_1m: metrics::returns_1m(table, tickers)?,
        averages_1m: metrics::month_averages(&recent, tickers)?,
    };

    Ok(DashboardSnapshot {
        table: CompanyTable::from_columns(columns)?,
        series: metrics::time_series(&recent, tickers)?,
        last_prices: metrics::last_n_closes(table, tickers, last_n)?,
        profiles,
    })
}

pub struct Dashboard {
    key: DashboardKey,
    concurrency: usize,
    history: Arc<dyn PriceHistoryProvider>,
    metadata: Arc<dyn MetadataProvider>,
    cache: Arc<SnapshotCache>,
}

impl Dashboard {
    pub fn new(
        config: &AppConfig,
        history: Arc<dyn PriceHistoryProvider>,
        metadata: Arc<dyn MetadataProvider>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Dashboard {
            key: DashboardKey {
                tickers: config.tickers.clone(),
                window: config.window,
                last_prices: config.last_prices,
            },
            concurrency: config.concurrency,
            history,
            metadata,
            cache,
        }
    }

    /// Number of network requests a cold load performs.
    pub fn request_count(&self) -> usize {
        self.key.tickers.len() * 2
    }

    /// Returns the snapshot for this dashboard's key, computing it on a miss.
    ///
    /// `progress` is called once per completed request.
    pub async fn load(&self, progress: &(dyn Fn() + Send + Sync)) -> Result<Arc<DashboardSnapshot>> {
        if let Some(snapshot) = self.cache.get(&self.key).await {
            return Ok(snapshot);
        }

        let tickers = &self.key.tickers;
        let fetch_window = self.key.window.fetch_window();
        info!(
            tickers = tickers.len(),
            window = %self.key.window,
            fetch_window = %fetch_window,
            "Fetching market data"
        );
        let (table, profiles) = futures::try_join!(
            fetch_price_table(
                self.history.as_ref(),
                tickers,
                fetch_window,
                self.concurrency,
                progress,
            ),
            fetch_profiles(self.metadata.as_ref(), tickers, self.concurrency, progress),
        )?;

        let snapshot = Arc::new(build_snapshot(
            &table,
            profiles,
            tickers,
            self.key.window,
            self.key.last_prices,
        )?);
        self.cache.put(self.key.clone(), Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DataError;
    use crate::core::price::{PriceBar, PriceSeries};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `sessions` daily bars per month of the requested window.
    struct MockHistory {
        sessions: usize,
        calls: AtomicUsize,
        windows: Mutex<Vec<HistoryWindow>>,
    }

    impl MockHistory {
        fn new(sessions: usize) -> Self {
            Self {
                sessions,
                calls: AtomicUsize::new(0),
                windows: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PriceHistoryProvider for MockHistory {
        async fn fetch_history(&self, symbol: &str, window: HistoryWindow) -> Result<PriceSeries> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().unwrap().push(window);
            if symbol == "DOWN" {
                return Err(anyhow!("connection reset"));
            }
            let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
            let base = symbol.len() as f64 * 10.0;
            let bars = (0..self.sessions * window.months() as usize)
                .map(|i| PriceBar {
                    date: start + Duration::days(i as i64),
                    close: Some(base + i as f64),
                })
                .collect();
            Ok(PriceSeries::new(symbol, bars))
        }
    }

    struct MockMetadata {
        profiles: HashMap<String, CompanyProfile>,
        calls: AtomicUsize,
    }

    impl MockMetadata {
        fn new(entries: &[(&str, &str, f64)]) -> Self {
            let profiles = entries
                .iter()
                .map(|(symbol, country, market_cap)| {
                    (
                        symbol.to_string(),
                        CompanyProfile {
                            long_name: format!("{symbol} Corp"),
                            country: Some(country.to_string()),
                            market_cap: Some(*market_cap),
                        },
                    )
                })
                .collect();
            Self {
                profiles,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MetadataProvider for MockMetadata {
        async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.profiles
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow!("No metadata found for symbol: {}", symbol))
        }
    }

    fn config(tickers: &[&str]) -> AppConfig {
        AppConfig {
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
            ..AppConfig::default()
        }
    }

    fn dashboard(
        config: &AppConfig,
        history: &Arc<MockHistory>,
        metadata: &Arc<MockMetadata>,
    ) -> Dashboard {
        Dashboard::new(
            config,
            history.clone(),
            metadata.clone(),
            Arc::new(SnapshotCache::new()),
        )
    }

    #[tokio::test]
    async fn test_load_builds_sorted_table() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[
            ("TSLA", "US", 100.0),
            ("AAPL", "US", 300.0),
        ]));
        let config = config(&["TSLA", "AAPL"]);
        let snapshot = dashboard(&config, &history, &metadata)
            .load(&|| ())
            .await
            .unwrap();

        assert_eq!(snapshot.table.symbols(), vec!["AAPL", "TSLA"]);
        let aapl = &snapshot.table.rows()[0];
        assert_eq!(aapl.name, "AAPL Corp");
        // 75 daily bars from 2024-05-01; the trailing month starts after 2024-06-14
        assert_eq!(aapl.last_close, 114.0);
        assert_eq!(aapl.last_date, "2024-07-14");
        assert_eq!(aapl.average_1m, 99.5);
        assert!((aapl.return_1w - 5.0 / 109.0).abs() < 1e-12);
        assert!((aapl.return_1m - 21.0 / 93.0).abs() < 1e-12);
        assert_eq!(aapl.return_1d, format!("{:.2}", 1.0 / 113.0));

        assert_eq!(snapshot.series["TSLA"].len(), 30);
        assert_eq!(snapshot.last_prices["AAPL"][0], 114.0);
        assert_eq!(snapshot.last_prices["AAPL"].len(), 10);
        assert_eq!(snapshot.profiles[0].0, "TSLA");
    }

    #[tokio::test]
    async fn test_second_load_served_from_cache() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0), ("AZN", "UK", 2.0)]));
        let config = config(&["AAPL", "AZN"]);
        let dashboard = dashboard(&config, &history, &metadata);

        let progress_calls = AtomicUsize::new(0);
        let progress = || {
            progress_calls.fetch_add(1, Ordering::SeqCst);
        };
        let first = dashboard.load(&progress).await.unwrap();
        let second = dashboard.load(&progress).await.unwrap();

        assert_eq!(history.calls.load(Ordering::SeqCst), 2);
        assert_eq!(metadata.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            progress_calls.load(Ordering::SeqCst),
            dashboard.request_count()
        );
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            serde_json::to_string(&first.table).unwrap(),
            serde_json::to_string(&second.table).unwrap()
        );
    }

    #[tokio::test]
    async fn test_uncached_runs_are_identical() {
        let history = Arc::new(MockHistory::new(30));
        let metadata = Arc::new(MockMetadata::new(&[("MSFT", "US", 1.0), ("OR.PA", "FR", 2.0)]));
        let config = config(&["OR.PA", "MSFT"]);

        let a = dashboard(&config, &history, &metadata).load(&|| ()).await.unwrap();
        let b = dashboard(&config, &history, &metadata).load(&|| ()).await.unwrap();

        assert_eq!(history.calls.load(Ordering::SeqCst), 4);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_vec(&a.table).unwrap(),
            serde_json::to_vec(&b.table).unwrap()
        );
    }

    #[tokio::test]
    async fn test_different_window_is_a_cache_miss() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0)]));
        let cache = Arc::new(SnapshotCache::new());
        let monthly = config(&["AAPL"]);
        let quarterly = AppConfig {
            window: HistoryWindow::ThreeMonths,
            ..monthly.clone()
        };

        for config in [&monthly, &quarterly, &monthly] {
            Dashboard::new(config, history.clone(), metadata.clone(), cache.clone())
                .load(&|| ())
                .await
                .unwrap();
        }

        assert_eq!(history.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_metadata_failure_aborts_run() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0)]));
        let config = config(&["AAPL", "META"]);
        let cache = Arc::new(SnapshotCache::new());
        let dashboard = Dashboard::new(&config, history.clone(), metadata.clone(), cache.clone());

        let err = dashboard.load(&|| ()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch company profile for META"
        );
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_history_failure_aborts_run() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0), ("DOWN", "US", 1.0)]));
        let config = config(&["AAPL", "DOWN"]);

        let err = dashboard(&config, &history, &metadata)
            .load(&|| ())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch price history for DOWN");
        assert_eq!(format!("{:#}", err), "Failed to fetch price history for DOWN: connection reset");
    }

    #[tokio::test]
    async fn test_short_history_names_ticker() {
        let history = Arc::new(MockHistory::new(7));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0)]));
        let config = config(&["AAPL"]);

        let err = dashboard(&config, &history, &metadata)
            .load(&|| ())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::InsufficientHistory {
                ticker: "AAPL".to_string(),
                period: 21,
                required: 22,
                available: 21,
            })
        );
    }

    #[tokio::test]
    async fn test_default_window_survives_short_month() {
        // A calendar month holding only 21 sessions cannot feed a 21-session lag alone
        let history = Arc::new(MockHistory::new(21));
        let metadata = Arc::new(MockMetadata::new(&[("AAPL", "US", 1.0)]));
        let config = config(&["AAPL"]);
        assert_eq!(config.window, HistoryWindow::OneMonth);

        let snapshot = dashboard(&config, &history, &metadata)
            .load(&|| ())
            .await
            .unwrap();

        assert_eq!(
            *history.windows.lock().unwrap(),
            vec![HistoryWindow::ThreeMonths]
        );
        let aapl = &snapshot.table.rows()[0];
        assert!(aapl.return_1m.is_finite());
        assert!(snapshot.series["AAPL"].len() < 63);
    }

    #[tokio::test]
    async fn test_country_statistics_from_snapshot() {
        let history = Arc::new(MockHistory::new(25));
        let metadata = Arc::new(MockMetadata::new(&[
            ("AAPL", "US", 100.0),
            ("MSFT", "US", 300.0),
        ]));
        let config = config(&["AAPL", "MSFT"]);
        let snapshot = dashboard(&config, &history, &metadata)
            .load(&|| ())
            .await
            .unwrap();

        let stats = snapshot.country_statistics().unwrap();
        assert_eq!(stats["US"].symbols, 2);
        assert_eq!(stats["US"].weighted_average_price, 400.0);
    }
}
