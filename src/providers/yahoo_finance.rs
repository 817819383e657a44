use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Url;
use reqwest::cookie::Jar;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::core::config::{RetryConfig, YahooProviderConfig};
use crate::core::metadata::{CompanyProfile, MetadataProvider};
use crate::core::price::{HistoryWindow, PriceBar, PriceHistoryProvider, PriceSeries};
use crate::providers::util::with_retry;

const USER_AGENT: &str = "tickerdash/0.1";

/// Converts an epoch timestamp to the exchange-local trading date.
fn trading_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

// YahooFinanceProvider serves both daily history and company metadata
pub struct YahooFinanceProvider {
    base_url: String,
    cookie_url: String,
    retry: RetryConfig,
    cookies: Arc<Jar>,
    crumb: OnceCell<String>,
}

impl YahooFinanceProvider {
    pub fn new(config: &YahooProviderConfig, retry: RetryConfig) -> Self {
        YahooFinanceProvider {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            retry,
            cookies: Arc::new(Jar::default()),
            crumb: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&self.cookies))
            .build()?)
    }

    /// Crumb for quoteSummary requests, fetched once per provider.
    ///
    /// The crumb is only honoured together with the session cookie set by
    /// `cookie_url`, which answers with an error status while setting it.
    async fn crumb(&self, symbol: &str) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                let client = self.client()?;
                let cookie_url = self.cookie_url.as_str();
                let response =
                    with_retry(|| async { client.get(cookie_url).send().await }, self.retry)
                        .await
                        .with_context(|| {
                            format!("Request error for symbol: {symbol} URL: {cookie_url}")
                        })?;
                debug!(status = %response.status(), "Visited Yahoo cookie page");

                let crumb_url = format!("{}/v1/test/getcrumb", self.base_url);
                let text = self
                    .get_text(&crumb_url, symbol)
                    .await
                    .context("Failed to obtain Yahoo crumb")?;
                let crumb = text.trim().to_string();
                if crumb.is_empty() {
                    bail!("Yahoo returned an empty crumb");
                }
                debug!("Obtained Yahoo crumb");
                Ok::<_, anyhow::Error>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }

    async fn get_text(&self, url: &str, symbol: &str) -> Result<String> {
        let client = self.client()?;
        let response = with_retry(|| async { client.get(url).send().await }, self.retry)
            .await
            .with_context(|| format!("Request error for symbol: {symbol} URL: {url}"))?;

        debug!(status = %response.status(), "Received Yahoo response");
        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to get response text for symbol: {symbol}"))
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(default, alias = "gmtoffset")]
    gmt_offset: i64,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

fn extract_bars(item: &ChartItem) -> Vec<PriceBar> {
    let (Some(timestamps), Some(closes)) = (
        item.timestamp.as_ref(),
        item.indicators
            .as_ref()
            .and_then(|inds| inds.quote.first())
            .and_then(|q| q.close.as_ref()),
    ) else {
        return Vec::new();
    };

    let mut bars: Vec<PriceBar> = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            trading_date(*ts, item.meta.gmt_offset).map(|date| PriceBar {
                date,
                close: *close,
            })
        })
        .collect();

    // A session still in progress is reported without a close
    while bars.last().is_some_and(|bar| bar.close.is_none()) {
        if let Some(bar) = bars.pop() {
            debug!(date = %bar.date, "Dropping trailing session without close");
        }
    }
    bars
}

#[async_trait]
impl PriceHistoryProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol, window = %window)
    )]
    async fn fetch_history(&self, symbol: &str, window: HistoryWindow) -> Result<PriceSeries> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range={}",
            self.base_url,
            symbol,
            window.as_range()
        );
        debug!("Requesting price history from {}", url);

        let text = self.get_text(&url, symbol).await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse chart response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let bars = extract_bars(item);
        debug!(bars = bars.len(), "Parsed price history");
        Ok(PriceSeries::new(symbol, bars))
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct YahooSummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Deserialize, Debug)]
struct SummaryResult {
    result: Option<Vec<SummaryItem>>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SummaryItem {
    price: Option<SummaryPrice>,
    asset_profile: Option<AssetProfile>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SummaryPrice {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<RawValue>,
}

#[derive(Deserialize, Debug)]
struct RawValue {
    raw: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct AssetProfile {
    country: Option<String>,
}

#[async_trait]
impl MetadataProvider for YahooFinanceProvider {
    #[instrument(name = "YahooProfileFetch", skip(self), fields(symbol = %symbol))]
    async fn fetch_profile(&self, symbol: &str) -> Result<CompanyProfile> {
        let crumb = self.crumb(symbol).await?;
        let mut url = Url::parse(&format!(
            "{}/v10/finance/quoteSummary/{}?modules=price,assetProfile",
            self.base_url, symbol
        ))
        .with_context(|| format!("Invalid quoteSummary URL for symbol: {symbol}"))?;
        url.query_pairs_mut().append_pair("crumb", crumb);
        debug!("Requesting company profile from {}", url);

        let text = self.get_text(url.as_str(), symbol).await?;
        let data: YahooSummaryResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse summary response for {}: {}", symbol, e))?;

        let item = data
            .quote_summary
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No metadata found for symbol: {}", symbol))?;

        let price = item
            .price
            .ok_or_else(|| anyhow!("No price module in metadata for symbol: {}", symbol))?;
        let long_name = price
            .long_name
            .or(price.short_name)
            .ok_or_else(|| anyhow!("No company name found for symbol: {}", symbol))?;

        Ok(CompanyProfile {
            long_name,
            country: item.asset_profile.and_then(|p| p.country),
            market_cap: price.market_cap.and_then(|m| m.raw),
        })
    }
}
