//! Price history abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

/// Trailing window of trading days requested from a history provider.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize,
)]
pub enum HistoryWindow {
    #[default]
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl HistoryWindow {
    /// Range parameter understood by the chart endpoint.
    pub fn as_range(&self) -> &'static str {
        match self {
            HistoryWindow::OneMonth => "1mo",
            HistoryWindow::ThreeMonths => "3mo",
            HistoryWindow::SixMonths => "6mo",
            HistoryWindow::OneYear => "1y",
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            HistoryWindow::OneMonth => 1,
            HistoryWindow::ThreeMonths => 3,
            HistoryWindow::SixMonths => 6,
            HistoryWindow::OneYear => 12,
        }
    }

    /// Window actually requested from the provider.
    ///
    /// Never shorter than three months, so the 21-session lag of the monthly
    /// return is covered even when a calendar month holds fewer sessions.
    pub fn fetch_window(&self) -> HistoryWindow {
        (*self).max(HistoryWindow::ThreeMonths)
    }
}

impl Display for HistoryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_range())
    }
}

impl FromStr for HistoryWindow {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1mo" => Ok(HistoryWindow::OneMonth),
            "3mo" => Ok(HistoryWindow::ThreeMonths),
            "6mo" => Ok(HistoryWindow::SixMonths),
            "1y" => Ok(HistoryWindow::OneYear),
            _ => Err(anyhow::anyhow!("Invalid history window: {}", s)),
        }
    }
}

/// One trading day. `close` is `None` when the provider reported no close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: Option<f64>,
}

/// Daily bars for a single symbol, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: &str, bars: Vec<PriceBar>) -> Self {
        Self {
            symbol: symbol.to_string(),
            bars,
        }
    }

    pub fn closes(&self) -> Vec<Option<f64>> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars dated after the point `window` before the latest bar.
    pub fn trailing(&self, window: HistoryWindow) -> PriceSeries {
        let start = self
            .bars
            .last()
            .and_then(|bar| bar.date.checked_sub_months(Months::new(window.months())));
        let bars = match start {
            Some(start) => self
                .bars
                .iter()
                .filter(|bar| bar.date > start)
                .copied()
                .collect(),
            None => self.bars.clone(),
        };
        PriceSeries::new(&self.symbol, bars)
    }
}

/// Price history for a whole ticker universe, fetched once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    series: HashMap<String, PriceSeries>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol.clone(), series);
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceSeries> {
        self.series.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The same table cut down to the trailing `window` of every series.
    pub fn trailing(&self, window: HistoryWindow) -> PriceTable {
        self.series
            .values()
            .map(|series| series.trailing(window))
            .collect()
    }
}

impl FromIterator<PriceSeries> for PriceTable {
    fn from_iter<I: IntoIterator<Item = PriceSeries>>(iter: I) -> Self {
        let mut table = PriceTable::new();
        for series in iter {
            table.insert(series);
        }
        table
    }
}

#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn fetch_history(&self, symbol: &str, window: HistoryWindow) -> Result<PriceSeries>;
}
