//! Per-ticker statistics derived from a fetched [`PriceTable`].
//!
//! Every function takes the table and the ticker universe and returns one
//! value per ticker, in the order of `tickers`. The first ticker whose data
//! cannot produce a value aborts the computation with a [`DataError`] naming
//! that ticker.
use crate::core::error::{DataError, Result};
use crate::core::price::{PriceSeries, PriceTable};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sessions in one trading week.
pub const WEEK_PERIODS: usize = 5;
/// Sessions in one trading month.
pub const MONTH_PERIODS: usize = 21;
/// Default length of the most-recent-closes list.
pub const DEFAULT_LAST_N: usize = 10;

/// How missing closes are patched before a percent change is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMethod {
    /// Carry the previous close forward.
    Forward,
    /// Pull the next available close backward.
    Backward,
}

fn fill(closes: &[Option<f64>], method: FillMethod) -> Vec<Option<f64>> {
    let mut filled = closes.to_vec();
    match method {
        FillMethod::Forward => {
            let mut last = None;
            for value in filled.iter_mut() {
                match value {
                    Some(v) => last = Some(*v),
                    None => *value = last,
                }
            }
        }
        FillMethod::Backward => {
            let mut next = None;
            for value in filled.iter_mut().rev() {
                match value {
                    Some(v) => next = Some(*v),
                    None => *value = next,
                }
            }
        }
    }
    filled
}

/// Fractional change between each close and the close `periods` rows earlier.
///
/// The first `periods` entries have no reference close and are `None`, as is
/// any entry whose operands are still missing after filling.
pub fn pct_change(closes: &[Option<f64>], periods: usize, method: FillMethod) -> Vec<Option<f64>> {
    let filled = fill(closes, method);
    filled
        .iter()
        .enumerate()
        .map(|(i, current)| {
            if i < periods {
                return None;
            }
            match (current, filled[i - periods]) {
                (Some(current), Some(previous)) => Some(current / previous - 1.0),
                _ => None,
            }
        })
        .collect()
}

fn series_for<'a>(table: &'a PriceTable, ticker: &str) -> Result<&'a PriceSeries> {
    let series = table
        .get(ticker)
        .ok_or_else(|| DataError::MissingTicker(ticker.to_string()))?;
    if series.is_empty() {
        return Err(DataError::EmptySeries(ticker.to_string()));
    }
    Ok(series)
}

fn last_return(series: &PriceSeries, periods: usize, method: FillMethod) -> Result<f64> {
    if series.len() <= periods {
        return Err(DataError::InsufficientHistory {
            ticker: series.symbol.clone(),
            period: periods,
            required: periods + 1,
            available: series.len(),
        });
    }
    let change = pct_change(&series.closes(), periods, method)
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| DataError::MissingClose(series.symbol.clone()))?;
    if !change.is_finite() {
        return Err(DataError::ZeroReferenceClose {
            ticker: series.symbol.clone(),
            period: periods,
        });
    }
    Ok(change)
}

fn per_ticker<T>(
    table: &PriceTable,
    tickers: &[String],
    derive: impl Fn(&PriceSeries) -> Result<T>,
) -> Result<Vec<T>> {
    tickers
        .iter()
        .map(|ticker| series_for(table, ticker).and_then(&derive))
        .collect()
}

/// Cent rounding with ties to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Date of the most recent session, formatted `YYYY-MM-DD`.
pub fn last_close_dates(table: &PriceTable, tickers: &[String]) -> Result<Vec<String>> {
    per_ticker(table, tickers, |series| {
        let bar = series
            .bars
            .last()
            .ok_or_else(|| DataError::EmptySeries(series.symbol.clone()))?;
        Ok(bar.date.format("%Y-%m-%d").to_string())
    })
}

/// One-session return, rendered with two decimals.
pub fn returns_1d(table: &PriceTable, tickers: &[String]) -> Result<Vec<String>> {
    per_ticker(table, tickers, |series| {
        last_return(series, 1, FillMethod::Forward).map(|change| format!("{change:.2}"))
    })
}

pub fn returns_1w(table: &PriceTable, tickers: &[String]) -> Result<Vec<f64>> {
    per_ticker(table, tickers, |series| {
        last_return(series, WEEK_PERIODS, FillMethod::Forward)
    })
}

/// Monthly return. Gaps are back-filled before the lag is applied.
pub fn returns_1m(table: &PriceTable, tickers: &[String]) -> Result<Vec<f64>> {
    per_ticker(table, tickers, |series| {
        last_return(series, MONTH_PERIODS, FillMethod::Backward)
    })
}

/// Mean of every close present in the series.
pub fn month_averages(table: &PriceTable, tickers: &[String]) -> Result<Vec<f64>> {
    per_ticker(table, tickers, |series| {
        let closes: Vec<f64> = series.bars.iter().filter_map(|bar| bar.close).collect();
        if closes.is_empty() {
            return Err(DataError::MissingClose(series.symbol.clone()));
        }
        Ok(closes.iter().sum::<f64>() / closes.len() as f64)
    })
}

pub fn last_closes(table: &PriceTable, tickers: &[String]) -> Result<Vec<f64>> {
    per_ticker(table, tickers, |series| {
        series
            .bars
            .last()
            .and_then(|bar| bar.close)
            .ok_or_else(|| DataError::MissingClose(series.symbol.clone()))
    })
}

/// The `n` most recent closes per ticker, newest first, rounded to cents.
pub fn last_n_closes(
    table: &PriceTable,
    tickers: &[String],
    n: usize,
) -> Result<BTreeMap<String, Vec<f64>>> {
    let closes = per_ticker(table, tickers, |series| {
        Ok(series
            .bars
            .iter()
            .rev()
            .filter_map(|bar| bar.close)
            .take(n)
            .map(round2)
            .collect::<Vec<_>>())
    })?;
    Ok(tickers.iter().cloned().zip(closes).collect())
}

/// Dated closes per ticker, oldest first, for charting.
pub fn time_series(
    table: &PriceTable,
    tickers: &[String],
) -> Result<BTreeMap<String, Vec<(NaiveDate, f64)>>> {
    let points = per_ticker(table, tickers, |series| {
        Ok(series
            .bars
            .iter()
            .filter_map(|bar| bar.close.map(|close| (bar.date, close)))
            .collect::<Vec<_>>())
    })?;
    Ok(tickers.iter().cloned().zip(points).collect())
}
