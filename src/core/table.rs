//! Company records and the sorted companies table.
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Column headers, in display order.
pub const HEADERS: [&str; 8] = [
    "Symbol",
    "Name",
    "Last Date",
    "Last Close",
    "Return 1D",
    "Return 1W",
    "Return 1M",
    "Average 1M",
];

/// One row of the companies table.
///
/// `return_1d` is kept as the two-decimal string the dashboard has always
/// shown; the weekly and monthly returns stay numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Last Date")]
    pub last_date: String,
    #[serde(rename = "Last Close")]
    pub last_close: f64,
    #[serde(rename = "Return 1D")]
    pub return_1d: String,
    #[serde(rename = "Return 1W")]
    pub return_1w: f64,
    #[serde(rename = "Return 1M")]
    pub return_1m: f64,
    #[serde(rename = "Average 1M")]
    pub average_1m: f64,
}

/// Parallel per-ticker columns, all in ticker-list order.
#[derive(Debug, Default)]
pub struct CompanyColumns {
    pub symbols: Vec<String>,
    pub names: Vec<String>,
    pub last_dates: Vec<String>,
    pub last_closes: Vec<f64>,
    pub returns_1d: Vec<String>,
    pub returns_1w: Vec<f64>,
    pub returns_1m: Vec<f64>,
    pub averages_1m: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyTable {
    rows: Vec<CompanyRecord>,
}

impl CompanyTable {
    /// Zips the columns into records and sorts them by symbol.
    pub fn from_columns(columns: CompanyColumns) -> Result<Self> {
        let len = columns.symbols.len();
        ensure!(
            [
                columns.names.len(),
                columns.last_dates.len(),
                columns.last_closes.len(),
                columns.returns_1d.len(),
                columns.returns_1w.len(),
                columns.returns_1m.len(),
                columns.averages_1m.len(),
            ]
            .iter()
            .all(|n| *n == len),
            "Column lengths do not match the {} tickers",
            len
        );

        let mut rows: Vec<CompanyRecord> = columns
            .symbols
            .into_iter()
            .zip(columns.names)
            .zip(columns.last_dates)
            .zip(columns.last_closes)
            .zip(columns.returns_1d)
            .zip(columns.returns_1w)
            .zip(columns.returns_1m)
            .zip(columns.averages_1m)
            .map(
                |(((((((symbol, name), last_date), last_close), return_1d), return_1w), return_1m), average_1m)| {
                    CompanyRecord {
                        symbol,
                        name,
                        last_date,
                        last_close,
                        return_1d,
                        return_1w,
                        return_1m,
                        average_1m,
                    }
                },
            )
            .collect();

        rows.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CompanyRecord] {
        &self.rows
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
