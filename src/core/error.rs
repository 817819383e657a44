use thiserror::Error;

/// Faults in the fetched data, always attributed to a single ticker.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No price data returned for ticker: {0}")]
    MissingTicker(String),

    #[error("Price series for ticker {0} is empty")]
    EmptySeries(String),

    #[error(
        "Insufficient history for ticker {ticker}: {period}-day return needs {required} sessions, got {available}"
    )]
    InsufficientHistory {
        ticker: String,
        period: usize,
        required: usize,
        available: usize,
    },

    #[error("No close price available for ticker: {0}")]
    MissingClose(String),

    #[error("Zero reference close for ticker {ticker}: {period}-day return is undefined")]
    ZeroReferenceClose { ticker: String, period: usize },

    #[error("Missing field '{field}' in metadata for ticker: {ticker}")]
    MissingField { ticker: String, field: &'static str },
}

pub type Result<T> = std::result::Result<T, DataError>;
