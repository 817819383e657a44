use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Outcome of resolving user text to a chartable ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSelection<'a> {
    Chart {
        symbol: &'a str,
        points: &'a [(NaiveDate, f64)],
    },
    /// Nothing was entered.
    MissingTicker,
    /// The input does not name a ticker in the universe.
    InvalidTicker(String),
}

/// Matches `input` case-insensitively against the charted universe.
pub fn select_chart<'a>(
    input: &str,
    series: &'a BTreeMap<String, Vec<(NaiveDate, f64)>>,
) -> ChartSelection<'a> {
    let wanted = input.trim();
    if wanted.is_empty() {
        return ChartSelection::MissingTicker;
    }

    series
        .iter()
        .find(|(symbol, _)| symbol.eq_ignore_ascii_case(wanted))
        .map_or_else(
            || ChartSelection::InvalidTicker(wanted.to_string()),
            |(symbol, points)| ChartSelection::Chart {
                symbol: symbol.as_str(),
                points: points.as_slice(),
            },
        )
}
