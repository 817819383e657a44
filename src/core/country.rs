//! Market capitalisation rolled up by country of incorporation.
use crate::core::error::{DataError, Result};
use crate::core::metadata::CompanyProfile;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CountryTotal {
    pub market_cap: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CountryAggregate {
    pub countries: BTreeMap<String, CountryTotal>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountryStatistic {
    #[serde(rename = "Symbols")]
    pub symbols: usize,
    #[serde(rename = "Weighted Average Price")]
    pub weighted_average_price: f64,
}

/// Sums market cap and instrument count per country.
///
/// A profile without a country or market cap aborts the aggregation.
pub fn aggregate_market_cap<'a, I>(profiles: I) -> Result<CountryAggregate>
where
    I: IntoIterator<Item = (&'a str, &'a CompanyProfile)>,
{
    let mut aggregate = CountryAggregate::default();
    for (ticker, profile) in profiles {
        let country = profile.country.as_ref().ok_or_else(|| DataError::MissingField {
            ticker: ticker.to_string(),
            field: "country",
        })?;
        let market_cap = profile.market_cap.ok_or_else(|| DataError::MissingField {
            ticker: ticker.to_string(),
            field: "marketCap",
        })?;

        let total = aggregate.countries.entry(country.clone()).or_default();
        total.market_cap += market_cap;
        total.count += 1;
        aggregate.total_count += 1;
    }
    Ok(aggregate)
}

/// Per-country statistic: `market_cap * count / total_count`.
///
/// Despite its name the weighted value is a market-cap share scaled by
/// instrument count, not a price.
pub fn country_statistics(aggregate: &CountryAggregate) -> BTreeMap<String, CountryStatistic> {
    debug_assert_eq!(
        aggregate.countries.values().map(|t| t.count).sum::<usize>(),
        aggregate.total_count
    );
    let total = aggregate.total_count as f64;
    aggregate
        .countries
        .iter()
        .map(|(country, t)| {
            (
                country.clone(),
                CountryStatistic {
                    symbols: t.count,
                    weighted_average_price: t.market_cap * t.count as f64 / total,
                },
            )
        })
        .collect()
}
