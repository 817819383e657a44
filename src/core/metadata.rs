use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Descriptive data for one listed company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub long_name: String,
    pub country: Option<String>,
    pub market_cap: Option<f64>,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn fetch_profile(&self, symbol: &str) -> anyhow::Result<CompanyProfile>;
}
