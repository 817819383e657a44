//! Core business logic abstractions

pub mod cache;
pub mod chart;
pub mod config;
pub mod country;
pub mod error;
pub mod log;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod price;
pub mod table;

// Re-export main types for cleaner imports
pub use metadata::{CompanyProfile, MetadataProvider};
pub use pipeline::{Dashboard, DashboardSnapshot};
pub use price::{HistoryWindow, PriceHistoryProvider, PriceTable};
