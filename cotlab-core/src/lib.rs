//! COTLab Core: Commitments of Traders data retrieval, normalization and
//! net position derivation.
//!
//! - Source adapters (CFTC JSON API, bulk CSV, yearly archives, plain CSV)
//!   producing canonically named datasets
//! - Type normalization of text columns that are mostly numeric
//! - Column classification and summary statistics for exploration
//! - Market catalog and net position series per trader category

pub mod classify;
pub mod config;
pub mod data;
pub mod domain;
pub mod markets;
pub mod net_position;
pub mod normalize;
pub mod session;
pub mod stats;

pub use classify::{classify, ColumnPartition};
pub use config::{ConfigError, CotConfig};
pub use markets::{is_cot_dataset, list_markets, search_markets, MarketSearch};
pub use net_position::{derive, DateParse, DeriveError, NetPositionPoint, NetPositionSeries};
pub use normalize::{normalize, normalize_with_summary, NormalizeSummary};
pub use session::Session;
pub use stats::{describe, ColumnSummary};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: datasets and derived series can cross threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Dataset>();
        require_sync::<domain::Dataset>();
        require_send::<domain::RawTable>();
        require_sync::<domain::RawTable>();
        require_send::<NetPositionSeries>();
        require_sync::<NetPositionSeries>();
        require_send::<ColumnPartition>();
        require_sync::<ColumnPartition>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<DeriveError>();
        require_sync::<DeriveError>();
        require_send::<domain::DatasetError>();
        require_sync::<domain::DatasetError>();
        require_send::<Session>();
        require_sync::<Session>();
        require_send::<CotConfig>();
        require_sync::<CotConfig>();
    }
}
