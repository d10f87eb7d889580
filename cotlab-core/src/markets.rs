//! Market catalog: distinct market names and search over them.

use crate::domain::fields::{MARKET, POSITION_FIELDS};
use crate::domain::{text_values, Dataset};
use std::collections::BTreeSet;

/// Sorted, distinct, non-blank market names. Empty when the dataset has no
/// market column.
pub fn list_markets(dataset: &Dataset) -> Vec<String> {
    let Some(column) = dataset.column(MARKET) else {
        return Vec::new();
    };
    text_values(column)
        .into_iter()
        .flatten()
        .filter(|name| !name.trim().is_empty())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// True when the dataset has the market column and at least one position
/// count column.
pub fn is_cot_dataset(dataset: &Dataset) -> bool {
    dataset.has_column(MARKET) && POSITION_FIELDS.iter().any(|f| dataset.has_column(f))
}

/// Outcome of [`search_markets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSearch {
    pub matches: Vec<String>,
    /// True when nothing matched and `matches` holds every market instead.
    pub fell_back: bool,
}

/// Case-insensitive substring search. A blank term returns every market;
/// a term with no hits also returns every market, flagged as a fallback.
pub fn search_markets(markets: &[String], term: &str) -> MarketSearch {
    let needle = term.trim().to_uppercase();
    if needle.is_empty() {
        return MarketSearch {
            matches: markets.to_vec(),
            fell_back: false,
        };
    }
    let matches: Vec<String> = markets
        .iter()
        .filter(|m| m.to_uppercase().contains(&needle))
        .cloned()
        .collect();
    if matches.is_empty() {
        MarketSearch {
            matches: markets.to_vec(),
            fell_back: true,
        }
    } else {
        MarketSearch {
            matches,
            fell_back: false,
        }
    }
}
