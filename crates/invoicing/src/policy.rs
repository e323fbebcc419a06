//! Reconciliation policy knobs.
//!
//! Defaults reproduce the long-standing behavior of the back office: live
//! catalog prices on update, no restock for lines dropped by an update, and
//! per-item stock commits on create.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use tillbook_core::DomainError;

/// Where an invoice update takes unit prices from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    /// Current catalog price of each product.
    #[default]
    Live,
    /// Price already on the invoice; the request's price for new products.
    Snapshot,
}

/// How a multi-item create commits stock decrements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockCommit {
    /// Validate and decrement item by item. A failure on item N keeps
    /// items 1..N-1 decremented.
    #[default]
    PerItem,
    /// Validate every item first, then apply all decrements as one batch.
    AllOrNothing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePolicy {
    pub price_source: PriceSource,
    /// Return stock for products an update removes from the invoice.
    pub restock_removed_items: bool,
    pub stock_commit: StockCommit,
}

impl FromStr for PriceSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "snapshot" => Ok(Self::Snapshot),
            other => Err(DomainError::validation(format!(
                "price source must be one of: live, snapshot (got {other:?})"
            ))),
        }
    }
}

impl FromStr for StockCommit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "per-item" => Ok(Self::PerItem),
            "all-or-nothing" => Ok(Self::AllOrNothing),
            other => Err(DomainError::validation(format!(
                "stock commit must be one of: per-item, all-or-nothing (got {other:?})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_behavior() {
        let policy = ReconcilePolicy::default();
        assert_eq!(policy.price_source, PriceSource::Live);
        assert!(!policy.restock_removed_items);
        assert_eq!(policy.stock_commit, StockCommit::PerItem);
    }

    #[test]
    fn parses_case_and_separator_variants() {
        assert_eq!("Snapshot".parse::<PriceSource>().unwrap(), PriceSource::Snapshot);
        assert_eq!(
            "ALL_OR_NOTHING".parse::<StockCommit>().unwrap(),
            StockCommit::AllOrNothing
        );
        assert!("cheapest".parse::<PriceSource>().is_err());
    }
}
