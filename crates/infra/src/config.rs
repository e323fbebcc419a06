//! Runtime settings read from `TILLBOOK_*` environment variables.
//!
//! Unset variables take their defaults silently; malformed values fall back
//! to the default with a warning rather than aborting startup.

use std::path::PathBuf;
use std::str::FromStr;

use tillbook_invoicing::ReconcilePolicy;
use tillbook_observability::LogFormat;

use crate::reconciler::DEFAULT_NUMBER_RETRIES;

pub const DATA_FILE_VAR: &str = "TILLBOOK_DATA_FILE";
pub const PRICE_SOURCE_VAR: &str = "TILLBOOK_UPDATE_PRICE_SOURCE";
pub const RESTOCK_REMOVED_VAR: &str = "TILLBOOK_RESTOCK_REMOVED";
pub const STOCK_COMMIT_VAR: &str = "TILLBOOK_STOCK_COMMIT";
pub const NUMBER_RETRIES_VAR: &str = "TILLBOOK_NUMBER_RETRIES";
pub const LOG_FORMAT_VAR: &str = "TILLBOOK_LOG_FORMAT";

pub const DEFAULT_DATA_FILE: &str = "tillbook.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_file: PathBuf,
    pub policy: ReconcilePolicy,
    pub number_retries: u32,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            policy: ReconcilePolicy::default(),
            number_retries: DEFAULT_NUMBER_RETRIES,
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the process environment, a map in
    /// tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_file = lookup(DATA_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_file);

        Self {
            data_file,
            policy: ReconcilePolicy {
                price_source: parse_or(&lookup, PRICE_SOURCE_VAR, defaults.policy.price_source),
                restock_removed_items: parse_or(
                    &lookup,
                    RESTOCK_REMOVED_VAR,
                    defaults.policy.restock_removed_items,
                ),
                stock_commit: parse_or(&lookup, STOCK_COMMIT_VAR, defaults.policy.stock_commit),
            },
            number_retries: parse_or(&lookup, NUMBER_RETRIES_VAR, defaults.number_retries),
            log_format: parse_or(&lookup, LOG_FORMAT_VAR, defaults.log_format),
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, value = %raw, error = %err, ?default, "ignoring malformed setting");
            default
        }
    }
}
