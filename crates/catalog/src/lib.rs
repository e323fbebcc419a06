//! Catalog domain module.
//!
//! Products, categories and the stock rules that guard a product's quantity,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod category;
pub mod product;

pub use category::Category;
pub use product::{NewProduct, Product, ProductUpdate};

use tillbook_core::{DomainError, DomainResult};

/// Trim a required text field, rejecting blanks.
pub(crate) fn require_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
