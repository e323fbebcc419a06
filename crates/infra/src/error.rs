//! Service-level error mapping.
//!
//! Domain errors and store errors are folded into one enum the callers (CLI,
//! an HTTP layer) can render: every variant carries enough context for a
//! user-facing message.

use thiserror::Error;

use tillbook_core::{DomainError, InvoiceId};

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or empty input.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("product {0} not found")]
    ProductNotFound(String),

    #[error("product {0} is out of stock")]
    OutOfStock(String),

    #[error("insufficient stock for {product}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// Any other missing record (category, product by id).
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness rule broken (duplicate name, exhausted invoice numbering).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("storage failure: {0}")]
    Store(#[source] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            DomainError::OutOfStock { product } => ServiceError::OutOfStock(product),
            DomainError::InsufficientStock {
                product,
                available,
                requested,
            } => ServiceError::InsufficientStock {
                product,
                available,
                requested,
            },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Rejected(err) => err.into(),
            StoreError::DuplicateInvoiceNumber(n) => {
                ServiceError::Conflict(format!("invoice number {n} is already taken"))
            }
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Stable machine-readable code, e.g. for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::ProductNotFound(_) => "product_not_found",
            ServiceError::OutOfStock(_) => "out_of_stock",
            ServiceError::InsufficientStock { .. } => "insufficient_stock",
            ServiceError::InvoiceNotFound(_) => "invoice_not_found",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::InvariantViolation(_) => "invariant_violation",
            ServiceError::Store(_) => "store_error",
        }
    }
}
