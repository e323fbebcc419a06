//! Persistence boundary.
//!
//! The services talk to storage only through `ProductStore`, `CategoryStore`
//! and `InvoiceStore`. Two backends share one in-process document model
//! ([`Collections`]):
//!
//! - [`InMemoryStore`]: tests/dev, nothing survives the process.
//! - [`JsonFileStore`]: the whole document is rewritten to a JSON file after
//!   every successful mutation (write-to-temp, then rename).
//!
//! Stock adjustments are conditional updates executed under the backend's
//! write lock: the non-negative check and the write happen together.

pub mod collections;
pub mod in_memory;
pub mod json_file;

pub use collections::{Collections, Document};
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use tillbook_catalog::{Category, Product};
use tillbook_core::{CategoryId, DomainError, InvoiceId, ProductId};
use tillbook_invoicing::{Invoice, StockDelta};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected the write (stock shortage, missing record,
    /// duplicate name).
    #[error(transparent)]
    Rejected(#[from] DomainError),

    /// Another invoice already holds this number.
    #[error("invoice number {0} is already taken")]
    DuplicateInvoiceNumber(u64),

    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("document (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("lock poisoned")]
    LockPoisoned,
}

pub trait ProductStore: Send + Sync {
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError>;
    fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    /// Insert or replace by id. Fails with `Conflict` if another product
    /// already uses the name.
    fn upsert_product(&self, product: Product) -> Result<(), StoreError>;
    fn delete_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    /// Conditional update: `quantity += delta` only if the result stays
    /// non-negative.
    fn adjust_quantity(&self, name: &str, delta: i64, now: DateTime<Utc>) -> Result<Product, StoreError>;
    /// Apply every delta or none of them.
    fn adjust_quantities(&self, deltas: &[StockDelta], now: DateTime<Utc>) -> Result<Vec<Product>, StoreError>;
}

pub trait CategoryStore: Send + Sync {
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError>;
    fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    fn upsert_category(&self, category: Category) -> Result<(), StoreError>;
    fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;
}

pub trait InvoiceStore: Send + Sync {
    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
    /// All invoices, ordered by invoice number.
    fn list_invoices(&self) -> Result<Vec<Invoice>, StoreError>;
    fn max_invoice_number(&self) -> Result<Option<u64>, StoreError>;
    /// Insert or replace by id. Fails with `DuplicateInvoiceNumber` if a
    /// different invoice already holds the number.
    fn save_invoice(&self, invoice: Invoice) -> Result<(), StoreError>;
    fn delete_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError>;
}

/// Locked access to a [`Collections`] document.
///
/// Backends only decide how reads and writes are guarded and made durable;
/// the store traits are implemented once for every backend.
pub trait DocumentBackend: Send + Sync {
    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError>;
    /// Run `f` as one unit: if it fails, no change is kept.
    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError>;
}

impl<B: DocumentBackend> DocumentBackend for Arc<B> {
    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        (**self).read(f)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        (**self).write(f)
    }
}

impl<B: DocumentBackend> ProductStore for B {
    fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.read(|c| c.product(id).cloned())
    }

    fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, StoreError> {
        self.read(|c| c.product_by_name(name).cloned())
    }

    fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.read(|c| c.products().cloned().collect())
    }

    fn upsert_product(&self, product: Product) -> Result<(), StoreError> {
        self.write(|c| c.upsert_product(product))
    }

    fn delete_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.write(|c| Ok(c.remove_product(id)))
    }

    fn adjust_quantity(&self, name: &str, delta: i64, now: DateTime<Utc>) -> Result<Product, StoreError> {
        self.write(|c| c.adjust_quantity(name, delta, now))
    }

    fn adjust_quantities(&self, deltas: &[StockDelta], now: DateTime<Utc>) -> Result<Vec<Product>, StoreError> {
        self.write(|c| c.adjust_quantities(deltas, now))
    }
}

impl<B: DocumentBackend> CategoryStore for B {
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.read(|c| c.category(id).cloned())
    }

    fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, StoreError> {
        self.read(|c| c.category_by_name(name).cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.read(|c| c.categories().cloned().collect())
    }

    fn upsert_category(&self, category: Category) -> Result<(), StoreError> {
        self.write(|c| c.upsert_category(category))
    }

    fn delete_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        self.write(|c| Ok(c.remove_category(id)))
    }
}

impl<B: DocumentBackend> InvoiceStore for B {
    fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        self.read(|c| c.invoice(id).cloned())
    }

    fn list_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        self.read(|c| c.invoices_by_number())
    }

    fn max_invoice_number(&self) -> Result<Option<u64>, StoreError> {
        self.read(|c| c.max_invoice_number())
    }

    fn save_invoice(&self, invoice: Invoice) -> Result<(), StoreError> {
        self.write(|c| c.save_invoice(invoice))
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        self.write(|c| Ok(c.remove_invoice(id)))
    }
}
