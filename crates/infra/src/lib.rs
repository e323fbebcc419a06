//! Infrastructure layer: storage backends, the catalog/invoice/report
//! services built on them, and runtime configuration.

pub mod catalog;
pub mod config;
pub mod error;
pub mod reconciler;
pub mod reports;
pub mod store;


pub use catalog::{CategoryDirectory, ProductCatalog};
pub use config::Settings;
pub use error::{ServiceError, ServiceResult};
pub use reconciler::InvoiceReconciler;
pub use reports::SalesReports;
pub use store::{
    CategoryStore, DocumentBackend, InMemoryStore, InvoiceStore, JsonFileStore, ProductStore,
    StoreError,
};
