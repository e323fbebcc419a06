//! Domain foundation building blocks for `tillbook`.
//!
//! This crate contains **pure domain** primitives shared by the catalog,
//! invoicing and reporting crates (no storage, no IO).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, InvoiceId, ProductId};
