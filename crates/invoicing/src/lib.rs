//! Invoicing domain module.
//!
//! Invoices, their embedded line items, and the pure planning logic that
//! decides how stock must move when an invoice is created, revised or deleted.
//! No IO, no storage: the infra crate executes the plans against a catalog.

pub mod invoice;
pub mod line_item;
pub mod plan;
pub mod policy;

pub use invoice::{Customer, Invoice, InvoiceDraft, change_for};
pub use line_item::{InvoiceLineItem, LineItemRequest, validate_requests};
pub use plan::{RevisionLine, RevisionPlan, StockDelta, demand_by_product, plan_revision};
pub use policy::{PriceSource, ReconcilePolicy, StockCommit};
