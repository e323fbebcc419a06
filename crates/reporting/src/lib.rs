//! Sales reporting.
//!
//! Read-only filter+reduce projections over invoices: counts and sales totals
//! for a day, a month, a range of months, or an arbitrary date range. Calendar
//! buckets are evaluated in UTC.

pub mod period;
pub mod summary;

pub use period::SalesPeriod;
pub use summary::{InvoiceDigest, SalesReport, SalesSummary, report, summarize, total_sales};
