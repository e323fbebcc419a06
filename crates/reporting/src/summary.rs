use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::InvoiceId;
use tillbook_invoicing::{Invoice, InvoiceLineItem};

use crate::period::SalesPeriod;

/// Count and sales total over a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: u64,
    pub invoices_count: u64,
}

/// Invoice as listed in a sales report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDigest {
    pub invoice_id: InvoiceId,
    pub invoice_number: u64,
    pub customer_name: String,
    pub customer_contact: String,
    pub items: Vec<InvoiceLineItem>,
    pub total_amount: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceDigest {
    fn from(invoice: &Invoice) -> Self {
        Self {
            invoice_id: invoice.id_typed(),
            invoice_number: invoice.invoice_number(),
            customer_name: invoice.customer_name().to_string(),
            customer_contact: invoice.customer_contact().to_string(),
            items: invoice.items().to_vec(),
            total_amount: invoice.total_amount(),
            created_at: invoice.created_at(),
        }
    }
}

/// Summary plus the invoices behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    #[serde(flatten)]
    pub summary: SalesSummary,
    pub invoices: Vec<InvoiceDigest>,
}

/// Count invoices created in `period` and sum their totals.
pub fn summarize<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
    period: &SalesPeriod,
) -> SalesSummary {
    invoices
        .into_iter()
        .filter(|invoice| period.contains(invoice.created_at()))
        .fold(SalesSummary::default(), |acc, invoice| SalesSummary {
            total_sales: acc.total_sales.saturating_add(invoice.total_amount()),
            invoices_count: acc.invoices_count + 1,
        })
}

/// Like [`summarize`], also listing the matching invoices (by number).
pub fn report<'a>(invoices: impl IntoIterator<Item = &'a Invoice>, period: &SalesPeriod) -> SalesReport {
    let mut matching: Vec<&Invoice> = invoices
        .into_iter()
        .filter(|invoice| period.contains(invoice.created_at()))
        .collect();
    matching.sort_by_key(|invoice| invoice.invoice_number());

    SalesReport {
        summary: summarize(matching.iter().copied(), &SalesPeriod::All),
        invoices: matching.into_iter().map(InvoiceDigest::from).collect(),
    }
}

/// Sum of every invoice total.
pub fn total_sales<'a>(invoices: impl IntoIterator<Item = &'a Invoice>) -> u64 {
    summarize(invoices, &SalesPeriod::All).total_sales
}
