use tracing::instrument;

use tillbook_reporting::{SalesPeriod, SalesReport, SalesSummary};

use crate::error::ServiceResult;
use crate::store::InvoiceStore;

/// Read-only sales figures over persisted invoices.
#[derive(Debug, Clone)]
pub struct SalesReports<S> {
    store: S,
}

impl<S: InvoiceStore> SalesReports<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self), err)]
    pub fn summary(&self, period: &SalesPeriod) -> ServiceResult<SalesSummary> {
        let invoices = self.store.list_invoices()?;
        Ok(tillbook_reporting::summarize(&invoices, period))
    }

    #[instrument(skip(self), err)]
    pub fn report(&self, period: &SalesPeriod) -> ServiceResult<SalesReport> {
        let invoices = self.store.list_invoices()?;
        Ok(tillbook_reporting::report(&invoices, period))
    }

    pub fn total_sales(&self) -> ServiceResult<u64> {
        let invoices = self.store.list_invoices()?;
        Ok(tillbook_reporting::total_sales(&invoices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tillbook_core::InvoiceId;
    use tillbook_invoicing::{Customer, InvoiceDraft, InvoiceLineItem};

    #[test]
    fn summary_reads_from_store() {
        let store = Arc::new(InMemoryStore::new());
        let sold_on = |day: u32| Utc.with_ymd_and_hms(2024, 7, day, 9, 0, 0).unwrap();
        for (number, day) in [(1, 1), (2, 15), (3, 31)] {
            let invoice = InvoiceDraft::new(
                Customer::default(),
                vec![InvoiceLineItem::priced("Pen", 2, 5, "Acme").unwrap()],
                10,
            )
            .unwrap()
            .assign(InvoiceId::new(), number, sold_on(day));
            store.save_invoice(invoice).unwrap();
        }

        let reports = SalesReports::new(store);
        let range = SalesPeriod::date_range(
            sold_on(1).date_naive(),
            sold_on(15).date_naive(),
        )
        .unwrap();
        let summary = reports.summary(&range).unwrap();
        assert_eq!(summary.invoices_count, 2);
        assert_eq!(summary.total_sales, 20);
        assert_eq!(reports.total_sales().unwrap(), 30);
        assert_eq!(
            reports.report(&SalesPeriod::month(2024, 7).unwrap()).unwrap().invoices.len(),
            3
        );
    }
}
