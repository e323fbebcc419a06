//! Invoice reconciliation.
//!
//! Every invoice mutation is mirrored in catalog stock:
//!
//! - create: each line's quantity leaves stock;
//! - update: only the per-product difference moves;
//! - delete: every line's quantity comes back.
//!
//! Stock changes go through the store's conditional updates, so stock never
//! goes negative even when two writers race on the same product. What
//! happens to already-committed lines when a later line fails is governed by
//! [`StockCommit`].

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use tillbook_catalog::Product;
use tillbook_core::{DomainError, InvoiceId};
use tillbook_invoicing::{
    Customer, Invoice, InvoiceDraft, InvoiceLineItem, LineItemRequest, PriceSource,
    ReconcilePolicy, StockCommit, StockDelta, demand_by_product, plan_revision,
    validate_requests,
};

use crate::catalog::ProductCatalog;
use crate::error::{ServiceError, ServiceResult};
use crate::store::{InvoiceStore, ProductStore, StoreError};

/// Attempts made after the first when another writer takes the next invoice
/// number.
pub const DEFAULT_NUMBER_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct InvoiceReconciler<S> {
    store: S,
    catalog: ProductCatalog<S>,
    policy: ReconcilePolicy,
    number_retries: u32,
}

impl<S> InvoiceReconciler<S>
where
    S: ProductStore + InvoiceStore + Clone,
{
    pub fn new(store: S, policy: ReconcilePolicy) -> Self {
        Self {
            catalog: ProductCatalog::new(store.clone()),
            store,
            policy,
            number_retries: DEFAULT_NUMBER_RETRIES,
        }
    }

    pub fn with_number_retries(mut self, retries: u32) -> Self {
        self.number_retries = retries;
        self
    }

    pub fn policy(&self) -> &ReconcilePolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &ProductCatalog<S> {
        &self.catalog
    }

    /// Sell `items` to `customer`.
    ///
    /// Unit prices come from the request. On success the invoice carries the
    /// next invoice number and every product has been decremented.
    #[instrument(skip(self, items, customer), fields(items = items.len(), customer = %customer.name), err)]
    pub fn create(
        &self,
        items: &[LineItemRequest],
        customer: Customer,
        paid_amount: u64,
    ) -> ServiceResult<Invoice> {
        validate_requests(items)?;

        let lines = match self.policy.stock_commit {
            StockCommit::PerItem => self.withdraw_per_item(items)?,
            StockCommit::AllOrNothing => self.withdraw_all(items)?,
        };

        let draft = InvoiceDraft::new(customer, lines, paid_amount)?;
        let invoice = self.save_with_next_number(&draft)?;
        info!(
            invoice_number = invoice.invoice_number(),
            total = invoice.total_amount(),
            change = invoice.change_amount(),
            "invoice created"
        );
        Ok(invoice)
    }

    fn withdraw_per_item(&self, items: &[LineItemRequest]) -> ServiceResult<Vec<InvoiceLineItem>> {
        let mut lines: Vec<InvoiceLineItem> = Vec::with_capacity(items.len());
        for request in items {
            match self.withdraw_one(request) {
                Ok(line) => lines.push(line),
                Err(err) => {
                    if !lines.is_empty() {
                        let committed: Vec<&str> =
                            lines.iter().map(|l| l.product_name.as_str()).collect();
                        warn!(
                            failed = %request.product_name,
                            ?committed,
                            "invoice aborted after partial stock commit"
                        );
                    }
                    return Err(err);
                }
            }
        }
        Ok(lines)
    }

    fn withdraw_one(&self, request: &LineItemRequest) -> ServiceResult<InvoiceLineItem> {
        let product = self.catalog.require(&request.product_name)?;
        product.check_withdrawal(request.quantity)?;
        let line = InvoiceLineItem::priced(
            product.name(),
            request.quantity,
            request.unit_price,
            product.company(),
        )?;
        self.catalog
            .adjust_quantity(product.name(), -request.quantity)?;
        Ok(line)
    }

    fn withdraw_all(&self, items: &[LineItemRequest]) -> ServiceResult<Vec<InvoiceLineItem>> {
        let mut products: Vec<Product> = Vec::new();
        let mut deltas: Vec<StockDelta> = Vec::new();
        for (name, demand) in demand_by_product(items)? {
            let product = self.catalog.require(&name)?;
            product.check_withdrawal(demand)?;
            deltas.push(StockDelta::new(name, -demand));
            products.push(product);
        }

        let lines = items
            .iter()
            .map(|request| {
                let company = products
                    .iter()
                    .find(|p| p.name() == request.product_name)
                    .map(|p| p.company())
                    .unwrap_or_default();
                InvoiceLineItem::priced(
                    request.product_name.as_str(),
                    request.quantity,
                    request.unit_price,
                    company,
                )
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        self.catalog.adjust_many(&deltas)?;
        Ok(lines)
    }

    fn save_with_next_number(&self, draft: &InvoiceDraft) -> ServiceResult<Invoice> {
        for attempt in 0..=self.number_retries {
            let number = match self.store.max_invoice_number()? {
                Some(max) => max.checked_add(1).ok_or_else(|| {
                    ServiceError::InvariantViolation("invoice numbers exhausted".to_string())
                })?,
                None => 1,
            };
            let invoice = draft.assign(InvoiceId::new(), number, Utc::now());
            match self.store.save_invoice(invoice.clone()) {
                Ok(()) => return Ok(invoice),
                Err(StoreError::DuplicateInvoiceNumber(taken)) => {
                    debug!(attempt, taken, "invoice number taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(
            retries = self.number_retries,
            "stock committed but no invoice number could be assigned"
        );
        Err(ServiceError::Conflict(format!(
            "could not assign an invoice number after {} attempts",
            self.number_retries + 1
        )))
    }

    /// Replace the lines, customer and payment of an existing invoice.
    ///
    /// Stock moves by the per-product difference between the old and new
    /// quantities. The invoice number and creation time are kept.
    #[instrument(skip(self, items, customer), fields(items = items.len()), err)]
    pub fn update(
        &self,
        id: InvoiceId,
        items: &[LineItemRequest],
        customer: Customer,
        paid_amount: u64,
    ) -> ServiceResult<Invoice> {
        validate_requests(items)?;
        let mut invoice = self.get(id)?;
        let plan = plan_revision(&invoice, items)?;

        let mut products: Vec<Product> = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            products.push(self.catalog.require(&line.product_name)?);
        }

        let lines = items
            .iter()
            .map(|request| {
                let product = products
                    .iter()
                    .find(|p| p.name() == request.product_name);
                let unit_price = match self.policy.price_source {
                    PriceSource::Live => product.map(|p| p.price()).unwrap_or(request.unit_price),
                    PriceSource::Snapshot => invoice
                        .unit_price_of(&request.product_name)
                        .unwrap_or(request.unit_price),
                };
                InvoiceLineItem::priced(
                    request.product_name.as_str(),
                    request.quantity,
                    unit_price,
                    product.map(|p| p.company()).unwrap_or_default(),
                )
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let draft = InvoiceDraft::new(customer, lines, paid_amount)?;

        let deltas: Vec<StockDelta> = plan
            .lines
            .iter()
            .filter(|line| line.stock_delta() != 0)
            .map(|line| StockDelta::new(line.product_name.as_str(), line.stock_delta()))
            .collect();
        match self.policy.stock_commit {
            StockCommit::PerItem => {
                for (applied, delta) in deltas.iter().enumerate() {
                    if let Err(err) = self.catalog.adjust_quantity(&delta.product_name, delta.delta) {
                        if applied > 0 {
                            warn!(
                                invoice_number = invoice.invoice_number(),
                                failed = %delta.product_name,
                                applied,
                                "invoice update aborted after partial stock commit"
                            );
                        }
                        return Err(err);
                    }
                }
            }
            StockCommit::AllOrNothing => {
                if !deltas.is_empty() {
                    self.catalog.adjust_many(&deltas)?;
                }
            }
        }

        for removed in plan.removal_restocks(&self.policy) {
            self.restock_or_skip(&removed.product_name, removed.delta)?;
        }

        invoice.revise(draft, Utc::now());
        self.store.save_invoice(invoice.clone())?;
        info!(
            invoice_number = invoice.invoice_number(),
            total = invoice.total_amount(),
            "invoice updated"
        );
        Ok(invoice)
    }

    /// Delete an invoice and give its stock back. Returns the deleted record.
    #[instrument(skip(self), err)]
    pub fn delete(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        let invoice = self.get(id)?;
        for (name, quantity) in invoice.quantities_by_product()? {
            self.restock_or_skip(&name, quantity)?;
        }
        self.store.delete_invoice(id)?;
        info!(invoice_number = invoice.invoice_number(), "invoice deleted");
        Ok(invoice)
    }

    /// Return stock to a product that may have left the catalog since it was
    /// sold.
    fn restock_or_skip(&self, name: &str, quantity: i64) -> ServiceResult<()> {
        match self.catalog.adjust_quantity(name, quantity) {
            Ok(_) => Ok(()),
            Err(ServiceError::ProductNotFound(_)) => {
                warn!(product = name, quantity, "product no longer in catalog; stock not restored");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn get(&self, id: InvoiceId) -> ServiceResult<Invoice> {
        self.store
            .get_invoice(id)?
            .ok_or(ServiceError::InvoiceNotFound(id))
    }

    /// All invoices, by invoice number.
    pub fn list(&self) -> ServiceResult<Vec<Invoice>> {
        Ok(self.store.list_invoices()?)
    }

    pub fn search_by_customer(&self, fragment: &str) -> ServiceResult<Vec<Invoice>> {
        let needle = fragment.trim().to_lowercase();
        let mut invoices = self.list()?;
        invoices.retain(|i| i.customer_name().to_lowercase().contains(&needle));
        Ok(invoices)
    }
}
