use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult, Entity, InvoiceId};

use crate::line_item::InvoiceLineItem;
use crate::plan::sum_by_product;

/// Customer details printed on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub contact: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
        }
    }
}

/// Change owed to the customer: `max(0, paid - total)`.
pub fn change_for(paid_amount: u64, total_amount: u64) -> u64 {
    paid_amount.saturating_sub(total_amount)
}

fn total_of(items: &[InvoiceLineItem]) -> DomainResult<u64> {
    items.iter().try_fold(0u64, |acc, item| {
        acc.checked_add(item.line_total)
            .ok_or_else(|| DomainError::invariant("invoice total overflow"))
    })
}

/// Priced invoice content, before it is given an id and a number.
///
/// The number is assigned at save time, so the reconciler keeps the draft
/// around and re-assigns it if the store reports a numbering conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    customer: Customer,
    items: Vec<InvoiceLineItem>,
    total_amount: u64,
    paid_amount: u64,
}

impl InvoiceDraft {
    pub fn new(
        customer: Customer,
        items: Vec<InvoiceLineItem>,
        paid_amount: u64,
    ) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation("no items"));
        }
        let total_amount = total_of(&items)?;
        Ok(Self {
            customer,
            items,
            total_amount,
            paid_amount,
        })
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn items(&self) -> &[InvoiceLineItem] {
        &self.items
    }

    /// Materialize the draft as a persisted-shape invoice.
    pub fn assign(&self, id: InvoiceId, invoice_number: u64, now: DateTime<Utc>) -> Invoice {
        Invoice {
            id,
            invoice_number,
            customer_name: self.customer.name.clone(),
            customer_contact: self.customer.contact.clone(),
            items: self.items.clone(),
            total_amount: self.total_amount,
            paid_amount: self.paid_amount,
            change_amount: change_for(self.paid_amount, self.total_amount),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Invoice record.
///
/// Invariants (held by every constructor and mutator):
/// - `total_amount == sum(items.line_total)`
/// - `change_amount == max(0, paid_amount - total_amount)`
/// - `invoice_number` never changes after assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    invoice_number: u64,
    customer_name: String,
    customer_contact: String,
    items: Vec<InvoiceLineItem>,
    total_amount: u64,
    paid_amount: u64,
    change_amount: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn invoice_number(&self) -> u64 {
        self.invoice_number
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn customer_contact(&self) -> &str {
        &self.customer_contact
    }

    pub fn items(&self) -> &[InvoiceLineItem] {
        &self.items
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn paid_amount(&self) -> u64 {
        self.paid_amount
    }

    pub fn change_amount(&self) -> u64 {
        self.change_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace content with a re-priced draft. Number and creation time stay.
    pub fn revise(&mut self, draft: InvoiceDraft, now: DateTime<Utc>) {
        self.customer_name = draft.customer.name;
        self.customer_contact = draft.customer.contact;
        self.items = draft.items;
        self.total_amount = draft.total_amount;
        self.paid_amount = draft.paid_amount;
        self.change_amount = change_for(draft.paid_amount, draft.total_amount);
        self.updated_at = now;
    }

    /// Unit price of the first line for `product_name`, if any.
    pub fn unit_price_of(&self, product_name: &str) -> Option<u64> {
        self.items
            .iter()
            .find(|item| item.product_name == product_name)
            .map(|item| item.unit_price)
    }

    /// Quantity on this invoice per product, repeated lines summed, in
    /// first-appearance order.
    pub fn quantities_by_product(&self) -> DomainResult<Vec<(String, i64)>> {
        sum_by_product(
            self.items
                .iter()
                .map(|item| (item.product_name.as_str(), item.quantity)),
        )
    }

    /// Re-check the stored invariants (used on records loaded from disk).
    pub fn check_invariants(&self) -> DomainResult<()> {
        if self.invoice_number == 0 {
            return Err(DomainError::invariant("invoice number must start at 1"));
        }
        if total_of(&self.items)? != self.total_amount {
            return Err(DomainError::invariant(format!(
                "invoice {} total does not match its lines",
                self.invoice_number
            )));
        }
        if change_for(self.paid_amount, self.total_amount) != self.change_amount {
            return Err(DomainError::invariant(format!(
                "invoice {} change amount is inconsistent",
                self.invoice_number
            )));
        }
        Ok(())
    }
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: i64, unit_price: u64) -> InvoiceLineItem {
        InvoiceLineItem::priced(name, quantity, unit_price, "Acme").unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn draft_totals_lines_and_computes_change() {
        let draft = InvoiceDraft::new(
            Customer::new("Ada", "555-0100"),
            vec![line("Pen", 3, 5)],
            20,
        )
        .unwrap();
        let invoice = draft.assign(InvoiceId::new(), 1, test_time());
        assert_eq!(invoice.total_amount(), 15);
        assert_eq!(invoice.change_amount(), 5);
        assert_eq!(invoice.invoice_number(), 1);
        invoice.check_invariants().unwrap();
    }

    #[test]
    fn underpayment_gives_zero_change() {
        let draft = InvoiceDraft::new(Customer::default(), vec![line("Pen", 3, 5)], 10).unwrap();
        let invoice = draft.assign(InvoiceId::new(), 4, test_time());
        assert_eq!(invoice.change_amount(), 0);
    }

    #[test]
    fn draft_without_items_is_rejected() {
        let err = InvoiceDraft::new(Customer::default(), vec![], 0).unwrap_err();
        assert_eq!(err, DomainError::validation("no items"));
    }

    #[test]
    fn revise_keeps_number_and_creation_time() {
        let created = test_time();
        let mut invoice = InvoiceDraft::new(Customer::default(), vec![line("Pen", 3, 5)], 20)
            .unwrap()
            .assign(InvoiceId::new(), 7, created);

        let draft = InvoiceDraft::new(
            Customer::new("Grace", "555-0199"),
            vec![line("Pen", 1, 5), line("Ink", 2, 12)],
            30,
        )
        .unwrap();
        invoice.revise(draft, test_time());

        assert_eq!(invoice.invoice_number(), 7);
        assert_eq!(invoice.created_at(), created);
        assert_eq!(invoice.customer_name(), "Grace");
        assert_eq!(invoice.total_amount(), 29);
        assert_eq!(invoice.change_amount(), 1);
        invoice.check_invariants().unwrap();
    }

    #[test]
    fn repeated_products_are_summed_in_first_appearance_order() {
        let invoice = InvoiceDraft::new(
            Customer::default(),
            vec![line("Pen", 1, 5), line("Ink", 2, 12), line("Pen", 4, 6)],
            0,
        )
        .unwrap()
        .assign(InvoiceId::new(), 1, test_time());

        assert_eq!(
            invoice.quantities_by_product().unwrap(),
            vec![("Pen".to_string(), 5), ("Ink".to_string(), 2)]
        );
        assert_eq!(invoice.unit_price_of("Pen"), Some(5));
        assert_eq!(invoice.unit_price_of("Paper"), None);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: totals and change are derived consistently for any lines and payment.
            #[test]
            fn totals_and_change_hold(
                lines in prop::collection::vec((1i64..1_000i64, 0u64..100_000u64), 1..20),
                paid in 0u64..50_000_000u64
            ) {
                let items: Vec<InvoiceLineItem> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, (qty, price))| line(&format!("P{i}"), *qty, *price))
                    .collect();
                let expected: u64 = lines.iter().map(|(q, p)| (*q as u64) * p).sum();

                let invoice = InvoiceDraft::new(Customer::default(), items, paid)
                    .unwrap()
                    .assign(InvoiceId::new(), 1, Utc::now());

                prop_assert_eq!(invoice.total_amount(), expected);
                prop_assert_eq!(invoice.change_amount(), paid.saturating_sub(expected));
                prop_assert!(invoice.check_invariants().is_ok());
            }
        }
    }
}
