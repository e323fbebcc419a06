//! Stock movement planning.
//!
//! Pure functions that turn invoice content into signed stock deltas. The
//! infra reconciler validates and applies them against the catalog.

use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult};

use crate::invoice::Invoice;
use crate::line_item::LineItemRequest;
use crate::policy::ReconcilePolicy;

/// Signed change to one product's stock (`quantity += delta`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDelta {
    pub product_name: String,
    pub delta: i64,
}

impl StockDelta {
    pub fn new(product_name: impl Into<String>, delta: i64) -> Self {
        Self {
            product_name: product_name.into(),
            delta,
        }
    }
}

/// Sum quantities per product name, in first-appearance order.
pub(crate) fn sum_by_product<'a>(
    lines: impl IntoIterator<Item = (&'a str, i64)>,
) -> DomainResult<Vec<(String, i64)>> {
    let mut out: Vec<(String, i64)> = Vec::new();
    for (product_name, quantity) in lines {
        match out.iter_mut().find(|(name, _)| *name == product_name) {
            Some((_, qty)) => {
                *qty = qty.checked_add(quantity).ok_or_else(|| {
                    DomainError::validation(format!("quantity overflow for {product_name}"))
                })?;
            }
            None => out.push((product_name.to_string(), quantity)),
        }
    }
    Ok(out)
}

/// Requested quantity per product, repeated lines summed, in first-appearance
/// order.
pub fn demand_by_product(requests: &[LineItemRequest]) -> DomainResult<Vec<(String, i64)>> {
    sum_by_product(
        requests
            .iter()
            .map(|r| (r.product_name.as_str(), r.quantity)),
    )
}

/// One product's quantity before and after an invoice update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionLine {
    pub product_name: String,
    pub previous_quantity: i64,
    pub new_quantity: i64,
}

impl RevisionLine {
    /// Change in the invoiced quantity (positive means more units sold).
    pub fn invoiced_delta(&self) -> i64 {
        self.new_quantity - self.previous_quantity
    }

    /// Matching change to catalog stock.
    pub fn stock_delta(&self) -> i64 {
        -self.invoiced_delta()
    }
}

/// Result of diffing an invoice against its replacement lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionPlan {
    /// Products present in the new lines, in first-appearance order.
    pub lines: Vec<RevisionLine>,
    /// Products dropped entirely by the update, with the stock they hold.
    pub removed: Vec<StockDelta>,
}

impl RevisionPlan {
    /// Restocks for dropped products, if the policy asks for them.
    pub fn removal_restocks(&self, policy: &ReconcilePolicy) -> &[StockDelta] {
        if policy.restock_removed_items {
            &self.removed
        } else {
            &[]
        }
    }
}

/// Diff the quantities on `existing` against `requests`.
pub fn plan_revision(
    existing: &Invoice,
    requests: &[LineItemRequest],
) -> DomainResult<RevisionPlan> {
    let previous = existing.quantities_by_product()?;
    let wanted = demand_by_product(requests)?;

    let lines = wanted
        .iter()
        .map(|(name, new_quantity)| RevisionLine {
            product_name: name.clone(),
            previous_quantity: previous
                .iter()
                .find(|(prev, _)| prev == name)
                .map(|(_, qty)| *qty)
                .unwrap_or(0),
            new_quantity: *new_quantity,
        })
        .collect();

    let removed = previous
        .into_iter()
        .filter(|(name, _)| !wanted.iter().any(|(w, _)| w == name))
        .map(|(name, qty)| StockDelta::new(name, qty))
        .collect();

    Ok(RevisionPlan { lines, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{Customer, InvoiceDraft};
    use crate::line_item::InvoiceLineItem;
    use chrono::Utc;
    use tillbook_core::InvoiceId;

    fn invoice_with(lines: &[(&str, i64)]) -> Invoice {
        let items = lines
            .iter()
            .map(|(name, qty)| InvoiceLineItem::priced(*name, *qty, 5, "Acme").unwrap())
            .collect();
        InvoiceDraft::new(Customer::default(), items, 0)
            .unwrap()
            .assign(InvoiceId::new(), 1, Utc::now())
    }

    #[test]
    fn demand_sums_repeated_products() {
        let demand = demand_by_product(&[
            LineItemRequest::new("Pen", 2, 5),
            LineItemRequest::new("Ink", 1, 9),
            LineItemRequest::new("Pen", 3, 5),
        ])
        .unwrap();
        assert_eq!(demand, vec![("Pen".to_string(), 5), ("Ink".to_string(), 1)]);
    }

    #[test]
    fn revision_computes_increase_decrease_and_new_lines() {
        let existing = invoice_with(&[("Pen", 3), ("Ink", 4)]);
        let plan = plan_revision(
            &existing,
            &[
                LineItemRequest::new("Pen", 5, 5),
                LineItemRequest::new("Ink", 1, 5),
                LineItemRequest::new("Paper", 2, 5),
            ],
        )
        .unwrap();

        let deltas: Vec<(&str, i64)> = plan
            .lines
            .iter()
            .map(|l| (l.product_name.as_str(), l.stock_delta()))
            .collect();
        assert_eq!(deltas, vec![("Pen", -2), ("Ink", 3), ("Paper", -2)]);
        assert!(plan.removed.is_empty());
    }

    #[test]
    fn dropped_products_restock_only_when_enabled() {
        let existing = invoice_with(&[("Pen", 3), ("Ink", 4)]);
        let plan = plan_revision(&existing, &[LineItemRequest::new("Pen", 3, 5)]).unwrap();

        assert_eq!(plan.lines[0].stock_delta(), 0);
        assert_eq!(plan.removed, vec![StockDelta::new("Ink", 4)]);

        let legacy = ReconcilePolicy::default();
        assert!(plan.removal_restocks(&legacy).is_empty());

        let restocking = ReconcilePolicy {
            restock_removed_items: true,
            ..ReconcilePolicy::default()
        };
        assert_eq!(plan.removal_restocks(&restocking), &[StockDelta::new("Ink", 4)]);
    }

    #[test]
    fn repeated_lines_that_overflow_are_rejected() {
        let err = demand_by_product(&[
            LineItemRequest::new("Pen", i64::MAX, 5),
            LineItemRequest::new("Pen", 2, 5),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("quantity overflow")));

        let existing = invoice_with(&[("Pen", 3)]);
        assert!(
            plan_revision(
                &existing,
                &[
                    LineItemRequest::new("Pen", i64::MAX, 0),
                    LineItemRequest::new("Pen", 1, 0),
                ],
            )
            .is_err()
        );
    }
}
