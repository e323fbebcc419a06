use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult};

/// A requested sale line: what the caller wants to put on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemRequest {
    pub product_name: String,
    pub quantity: i64,
    /// Price per unit in smallest currency unit.
    pub unit_price: u64,
}

impl LineItemRequest {
    pub fn new(product_name: impl Into<String>, quantity: i64, unit_price: u64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for {} must be positive",
                self.product_name
            )));
        }
        Ok(())
    }
}

/// Validate a whole request batch before any stock is touched.
pub fn validate_requests(items: &[LineItemRequest]) -> DomainResult<()> {
    if items.is_empty() {
        return Err(DomainError::validation("no items"));
    }
    items.iter().try_for_each(LineItemRequest::validate)
}

/// Line item embedded in an invoice.
///
/// Price and company are snapshots taken at sale time; later catalog edits do
/// not change them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: u64,
    pub line_total: u64,
    pub company: String,
}

impl InvoiceLineItem {
    /// Build a line item, computing `line_total = unit_price * quantity`.
    pub fn priced(
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: u64,
        company: impl Into<String>,
    ) -> DomainResult<Self> {
        let product_name = product_name.into();
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for {product_name} must be positive"
            )));
        }
        let line_total = (quantity as u64)
            .checked_mul(unit_price)
            .ok_or_else(|| DomainError::invariant("invoice line amount overflow"))?;
        Ok(Self {
            product_name,
            quantity,
            unit_price,
            line_total,
            company: company.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        assert_eq!(
            validate_requests(&[]).unwrap_err(),
            DomainError::validation("no items")
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let items = vec![
            LineItemRequest::new("Pen", 1, 5),
            LineItemRequest::new("Ink", 0, 5),
        ];
        assert_eq!(
            validate_requests(&items).unwrap_err(),
            DomainError::validation("quantity for Ink must be positive")
        );
    }

    #[test]
    fn priced_line_multiplies_quantity_by_unit_price() {
        let line = InvoiceLineItem::priced("Pen", 3, 5, "Acme").unwrap();
        assert_eq!(line.line_total, 15);
        assert_eq!(line.company, "Acme");
    }

    #[test]
    fn priced_line_detects_overflow() {
        let err = InvoiceLineItem::priced("Gold", 2, u64::MAX, "Mint").unwrap_err();
        assert_eq!(err, DomainError::invariant("invoice line amount overflow"));
    }
}
