use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{DomainError, DomainResult, Entity, ProductId};

use crate::require_text;

/// Catalog record: one sellable product and its stock on hand.
///
/// Prices are in the smallest currency unit (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    company: String,
    category: String,
    quantity: i64,
    price: u64,
    actual_price: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for adding a product to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub company: String,
    pub category: String,
    pub quantity: i64,
    /// Sale price in smallest currency unit.
    pub price: u64,
    /// Cost price in smallest currency unit.
    pub actual_price: u64,
}

/// Full replacement of a product's editable fields.
pub type ProductUpdate = NewProduct;

impl Product {
    /// Validate input and build a new catalog record.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let fields = ValidatedFields::from_input(input)?;
        Ok(Self {
            id,
            name: fields.name,
            company: fields.company,
            category: fields.category,
            quantity: fields.quantity,
            price: fields.price,
            actual_price: fields.actual_price,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn actual_price(&self) -> u64 {
        self.actual_price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the editable fields. Identity and creation time are kept.
    pub fn apply_update(&mut self, update: ProductUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let fields = ValidatedFields::from_input(update)?;
        self.name = fields.name;
        self.company = fields.company;
        self.category = fields.category;
        self.quantity = fields.quantity;
        self.price = fields.price;
        self.actual_price = fields.actual_price;
        self.updated_at = now;
        Ok(())
    }

    /// Check that `requested` units can be sold from current stock.
    ///
    /// A product with no stock fails with `OutOfStock` regardless of the
    /// requested amount; otherwise a shortfall is `InsufficientStock`.
    pub fn check_withdrawal(&self, requested: i64) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::out_of_stock(&self.name));
        }
        if self.quantity < requested {
            return Err(DomainError::insufficient_stock(
                &self.name,
                self.quantity,
                requested,
            ));
        }
        Ok(())
    }

    /// Quantity after applying `delta`, or `InsufficientStock` when the
    /// result would be negative.
    pub fn adjusted_quantity(&self, delta: i64) -> DomainResult<i64> {
        let new_quantity = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?;
        if new_quantity < 0 {
            return Err(DomainError::insufficient_stock(
                &self.name,
                self.quantity,
                delta.saturating_neg(),
            ));
        }
        Ok(new_quantity)
    }

    /// Apply `quantity += delta`, keeping `quantity >= 0`.
    ///
    /// On error the product is left untouched.
    pub fn apply_adjustment(&mut self, delta: i64, now: DateTime<Utc>) -> DomainResult<()> {
        self.quantity = self.adjusted_quantity(delta)?;
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

struct ValidatedFields {
    name: String,
    company: String,
    category: String,
    quantity: i64,
    price: u64,
    actual_price: u64,
}

impl ValidatedFields {
    fn from_input(input: NewProduct) -> DomainResult<Self> {
        if input.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        Ok(Self {
            name: require_text("name", &input.name)?,
            company: require_text("company", &input.company)?,
            category: require_text("category", &input.category)?,
            quantity: input.quantity,
            price: input.price,
            actual_price: input.actual_price,
        })
    }
}
