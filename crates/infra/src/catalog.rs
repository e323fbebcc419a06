//! Catalog services: products (source of truth for stock and price) and the
//! category list.

use chrono::Utc;
use tracing::{debug, info, instrument};

use tillbook_catalog::{Category, NewProduct, Product, ProductUpdate};
use tillbook_core::{CategoryId, DomainError, ProductId};
use tillbook_invoicing::StockDelta;

use crate::error::{ServiceError, ServiceResult};
use crate::store::{CategoryStore, ProductStore, StoreError};

#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S: ProductStore> ProductCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub fn add_product(&self, input: NewProduct) -> ServiceResult<Product> {
        if self.store.find_product_by_name(input.name.trim())?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "product name \"{}\" already exists",
                input.name.trim()
            )));
        }
        let product = Product::create(ProductId::new(), input, Utc::now())?;
        self.store.upsert_product(product.clone())?;
        info!(product_id = %product.id_typed(), quantity = product.quantity(), "product added");
        Ok(product)
    }

    pub fn get(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .get_product(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))
    }

    pub fn find_by_name(&self, name: &str) -> ServiceResult<Option<Product>> {
        Ok(self.store.find_product_by_name(name)?)
    }

    /// Lookup that must succeed; absence is `ProductNotFound`.
    pub fn require(&self, name: &str) -> ServiceResult<Product> {
        self.find_by_name(name)?
            .ok_or_else(|| ServiceError::ProductNotFound(name.to_string()))
    }

    pub fn list(&self) -> ServiceResult<Vec<Product>> {
        Ok(self.store.list_products()?)
    }

    /// Case-insensitive substring search on product names. An empty
    /// fragment lists everything.
    pub fn search(&self, fragment: &str) -> ServiceResult<Vec<Product>> {
        let needle = fragment.trim().to_lowercase();
        let mut products = self.list()?;
        if !needle.is_empty() {
            products.retain(|p| p.name().to_lowercase().contains(&needle));
        }
        Ok(products)
    }

    pub fn count(&self) -> ServiceResult<usize> {
        Ok(self.list()?.len())
    }

    #[instrument(skip(self, update), err)]
    pub fn update_product(&self, id: ProductId, update: ProductUpdate) -> ServiceResult<Product> {
        let mut product = self.get(id)?;
        product.apply_update(update, Utc::now())?;
        self.store.upsert_product(product.clone())?;
        info!(name = product.name(), "product updated");
        Ok(product)
    }

    /// Remove a product. Invoices that sold it keep their line items.
    #[instrument(skip(self), err)]
    pub fn delete_product(&self, id: ProductId) -> ServiceResult<Product> {
        let removed = self
            .store
            .delete_product(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("product {id}")))?;
        info!(name = removed.name(), "product deleted");
        Ok(removed)
    }

    /// `quantity += delta`, refused if stock would go negative.
    #[instrument(skip(self), err)]
    pub fn adjust_quantity(&self, name: &str, delta: i64) -> ServiceResult<Product> {
        let product = self
            .store
            .adjust_quantity(name, delta, Utc::now())
            .map_err(|e| not_found_as_product(e, name))?;
        debug!(quantity = product.quantity(), "stock adjusted");
        Ok(product)
    }

    /// Apply several adjustments as one all-or-nothing batch.
    #[instrument(skip(self, deltas), fields(count = deltas.len()), err)]
    pub fn adjust_many(&self, deltas: &[StockDelta]) -> ServiceResult<Vec<Product>> {
        self.store
            .adjust_quantities(deltas, Utc::now())
            .map_err(|e| match e {
                StoreError::Rejected(DomainError::NotFound(what)) => {
                    ServiceError::ProductNotFound(what.trim_start_matches("product ").to_string())
                }
                other => other.into(),
            })
    }

    /// Receive new stock.
    pub fn restock(&self, name: &str, amount: i64) -> ServiceResult<Product> {
        if amount <= 0 {
            return Err(ServiceError::Validation(
                "restock amount must be positive".to_string(),
            ));
        }
        self.adjust_quantity(name, amount)
    }
}

fn not_found_as_product(err: StoreError, name: &str) -> ServiceError {
    match err {
        StoreError::Rejected(DomainError::NotFound(_)) => ServiceError::ProductNotFound(name.to_string()),
        other => other.into(),
    }
}

#[derive(Debug, Clone)]
pub struct CategoryDirectory<S> {
    store: S,
}

impl<S: CategoryStore> CategoryDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn list(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.store.list_categories()?)
    }

    #[instrument(skip(self), err)]
    pub fn add(&self, name: &str) -> ServiceResult<Category> {
        let category = Category::create(CategoryId::new(), name, Utc::now())?;
        if self.store.find_category_by_name(category.name())?.is_some() {
            return Err(ServiceError::Conflict("category already exists".to_string()));
        }
        self.store.upsert_category(category.clone())?;
        info!(category_id = %category.id_typed(), "category added");
        Ok(category)
    }

    #[instrument(skip(self), err)]
    pub fn rename(&self, id: CategoryId, name: &str) -> ServiceResult<Category> {
        let mut category = self
            .store
            .get_category(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))?;
        category.rename(name)?;
        self.store.upsert_category(category.clone())?;
        Ok(category)
    }

    #[instrument(skip(self), err)]
    pub fn delete(&self, id: CategoryId) -> ServiceResult<Category> {
        self.store
            .delete_category(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("category {id}")))
    }
}
