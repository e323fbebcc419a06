use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_catalog::{Category, Product};
use tillbook_core::{CategoryId, DomainError, Entity, InvoiceId, ProductId};
use tillbook_invoicing::{Invoice, StockDelta};

use super::StoreError;

fn insert_by_id<E>(map: &mut BTreeMap<E::Id, E>, entity: E)
where
    E: Entity,
    E::Id: Ord,
{
    map.insert(entity.id().clone(), entity);
}

/// Serialized shape of the whole database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
}

/// In-process collections plus the constraints a document database would
/// enforce: unique product and category names, unique invoice numbers, and
/// conditional stock updates.
///
/// Keyed by UUIDv7 ids, so iteration follows creation order.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    products: BTreeMap<ProductId, Product>,
    categories: BTreeMap<CategoryId, Category>,
    invoices: BTreeMap<InvoiceId, Invoice>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }

    // --- products ---

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn product_by_name(&self, name: &str) -> Option<&Product> {
        self.products.values().find(|p| p.name() == name)
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn upsert_product(&mut self, product: Product) -> Result<(), StoreError> {
        let id = product.id_typed();
        if let Some(other) = self.product_by_name(product.name()) {
            if other.id_typed() != id {
                return Err(DomainError::conflict(format!(
                    "product name \"{}\" already exists",
                    product.name()
                ))
                .into());
            }
        }
        insert_by_id(&mut self.products, product);
        Ok(())
    }

    pub fn remove_product(&mut self, id: ProductId) -> Option<Product> {
        self.products.remove(&id)
    }

    fn product_by_name_mut(&mut self, name: &str) -> Result<&mut Product, StoreError> {
        self.products
            .values_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| DomainError::not_found(format!("product {name}")).into())
    }

    pub fn adjust_quantity(
        &mut self,
        name: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        let product = self.product_by_name_mut(name)?;
        product.apply_adjustment(delta, now)?;
        Ok(product.clone())
    }

    /// Validate every delta against current stock, then apply them all.
    ///
    /// Deltas for the same product are summed before validation, so a batch
    /// cannot pass by splitting one product's demand across entries.
    pub fn adjust_quantities(
        &mut self,
        deltas: &[StockDelta],
        now: DateTime<Utc>,
    ) -> Result<Vec<Product>, StoreError> {
        let mut staged: Vec<Product> = Vec::new();
        for delta in deltas {
            let index = match staged.iter().position(|p| p.name() == delta.product_name) {
                Some(i) => i,
                None => {
                    let current = self.product_by_name_mut(&delta.product_name)?.clone();
                    staged.push(current);
                    staged.len() - 1
                }
            };
            staged[index].apply_adjustment(delta.delta, now)?;
        }

        for product in &staged {
            insert_by_id(&mut self.products, product.clone());
        }
        Ok(staged)
    }

    // --- categories ---

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.name() == name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn upsert_category(&mut self, category: Category) -> Result<(), StoreError> {
        let id = category.id_typed();
        if let Some(other) = self.category_by_name(category.name()) {
            if other.id_typed() != id {
                return Err(DomainError::conflict("category already exists").into());
            }
        }
        insert_by_id(&mut self.categories, category);
        Ok(())
    }

    pub fn remove_category(&mut self, id: CategoryId) -> Option<Category> {
        self.categories.remove(&id)
    }

    // --- invoices ---

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    pub fn invoices_by_number(&self) -> Vec<Invoice> {
        let mut out: Vec<Invoice> = self.invoices.values().cloned().collect();
        out.sort_by_key(|i| i.invoice_number());
        out
    }

    pub fn max_invoice_number(&self) -> Option<u64> {
        self.invoices.values().map(|i| i.invoice_number()).max()
    }

    pub fn save_invoice(&mut self, invoice: Invoice) -> Result<(), StoreError> {
        let id = invoice.id_typed();
        let number = invoice.invoice_number();
        if self
            .invoices
            .values()
            .any(|other| other.invoice_number() == number && other.id_typed() != id)
        {
            return Err(StoreError::DuplicateInvoiceNumber(number));
        }
        insert_by_id(&mut self.invoices, invoice);
        Ok(())
    }

    pub fn remove_invoice(&mut self, id: InvoiceId) -> Option<Invoice> {
        self.invoices.remove(&id)
    }

    // --- document conversion ---

    pub fn to_document(&self) -> Document {
        Document {
            products: self.products.values().cloned().collect(),
            categories: self.categories.values().cloned().collect(),
            invoices: self.invoices_by_number(),
        }
    }

    /// Rebuild collections from a document, re-checking the uniqueness and
    /// invoice invariants a hand-edited file could break.
    pub fn from_document(document: Document) -> Result<Self, StoreError> {
        let mut collections = Self::new();
        for product in document.products {
            if product.quantity() < 0 {
                return Err(DomainError::invariant(format!(
                    "product {} has negative stock",
                    product.name()
                ))
                .into());
            }
            collections.upsert_product(product)?;
        }
        for category in document.categories {
            collections.upsert_category(category)?;
        }
        for invoice in document.invoices {
            invoice.check_invariants()?;
            collections.save_invoice(invoice)?;
        }
        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tillbook_catalog::NewProduct;
    use tillbook_invoicing::{Customer, InvoiceDraft, InvoiceLineItem};

    fn product(name: &str, quantity: i64) -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: name.to_string(),
                company: "Acme".to_string(),
                category: "General".to_string(),
                quantity,
                price: 5,
                actual_price: 3,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn invoice(number: u64) -> Invoice {
        InvoiceDraft::new(
            Customer::default(),
            vec![InvoiceLineItem::priced("Pen", 1, 5, "Acme").unwrap()],
            5,
        )
        .unwrap()
        .assign(InvoiceId::new(), number, Utc::now())
    }

    #[test]
    fn duplicate_product_name_is_a_conflict() {
        let mut c = Collections::new();
        c.upsert_product(product("Pen", 1)).unwrap();
        let err = c.upsert_product(product("Pen", 2)).unwrap_err();
        match err {
            StoreError::Rejected(DomainError::Conflict(msg)) => {
                assert_eq!(msg, "product name \"Pen\" already exists")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn conditional_adjust_rejects_negative_result() {
        let mut c = Collections::new();
        c.upsert_product(product("Pen", 2)).unwrap();
        let err = c.adjust_quantity("Pen", -3, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(DomainError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(c.product_by_name("Pen").unwrap().quantity(), 2);
    }

    #[test]
    fn batch_adjust_is_all_or_nothing() {
        let mut c = Collections::new();
        c.upsert_product(product("Pen", 5)).unwrap();
        c.upsert_product(product("Ink", 1)).unwrap();

        let err = c
            .adjust_quantities(
                &[StockDelta::new("Pen", -2), StockDelta::new("Ink", -2)],
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(DomainError::InsufficientStock { .. })));
        assert_eq!(c.product_by_name("Pen").unwrap().quantity(), 5);
        assert_eq!(c.product_by_name("Ink").unwrap().quantity(), 1);

        let updated = c
            .adjust_quantities(
                &[StockDelta::new("Pen", -2), StockDelta::new("Ink", -1)],
                Utc::now(),
            )
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(c.product_by_name("Pen").unwrap().quantity(), 3);
        assert_eq!(c.product_by_name("Ink").unwrap().quantity(), 0);
    }

    #[test]
    fn batch_adjust_sums_split_demand() {
        let mut c = Collections::new();
        c.upsert_product(product("Pen", 3)).unwrap();
        let err = c
            .adjust_quantities(
                &[StockDelta::new("Pen", -2), StockDelta::new("Pen", -2)],
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(DomainError::InsufficientStock { .. })));
        assert_eq!(c.product_by_name("Pen").unwrap().quantity(), 3);
    }

    #[test]
    fn invoice_numbers_are_unique() {
        let mut c = Collections::new();
        c.save_invoice(invoice(1)).unwrap();
        let err = c.save_invoice(invoice(1)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateInvoiceNumber(1)));
        assert_eq!(c.max_invoice_number(), Some(1));
    }

    #[test]
    fn document_conversion_preserves_records() {
        let mut c = Collections::new();
        c.upsert_product(product("Pen", 3)).unwrap();
        c.upsert_category(Category::create(CategoryId::new(), "General", Utc::now()).unwrap())
            .unwrap();
        c.save_invoice(invoice(2)).unwrap();
        c.save_invoice(invoice(1)).unwrap();

        let document = c.to_document();
        assert_eq!(
            document
                .invoices
                .iter()
                .map(|i| i.invoice_number())
                .collect::<Vec<_>>(),
            vec![1, 2]
        );

        let restored = Collections::from_document(document.clone()).unwrap();
        assert_eq!(restored.to_document(), document);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stock_matches_accepted_adjustments(
                initial in 0i64..50,
                deltas in prop::collection::vec(-20i64..20, 0..40)
            ) {
                let mut c = Collections::new();
                c.upsert_product(product("Pen", initial)).unwrap();

                let mut expected = initial;
                for delta in deltas {
                    match c.adjust_quantity("Pen", delta, Utc::now()) {
                        Ok(p) => {
                            expected += delta;
                            prop_assert_eq!(p.quantity(), expected);
                        }
                        Err(_) => prop_assert!(expected + delta < 0),
                    }
                }
                prop_assert!(c.product_by_name("Pen").unwrap().quantity() >= 0);
                prop_assert_eq!(c.product_by_name("Pen").unwrap().quantity(), expected);
            }
        }
    }
}
