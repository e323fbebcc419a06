use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, instrument};

use super::{Collections, Document, DocumentBackend, StoreError};

/// Durable store backed by one JSON document on disk.
///
/// ## Write path
///
/// Each write mutates a copy of the collections, serializes it to
/// `<file>.tmp`, fsyncs, then renames over the real file. Only after the
/// rename succeeds does the in-memory copy replace the live one, so a failed
/// write is invisible to later reads and to the file.
///
/// One process owns the file. Nothing coordinates multiple processes writing
/// the same path.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: RwLock<Collections>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if the file does not exist yet.
    #[instrument(skip(path), fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let collections = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let document: Document = serde_json::from_str(&raw)?;
            debug!(
                products = document.products.len(),
                categories = document.categories.len(),
                invoices = document.invoices.len(),
                "loaded document"
            );
            Collections::from_document(document)?
        } else {
            debug!("no document yet; starting empty");
            Collections::new()
        };

        Ok(Self {
            path,
            inner: RwLock::new(collections),
        })
    }

    fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&collections.to_document())?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = fs::File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DocumentBackend for JsonFileStore {
    fn read<T>(&self, f: impl FnOnce(&Collections) -> T) -> Result<T, StoreError> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CategoryStore, ProductStore};
    use chrono::Utc;
    use tillbook_catalog::{Category, NewProduct, Product};
    use tillbook_core::{CategoryId, ProductId};

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tillbook-{}-{}", name, ProductId::new()))
            .join("store.json")
    }

    fn pen() -> Product {
        Product::create(
            ProductId::new(),
            NewProduct {
                name: "Pen".to_string(),
                company: "Acme".to_string(),
                category: "Stationery".to_string(),
                quantity: 10,
                price: 5,
                actual_price: 3,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn writes_survive_reopen() {
        let path = scratch_path("reopen");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.upsert_product(pen()).unwrap();
            store
                .upsert_category(Category::create(CategoryId::new(), "Stationery", Utc::now()).unwrap())
                .unwrap();
            store.adjust_quantity("Pen", -3, Utc::now()).unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        let pen = reopened.find_product_by_name("Pen").unwrap().unwrap();
        assert_eq!(pen.quantity(), 7);
        assert_eq!(reopened.list_categories().unwrap().len(), 1);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn rejected_write_changes_nothing_on_disk() {
        let path = scratch_path("rejected");
        let store = JsonFileStore::open(&path).unwrap();
        store.upsert_product(pen()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        assert!(store.adjust_quantity("Pen", -11, Utc::now()).is_err());

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(store.find_product_by_name("Pen").unwrap().unwrap().quantity(), 10);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_document_fails_to_open() {
        let path = scratch_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
