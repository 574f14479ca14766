//! In-process store implementations.
//!
//! Intended for tests and `--dry-run` reconciliation. Not optimized for
//! performance: name search is a linear scan.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use feedsync_core::normalize::strip_dashes;
use feedsync_core::{
    CatalogProduct, CatalogStore, NameQuery, NewProductCandidate, NewProductStatus,
    PriceChangeCandidate, PriceChangeStatus, QueuedNewProduct, QueuedPriceChange, ReviewQueue,
    SnapshotStore, StoreError, SupplierRecord,
};
use rust_decimal::Decimal;

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

fn clamp_limit(limit: i64) -> usize {
    usize::try_from(limit.max(0)).unwrap_or(usize::MAX)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<CatalogProduct>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }

    /// Snapshot of every product, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn products(&self) -> Result<Vec<CatalogProduct>, StoreError> {
        Ok(self.products.read().map_err(|_| poisoned())?.clone())
    }

    fn find<P>(&self, predicate: P) -> Result<Option<CatalogProduct>, StoreError>
    where
        P: Fn(&CatalogProduct) -> bool,
    {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.iter().find(|p| predicate(p)).cloned())
    }

    fn update<F>(&self, id: i64, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut CatalogProduct),
    {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::Query(format!("catalog product {id} not found")))?;
        apply(product);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, StoreError> {
        self.find(|p| p.sku == sku)
    }

    async fn find_by_model(&self, model: &str) -> Result<Option<CatalogProduct>, StoreError> {
        self.find(|p| p.model.as_deref() == Some(model))
    }

    async fn search_by_name(&self, query: &NameQuery) -> Result<Vec<CatalogProduct>, StoreError> {
        let key = |s: &str| {
            let lowered = s.to_lowercase();
            if query.ignore_dashes {
                strip_dashes(&lowered)
            } else {
                lowered
            }
        };
        let terms: Vec<String> = query.terms.iter().map(|t| key(t.as_str())).collect();

        let products = self.products.read().map_err(|_| poisoned())?;
        let mut found: Vec<CatalogProduct> = products
            .iter()
            .filter(|p| {
                let name = key(&p.name);
                terms.iter().all(|t| name.contains(t.as_str()))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        found.truncate(query.limit);
        Ok(found)
    }

    async fn get_product(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError> {
        self.find(|p| p.id == id)
    }

    async fn update_price(&self, id: i64, price: Decimal) -> Result<(), StoreError> {
        self.update(id, |p| p.price = price)
    }

    async fn update_stock(&self, id: i64, stock: i32) -> Result<(), StoreError> {
        self.update(id, |p| p.stock = stock)
    }
}

// ---------------------------------------------------------------------------
// Review queue
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryReviewQueue {
    next_id: AtomicI64,
    price_changes: RwLock<Vec<QueuedPriceChange>>,
    new_products: RwLock<Vec<QueuedNewProduct>>,
}

impl InMemoryReviewQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Every queued price change regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn price_changes(&self) -> Result<Vec<QueuedPriceChange>, StoreError> {
        Ok(self.price_changes.read().map_err(|_| poisoned())?.clone())
    }

    /// Every queued new-product candidate regardless of status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn new_products(&self) -> Result<Vec<QueuedNewProduct>, StoreError> {
        Ok(self.new_products.read().map_err(|_| poisoned())?.clone())
    }
}

#[async_trait]
impl ReviewQueue for InMemoryReviewQueue {
    async fn insert_price_change(
        &self,
        candidate: &PriceChangeCandidate,
    ) -> Result<i64, StoreError> {
        let mut queue = self.price_changes.write().map_err(|_| poisoned())?;
        let id = self.allocate_id();
        queue.push(QueuedPriceChange {
            id,
            candidate: candidate.clone(),
        });
        Ok(id)
    }

    async fn insert_new_product(
        &self,
        candidate: &NewProductCandidate,
    ) -> Result<i64, StoreError> {
        let mut queue = self.new_products.write().map_err(|_| poisoned())?;
        let id = self.allocate_id();
        queue.push(QueuedNewProduct {
            id,
            candidate: candidate.clone(),
        });
        Ok(id)
    }

    async fn get_price_change(&self, id: i64) -> Result<Option<QueuedPriceChange>, StoreError> {
        let queue = self.price_changes.read().map_err(|_| poisoned())?;
        Ok(queue.iter().find(|q| q.id == id).cloned())
    }

    async fn set_price_change_status(
        &self,
        id: i64,
        status: PriceChangeStatus,
    ) -> Result<bool, StoreError> {
        let mut queue = self.price_changes.write().map_err(|_| poisoned())?;
        match queue
            .iter_mut()
            .find(|q| q.id == id && q.candidate.status == PriceChangeStatus::Pending)
        {
            Some(entry) => {
                entry.candidate.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reopen_price_change(&self, id: i64) -> Result<bool, StoreError> {
        let mut queue = self.price_changes.write().map_err(|_| poisoned())?;
        match queue
            .iter_mut()
            .find(|q| q.id == id && q.candidate.status == PriceChangeStatus::Approved)
        {
            Some(entry) => {
                entry.candidate.status = PriceChangeStatus::Pending;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_pending_price_changes(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedPriceChange>, StoreError> {
        let queue = self.price_changes.read().map_err(|_| poisoned())?;
        Ok(queue
            .iter()
            .filter(|q| q.candidate.status == PriceChangeStatus::Pending)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn list_pending_new_products(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedNewProduct>, StoreError> {
        let queue = self.new_products.read().map_err(|_| poisoned())?;
        Ok(queue
            .iter()
            .filter(|q| q.candidate.status == NewProductStatus::Pending)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Supplier snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    entries: RwLock<HashMap<String, HashMap<String, SupplierRecord>>>,
}

impl InMemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a supplier's snapshot with bare SKUs, as if an earlier run had
    /// stored them.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn seed<I, S>(&self, supplier_name: &str, skus: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let supplier = entries.entry(supplier_name.to_string()).or_default();
        for sku in skus {
            let sku = sku.into();
            supplier.insert(sku.clone(), SupplierRecord::new(sku));
        }
        Ok(())
    }

    /// The last stored record for `(supplier_name, sku)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the lock is poisoned.
    pub fn entry(
        &self,
        supplier_name: &str,
        sku: &str,
    ) -> Result<Option<SupplierRecord>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(supplier_name)
            .and_then(|supplier| supplier.get(sku))
            .cloned())
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn known_skus(&self, supplier_name: &str) -> Result<HashSet<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(supplier_name)
            .map(|supplier| supplier.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert_entry(
        &self,
        supplier_name: &str,
        record: &SupplierRecord,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries
            .entry(supplier_name.to_string())
            .or_default()
            .insert(record.sku.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, sku: &str, name: &str) -> CatalogProduct {
        CatalogProduct {
            id,
            sku: sku.to_string(),
            model: None,
            name: name.to_string(),
            price: Decimal::from(100),
            stock: 1,
        }
    }

    fn query(terms: &[&str], ignore_dashes: bool) -> NameQuery {
        NameQuery {
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
            ignore_dashes,
            limit: 50,
        }
    }

    #[tokio::test]
    async fn name_search_is_conjunctive_and_sorted() {
        let catalog = InMemoryCatalog::new(vec![
            product(1, "B", "Zeta Speaker Black"),
            product(2, "A", "Alpha Speaker Black"),
            product(3, "C", "Alpha Amplifier"),
        ]);
        let found = catalog
            .search_by_name(&query(&["speaker", "black"], false))
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn name_search_can_ignore_dashes() {
        let catalog = InMemoryCatalog::new(vec![product(1, "K", "KLIPSCH RP-1400SW Subwoofer")]);
        let strict = catalog
            .search_by_name(&query(&["rp1400sw"], false))
            .await
            .unwrap();
        assert!(strict.is_empty());
        let relaxed = catalog
            .search_by_name(&query(&["rp1400sw"], true))
            .await
            .unwrap();
        assert_eq!(relaxed.len(), 1);
    }

    #[tokio::test]
    async fn updating_missing_product_is_a_query_error() {
        let catalog = InMemoryCatalog::default();
        let err = catalog.update_price(9, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn status_only_moves_from_pending() {
        let queue = InMemoryReviewQueue::new();
        let id = queue
            .insert_price_change(&PriceChangeCandidate {
                product_id: 1,
                sku: "A".to_string(),
                product_name: "A".to_string(),
                current_price: Decimal::from(10),
                new_price: Decimal::from(20),
                change_pct: Decimal::from(100),
                supplier_id: "s".to_string(),
                status: PriceChangeStatus::Pending,
            })
            .await
            .unwrap();
        assert!(queue
            .set_price_change_status(id, PriceChangeStatus::Rejected)
            .await
            .unwrap());
        assert!(!queue
            .set_price_change_status(id, PriceChangeStatus::Approved)
            .await
            .unwrap());
        assert!(queue.list_pending_price_changes(10).await.unwrap().is_empty());
        assert!(!queue.reopen_price_change(id).await.unwrap());
    }

    #[tokio::test]
    async fn only_approved_candidates_reopen() {
        let queue = InMemoryReviewQueue::new();
        let id = queue
            .insert_price_change(&PriceChangeCandidate {
                product_id: 1,
                sku: "A".to_string(),
                product_name: "A".to_string(),
                current_price: Decimal::from(10),
                new_price: Decimal::from(20),
                change_pct: Decimal::from(100),
                supplier_id: "s".to_string(),
                status: PriceChangeStatus::Pending,
            })
            .await
            .unwrap();
        assert!(!queue.reopen_price_change(id).await.unwrap());
        assert!(queue
            .set_price_change_status(id, PriceChangeStatus::Approved)
            .await
            .unwrap());
        assert!(queue.reopen_price_change(id).await.unwrap());
        assert_eq!(queue.list_pending_price_changes(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshot_upsert_is_idempotent() {
        let store = InMemorySnapshotStore::new();
        let record = SupplierRecord::new("A1").with_price(Decimal::from(5));
        store.upsert_entry("acme", &record).await.unwrap();
        store.upsert_entry("acme", &record).await.unwrap();
        store.seed("acme", ["B2"]).unwrap();
        let known = store.known_skus("acme").await.unwrap();
        assert_eq!(known.len(), 2);
        assert!(store.known_skus("other").await.unwrap().is_empty());
        assert_eq!(store.entry("acme", "A1").unwrap(), Some(record));
    }
}
