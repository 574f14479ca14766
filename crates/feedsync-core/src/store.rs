//! Capabilities the reconciliation core consumes.
//!
//! Implementations are injected at construction time: `feedsync-db` provides
//! Postgres-backed stores sharing one connection pool, and
//! `feedsync-matcher::memory` provides in-process stores for tests and dry
//! runs.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::{RetailCalcError, ScanError, StoreError};
use crate::types::{
    CatalogProduct, NameQuery, NewProductCandidate, PriceChangeCandidate, PriceChangeStatus,
    QueuedNewProduct, QueuedPriceChange, RawSupplierRow, SupplierRecord,
};

/// Read access to the catalog plus the two mutable fields.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, StoreError>;

    async fn find_by_model(&self, model: &str) -> Result<Option<CatalogProduct>, StoreError>;

    /// Conjunctive, case-insensitive substring match over product names.
    /// Results are ordered by name and bounded by `query.limit`.
    async fn search_by_name(&self, query: &NameQuery) -> Result<Vec<CatalogProduct>, StoreError>;

    async fn get_product(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError>;

    async fn update_price(&self, id: i64, price: Decimal) -> Result<(), StoreError>;

    async fn update_stock(&self, id: i64, stock: i32) -> Result<(), StoreError>;
}

/// The price-change and new-product review queues.
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    /// Returns the id assigned to the stored candidate.
    async fn insert_price_change(&self, candidate: &PriceChangeCandidate)
        -> Result<i64, StoreError>;

    /// Returns the id assigned to the stored candidate.
    async fn insert_new_product(&self, candidate: &NewProductCandidate)
        -> Result<i64, StoreError>;

    async fn get_price_change(&self, id: i64) -> Result<Option<QueuedPriceChange>, StoreError>;

    /// Moves a `pending` candidate to `status`. Returns `false` when the
    /// candidate does not exist or is no longer pending.
    async fn set_price_change_status(
        &self,
        id: i64,
        status: PriceChangeStatus,
    ) -> Result<bool, StoreError>;

    /// Moves an `approved` candidate back to `pending`, undoing a claim whose
    /// catalog write failed. Returns `false` when it is not `approved`.
    async fn reopen_price_change(&self, id: i64) -> Result<bool, StoreError>;

    async fn list_pending_price_changes(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedPriceChange>, StoreError>;

    async fn list_pending_new_products(&self, limit: i64)
        -> Result<Vec<QueuedNewProduct>, StoreError>;
}

/// The per-supplier set of SKUs seen in processed feeds.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn known_skus(&self, supplier_name: &str) -> Result<HashSet<String>, StoreError>;

    async fn upsert_entry(
        &self,
        supplier_name: &str,
        record: &SupplierRecord,
    ) -> Result<(), StoreError>;
}

/// Produces the extracted rows of one supplier's current feed.
#[async_trait]
pub trait SupplierScanner: Send + Sync {
    async fn run_scan(&self) -> Result<Vec<RawSupplierRow>, ScanError>;
}

/// Converts a supplier cost price into the catalog retail price.
pub trait RetailCalculator: Send + Sync {
    /// # Errors
    ///
    /// Returns [`RetailCalcError`] when no valid retail price can be derived.
    fn retail_price(
        &self,
        cost: Decimal,
        supplier_id: &str,
        category: Option<&str>,
    ) -> Result<Decimal, RetailCalcError>;
}

impl<F> RetailCalculator for F
where
    F: Fn(Decimal, &str, Option<&str>) -> Result<Decimal, RetailCalcError> + Send + Sync,
{
    fn retail_price(
        &self,
        cost: Decimal,
        supplier_id: &str,
        category: Option<&str>,
    ) -> Result<Decimal, RetailCalcError> {
        self(cost, supplier_id, category)
    }
}
