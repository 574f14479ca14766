//! Postgres implementations of the reconciliation store traits.
//!
//! One [`PgStore`] wraps one pool and serves as catalog, review queue, and
//! snapshot store. Every call borrows a pooled connection for a single
//! statement.

use std::collections::HashSet;

use async_trait::async_trait;
use feedsync_core::{
    CatalogProduct, CatalogStore, NameQuery, NewProductCandidate, PriceChangeCandidate,
    PriceChangeStatus, QueuedNewProduct, QueuedPriceChange, ReviewQueue, SnapshotStore,
    StoreError, SupplierRecord,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{catalog, review_queue, supplier_catalog, DbError};

/// Classify a database error for the reconciliation layer. Connection-level
/// failures become [`StoreError::Unavailable`]; everything else is a
/// [`StoreError::Query`].
#[must_use]
pub fn store_error(err: DbError) -> StoreError {
    match err {
        DbError::Sqlx(
            e @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)),
        ) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn not_found_as_query(id: i64) -> impl FnOnce(DbError) -> StoreError {
    move |err| match err {
        DbError::NotFound => StoreError::Query(format!("catalog product {id} not found")),
        other => store_error(other),
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_by_sku(&self, sku: &str) -> Result<Option<CatalogProduct>, StoreError> {
        let row = catalog::get_catalog_product_by_sku(&self.pool, sku)
            .await
            .map_err(store_error)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn find_by_model(&self, model: &str) -> Result<Option<CatalogProduct>, StoreError> {
        let row = catalog::get_catalog_product_by_model(&self.pool, model)
            .await
            .map_err(store_error)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn search_by_name(&self, query: &NameQuery) -> Result<Vec<CatalogProduct>, StoreError> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let rows = catalog::search_catalog_products_by_name(
            &self.pool,
            &query.terms,
            query.ignore_dashes,
            limit,
        )
        .await
        .map_err(store_error)?;
        Ok(rows.into_iter().map(CatalogProduct::from).collect())
    }

    async fn get_product(&self, id: i64) -> Result<Option<CatalogProduct>, StoreError> {
        let row = catalog::get_catalog_product(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(CatalogProduct::from))
    }

    async fn update_price(&self, id: i64, price: Decimal) -> Result<(), StoreError> {
        catalog::update_catalog_price(&self.pool, id, price)
            .await
            .map_err(not_found_as_query(id))
    }

    async fn update_stock(&self, id: i64, stock: i32) -> Result<(), StoreError> {
        catalog::update_catalog_stock(&self.pool, id, stock)
            .await
            .map_err(not_found_as_query(id))
    }
}

#[async_trait]
impl ReviewQueue for PgStore {
    async fn insert_price_change(
        &self,
        candidate: &PriceChangeCandidate,
    ) -> Result<i64, StoreError> {
        review_queue::insert_price_change_candidate(&self.pool, candidate)
            .await
            .map_err(store_error)
    }

    async fn insert_new_product(
        &self,
        candidate: &NewProductCandidate,
    ) -> Result<i64, StoreError> {
        review_queue::insert_new_product_candidate(&self.pool, candidate)
            .await
            .map_err(store_error)
    }

    async fn get_price_change(&self, id: i64) -> Result<Option<QueuedPriceChange>, StoreError> {
        review_queue::get_price_change_candidate(&self.pool, id)
            .await
            .map_err(store_error)
    }

    async fn set_price_change_status(
        &self,
        id: i64,
        status: PriceChangeStatus,
    ) -> Result<bool, StoreError> {
        review_queue::set_price_change_status(&self.pool, id, status)
            .await
            .map_err(store_error)
    }

    async fn reopen_price_change(&self, id: i64) -> Result<bool, StoreError> {
        review_queue::reopen_price_change_candidate(&self.pool, id)
            .await
            .map_err(store_error)
    }

    async fn list_pending_price_changes(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedPriceChange>, StoreError> {
        review_queue::list_pending_price_changes(&self.pool, limit)
            .await
            .map_err(store_error)
    }

    async fn list_pending_new_products(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedNewProduct>, StoreError> {
        review_queue::list_pending_new_products(&self.pool, limit)
            .await
            .map_err(store_error)
    }
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn known_skus(&self, supplier_name: &str) -> Result<HashSet<String>, StoreError> {
        let skus = supplier_catalog::list_known_skus(&self.pool, supplier_name)
            .await
            .map_err(store_error)?;
        Ok(skus.into_iter().collect())
    }

    async fn upsert_entry(
        &self,
        supplier_name: &str,
        record: &SupplierRecord,
    ) -> Result<(), StoreError> {
        supplier_catalog::upsert_supplier_catalog_entry(&self.pool, supplier_name, record)
            .await
            .map_err(store_error)
    }
}
