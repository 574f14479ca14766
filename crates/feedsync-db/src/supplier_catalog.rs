//! Database operations for `supplier_catalog`, the per-supplier record of
//! SKUs seen in processed feeds.

use chrono::{DateTime, Utc};
use feedsync_core::SupplierRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `supplier_catalog` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupplierCatalogRow {
    pub supplier_name: String,
    pub sku: String,
    pub name: Option<String>,
    pub cost_price: Option<Decimal>,
    pub stock_level: Option<i32>,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

/// Every SKU stored for `supplier_name`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_known_skus(pool: &PgPool, supplier_name: &str) -> Result<Vec<String>, DbError> {
    let skus = sqlx::query_scalar::<_, String>(
        "SELECT sku FROM supplier_catalog WHERE supplier_name = $1 ORDER BY sku",
    )
    .bind(supplier_name)
    .fetch_all(pool)
    .await?;
    Ok(skus)
}

/// Upserts the latest feed values for `(supplier_name, record.sku)`.
///
/// Conflicts update `name`, `cost_price`, `stock_level`, and `last_seen_at`;
/// `first_seen_at` is kept.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_supplier_catalog_entry(
    pool: &PgPool,
    supplier_name: &str,
    record: &SupplierRecord,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO supplier_catalog (supplier_name, sku, name, cost_price, stock_level) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (supplier_name, sku) DO UPDATE SET \
             name         = EXCLUDED.name, \
             cost_price   = EXCLUDED.cost_price, \
             stock_level  = EXCLUDED.stock_level, \
             last_seen_at = NOW()",
    )
    .bind(supplier_name)
    .bind(&record.sku)
    .bind(&record.name)
    .bind(record.price)
    .bind(record.stock)
    .execute(pool)
    .await?;
    Ok(())
}
