//! Database operations for `price_change_candidates` and
//! `new_product_candidates`.

use chrono::{DateTime, Utc};
use feedsync_core::{
    NewProductCandidate, NewProductStatus, PriceChangeCandidate, PriceChangeStatus,
    QueuedNewProduct, QueuedPriceChange,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `price_change_candidates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceChangeCandidateRow {
    pub id: i64,
    pub product_id: i64,
    pub sku: String,
    pub product_name: String,
    pub current_price: Decimal,
    pub new_price: Decimal,
    pub change_pct: Decimal,
    pub supplier_id: String,
    /// `pending`, `approved`, or `rejected` (CHECK constraint).
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PriceChangeCandidateRow> for QueuedPriceChange {
    type Error = DbError;

    fn try_from(row: PriceChangeCandidateRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PriceChangeStatus>()
            .map_err(|reason| DbError::Decode {
                column: "price_change_candidates.status",
                reason,
            })?;
        Ok(QueuedPriceChange {
            id: row.id,
            candidate: PriceChangeCandidate {
                product_id: row.product_id,
                sku: row.sku,
                product_name: row.product_name,
                current_price: row.current_price,
                new_price: row.new_price,
                change_pct: row.change_pct,
                supplier_id: row.supplier_id,
                status,
            },
        })
    }
}

/// A row from the `new_product_candidates` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NewProductCandidateRow {
    pub id: i64,
    pub supplier_name: String,
    pub sku: String,
    pub name: Option<String>,
    pub cost_price: Option<Decimal>,
    pub stock_level: Option<i32>,
    /// `pending`, `approved_pending`, or `approved` (CHECK constraint).
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NewProductCandidateRow> for QueuedNewProduct {
    type Error = DbError;

    fn try_from(row: NewProductCandidateRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<NewProductStatus>()
            .map_err(|reason| DbError::Decode {
                column: "new_product_candidates.status",
                reason,
            })?;
        Ok(QueuedNewProduct {
            id: row.id,
            candidate: NewProductCandidate {
                supplier_name: row.supplier_name,
                sku: row.sku,
                name: row.name,
                cost_price: row.cost_price,
                stock_level: row.stock_level,
                status,
            },
        })
    }
}

const PRICE_CHANGE_COLUMNS: &str = "id, product_id, sku, product_name, current_price, new_price, \
                                    change_pct, supplier_id, status, created_at, reviewed_at";

const NEW_PRODUCT_COLUMNS: &str =
    "id, supplier_name, sku, name, cost_price, stock_level, status, created_at";

// ---------------------------------------------------------------------------
// price_change_candidates operations
// ---------------------------------------------------------------------------

/// Inserts a candidate row. No deduplication: every call adds a row.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_price_change_candidate(
    pool: &PgPool,
    candidate: &PriceChangeCandidate,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO price_change_candidates \
             (product_id, sku, product_name, current_price, new_price, change_pct, \
              supplier_id, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(candidate.product_id)
    .bind(&candidate.sku)
    .bind(&candidate.product_name)
    .bind(candidate.current_price)
    .bind(candidate.new_price)
    .bind(candidate.change_pct)
    .bind(&candidate.supplier_id)
    .bind(candidate.status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Decode`] if
/// the stored status is unknown.
pub async fn get_price_change_candidate(
    pool: &PgPool,
    id: i64,
) -> Result<Option<QueuedPriceChange>, DbError> {
    let row = sqlx::query_as::<_, PriceChangeCandidateRow>(&format!(
        "SELECT {PRICE_CHANGE_COLUMNS} FROM price_change_candidates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(QueuedPriceChange::try_from).transpose()
}

/// Moves a `pending` candidate to `status` and stamps `reviewed_at`.
///
/// Returns `false` when the row does not exist or is no longer pending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_price_change_status(
    pool: &PgPool,
    id: i64,
    status: PriceChangeStatus,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE price_change_candidates \
         SET status = $2, reviewed_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .bind(status.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves an `approved` candidate back to `pending` and clears `reviewed_at`.
///
/// Returns `false` when the row does not exist or is not approved.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn reopen_price_change_candidate(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE price_change_candidates \
         SET status = 'pending', reviewed_at = NULL \
         WHERE id = $1 AND status = 'approved'",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Oldest pending candidates first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Decode`] if
/// a stored status is unknown.
pub async fn list_pending_price_changes(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<QueuedPriceChange>, DbError> {
    let rows = sqlx::query_as::<_, PriceChangeCandidateRow>(&format!(
        "SELECT {PRICE_CHANGE_COLUMNS} FROM price_change_candidates \
         WHERE status = 'pending' \
         ORDER BY created_at, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(QueuedPriceChange::try_from).collect()
}

// ---------------------------------------------------------------------------
// new_product_candidates operations
// ---------------------------------------------------------------------------

/// Inserts a candidate row. No deduplication: every call adds a row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_new_product_candidate(
    pool: &PgPool,
    candidate: &NewProductCandidate,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO new_product_candidates \
             (supplier_name, sku, name, cost_price, stock_level, status) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(&candidate.supplier_name)
    .bind(&candidate.sku)
    .bind(&candidate.name)
    .bind(candidate.cost_price)
    .bind(candidate.stock_level)
    .bind(candidate.status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Oldest pending candidates first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Decode`] if
/// a stored status is unknown.
pub async fn list_pending_new_products(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<QueuedNewProduct>, DbError> {
    let rows = sqlx::query_as::<_, NewProductCandidateRow>(&format!(
        "SELECT {NEW_PRODUCT_COLUMNS} FROM new_product_candidates \
         WHERE status = 'pending' \
         ORDER BY created_at, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(QueuedNewProduct::try_from).collect()
}
