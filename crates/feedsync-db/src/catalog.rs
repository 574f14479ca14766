//! Database operations for `catalog_products`.

use chrono::{DateTime, Utc};
use feedsync_core::normalize::strip_dashes;
use feedsync_core::CatalogProduct;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `catalog_products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CatalogProductRow {
    pub id: i64,
    pub sku: String,
    pub model: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CatalogProductRow> for CatalogProduct {
    fn from(row: CatalogProductRow) -> Self {
        CatalogProduct {
            id: row.id,
            sku: row.sku,
            model: row.model,
            name: row.name,
            price: row.price,
            stock: row.stock,
        }
    }
}

const CATALOG_COLUMNS: &str = "id, sku, model, name, price, stock, created_at, updated_at";

/// Unicode dash variants folded away by `translate()` when dashes are ignored.
const SQL_DASHES: &str = "-\u{2010}\u{2011}\u{2012}\u{2013}\u{2014}\u{2212}";

/// Escape `LIKE` metacharacters and wrap the term for a substring match.
pub(crate) fn like_pattern(term: &str, ignore_dashes: bool) -> String {
    let term = term.to_lowercase();
    let term = if ignore_dashes {
        strip_dashes(&term)
    } else {
        term
    };
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_product(
    pool: &PgPool,
    id: i64,
) -> Result<Option<CatalogProductRow>, DbError> {
    let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Exact, case-sensitive SKU lookup.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_product_by_sku(
    pool: &PgPool,
    sku: &str,
) -> Result<Option<CatalogProductRow>, DbError> {
    let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE sku = $1"
    ))
    .bind(sku)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Exact, case-sensitive model lookup. When several products share a model
/// the lowest id wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_catalog_product_by_model(
    pool: &PgPool,
    model: &str,
) -> Result<Option<CatalogProductRow>, DbError> {
    let row = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalog_products WHERE model = $1 ORDER BY id LIMIT 1"
    ))
    .bind(model)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Products whose lowercased name contains every term, ordered by name.
///
/// With `ignore_dashes`, dashes are removed from both the terms and the
/// stored name before comparing. An empty `terms` slice returns nothing.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_catalog_products_by_name(
    pool: &PgPool,
    terms: &[String],
    ignore_dashes: bool,
    limit: i64,
) -> Result<Vec<CatalogProductRow>, DbError> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }
    let patterns: Vec<String> = terms
        .iter()
        .map(|t| like_pattern(t, ignore_dashes))
        .collect();

    let rows = sqlx::query_as::<_, CatalogProductRow>(&format!(
        "SELECT {CATALOG_COLUMNS} FROM catalog_products \
         WHERE (CASE WHEN $2 THEN translate(lower(name), $3, '') ELSE lower(name) END) \
               LIKE ALL($1) \
         ORDER BY name, id \
         LIMIT $4"
    ))
    .bind(&patterns)
    .bind(ignore_dashes)
    .bind(SQL_DASHES)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_catalog_price(pool: &PgPool, id: i64, price: Decimal) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE catalog_products SET price = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(price)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_catalog_stock(pool: &PgPool, id: i64, stock: i32) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE catalog_products SET stock = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(stock)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
