//! Offline unit tests for feedsync-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use feedsync_core::{
    AppConfig, CatalogProduct, Environment, MatchSettings, NewProductStatus, PriceChangeStatus,
    QueuedNewProduct, QueuedPriceChange,
};
use feedsync_db::{
    CatalogProductRow, DbError, NewProductCandidateRow, PoolConfig, PriceChangeCandidateRow,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

fn price_change_row(status: &str) -> PriceChangeCandidateRow {
    PriceChangeCandidateRow {
        id: 11,
        product_id: 1,
        sku: "KEF-Q350".to_string(),
        product_name: "KEF Q350 Bookshelf Speaker".to_string(),
        current_price: Decimal::from(4500),
        new_price: Decimal::from(5000),
        change_pct: Decimal::new(1111, 2),
        supplier_id: "audio-direct".to_string(),
        status: status.to_string(),
        created_at: Utc::now(),
        reviewed_at: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        suppliers_path: PathBuf::from("./config/suppliers.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        max_concurrent_suppliers: 2,
        matching: MatchSettings::default(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn catalog_row_converts_to_domain_product() {
    let row = CatalogProductRow {
        id: 3,
        sku: "AVR-X2800H".to_string(),
        model: Some("AVRX2800H".to_string()),
        name: "Denon AVR-X2800H Receiver".to_string(),
        price: Decimal::new(89900, 2),
        stock: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let product = CatalogProduct::from(row);
    assert_eq!(product.id, 3);
    assert_eq!(product.model.as_deref(), Some("AVRX2800H"));
    assert_eq!(product.price, Decimal::new(89900, 2));
    assert_eq!(product.stock, 4);
}

#[test]
fn price_change_row_decodes_status() {
    let queued = QueuedPriceChange::try_from(price_change_row("approved")).unwrap();
    assert_eq!(queued.id, 11);
    assert_eq!(queued.candidate.status, PriceChangeStatus::Approved);
    assert_eq!(queued.candidate.supplier_id, "audio-direct");
}

#[test]
fn price_change_row_rejects_unknown_status() {
    let err = QueuedPriceChange::try_from(price_change_row("maybe")).unwrap_err();
    assert!(matches!(
        err,
        DbError::Decode { column: "price_change_candidates.status", .. }
    ));
}

#[test]
fn new_product_row_decodes_status() {
    let row = NewProductCandidateRow {
        id: 5,
        supplier_name: "Audio Direct".to_string(),
        sku: "NEW-999".to_string(),
        name: Some("Brand New Widget".to_string()),
        cost_price: Some(Decimal::from(100)),
        stock_level: None,
        status: "approved_pending".to_string(),
        created_at: Utc::now(),
    };

    let queued = QueuedNewProduct::try_from(row).unwrap();
    assert_eq!(queued.candidate.status, NewProductStatus::ApprovedPending);
    assert_eq!(queued.candidate.cost_price, Some(Decimal::from(100)));
}
