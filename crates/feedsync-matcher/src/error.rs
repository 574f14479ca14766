use feedsync_core::{PriceChangeStatus, ScanError, StoreError};
use thiserror::Error;

/// Failures that abort a whole batch. Everything narrower is counted in the
/// batch summary instead.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("catalog unavailable while resolving SKU {sku}: {source}")]
    CatalogUnavailable {
        sku: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("price change candidate {0} not found")]
    NotFound(i64),

    #[error("price change candidate {id} is {status}, not pending")]
    NotPending { id: i64, status: PriceChangeStatus },

    #[error("catalog product {0} no longer exists")]
    ProductMissing(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SupplierRunError {
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
