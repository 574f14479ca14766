use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read suppliers file {path}: {source}")]
    SuppliersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse suppliers file: {0}")]
    SuppliersFileParse(#[from] serde_yaml::Error),

    #[error("supplier config validation failed: {0}")]
    Validation(String),
}

/// Errors surfaced by catalog, review-queue, and snapshot stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store cannot be reached at all (pool closed, acquire
    /// timeout, I/O). No partial progress is possible while this holds.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl StoreError {
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum RetailCalcError {
    #[error("no markup rule configured for supplier '{0}'")]
    UnknownSupplier(String),

    #[error("cost price {0} is negative")]
    InvalidCost(Decimal),

    #[error("retail calculation failed: {0}")]
    Other(String),
}

/// A failure confined to one supplier row. The row is skipped and the batch
/// continues.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("supplier row has no SKU")]
    MissingSku,

    #[error("invalid price {value:?} for SKU {sku}: {reason}")]
    InvalidPrice {
        sku: String,
        value: String,
        reason: String,
    },

    #[error("invalid stock level {value:?} for SKU {sku}")]
    InvalidStock { sku: String, value: String },

    #[error("catalog lookup failed for SKU {sku}: {source}")]
    Lookup {
        sku: String,
        #[source]
        source: StoreError,
    },

    #[error("retail price calculation failed for SKU {sku}: {source}")]
    RetailCalc {
        sku: String,
        #[source]
        source: RetailCalcError,
    },

    #[error("review queue write failed for SKU {sku}: {source}")]
    Enqueue {
        sku: String,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read feed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON deserialization error for {path}: {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no scanner registered for supplier '{0}'")]
    NotRegistered(String),
}
