//! Explicit supplier → scanner registration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use feedsync_core::{RawSupplierRow, ScanError, SupplierScanner, SuppliersFile};

/// Reads already-extracted rows from a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFeedScanner {
    path: PathBuf,
}

impl JsonFeedScanner {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SupplierScanner for JsonFeedScanner {
    async fn run_scan(&self) -> Result<Vec<RawSupplierRow>, ScanError> {
        let path = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ScanError::Io {
                path: path.clone(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| ScanError::Deserialize { path, source })
    }
}

/// Scanners keyed by supplier name, iterated in name order.
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    scanners: BTreeMap<String, Arc<dyn SupplierScanner>>,
}

impl ScannerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a [`JsonFeedScanner`] for every supplier with a `feed_path`.
    /// Relative paths are resolved against `base_dir`.
    #[must_use]
    pub fn from_suppliers(file: &SuppliersFile, base_dir: &Path) -> Self {
        let mut registry = Self::new();
        for supplier in &file.suppliers {
            match &supplier.feed_path {
                Some(path) => {
                    registry.register(&supplier.name, JsonFeedScanner::new(base_dir.join(path)));
                }
                None => {
                    tracing::debug!(supplier = %supplier.name, "no feed_path configured, not registered");
                }
            }
        }
        registry
    }

    /// Replaces any scanner already registered under `supplier_name`.
    pub fn register<S>(&mut self, supplier_name: &str, scanner: S)
    where
        S: SupplierScanner + 'static,
    {
        self.scanners
            .insert(supplier_name.to_string(), Arc::new(scanner));
    }

    /// # Errors
    ///
    /// Returns [`ScanError::NotRegistered`] for an unknown supplier.
    pub fn get(&self, supplier_name: &str) -> Result<Arc<dyn SupplierScanner>, ScanError> {
        self.scanners
            .get(supplier_name)
            .cloned()
            .ok_or_else(|| ScanError::NotRegistered(supplier_name.to_string()))
    }

    pub fn suppliers(&self) -> impl Iterator<Item = &str> {
        self.scanners.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scanners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scanners.is_empty()
    }
}
