//! Supplier feed reconciliation: identity resolution, delta classification,
//! and discontinuation detection against a product catalog.

pub mod delta;
pub mod discontinuation;
pub mod error;
pub mod memory;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod runner;
pub mod search;

pub use delta::{change_pct, Delta, DeltaDetector};
pub use discontinuation::find_discontinued;
pub use error::{ReconcileError, ReviewError, SupplierRunError};
pub use memory::{InMemoryCatalog, InMemoryReviewQueue, InMemorySnapshotStore};
pub use reconciler::{ReconciliationSummary, Reconciler};
pub use registry::{JsonFeedScanner, ScannerRegistry};
pub use resolver::{similarity, IdentityResolver};
pub use runner::{run_registered_suppliers, SupplierRunOutcome};
pub use search::{analyze_query, CatalogSearchIndex, QueryTerms};
