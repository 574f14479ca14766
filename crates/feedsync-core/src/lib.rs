pub mod app_config;
pub mod config;
pub mod error;
pub mod normalize;
pub mod pricing;
pub mod settings;
pub mod store;
pub mod suppliers;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RecordError, RetailCalcError, ScanError, StoreError};
pub use normalize::{model_variants, normalize, normalize_keeping_case, strip_dashes};
pub use pricing::MarkupRules;
pub use settings::MatchSettings;
pub use store::{CatalogStore, RetailCalculator, ReviewQueue, SnapshotStore, SupplierScanner};
pub use suppliers::{load_suppliers, slugify, SupplierConfig, SuppliersFile};
pub use types::{
    CatalogProduct, MatchResult, MatchType, NameQuery, NewProductCandidate, NewProductStatus,
    PriceChangeCandidate, PriceChangeStatus, QueuedNewProduct, QueuedPriceChange, RawSupplierRow,
    StockDelta, SupplierRecord,
};
