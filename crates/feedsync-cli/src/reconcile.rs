//! `reconcile` command handler.
//!
//! Builds the scanner registry from the supplier file, wires the Postgres
//! stores into a [`Reconciler`], and prints one JSON summary per supplier.
//! A failing supplier is reported but does not stop the others.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use feedsync_core::{
    AppConfig, CatalogStore, MarkupRules, ReviewQueue, SnapshotStore, SuppliersFile,
};
use feedsync_db::PgStore;
use feedsync_matcher::{
    run_registered_suppliers, InMemoryReviewQueue, InMemorySnapshotStore, JsonFeedScanner,
    Reconciler, ScannerRegistry,
};

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Reconcile a single supplier (by name or slug)
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub supplier: Option<String>,

    /// Reconcile every supplier with a configured feed
    #[arg(long)]
    pub all: bool,

    /// Read the feed from this file instead of the configured `feed_path`
    #[arg(long, requires = "supplier")]
    pub file: Option<PathBuf>,

    /// Match and classify without writing review rows or snapshots
    #[arg(long)]
    pub dry_run: bool,
}

/// Build the registry for this invocation.
///
/// # Errors
///
/// Returns an error if the named supplier is not configured or has neither a
/// `feed_path` nor an explicit `--file`.
pub(crate) fn build_registry(
    suppliers: &SuppliersFile,
    base_dir: &Path,
    args: &ReconcileArgs,
) -> anyhow::Result<ScannerRegistry> {
    let Some(name) = args.supplier.as_deref() else {
        return Ok(ScannerRegistry::from_suppliers(suppliers, base_dir));
    };

    let supplier = suppliers
        .find(name)
        .ok_or_else(|| anyhow::anyhow!("supplier '{name}' not found in supplier config"))?;

    let feed = match (&args.file, &supplier.feed_path) {
        (Some(file), _) => file.clone(),
        (None, Some(path)) => base_dir.join(path),
        (None, None) => anyhow::bail!(
            "supplier '{}' has no feed_path configured; pass --file",
            supplier.name
        ),
    };

    let mut registry = ScannerRegistry::new();
    registry.register(&supplier.name, JsonFeedScanner::new(feed));
    Ok(registry)
}

/// Run reconciliation for the selected suppliers.
///
/// With `--dry-run` the catalog is still read from Postgres, but candidates
/// and snapshot updates go to in-memory stores seeded with the stored SKUs.
///
/// # Errors
///
/// Returns an error if the supplier config cannot be loaded, the registry
/// cannot be built, a dry-run snapshot cannot be seeded, or every supplier
/// failed.
pub(crate) async fn run_reconcile(
    pool: sqlx::PgPool,
    config: &AppConfig,
    args: &ReconcileArgs,
) -> anyhow::Result<()> {
    let suppliers = feedsync_core::load_suppliers(&config.suppliers_path)?;
    let base_dir = config
        .suppliers_path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let registry = build_registry(&suppliers, &base_dir, args)?;

    if registry.is_empty() {
        println!("no suppliers with a feed to reconcile");
        return Ok(());
    }

    let store = Arc::new(PgStore::new(pool));
    let catalog: Arc<dyn CatalogStore> = store.clone();
    let queue: Arc<dyn ReviewQueue>;
    let snapshots: Arc<dyn SnapshotStore>;
    if args.dry_run {
        let seeded = InMemorySnapshotStore::new();
        for supplier in registry.suppliers() {
            let known = store.known_skus(supplier).await?;
            seeded.seed(supplier, known)?;
        }
        queue = Arc::new(InMemoryReviewQueue::new());
        snapshots = Arc::new(seeded);
    } else {
        queue = store.clone();
        snapshots = store;
    }

    let reconciler = Reconciler::new(
        catalog,
        queue,
        snapshots,
        Arc::new(MarkupRules::from_suppliers(&suppliers)),
        &config.matching,
    );

    let outcomes =
        run_registered_suppliers(&reconciler, &registry, config.max_concurrent_suppliers).await;

    let mut failed = 0_usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => println!("{}", serde_json::to_string_pretty(summary)?),
            Err(e) => {
                failed += 1;
                eprintln!("error: {}: {e}", outcome.supplier);
            }
        }
    }

    if args.dry_run {
        println!("dry-run: no review rows or snapshots were written");
    }

    if failed == outcomes.len() {
        anyhow::bail!("reconciliation failed for all {failed} supplier(s)");
    }
    Ok(())
}
