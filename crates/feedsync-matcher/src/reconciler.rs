//! Per-batch reconciliation of one supplier feed against the catalog.

use std::collections::HashSet;
use std::sync::Arc;

use feedsync_core::{
    slugify, CatalogStore, MatchSettings, NewProductCandidate, NewProductStatus,
    PriceChangeStatus, QueuedNewProduct, QueuedPriceChange, RawSupplierRow, RecordError,
    RetailCalculator, ReviewQueue, SnapshotStore, StoreError, SupplierRecord,
};
use serde::Serialize;

use crate::delta::DeltaDetector;
use crate::discontinuation::find_discontinued;
use crate::error::{ReconcileError, ReviewError};
use crate::resolver::IdentityResolver;

/// Counts reported for one `reconcile` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub supplier: String,
    /// Rows received, valid or not.
    pub records: usize,
    pub matched: usize,
    pub new_candidates: usize,
    pub price_changes_queued: usize,
    /// Matched records whose stock differs from the catalog. Not applied.
    pub stock_deltas: usize,
    pub discontinued_count: usize,
    pub discontinued: Vec<String>,
    /// Rows skipped because of a per-row failure.
    pub errors: usize,
    /// Set when the snapshot could not be read or written. The
    /// discontinuation sweep is skipped in that case.
    pub snapshot_error: Option<String>,
}

enum RecordOutcome {
    Matched {
        price_change_queued: bool,
        stock_changed: bool,
    },
    NewCandidate,
}

pub struct Reconciler {
    catalog: Arc<dyn CatalogStore>,
    queue: Arc<dyn ReviewQueue>,
    snapshots: Arc<dyn SnapshotStore>,
    retail: Arc<dyn RetailCalculator>,
    resolver: IdentityResolver,
    delta: DeltaDetector,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        queue: Arc<dyn ReviewQueue>,
        snapshots: Arc<dyn SnapshotStore>,
        retail: Arc<dyn RetailCalculator>,
        settings: &MatchSettings,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(Arc::clone(&catalog), settings),
            delta: DeltaDetector::new(settings.price_change_threshold_pct),
            catalog,
            queue,
            snapshots,
            retail,
        }
    }

    /// Validate extracted rows and reconcile the valid ones. Rows that fail
    /// validation are logged and counted as errors.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::CatalogUnavailable`] if the catalog store
    /// cannot be reached.
    pub async fn reconcile_rows(
        &self,
        supplier_name: &str,
        rows: Vec<RawSupplierRow>,
    ) -> Result<ReconciliationSummary, ReconcileError> {
        let mut records = Vec::with_capacity(rows.len());
        let mut invalid = 0usize;
        for row in rows {
            match SupplierRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(supplier = %supplier_name, error = %e, "skipping invalid supplier row");
                    invalid += 1;
                }
            }
        }

        let mut summary = self.reconcile(supplier_name, records).await?;
        summary.records += invalid;
        summary.errors += invalid;
        Ok(summary)
    }

    /// Resolve every record, queue price changes and new products, refresh
    /// the supplier snapshot, and report SKUs that disappeared from the feed.
    ///
    /// Records are processed in order. A record that fails is logged,
    /// counted, and skipped; the batch continues.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::CatalogUnavailable`] if the catalog store
    /// cannot be reached. No other failure aborts the batch.
    pub async fn reconcile(
        &self,
        supplier_name: &str,
        records: Vec<SupplierRecord>,
    ) -> Result<ReconciliationSummary, ReconcileError> {
        let supplier_id = slugify(supplier_name);
        let mut summary = ReconciliationSummary {
            supplier: supplier_name.to_string(),
            records: records.len(),
            ..ReconciliationSummary::default()
        };

        let known = match self.snapshots.known_skus(supplier_name).await {
            Ok(known) => Some(known),
            Err(e) => {
                tracing::warn!(supplier = %supplier_name, error = %e, "failed to read supplier snapshot");
                summary.snapshot_error = Some(e.to_string());
                None
            }
        };

        let mut feed_skus: HashSet<String> = HashSet::with_capacity(records.len());

        for record in &records {
            if let Err(e) = record.validate() {
                tracing::warn!(supplier = %supplier_name, error = %e, "skipping invalid supplier record");
                summary.errors += 1;
                continue;
            }
            feed_skus.insert(record.sku.clone());

            match self.process_record(supplier_name, &supplier_id, record).await {
                Ok(RecordOutcome::Matched {
                    price_change_queued,
                    stock_changed,
                }) => {
                    summary.matched += 1;
                    summary.price_changes_queued += usize::from(price_change_queued);
                    summary.stock_deltas += usize::from(stock_changed);
                }
                Ok(RecordOutcome::NewCandidate) => summary.new_candidates += 1,
                Err(RecordError::Lookup { sku, source }) if source.is_unavailable() => {
                    return Err(ReconcileError::CatalogUnavailable { sku, source });
                }
                Err(e) => {
                    tracing::warn!(
                        supplier = %supplier_name,
                        sku = %record.sku,
                        name = record.name.as_deref().unwrap_or(""),
                        error = %e,
                        "skipping supplier record"
                    );
                    summary.errors += 1;
                }
            }

            if summary.snapshot_error.is_none() {
                if let Err(e) = self.snapshots.upsert_entry(supplier_name, record).await {
                    tracing::warn!(
                        supplier = %supplier_name,
                        sku = %record.sku,
                        error = %e,
                        "failed to update supplier snapshot"
                    );
                    summary.snapshot_error = Some(e.to_string());
                }
            }
        }

        match known {
            Some(known) if summary.snapshot_error.is_none() => {
                let gone = find_discontinued(supplier_name, &known, &feed_skus);
                summary.discontinued_count = gone.len();
                summary.discontinued = gone.into_iter().collect();
            }
            _ => {
                tracing::warn!(supplier = %supplier_name, "discontinuation sweep skipped");
            }
        }

        tracing::info!(
            supplier = %supplier_name,
            records = summary.records,
            matched = summary.matched,
            new_candidates = summary.new_candidates,
            price_changes_queued = summary.price_changes_queued,
            stock_deltas = summary.stock_deltas,
            discontinued = summary.discontinued_count,
            errors = summary.errors,
            "reconciliation complete"
        );
        Ok(summary)
    }

    async fn process_record(
        &self,
        supplier_name: &str,
        supplier_id: &str,
        record: &SupplierRecord,
    ) -> Result<RecordOutcome, RecordError> {
        let resolved =
            self.resolver
                .resolve(record)
                .await
                .map_err(|source| RecordError::Lookup {
                    sku: record.sku.clone(),
                    source,
                })?;

        let Some(product) = resolved.product else {
            let candidate = NewProductCandidate {
                supplier_name: supplier_name.to_string(),
                sku: record.sku.clone(),
                name: record.name.clone(),
                cost_price: record.price,
                stock_level: record.stock,
                status: NewProductStatus::Pending,
            };
            let id = self
                .queue
                .insert_new_product(&candidate)
                .await
                .map_err(|source| enqueue_error(record, source))?;
            tracing::debug!(supplier = %supplier_name, sku = %record.sku, id, "queued new product");
            return Ok(RecordOutcome::NewCandidate);
        };

        tracing::debug!(
            sku = %record.sku,
            product_id = product.id,
            match_type = %resolved.match_type,
            confidence = resolved.confidence,
            "resolved supplier record"
        );

        let delta = self
            .delta
            .detect(&product, record, supplier_id, self.retail.as_ref())?;

        let stock_changed = match delta.stock {
            Some(stock) if stock.is_change() => {
                tracing::info!(
                    supplier = %supplier_name,
                    sku = %record.sku,
                    product_id = product.id,
                    current = stock.current,
                    incoming = stock.incoming,
                    delta = stock.delta,
                    "stock level differs from catalog (not applied)"
                );
                true
            }
            _ => false,
        };

        let price_change_queued = match &delta.price_change {
            Some(candidate) => {
                let id = self
                    .queue
                    .insert_price_change(candidate)
                    .await
                    .map_err(|source| enqueue_error(record, source))?;
                tracing::info!(
                    supplier = %supplier_name,
                    sku = %record.sku,
                    id,
                    change_pct = %candidate.change_pct,
                    "queued price change for review"
                );
                true
            }
            None => false,
        };

        Ok(RecordOutcome::Matched {
            price_change_queued,
            stock_changed,
        })
    }

    // -----------------------------------------------------------------------
    // Review actions
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns [`StoreError`] if the queue cannot be read.
    pub async fn pending_price_changes(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedPriceChange>, StoreError> {
        self.queue.list_pending_price_changes(limit).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the queue cannot be read.
    pub async fn pending_new_products(
        &self,
        limit: i64,
    ) -> Result<Vec<QueuedNewProduct>, StoreError> {
        self.queue.list_pending_new_products(limit).await
    }

    /// Mark the candidate approved, then write its retail price to the
    /// catalog.
    ///
    /// The status is claimed before the catalog is touched, so a concurrent
    /// reject wins cleanly. A failed catalog write moves the candidate back
    /// to `pending`.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] if the candidate is missing or not pending,
    /// if its product no longer exists, or if a store call fails.
    pub async fn approve_price_change(&self, id: i64) -> Result<QueuedPriceChange, ReviewError> {
        let mut queued = self.pending_price_change(id).await?;
        let product_id = queued.candidate.product_id;

        if self.catalog.get_product(product_id).await?.is_none() {
            return Err(ReviewError::ProductMissing(product_id));
        }
        self.transition(id, PriceChangeStatus::Approved).await?;

        if let Err(e) = self
            .catalog
            .update_price(product_id, queued.candidate.new_price)
            .await
        {
            match self.queue.reopen_price_change(id).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::error!(id, "approved price change could not be reopened");
                }
                Err(reopen) => {
                    tracing::error!(id, error = %reopen, "failed to reopen price change");
                }
            }
            return Err(e.into());
        }

        tracing::info!(
            id,
            product_id,
            new_price = %queued.candidate.new_price,
            "price change approved"
        );
        queued.candidate.status = PriceChangeStatus::Approved;
        Ok(queued)
    }

    /// Mark the candidate rejected. The catalog is not touched.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError`] if the candidate is missing or not pending, or
    /// if a store call fails.
    pub async fn reject_price_change(&self, id: i64) -> Result<QueuedPriceChange, ReviewError> {
        let mut queued = self.pending_price_change(id).await?;
        self.transition(id, PriceChangeStatus::Rejected).await?;

        tracing::info!(id, product_id = queued.candidate.product_id, "price change rejected");
        queued.candidate.status = PriceChangeStatus::Rejected;
        Ok(queued)
    }

    async fn pending_price_change(&self, id: i64) -> Result<QueuedPriceChange, ReviewError> {
        let queued = self
            .queue
            .get_price_change(id)
            .await?
            .ok_or(ReviewError::NotFound(id))?;
        if queued.candidate.status != PriceChangeStatus::Pending {
            return Err(ReviewError::NotPending {
                id,
                status: queued.candidate.status,
            });
        }
        Ok(queued)
    }

    async fn transition(&self, id: i64, status: PriceChangeStatus) -> Result<(), ReviewError> {
        if self.queue.set_price_change_status(id, status).await? {
            return Ok(());
        }
        // Another reviewer got there first.
        match self.queue.get_price_change(id).await? {
            Some(current) => Err(ReviewError::NotPending {
                id,
                status: current.candidate.status,
            }),
            None => Err(ReviewError::NotFound(id)),
        }
    }
}

fn enqueue_error(record: &SupplierRecord, source: StoreError) -> RecordError {
    RecordError::Enqueue {
        sku: record.sku.clone(),
        source,
    }
}
