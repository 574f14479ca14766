use futures::stream::{self, StreamExt};

use crate::error::SupplierRunError;
use crate::reconciler::{ReconciliationSummary, Reconciler};
use crate::registry::ScannerRegistry;

/// Result of scanning and reconciling one registered supplier.
#[derive(Debug)]
pub struct SupplierRunOutcome {
    pub supplier: String,
    pub result: Result<ReconciliationSummary, SupplierRunError>,
}

async fn run_supplier(
    reconciler: &Reconciler,
    registry: &ScannerRegistry,
    supplier: &str,
) -> Result<ReconciliationSummary, SupplierRunError> {
    let scanner = registry.get(supplier)?;
    let rows = scanner.run_scan().await?;
    tracing::info!(supplier = %supplier, rows = rows.len(), "supplier feed scanned");
    Ok(reconciler.reconcile_rows(supplier, rows).await?)
}

/// Scan and reconcile every registered supplier, at most `max_concurrent` at
/// a time. Records within one supplier are still processed sequentially.
///
/// A failing supplier is logged and reported in its outcome; the others run
/// to completion. Outcomes are returned in supplier-name order.
pub async fn run_registered_suppliers(
    reconciler: &Reconciler,
    registry: &ScannerRegistry,
    max_concurrent: usize,
) -> Vec<SupplierRunOutcome> {
    let suppliers: Vec<String> = registry.suppliers().map(str::to_string).collect();
    let supplier_count = suppliers.len();

    let mut outcomes: Vec<SupplierRunOutcome> = stream::iter(suppliers)
        .map(|supplier| async move {
            let result = run_supplier(reconciler, registry, &supplier).await;
            SupplierRunOutcome { supplier, result }
        })
        .buffer_unordered(max_concurrent.max(1))
        .collect()
        .await;
    outcomes.sort_by(|a, b| a.supplier.cmp(&b.supplier));

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in &outcomes {
        if let Err(e) = &outcome.result {
            tracing::error!(supplier = %outcome.supplier, error = %e, "supplier run failed");
        }
    }
    if failed > 0 {
        tracing::warn!(
            failed_suppliers = failed,
            total_suppliers = supplier_count,
            "some suppliers failed during reconciliation"
        );
    }

    outcomes
}
