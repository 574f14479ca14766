//! `review` command handlers: list pending candidates and approve or reject
//! price changes.

use std::sync::Arc;

use clap::Subcommand;
use feedsync_core::{AppConfig, MarkupRules};
use feedsync_db::PgStore;
use feedsync_matcher::Reconciler;

/// Sub-commands available under `review`.
#[derive(Debug, Subcommand)]
pub enum ReviewCommands {
    /// Show pending price changes and new product candidates
    List {
        /// Maximum number of rows per queue
        #[arg(long, default_value = "50")]
        limit: i64,
    },
    /// Apply a pending price change to the catalog
    Approve {
        /// Candidate id
        id: i64,
    },
    /// Mark a pending price change as rejected
    Reject {
        /// Candidate id
        id: i64,
    },
}

/// # Errors
///
/// Returns an error if the supplier config cannot be loaded or the review
/// action fails.
pub(crate) async fn run_review(
    pool: sqlx::PgPool,
    config: &AppConfig,
    command: ReviewCommands,
) -> anyhow::Result<()> {
    let suppliers = feedsync_core::load_suppliers(&config.suppliers_path)?;
    let store = Arc::new(PgStore::new(pool));
    let reconciler = Reconciler::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(MarkupRules::from_suppliers(&suppliers)),
        &config.matching,
    );

    match command {
        ReviewCommands::List { limit } => {
            let price_changes = reconciler.pending_price_changes(limit).await?;
            let new_products = reconciler.pending_new_products(limit).await?;
            let out = serde_json::json!({
                "price_changes": price_changes,
                "new_products": new_products,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        ReviewCommands::Approve { id } => {
            let approved = reconciler.approve_price_change(id).await?;
            tracing::info!(id, sku = %approved.candidate.sku, "price change approved");
            println!(
                "approved #{id}: {} {} -> {}",
                approved.candidate.sku,
                approved.candidate.current_price,
                approved.candidate.new_price
            );
        }
        ReviewCommands::Reject { id } => {
            let rejected = reconciler.reject_price_change(id).await?;
            tracing::info!(id, sku = %rejected.candidate.sku, "price change rejected");
            println!("rejected #{id}: {}", rejected.candidate.sku);
        }
    }

    Ok(())
}
