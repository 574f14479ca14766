mod reconcile;
mod review;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::reconcile::ReconcileArgs;
use crate::review::ReviewCommands;

#[derive(Debug, Parser)]
#[command(name = "feedsync")]
#[command(about = "Reconcile supplier feeds against the product catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Scan supplier feeds and queue catalog changes for review
    Reconcile(ReconcileArgs),
    /// Inspect and act on the review queues
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("feedsync: no command given, see --help");
        return Ok(());
    };

    let config = feedsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = feedsync_db::PoolConfig::from_app_config(&config);
    let pool = feedsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            feedsync_db::ping(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = feedsync_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Reconcile(args) => reconcile::run_reconcile(pool, &config, &args).await?,
        Commands::Review { command } => review::run_review(pool, &config, command).await?,
    }

    Ok(())
}
