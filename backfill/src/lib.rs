mod error;
mod fetcher;
mod gap;
mod store;
mod worker;

#[cfg(test)]
mod testing;

pub use error::BackfillError;
pub use fetcher::{trx_id_records, BlockFetcher, FetchError, FetchOutcome, NonSuccessPolicy};
pub use gap::{find_missing, GapScanArgs, SearchWindows};
pub use store::{DatabaseTrxIdStore, TrxIdStore, MAX_INSERT_BATCH_SIZE};
pub use worker::{BackfillReport, BatchCoordinator, BatchWorkerArgs};

use anyhow::Result;
use clap::Parser;
use hive_core::{Metrics, PostgresPool, Rpc};
use indicatif::HumanDuration;
use log::info;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Clone)]
pub struct TrxFillContext {
    pub database_pool: sqlx::PgPool,
    pub hive_rpc: Rpc,
    pub metrics: Metrics,
}

impl TrxFillContext {
    pub const fn new(database_pool: sqlx::PgPool, hive_rpc: Rpc, metrics: Metrics) -> Self {
        Self {
            database_pool,
            hive_rpc,
            metrics,
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct TrxFillArgs {
    #[clap(flatten)]
    pub gap_scan: GapScanArgs,

    #[clap(flatten)]
    pub batch_worker: BatchWorkerArgs,
}

/// Scans the store for block numbers below its latest one that have no rows
/// and fetches them from the node.
pub async fn fill_missing<S, F>(
    store: S,
    fetcher: Arc<F>,
    metrics: Metrics,
    args: &TrxFillArgs,
) -> Result<BackfillReport, BackfillError>
where
    S: TrxIdStore,
    F: BlockFetcher,
{
    let started = Instant::now();

    let latest = store.latest_block_num().await?;

    info!("Last block: {}", latest);

    let missing = find_missing(&store, latest, args.gap_scan.search_step).await?;

    info!(
        "found {} missing blocks below {} in {}",
        missing.len(),
        latest,
        HumanDuration(started.elapsed())
    );

    metrics.count("block.missing", missing.len() as i64);

    let coordinator = BatchCoordinator::new(store, fetcher, metrics, args.batch_worker.clone());
    let report = coordinator.run(missing).await?;

    info!(
        "filled {} blocks ({} rows) over {} waves in {}, {} dropped, {} failed",
        report.fetched,
        report.inserted,
        report.waves,
        HumanDuration(started.elapsed()),
        report.dropped.len(),
        report.failed.len()
    );

    Ok(report)
}

pub async fn start_trx_fill(context: TrxFillContext, args: TrxFillArgs) -> Result<BackfillReport> {
    let TrxFillContext {
        database_pool,
        hive_rpc,
        metrics,
    } = context;

    let store = DatabaseTrxIdStore::new(PostgresPool::from(database_pool));

    let report = fill_missing(store, Arc::new(hive_rpc), metrics, &args).await?;

    Ok(report)
}

pub async fn find_missing_blocks(database_pool: sqlx::PgPool, args: &GapScanArgs) -> Result<Vec<i64>> {
    let store = DatabaseTrxIdStore::new(PostgresPool::from(database_pool));

    let latest = store.latest_block_num().await?;
    let missing = find_missing(&store, latest, args.search_step).await?;

    Ok(missing)
}
