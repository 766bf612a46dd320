use anyhow::{bail, Result};
use clap::Parser;
use hive_backfill::{start_trx_fill, TrxFillArgs, TrxFillContext};
use hive_core::{connect_db, HiveRpcArgs, Metrics, MetricsArgs, PoolArgs, Rpc};
use indicatif::HumanDuration;
use log::{error, info, warn};
use tokio::time::Instant;

#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    pub trx_fill: TrxFillArgs,

    /// Database configuration
    #[clap(flatten)]
    pub database: PoolArgs,

    /// Metrics configuration
    #[clap(flatten)]
    pub metrics: MetricsArgs,

    /// Hive node configuration
    #[clap(flatten)]
    pub hive: HiveRpcArgs,
}

/// Fills the gaps of `hive_trxid_block_num` from the configured node.
///
/// Fails when the store or the node can't be reached, when a write fails, or
/// when some blocks could still not be fetched after the last retry wave.
pub async fn run(config: Args) -> Result<()> {
    let started = Instant::now();

    let database_pool = connect_db(&config.database).await?;
    let hive_rpc = Rpc::try_from_config(&config.hive)?;
    let metrics = Metrics::try_from_config(&config.metrics)?;

    let context = TrxFillContext::new(database_pool, hive_rpc, metrics.clone());

    let report = start_trx_fill(context, config.trx_fill).await?;

    metrics.time("job.completed", started.elapsed());

    if !report.dropped.is_empty() {
        warn!("dropped blocks: {:?}", report.dropped);
    }

    if !report.failed.is_empty() {
        error!("failed blocks: {:?}", report.failed);

        bail!(
            "{} blocks could not be fetched after {} waves",
            report.failed.len(),
            report.waves
        );
    }

    info!("Done in {}", HumanDuration(started.elapsed()));

    Ok(())
}
