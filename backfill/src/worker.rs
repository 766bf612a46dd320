use crate::{
    error::BackfillError,
    fetcher::{BlockFetcher, FetchError, FetchOutcome, NonSuccessPolicy},
    store::TrxIdStore,
};
use backon::{BackoffBuilder, ExponentialBuilder};
use clap::Parser;
use hive_core::Metrics;
use hive_types::dao::hive_trxid_block_num;
use indicatif::HumanDuration;
use log::{debug, error, info, warn};
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};

#[derive(Debug, Clone, Parser)]
pub struct BatchWorkerArgs {
    /// Number of blocks fetched concurrently and flushed together.
    #[arg(long, env = "PROCESS_STEP", default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
    pub process_step: u64,

    /// Retry waves allowed after the first wave before giving up.
    #[arg(long, env, default_value = "10")]
    pub max_retry_waves: usize,

    /// Backoff before the first retry wave, in milliseconds.
    #[arg(long, env, default_value = "1000")]
    pub retry_min_delay: u64,

    /// Upper bound of the backoff between retry waves, in milliseconds.
    #[arg(long, env, default_value = "60000")]
    pub retry_max_delay: u64,

    /// How blocks answered with a non-2xx status are handled.
    #[arg(long, env, value_enum, default_value = "retry")]
    pub non_success_policy: NonSuccessPolicy,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub waves: usize,
    /// Blocks whose rows reached the store.
    pub fetched: usize,
    pub inserted: u64,
    /// Blocks given up on for this run without retry.
    pub dropped: Vec<i64>,
    /// Blocks still failing after the last retry wave.
    pub failed: Vec<i64>,
}

/// Results of the fetch tasks of one chunk. Fetch tasks only ever touch it
/// through the coordinator's mutex.
#[derive(Debug, Default)]
struct WaveAccumulator {
    pending: Vec<hive_trxid_block_num::Model>,
    pending_blocks: usize,
    retry: Vec<i64>,
    dropped: Vec<i64>,
}

impl WaveAccumulator {
    fn record(
        &mut self,
        block_num: i64,
        result: Result<FetchOutcome, FetchError>,
        policy: NonSuccessPolicy,
        metrics: &Metrics,
    ) {
        match result {
            Ok(FetchOutcome::Records(records)) => {
                metrics.increment("block.succeeded");
                self.pending_blocks += 1;
                self.pending.extend(records);
            }
            Ok(FetchOutcome::NotFound) => {
                warn!("block {} unknown to the node, dropping it", block_num);
                metrics.increment("block.dropped");
                self.dropped.push(block_num);
            }
            Err(e @ FetchError::Status(_)) if e.is_retryable(policy) => {
                warn!("block {} answered with {}, queued for retry", block_num, e);
                metrics.increment("block.failed");
                self.retry.push(block_num);
            }
            Err(e) if e.is_retryable(policy) => {
                error!("Error: {} {}", e, block_num);
                metrics.increment("block.failed");
                self.retry.push(block_num);
            }
            Err(e) => {
                warn!("dropping block {}: {}", block_num, e);
                metrics.increment("block.dropped");
                self.dropped.push(block_num);
            }
        }
    }
}

pub struct BatchCoordinator<S, F> {
    store: S,
    fetcher: Arc<F>,
    metrics: Metrics,
    args: BatchWorkerArgs,
    accumulator: Arc<Mutex<WaveAccumulator>>,
}

impl<S: TrxIdStore, F: BlockFetcher> BatchCoordinator<S, F> {
    pub fn new(store: S, fetcher: Arc<F>, metrics: Metrics, args: BatchWorkerArgs) -> Self {
        Self {
            store,
            fetcher,
            metrics,
            args,
            accumulator: Arc::new(Mutex::new(WaveAccumulator::default())),
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Fetches and stores every block of `missing`.
    ///
    /// Blocks are dispatched in chunks of `process_step`; each chunk is joined
    /// and flushed before the next one starts. Blocks that failed with a
    /// retryable error make up the next wave, after an exponential backoff,
    /// until none are left or `max_retry_waves` is used up. A storage failure
    /// stops the run.
    pub async fn run(&self, missing: Vec<i64>) -> Result<BackfillReport, BackfillError> {
        let process_step = usize::try_from(self.args.process_step)
            .ok()
            .filter(|step| *step > 0)
            .ok_or(BackfillError::InvalidProcessStep)?;

        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.args.retry_min_delay))
            .with_max_delay(Duration::from_millis(self.args.retry_max_delay))
            .with_max_times(self.args.max_retry_waves)
            .build();

        *self.accumulator.lock().await = WaveAccumulator::default();

        let mut report = BackfillReport::default();
        let mut input = missing;

        while !input.is_empty() {
            let timing = Instant::now();
            report.waves += 1;

            for chunk in input.chunks(process_step) {
                self.dispatch_chunk(chunk).await;

                self.flush(&mut report).await?;
            }

            let retry = {
                let mut accumulator = self.accumulator.lock().await;
                report.dropped.append(&mut accumulator.dropped);
                std::mem::take(&mut accumulator.retry)
            };

            self.metrics.time("wave.completed", timing.elapsed());
            debug!(
                "wave {} over {} blocks finished in {}",
                report.waves,
                input.len(),
                HumanDuration(timing.elapsed())
            );

            if retry.is_empty() {
                break;
            }

            match backoff.next() {
                Some(delay) => {
                    info!(
                        "Failed Tasks: {}, retrying in {}",
                        retry.len(),
                        HumanDuration(delay)
                    );
                    tokio::time::sleep(delay).await;
                    input = retry;
                }
                None => {
                    error!(
                        "{} blocks still failing after {} retry waves",
                        retry.len(),
                        self.args.max_retry_waves
                    );
                    report.failed = retry;
                    break;
                }
            }
        }

        report.dropped.sort_unstable();
        report.failed.sort_unstable();

        Ok(report)
    }

    /// Runs one fetch task per block and waits for all of them.
    async fn dispatch_chunk(&self, chunk: &[i64]) {
        let policy = self.args.non_success_policy;

        let (block_nums, handles): (Vec<_>, Vec<_>) = chunk
            .iter()
            .copied()
            .map(|block_num| {
                let fetcher = Arc::clone(&self.fetcher);
                let accumulator = Arc::clone(&self.accumulator);
                let metrics = self.metrics.clone();

                let handle = tokio::spawn(async move {
                    let timing = Instant::now();
                    let result = fetcher.fetch(block_num).await;

                    metrics.time("block.fetched", timing.elapsed());

                    accumulator
                        .lock()
                        .await
                        .record(block_num, result, policy, &metrics);
                });

                (block_num, handle)
            })
            .unzip();

        let joined = futures::future::join_all(handles).await;

        for (block_num, result) in block_nums.into_iter().zip(joined) {
            if let Err(e) = result {
                error!("fetch task for block {}: {:?}", block_num, e);
                self.metrics.increment("block.failed");
                self.accumulator.lock().await.retry.push(block_num);
            }
        }
    }

    async fn flush(&self, report: &mut BackfillReport) -> Result<(), BackfillError> {
        let (pending, pending_blocks) = {
            let mut accumulator = self.accumulator.lock().await;
            let pending_blocks = std::mem::take(&mut accumulator.pending_blocks);
            (std::mem::take(&mut accumulator.pending), pending_blocks)
        };

        if pending.is_empty() {
            return Ok(());
        }

        let timing = Instant::now();
        let first = pending
            .iter()
            .map(|row| row.block_num)
            .min()
            .unwrap_or_default();

        info!("insert from block num: {}", first);

        let inserted = self.store.bulk_insert(pending).await?;

        report.inserted += inserted;
        report.fetched += pending_blocks;

        self.metrics.count("rows.inserted", inserted as i64);
        self.metrics.time("chunk.flushed", timing.elapsed());

        Ok(())
    }
}
