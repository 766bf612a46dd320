//! In-memory stand-ins for the store and the RPC node.

use crate::{
    fetcher::{BlockFetcher, FetchError, FetchOutcome},
    store::TrxIdStore,
};
use async_trait::async_trait;
use hive_types::dao::hive_trxid_block_num;
use sea_orm::DbErr;
use std::{
    collections::{BTreeSet, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<hive_trxid_block_num::Model>>,
    writes: Mutex<Vec<Vec<hive_trxid_block_num::Model>>>,
    window_lookups: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with_blocks(block_nums: &[i64]) -> Self {
        let rows = block_nums
            .iter()
            .map(|block_num| {
                hive_trxid_block_num::Model::new(Some(format!("{:040x}", block_num)), *block_num)
            })
            .collect();

        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn window_lookups(&self) -> usize {
        self.window_lookups.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<Vec<hive_trxid_block_num::Model>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn block_nums(&self) -> BTreeSet<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .map(|row| row.block_num)
            .collect()
    }
}

#[async_trait]
impl TrxIdStore for MemoryStore {
    async fn latest_block_num(&self) -> Result<i64, DbErr> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|row| row.block_num)
            .max()
            .unwrap_or(0))
    }

    async fn find_in_window(&self, lo: i64, hi: i64) -> Result<BTreeSet<i64>, DbErr> {
        self.window_lookups.fetch_add(1, Ordering::SeqCst);

        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|row| row.block_num)
            .filter(|block_num| (lo..=hi).contains(block_num))
            .collect())
    }

    async fn bulk_insert(&self, records: Vec<hive_trxid_block_num::Model>) -> Result<u64, DbErr> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("disk full".to_string()));
        }

        let inserted = records.len() as u64;

        self.rows.lock().unwrap().extend(records.iter().cloned());
        self.writes.lock().unwrap().push(records);

        Ok(inserted)
    }
}

/// Answers every block as empty unless told otherwise.
#[derive(Default)]
pub struct ScriptedFetcher {
    blocks: HashMap<i64, Vec<String>>,
    transport_failures: Mutex<HashMap<i64, usize>>,
    panics: Mutex<HashMap<i64, usize>>,
    status_failures: HashSet<i64>,
    request_failures: HashSet<i64>,
    not_found: HashSet<i64>,
    calls: Mutex<Vec<i64>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    latency: Duration,
}

impl ScriptedFetcher {
    pub fn with_block(mut self, block_num: i64, trx_ids: &[&str]) -> Self {
        self.blocks.insert(
            block_num,
            trx_ids.iter().map(|trx_id| trx_id.to_string()).collect(),
        );
        self
    }

    /// The first `times` fetches of `block_num` fail at the transport level.
    pub fn failing(self, block_num: i64, times: usize) -> Self {
        self.transport_failures
            .lock()
            .unwrap()
            .insert(block_num, times);
        self
    }

    /// The first `times` fetches of `block_num` panic inside the fetch task.
    pub fn panicking(self, block_num: i64, times: usize) -> Self {
        self.panics.lock().unwrap().insert(block_num, times);
        self
    }

    /// Every fetch holds its slot for at least `latency`.
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_request_failure(mut self, block_num: i64) -> Self {
        self.request_failures.insert(block_num);
        self
    }

    pub fn with_status_failure(mut self, block_num: i64) -> Self {
        self.status_failures.insert(block_num);
        self
    }

    pub fn not_found(mut self, block_num: i64) -> Self {
        self.not_found.insert(block_num);
        self
    }

    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn answer(&self, block_num: i64) -> Result<FetchOutcome, FetchError> {
        {
            let mut failures = self.transport_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(&block_num) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::Transport("connection reset by peer".into()));
                }
            }
        }

        if self.request_failures.contains(&block_num) {
            return Err(FetchError::Request("relative URL without a base".into()));
        }

        if self.status_failures.contains(&block_num) {
            return Err(FetchError::Status(503));
        }

        if self.not_found.contains(&block_num) {
            return Ok(FetchOutcome::NotFound);
        }

        let records = match self.blocks.get(&block_num) {
            Some(trx_ids) if !trx_ids.is_empty() => trx_ids
                .iter()
                .map(|trx_id| hive_trxid_block_num::Model::new(Some(trx_id.clone()), block_num))
                .collect(),
            _ => vec![hive_trxid_block_num::Model::empty_block(block_num)],
        };

        Ok(FetchOutcome::Records(records))
    }
}

#[async_trait]
impl BlockFetcher for ScriptedFetcher {
    async fn fetch(&self, block_num: i64) -> Result<FetchOutcome, FetchError> {
        self.calls.lock().unwrap().push(block_num);

        let panics = {
            let mut panics = self.panics.lock().unwrap();
            match panics.get_mut(&block_num) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };

        if panics {
            panic!("fetch of block {} blew up", block_num);
        }

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // Shuffle completion order inside a chunk.
        let delay = 5 - block_num.rem_euclid(5) as u64;
        tokio::time::sleep(self.latency + Duration::from_millis(delay)).await;

        let answer = self.answer(block_num);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        answer
    }
}
