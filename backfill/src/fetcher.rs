use async_trait::async_trait;
use clap::ValueEnum;
use hive_core::{HiveRpcError, Rpc};
use hive_types::{dao::hive_trxid_block_num, rpc::JsonRpcError, rpc::SignedBlock};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Rows for the block, at least one.
    Records(Vec<hive_trxid_block_num::Model>),
    /// The node answered with a null block.
    NotFound,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(#[source] BoxError),
    #[error("non-success status {0}")]
    Status(u16),
    #[error("json-rpc: {0}")]
    Rpc(JsonRpcError),
    #[error("decode: {0}")]
    Decode(#[source] BoxError),
    #[error("request: {0}")]
    Request(#[source] BoxError),
}

impl From<HiveRpcError> for FetchError {
    fn from(error: HiveRpcError) -> Self {
        match error {
            HiveRpcError::Transport { source, .. } => Self::Transport(source.into()),
            HiveRpcError::Status { status, .. } => Self::Status(status.as_u16()),
            HiveRpcError::Rpc { error, .. } => Self::Rpc(error),
            HiveRpcError::Decode { source, .. } => Self::Decode(source.into()),
            other => Self::Request(other.into()),
        }
    }
}

/// What to do with a block whose request came back with a non-2xx status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NonSuccessPolicy {
    /// Queue the block for the next wave, like a transport failure.
    Retry,
    /// Give up on the block for this run and list it in the report.
    Drop,
}

impl FetchError {
    /// A request that could not even be built fails the same way every time,
    /// so it is never retried.
    pub const fn is_retryable(&self, policy: NonSuccessPolicy) -> bool {
        match self {
            Self::Status(_) => matches!(policy, NonSuccessPolicy::Retry),
            Self::Request(_) => false,
            Self::Transport(_) | Self::Rpc(_) | Self::Decode(_) => true,
        }
    }
}

#[async_trait]
pub trait BlockFetcher: Send + Sync + 'static {
    async fn fetch(&self, block_num: i64) -> Result<FetchOutcome, FetchError>;
}

/// One row per transaction id, or a single NULL row for an empty block.
pub fn trx_id_records(block_num: i64, block: &SignedBlock) -> Vec<hive_trxid_block_num::Model> {
    let trx_ids = block.transaction_ids();

    if trx_ids.is_empty() {
        return vec![hive_trxid_block_num::Model::empty_block(block_num)];
    }

    trx_ids
        .iter()
        .map(|trx_id| hive_trxid_block_num::Model::new(Some(trx_id.clone()), block_num))
        .collect()
}

#[async_trait]
impl BlockFetcher for Rpc {
    async fn fetch(&self, block_num: i64) -> Result<FetchOutcome, FetchError> {
        let outcome = match self.get_block(block_num).await? {
            Some(block) => FetchOutcome::Records(trx_id_records(block_num, &block)),
            None => FetchOutcome::NotFound,
        };

        Ok(outcome)
    }
}
