use clap::Parser;
use hive_types::rpc::{GetBlockResponse, JsonRpcError, JsonRpcRequest, SignedBlock};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode, Url};
use std::time::Duration;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Clone, Parser, Debug)]
pub struct HiveRpcArgs {
    /// The Hive JSON-RPC endpoint.
    #[arg(long, env = "API_URL")]
    pub api_url: String,
    /// The request timeout in milliseconds
    #[arg(long, env, default_value = "10000")]
    pub hive_rpc_request_timeout: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum HiveRpcError {
    #[error("url parse: {0}")]
    Url(#[from] url::ParseError),
    #[error("reqwest client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("encode request for block {block_num}: {source}")]
    Encode {
        source: serde_json::Error,
        block_num: i64,
    },
    #[error("transport for block {block_num}: {source}")]
    Transport {
        source: reqwest::Error,
        block_num: i64,
    },
    #[error("response {status} for block {block_num}")]
    Status { status: StatusCode, block_num: i64 },
    #[error("json-rpc error for block {block_num}: {error}")]
    Rpc { error: JsonRpcError, block_num: i64 },
    #[error("json parse for block {block_num} with {source}")]
    Decode {
        source: serde_json::Error,
        block_num: i64,
    },
}

#[derive(Clone, Debug)]
pub struct Rpc {
    client: Client,
    url: Url,
}

impl Rpc {
    pub fn try_from_config(config: &HiveRpcArgs) -> Result<Self, HiveRpcError> {
        let url = Url::parse(&config.api_url)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.hive_rpc_request_timeout))
            .build()
            .map_err(HiveRpcError::Client)?;

        Ok(Self { client, url })
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Calls `condenser_api.get_block`. Returns `Ok(None)` when the node
    /// answers with a null result, which it does for blocks it does not have.
    pub async fn get_block(&self, block_num: i64) -> Result<Option<SignedBlock>, HiveRpcError> {
        let body = serde_json::to_vec(&JsonRpcRequest::get_block(block_num))
            .map_err(|source| HiveRpcError::Encode { source, block_num })?;

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|source| HiveRpcError::Transport { source, block_num })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HiveRpcError::Status { status, block_num });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| HiveRpcError::Transport { source, block_num })?;

        let response: GetBlockResponse = serde_json::from_slice(&bytes)
            .map_err(|source| HiveRpcError::Decode { source, block_num })?;

        if let Some(error) = response.error {
            return Err(HiveRpcError::Rpc { error, block_num });
        }

        Ok(response.result)
    }
}
