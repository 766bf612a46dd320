use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";
pub const GET_BLOCK_METHOD: &str = "condenser_api.get_block";

/// Outbound JSON-RPC 2.0 envelope. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonRpcRequest<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
    pub id: u32,
}

impl JsonRpcRequest<[i64; 1]> {
    pub const fn get_block(block_num: i64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: GET_BLOCK_METHOD,
            params: [block_num],
            id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: Option<String>,
    pub result: Option<T>,
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

pub type GetBlockResponse = JsonRpcResponse<SignedBlock>;

/// Block as returned by `condenser_api.get_block`. Only `transaction_ids` is
/// consumed by the backfill, the header is kept for logging and debugging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SignedBlock {
    pub previous: Option<String>,
    pub timestamp: Option<String>,
    pub witness: Option<String>,
    pub transaction_merkle_root: Option<String>,
    pub block_id: Option<String>,
    pub signing_key: Option<String>,
    pub witness_signature: Option<String>,
    pub extensions: Option<Vec<Value>>,
    pub transactions: Option<Vec<Value>>,
    pub transaction_ids: Option<Vec<String>>,
}

impl SignedBlock {
    pub fn transaction_ids(&self) -> &[String] {
        self.transaction_ids.as_deref().unwrap_or_default()
    }
}
