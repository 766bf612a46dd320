mod db;
mod hive_rpc;
mod metrics;

pub use db::*;
pub use hive_rpc::*;
pub use metrics::*;
