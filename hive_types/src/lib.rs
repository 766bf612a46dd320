pub mod dao;
pub mod rpc;
