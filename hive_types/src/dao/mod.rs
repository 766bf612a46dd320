pub mod hive_trxid_block_num;

pub mod prelude {
    pub use super::hive_trxid_block_num::Entity as HiveTrxidBlockNum;
}
