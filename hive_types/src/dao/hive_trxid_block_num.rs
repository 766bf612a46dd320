//! `hive_trxid_block_num` maps every transaction id of the chain to the block
//! that carries it. Blocks without transactions are stored as a single row with
//! a NULL `trx_id`, so each backfilled block number has at least one row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Default, Debug, DeriveEntity)]
pub struct Entity;

impl EntityName for Entity {
    fn table_name(&self) -> &str {
        "hive_trxid_block_num"
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveModel, DeriveActiveModel, Serialize, Deserialize)]
pub struct Model {
    pub trx_id: Option<String>,
    pub block_num: i64,
}

impl Model {
    pub const fn new(trx_id: Option<String>, block_num: i64) -> Self {
        Self { trx_id, block_num }
    }

    /// The row written for a block that carries no transactions.
    pub const fn empty_block(block_num: i64) -> Self {
        Self::new(None, block_num)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveColumn)]
pub enum Column {
    TrxId,
    BlockNum,
}

// The table has no primary key; block_num is the lookup key for every query
// the backfill issues, so sea-orm is told to treat it as one.
#[derive(Copy, Clone, Debug, EnumIter, DerivePrimaryKey)]
pub enum PrimaryKey {
    BlockNum,
}

impl PrimaryKeyTrait for PrimaryKey {
    type ValueType = i64;
    fn auto_increment() -> bool {
        false
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl ColumnTrait for Column {
    type EntityName = Entity;
    fn def(&self) -> ColumnDef {
        match self {
            Self::TrxId => ColumnType::String(None).def().null(),
            Self::BlockNum => ColumnType::BigInteger.def(),
        }
    }
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        panic!("No RelationDef")
    }
}

impl ActiveModelBehavior for ActiveModel {}
