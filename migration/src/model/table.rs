use sea_orm_migration::prelude::*;

#[derive(Copy, Clone, Iden)]
pub enum HiveTrxidBlockNum {
    Table,
    TrxId,
    BlockNum,
}
