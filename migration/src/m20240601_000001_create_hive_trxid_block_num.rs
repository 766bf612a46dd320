use sea_orm_migration::prelude::*;

use crate::model::table::HiveTrxidBlockNum;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No primary key: a block owns one row per transaction id, or a
        // single row with a NULL id when it has none.
        manager
            .create_table(
                Table::create()
                    .table(HiveTrxidBlockNum::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HiveTrxidBlockNum::TrxId).string().null())
                    .col(
                        ColumnDef::new(HiveTrxidBlockNum::BlockNum)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_hive_trxid_block_num_block_num")
                    .col((HiveTrxidBlockNum::BlockNum, IndexOrder::Desc))
                    .table(HiveTrxidBlockNum::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_hive_trxid_block_num_block_num")
                    .table(HiveTrxidBlockNum::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(HiveTrxidBlockNum::Table).to_owned())
            .await
    }
}
