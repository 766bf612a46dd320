use async_trait::async_trait;
use hive_core::DatabasePool;
use hive_types::dao::hive_trxid_block_num;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, TransactionTrait,
};
use std::collections::BTreeSet;

/// Upper bound on the rows carried by one physical INSERT.
pub const MAX_INSERT_BATCH_SIZE: usize = 1000;

#[async_trait]
pub trait TrxIdStore: Send + Sync {
    /// Highest stored block number, `0` when the table is empty.
    async fn latest_block_num(&self) -> Result<i64, DbErr>;

    /// Distinct block numbers with at least one row in `[lo, hi]`.
    async fn find_in_window(&self, lo: i64, hi: i64) -> Result<BTreeSet<i64>, DbErr>;

    /// Writes all records atomically and returns the number of rows inserted.
    async fn bulk_insert(&self, records: Vec<hive_trxid_block_num::Model>) -> Result<u64, DbErr>;
}

#[derive(Clone)]
pub struct DatabaseTrxIdStore<P: DatabasePool> {
    pool: P,
}

impl<P: DatabasePool> DatabaseTrxIdStore<P> {
    pub const fn new(pool: P) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromQueryResult)]
struct BlockNumRow {
    block_num: i64,
}

#[async_trait]
impl<P: DatabasePool> TrxIdStore for DatabaseTrxIdStore<P> {
    async fn latest_block_num(&self) -> Result<i64, DbErr> {
        let conn = self.pool.connection();

        let latest = hive_trxid_block_num::Entity::find()
            .order_by_desc(hive_trxid_block_num::Column::BlockNum)
            .one(&conn)
            .await?;

        Ok(latest.map_or(0, |row| row.block_num))
    }

    async fn find_in_window(&self, lo: i64, hi: i64) -> Result<BTreeSet<i64>, DbErr> {
        let conn = self.pool.connection();

        let rows = hive_trxid_block_num::Entity::find()
            .select_only()
            .column(hive_trxid_block_num::Column::BlockNum)
            .filter(hive_trxid_block_num::Column::BlockNum.between(lo, hi))
            .group_by(hive_trxid_block_num::Column::BlockNum)
            .into_model::<BlockNumRow>()
            .all(&conn)
            .await?;

        Ok(rows.into_iter().map(|row| row.block_num).collect())
    }

    // One transaction per flush: a block whose rows were only partly written
    // would look complete to the gap scan.
    async fn bulk_insert(&self, records: Vec<hive_trxid_block_num::Model>) -> Result<u64, DbErr> {
        if records.is_empty() {
            return Ok(0);
        }

        let conn = self.pool.connection();
        let backend = conn.get_database_backend();
        let txn = conn.begin().await?;

        let mut rows_affected = 0;

        for batch in records.chunks(MAX_INSERT_BATCH_SIZE) {
            let statement = hive_trxid_block_num::Entity::insert_many(
                batch
                    .iter()
                    .cloned()
                    .map(hive_trxid_block_num::ActiveModel::from),
            )
            .build(backend);

            rows_affected += txn.execute(statement).await?.rows_affected();
        }

        txn.commit().await?;

        Ok(rows_affected)
    }
}
