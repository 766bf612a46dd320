use anyhow::Result;
use clap::Parser;
use hive_backfill::{find_missing_blocks, GapScanArgs};
use hive_core::{connect_db, PoolArgs};
use log::debug;
use tokio::io::{stdout, AsyncWriteExt};

#[derive(Debug, Parser, Clone)]
pub struct Args {
    /// Database configuration
    #[clap(flatten)]
    pub database: PoolArgs,

    #[clap(flatten)]
    pub gap_scan: GapScanArgs,
}

pub async fn run(config: Args) -> Result<()> {
    let pool = connect_db(&config.database).await?;

    let missing = find_missing_blocks(pool, &config.gap_scan).await?;

    debug!("{} missing blocks", missing.len());

    let mut output = stdout();

    for block_num in missing {
        output.write_all(format!("{}\n", block_num).as_bytes()).await?;
    }

    output.flush().await?;

    Ok(())
}
