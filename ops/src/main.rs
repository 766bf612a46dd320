mod trx;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(author, version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetches every block below the latest stored one that has no rows and
    /// records its transaction ids.
    #[clap(name = "fill_trx_data")]
    FillTrxData(trx::backfiller::Args),
    /// Prints the block numbers `fill_trx_data` would fetch.
    #[clap(name = "find_missing")]
    FindMissing(trx::audit::Args),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();
    match args.command {
        Command::FillTrxData(args) => trx::backfiller::run(args).await?,
        Command::FindMissing(args) => trx::audit::run(args).await?,
    }

    Ok(())
}
