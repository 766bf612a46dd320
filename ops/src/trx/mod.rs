pub mod audit;
pub mod backfiller;
