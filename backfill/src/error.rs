#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    #[error("store: {0}")]
    Store(#[from] sea_orm::DbErr),
    #[error("search step must be at least 1, got {0}")]
    InvalidSearchStep(i64),
    #[error("process step must be at least 1")]
    InvalidProcessStep,
}
