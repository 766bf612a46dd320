use std::sync::Arc;

use clap::Parser;
use sea_orm::{DatabaseConnection, MockDatabase, MockDatabaseConnection, SqlxPostgresConnector};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

#[derive(Debug, Parser, Clone)]
pub struct PoolArgs {
    /// The Postgres connection string.
    #[arg(long, env = "PG_DSN")]
    pub pg_dsn: String,
    /// The maximum number of connections to the database.
    #[arg(long, env, default_value = "10")]
    pub database_max_connections: u32,
    /// The minimum number of connections to the database.
    #[arg(long, env, default_value = "1")]
    pub database_min_connections: u32,
}

/// Establishes a connection pool to the database. Both a malformed DSN and an
/// unreachable server surface as `sqlx::Error`.
pub async fn connect_db(config: &PoolArgs) -> Result<PgPool, sqlx::Error> {
    let options: PgConnectOptions = config.pg_dsn.parse()?;

    PgPoolOptions::new()
        .min_connections(config.database_min_connections)
        .max_connections(config.database_max_connections)
        .connect_with(options)
        .await
}

pub trait DatabasePool: Clone + Send + Sync + 'static {
    fn connection(&self) -> DatabaseConnection;
}

#[derive(Clone)]
pub struct PostgresPool(PgPool);

impl PostgresPool {
    pub const fn new(pool: PgPool) -> Self {
        Self(pool)
    }
}

impl From<PgPool> for PostgresPool {
    fn from(pool: PgPool) -> Self {
        Self::new(pool)
    }
}

impl DatabasePool for PostgresPool {
    fn connection(&self) -> DatabaseConnection {
        SqlxPostgresConnector::from_sqlx_postgres_pool(self.0.clone())
    }
}

#[derive(Clone)]
pub struct MockDatabasePool(Arc<MockDatabaseConnection>);

impl From<MockDatabase> for MockDatabasePool {
    fn from(mock_db: MockDatabase) -> Self {
        Self(Arc::new(MockDatabaseConnection::new(mock_db)))
    }
}

impl DatabasePool for MockDatabasePool {
    fn connection(&self) -> DatabaseConnection {
        DatabaseConnection::MockDatabaseConnection(Arc::clone(&self.0))
    }
}
