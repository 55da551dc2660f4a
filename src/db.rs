use backoff::future::retry_notify;
use backoff::ExponentialBackoff;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::store::{FundingStore, MemoryStore, PostgresStore};

/// Connects to Postgres, retrying with exponential backoff for up to
/// `db_connect_timeout`.
pub async fn connect(database_url: &str, config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(config.db_max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let policy = ExponentialBackoff {
        max_elapsed_time: Some(config.db_connect_timeout),
        ..Default::default()
    };

    retry_notify(
        policy,
        || {
            let options = options.clone();
            async move { Database::connect(options).await.map_err(backoff::Error::transient) }
        },
        |err: DbErr, wait: Duration| {
            tracing::warn!(error = %err, retry_in = ?wait, "database connection failed, retrying");
        },
    )
    .await
}

/// Picks the store backend: Postgres when `DATABASE_URL` is set, otherwise
/// an empty in-memory store.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn FundingStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database: PostgreSQL");
            let conn = connect(url, config).await?;
            if config.run_migrations {
                tracing::info!("Applying pending migrations");
                Migrator::up(&conn, None).await?;
            }
            Ok(Arc::new(PostgresStore::new(conn)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; continuing with in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
