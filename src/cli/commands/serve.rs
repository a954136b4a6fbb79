use anyhow::Context;

use crate::app::{self, AppState};
use crate::config;
use crate::database::{DatabaseManager, PgSchemaStore};
use crate::migrations::{self, MigrationRunner};

pub async fn handle(http: Option<String>) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(addr) = http {
        config.api.http_addr = addr;
    }

    tracing::info!("Starting Homebase API in {:?} mode", config.environment);

    let db = match config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.automigrate {
                let store = PgSchemaStore::new(pool.clone()).await?;
                let applied = MigrationRunner::new(&store, migrations::registry()).up().await?;
                if !applied.is_empty() {
                    tracing::info!(migrations = ?applied, "Applied pending migrations");
                }
            }
            Some(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving without a database");
            None
        }
    };

    let listener = tokio::net::TcpListener::bind(&config.api.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.api.http_addr))?;

    app::serve(&config, listener, AppState { db: db.clone() }).await?;

    if let Some(pool) = db {
        pool.close().await;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
