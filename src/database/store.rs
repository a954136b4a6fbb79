use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::info;

use super::ddl::{create_table_ddl, quote_identifier};
use crate::collections::Collection;
use crate::migrations::{AppliedMigration, MigrationError, SchemaStore};

const BOOTSTRAP: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS "_migrations" (
        "version" BIGINT PRIMARY KEY,
        "name" TEXT NOT NULL,
        "applied_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS "_collections" (
        "id" TEXT PRIMARY KEY,
        "name" TEXT NOT NULL UNIQUE,
        "kind" TEXT NOT NULL,
        "definition" JSONB NOT NULL,
        "created_at" TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// PostgreSQL-backed schema store.
///
/// Collection definitions live in `_collections`, each collection gets its
/// own table, and migration history lives in `_migrations`.
#[derive(Clone)]
pub struct PgSchemaStore {
    pool: PgPool,
}

impl PgSchemaStore {
    /// Wrap a pool, creating the bookkeeping tables if needed
    pub async fn new(pool: PgPool) -> Result<Self, MigrationError> {
        for statement in BOOTSTRAP {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Map of collection id to table name for the given ids
    async fn table_names(&self, ids: &[&str]) -> Result<HashMap<String, String>, MigrationError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let rows = sqlx::query(r#"SELECT "id", "name" FROM "_collections" WHERE "id" = ANY($1)"#)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get::<String, _>("id"), row.get::<String, _>("name")))
            .collect())
    }
}

#[async_trait]
impl SchemaStore for PgSchemaStore {
    async fn find_collection(
        &self,
        name_or_id: &str,
    ) -> Result<Option<Collection>, MigrationError> {
        let row = sqlx::query(
            r#"SELECT "definition" FROM "_collections" WHERE "id" = $1 OR "name" = $1"#,
        )
        .bind(name_or_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let definition: serde_json::Value = row.get("definition");
                Ok(Some(serde_json::from_value(definition)?))
            }
            None => Ok(None),
        }
    }

    async fn create_collection(&self, collection: &Collection) -> Result<(), MigrationError> {
        if self.find_collection(&collection.id).await?.is_some()
            || self.find_collection(&collection.name).await?.is_some()
        {
            return Err(MigrationError::CollectionExists(collection.name.clone()));
        }

        let tables = self.table_names(&collection.relation_targets()).await?;
        let ddl = create_table_ddl(collection, &tables)?;
        let definition = serde_json::to_value(collection)?;
        let kind = serde_json::to_value(collection.kind)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(&ddl).execute(&mut *tx).await?;
        sqlx::query(
            r#"INSERT INTO "_collections" ("id", "name", "kind", "definition") VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&collection.id)
        .bind(&collection.name)
        .bind(kind.as_str().unwrap_or_default())
        .bind(&definition)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!("Created collection '{}'", collection.name);
        Ok(())
    }

    async fn delete_collection(&self, name_or_id: &str) -> Result<(), MigrationError> {
        let collection = self
            .find_collection(name_or_id)
            .await?
            .ok_or_else(|| MigrationError::CollectionNotFound(name_or_id.to_string()))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_identifier(&collection.name)))
            .execute(&mut *tx)
            .await?;
        sqlx::query(r#"DELETE FROM "_collections" WHERE "id" = $1"#)
            .bind(&collection.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted collection '{}'", collection.name);
        Ok(())
    }

    async fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        let rows = sqlx::query_as::<_, AppliedMigration>(
            r#"SELECT "version", "name", "applied_at" FROM "_migrations" ORDER BY "version""#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn record_migration(&self, version: i64, name: &str) -> Result<(), MigrationError> {
        sqlx::query(r#"INSERT INTO "_migrations" ("version", "name") VALUES ($1, $2)"#)
            .bind(version)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn forget_migration(&self, version: i64) -> Result<(), MigrationError> {
        sqlx::query(r#"DELETE FROM "_migrations" WHERE "version" = $1"#)
            .bind(version)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
