//! Versioned schema migrations.
//!
//! Each migration has an `up` and a `down` step run against a
//! [`SchemaStore`]. The runner keeps the applied versions in the store and
//! only ever applies pending migrations in ascending version order.

pub mod runner;
pub mod steps;
pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub use runner::MigrationRunner;
pub use store::SchemaStore;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    #[error("Field '{field}' references unknown collection '{collection_id}'")]
    UnknownRelation { field: String, collection_id: String },

    #[error("Applied migration {0} is not registered")]
    UnknownMigration(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// History entry for an applied migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

#[async_trait]
pub trait Migration: Send + Sync {
    /// Unix timestamp the migration was authored at; defines ordering
    fn version(&self) -> i64;

    fn name(&self) -> &'static str;

    async fn up(&self, store: &dyn SchemaStore) -> Result<(), MigrationError>;

    async fn down(&self, store: &dyn SchemaStore) -> Result<(), MigrationError>;
}

/// All migrations shipped with the application
pub fn registry() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(steps::CreateUsers),
        Box::new(steps::CreateHabits),
        Box::new(steps::CreateInstruments),
    ]
}
