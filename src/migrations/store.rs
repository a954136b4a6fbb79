use async_trait::async_trait;

use super::{AppliedMigration, MigrationError};
use crate::collections::Collection;

/// Persistence needed by migrations: collection definitions plus history
#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn find_collection(&self, name_or_id: &str) -> Result<Option<Collection>, MigrationError>;

    /// Create the collection; fails if the name or id is taken
    async fn create_collection(&self, collection: &Collection) -> Result<(), MigrationError>;

    async fn delete_collection(&self, name_or_id: &str) -> Result<(), MigrationError>;

    /// Applied migrations in ascending version order
    async fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError>;

    async fn record_migration(&self, version: i64, name: &str) -> Result<(), MigrationError>;

    async fn forget_migration(&self, version: i64) -> Result<(), MigrationError>;
}
