use std::collections::HashSet;
use tracing::info;

use super::{AppliedMigration, Migration, MigrationError, SchemaStore};

/// Applies and reverts registered migrations against a store
pub struct MigrationRunner<'a> {
    store: &'a dyn SchemaStore,
    migrations: Vec<Box<dyn Migration>>,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(store: &'a dyn SchemaStore, mut migrations: Vec<Box<dyn Migration>>) -> Self {
        migrations.sort_by_key(|m| m.version());
        Self { store, migrations }
    }

    /// Registered migrations not yet applied, oldest first
    pub async fn pending(&self) -> Result<Vec<&dyn Migration>, MigrationError> {
        let applied: HashSet<i64> = self
            .store
            .applied_migrations()
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        Ok(self
            .migrations
            .iter()
            .map(|m| m.as_ref())
            .filter(|m| !applied.contains(&m.version()))
            .collect())
    }

    /// Apply every pending migration. Returns the names applied.
    pub async fn up(&self) -> Result<Vec<&'static str>, MigrationError> {
        let mut applied = Vec::new();

        for migration in self.pending().await? {
            info!(version = migration.version(), name = migration.name(), "Applying migration");
            migration.up(self.store).await?;
            self.store
                .record_migration(migration.version(), migration.name())
                .await?;
            applied.push(migration.name());
        }

        if applied.is_empty() {
            info!("No pending migrations");
        }
        Ok(applied)
    }

    /// Revert the `steps` most recently applied migrations, newest first
    pub async fn down(&self, steps: usize) -> Result<Vec<&'static str>, MigrationError> {
        let mut history = self.store.applied_migrations().await?;
        history.sort_by_key(|m| std::cmp::Reverse(m.version));

        let mut reverted = Vec::new();
        for record in history.into_iter().take(steps) {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.version() == record.version)
                .ok_or(MigrationError::UnknownMigration(record.version))?;

            info!(version = record.version, name = migration.name(), "Reverting migration");
            migration.down(self.store).await?;
            self.store.forget_migration(record.version).await?;
            reverted.push(migration.name());
        }
        Ok(reverted)
    }

    pub async fn history(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        self.store.applied_migrations().await
    }

    /// Drop history entries whose migration is no longer registered.
    /// Returns the versions removed.
    pub async fn sync_history(&self) -> Result<Vec<i64>, MigrationError> {
        let registered: HashSet<i64> = self.migrations.iter().map(|m| m.version()).collect();

        let mut removed = Vec::new();
        for record in self.store.applied_migrations().await? {
            if registered.contains(&record.version) {
                continue;
            }
            info!(
                version = record.version,
                name = %record.name,
                "Removing orphaned migration history"
            );
            self.store.forget_migration(record.version).await?;
            removed.push(record.version);
        }
        Ok(removed)
    }
}
