use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::collections::Collection;
use crate::migrations::{AppliedMigration, MigrationError, SchemaStore};

/// In-memory schema store for exercising migrations without PostgreSQL
#[derive(Default)]
pub struct MemorySchemaStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    collections: Vec<Collection>,
    history: BTreeMap<i64, AppliedMigration>,
    fail_next_record: bool,
    fail_next_forget: bool,
}

impl MemorySchemaStore {
    pub fn collection_count(&self) -> usize {
        self.state.lock().unwrap().collections.len()
    }

    /// Make the next history write fail after the schema change went through
    pub fn fail_next_record(&self) {
        self.state.lock().unwrap().fail_next_record = true;
    }

    pub fn fail_next_forget(&self) {
        self.state.lock().unwrap().fail_next_forget = true;
    }
}

fn injected_failure() -> MigrationError {
    MigrationError::Database(sqlx::Error::PoolTimedOut)
}

fn matches(collection: &Collection, name_or_id: &str) -> bool {
    collection.id == name_or_id || collection.name == name_or_id
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn find_collection(
        &self,
        name_or_id: &str,
    ) -> Result<Option<Collection>, MigrationError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .collections
            .iter()
            .find(|c| matches(c, name_or_id))
            .cloned())
    }

    async fn create_collection(&self, collection: &Collection) -> Result<(), MigrationError> {
        let mut state = self.state.lock().unwrap();

        if state
            .collections
            .iter()
            .any(|c| matches(c, &collection.id) || matches(c, &collection.name))
        {
            return Err(MigrationError::CollectionExists(collection.name.clone()));
        }

        for field in &collection.fields {
            if let crate::collections::FieldKind::Relation { collection_id, .. } = &field.kind {
                if !state.collections.iter().any(|c| &c.id == collection_id) {
                    return Err(MigrationError::UnknownRelation {
                        field: field.name.clone(),
                        collection_id: collection_id.clone(),
                    });
                }
            }
        }

        state.collections.push(collection.clone());
        Ok(())
    }

    async fn delete_collection(&self, name_or_id: &str) -> Result<(), MigrationError> {
        let mut state = self.state.lock().unwrap();
        let before = state.collections.len();
        state.collections.retain(|c| !matches(c, name_or_id));

        if state.collections.len() == before {
            return Err(MigrationError::CollectionNotFound(name_or_id.to_string()));
        }
        Ok(())
    }

    async fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        Ok(self.state.lock().unwrap().history.values().cloned().collect())
    }

    async fn record_migration(&self, version: i64, name: &str) -> Result<(), MigrationError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_record) {
            return Err(injected_failure());
        }
        state.history.insert(
            version,
            AppliedMigration {
                version,
                name: name.to_string(),
                applied_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn forget_migration(&self, version: i64) -> Result<(), MigrationError> {
        let mut state = self.state.lock().unwrap();
        if std::mem::take(&mut state.fail_next_forget) {
            return Err(injected_failure());
        }
        state.history.remove(&version);
        Ok(())
    }
}
