use async_trait::async_trait;

use super::{Migration, MigrationError, SchemaStore};
use crate::collections::{self, Collection, USERS_COLLECTION_ID};

// Steps converge on their target state so a run interrupted between the
// schema change and the history write can be repeated.

async fn ensure_collection(
    store: &dyn SchemaStore,
    collection: Collection,
) -> Result<(), MigrationError> {
    if store.find_collection(&collection.id).await?.is_some() {
        tracing::info!(collection = %collection.name, "Collection already exists, skipping");
        return Ok(());
    }
    store.create_collection(&collection).await
}

async fn drop_collection(store: &dyn SchemaStore, name_or_id: &str) -> Result<(), MigrationError> {
    if store.find_collection(name_or_id).await?.is_none() {
        tracing::info!(collection = name_or_id, "Collection already removed, skipping");
        return Ok(());
    }
    store.delete_collection(name_or_id).await
}

/// Installs the auth collection unless an earlier setup already created it
pub struct CreateUsers;

#[async_trait]
impl Migration for CreateUsers {
    fn version(&self) -> i64 {
        1735422600
    }

    fn name(&self) -> &'static str {
        "create_users"
    }

    async fn up(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        ensure_collection(store, collections::users()).await
    }

    async fn down(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        drop_collection(store, USERS_COLLECTION_ID).await
    }
}

pub struct CreateHabits;

#[async_trait]
impl Migration for CreateHabits {
    fn version(&self) -> i64 {
        1766960500
    }

    fn name(&self) -> &'static str {
        "create_habits"
    }

    async fn up(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        ensure_collection(store, collections::habits()).await
    }

    async fn down(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        drop_collection(store, "habits").await
    }
}

pub struct CreateInstruments;

#[async_trait]
impl Migration for CreateInstruments {
    fn version(&self) -> i64 {
        1767160004
    }

    fn name(&self) -> &'static str {
        "create_instruments"
    }

    async fn up(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        ensure_collection(store, collections::instruments()).await
    }

    async fn down(&self, store: &dyn SchemaStore) -> Result<(), MigrationError> {
        drop_collection(store, "instruments").await
    }
}
