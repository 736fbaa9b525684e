//! The sequential migration runner.

use crate::core::{Direction, MigrateError, MigrationEvent, MigratorEvent, Result};
use crate::migration::Migration;
use crate::store::{FileStore, PersistentStore};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{Instrument, Level, event, info_span};

// Runner implementation is split by concern: listener registry, plan
// computation and step execution share this module's private scope.
include!("migrator/listeners.rs");
include!("migrator/plan.rs");
include!("migrator/execution.rs");

/// Moves a store's position through an ordered list of migrations.
///
/// The list order is the only ordering authority. Every call to [`up`] or
/// [`down`] reloads the current position from the store, computes the steps
/// to run, and persists progress after each step so an interrupted run can
/// simply be started again.
///
/// [`up`]: Migrator::up
/// [`down`]: Migrator::down
pub struct Migrator {
    migrations: Vec<Migration>,
    positions: HashMap<String, usize>,
    store: Arc<dyn PersistentStore>,
    listeners: RwLock<Vec<(ListenerId, EventListener)>>,
    next_listener_id: AtomicU64,
    running: AtomicBool,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("migrations", &self.migrations)
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish()
    }
}

impl Migrator {
    /// Builds a migrator over `migrations`, persisting progress in `store`.
    ///
    /// Fails if a migration has an empty name or if two migrations share a name.
    pub fn new<S>(store: S, migrations: Vec<Migration>) -> Result<Self>
    where
        S: PersistentStore + 'static,
    {
        Self::with_shared_store(Arc::new(store), migrations)
    }

    /// Builds a migrator persisting progress in a file at `path`.
    pub fn open(path: impl AsRef<Path>, migrations: Vec<Migration>) -> Result<Self> {
        Self::new(FileStore::new(path), migrations)
    }

    pub fn with_shared_store(
        store: Arc<dyn PersistentStore>,
        migrations: Vec<Migration>,
    ) -> Result<Self> {
        let mut positions = HashMap::with_capacity(migrations.len());
        for (position, migration) in migrations.iter().enumerate() {
            if migration.name().is_empty() {
                return Err(MigrateError::EmptyMigrationName { position });
            }
            if positions.insert(migration.name().to_string(), position).is_some() {
                return Err(MigrateError::DuplicateMigration(
                    migration.name().to_string(),
                ));
            }
        }

        Ok(Self {
            migrations,
            positions,
            store,
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            running: AtomicBool::new(false),
        })
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn store(&self) -> &Arc<dyn PersistentStore> {
        &self.store
    }

    /// Returns the position of `name` in the declared list.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| MigrateError::UnknownMigration(name.to_string()))
    }

    /// Resolves the persisted position: `None` when nothing has been applied,
    /// otherwise the index of the last applied migration.
    pub async fn current_index(&self) -> Result<Option<usize>> {
        match self.store.load().await? {
            Some(name) if !name.is_empty() => self.index_of(&name).map(Some),
            _ => Ok(None),
        }
    }

    /// Reports which migrations are applied and which are still pending.
    pub async fn status(&self) -> Result<MigrationStatus> {
        let current = self.current_index().await?;
        let applied_len = current.map_or(0, |index| index + 1);
        let names = self.migrations.iter().map(|m| m.name().to_string());

        Ok(MigrationStatus {
            current: current.map(|index| self.migrations[index].name().to_string()),
            applied: names.clone().take(applied_len).collect(),
            pending: names.skip(applied_len).collect(),
        })
    }
}

/// Snapshot of the migrator's position against its migration list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MigrationStatus {
    pub current: Option<String>,
    pub applied: Vec<String>,
    pub pending: Vec<String>,
}
