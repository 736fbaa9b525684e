// ============================================================================
// migrun Library
// ============================================================================

pub mod core;
pub mod migration;
pub mod migrator;
pub mod store;

// Re-export main types for convenience
pub use crate::core::{Direction, MigrateError, MigrationEvent, MigratorEvent, Result};
pub use migration::{Migration, MigrationFn, MigrationOps, operation};
pub use migrator::{
    EventListener, ListenerId, MigrationReport, MigrationStatus, Migrator, RunPlan,
};
pub use store::{DurabilityMode, FileStore, FileStoreConfig, MemoryStore, PersistentStore};

/// Builds a [`Migrator`] over `migrations`, persisting progress in `store`.
///
/// # Examples
///
/// ```
/// use migrun::{MemoryStore, Migration, migrate};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let migrator = migrate(
///     MemoryStore::new(),
///     vec![
///         Migration::new("create-users", || async { Ok(()) }),
///         Migration::reversible("add-full-name", || async { Ok(()) }, || async { Ok(()) }),
///     ],
/// )?;
///
/// migrator.on_migration_end(|event| println!("{} {}", event.direction, event.name))?;
/// migrator.up(None).await?;
/// migrator.down(Some("add-full-name")).await?;
/// # Ok(())
/// # }
/// ```
pub fn migrate<S>(store: S, migrations: Vec<Migration>) -> Result<Migrator>
where
    S: PersistentStore + 'static,
{
    Migrator::new(store, migrations)
}
