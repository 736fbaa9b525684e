//! Persistence of the migrator's position.
//!
//! A store remembers at most one value: the name of the most recently fully
//! applied migration, or nothing if no migration has been applied yet.

use crate::core::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod file;
pub mod memory;

pub use file::{DurabilityMode, FileStore, FileStoreConfig};
pub use memory::MemoryStore;

/// Durable holder of the current migration name.
///
/// Implementations must return `None` from the first `load` on a fresh store
/// and make every `save` visible to the next `load` in the same process.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    /// Returns the persisted migration name, if any.
    async fn load(&self) -> Result<Option<String>>;

    /// Replaces the persisted name. `None` clears it.
    async fn save(&self, name: Option<&str>) -> Result<()>;
}

#[async_trait]
impl<T: PersistentStore + ?Sized> PersistentStore for Arc<T> {
    async fn load(&self) -> Result<Option<String>> {
        (**self).load().await
    }

    async fn save(&self, name: Option<&str>) -> Result<()> {
        (**self).save(name).await
    }
}

#[async_trait]
impl<T: PersistentStore + ?Sized> PersistentStore for Box<T> {
    async fn load(&self) -> Result<Option<String>> {
        (**self).load().await
    }

    async fn save(&self, name: Option<&str>) -> Result<()> {
        (**self).save(name).await
    }
}
