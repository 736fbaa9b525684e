use super::PersistentStore;
use crate::core::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Volatile store keeping the current migration name in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already reports `name` as the current migration.
    pub fn with_state(name: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(name.into())),
        }
    }

    pub async fn current(&self) -> Option<String> {
        self.data.lock().await.clone()
    }

    pub async fn set(&self, name: Option<&str>) {
        *self.data.lock().await = name.map(str::to_string);
    }
}

#[async_trait]
impl PersistentStore for MemoryStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.data.lock().await.clone())
    }

    async fn save(&self, name: Option<&str>) -> Result<()> {
        self.set(name).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty_and_reads_back_writes() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), None);

        store.save(Some("hey")).await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("hey"));

        store.save(None).await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }
}
