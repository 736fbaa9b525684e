use super::PersistentStore;
use crate::core::{MigrateError, Result};
use async_trait::async_trait;
use log::{debug, warn};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// fsync the new contents before they replace the old file.
    #[default]
    Sync,
    /// Leave flushing to the OS.
    Buffered,
}

/// Configuration of a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// File holding the current migration name
    pub path: PathBuf,

    /// Whether writes are synced to disk before being published
    pub durability: DurabilityMode,

    /// Create missing parent directories on save
    pub create_dirs: bool,
}

impl FileStoreConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            durability: DurabilityMode::default(),
            create_dirs: true,
        }
    }

    /// Set the durability mode
    pub fn durability(mut self, durability: DurabilityMode) -> Self {
        self.durability = durability;
        self
    }

    /// Set whether parent directories are created on save
    pub fn create_dirs(mut self, create_dirs: bool) -> Self {
        self.create_dirs = create_dirs;
        self
    }
}

// ============================================================================
// File Store
// ============================================================================

/// Keeps the current migration name as a single UTF-8 string in a file.
///
/// A missing (or empty) file means nothing has been applied. Clearing the
/// state deletes the file. Writes go through a temporary file in the same
/// directory that is renamed over the target, so a crash never leaves a
/// half-written name behind.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: FileStoreConfig,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_config(FileStoreConfig::new(path))
    }

    pub fn with_config(config: FileStoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn load(&self) -> Result<Option<String>> {
        let path = &self.config.path;
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let name = String::from_utf8(bytes).map_err(|e| {
                    MigrateError::IoError(format!(
                        "State file '{}' is not valid UTF-8: {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!("Loaded migration state '{}' from {}", name, path.display());
                Ok(if name.is_empty() { None } else { Some(name) })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MigrateError::IoError(format!(
                "Failed to read state file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn save(&self, name: Option<&str>) -> Result<()> {
        let path = &self.config.path;
        let Some(name) = name else {
            return match tokio::fs::remove_file(path).await {
                Ok(()) => {
                    debug!("Cleared migration state at {}", path.display());
                    Ok(())
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("Migration state at {} was already clear", path.display());
                    Ok(())
                }
                Err(e) => Err(MigrateError::IoError(format!(
                    "Failed to delete state file '{}': {}",
                    path.display(),
                    e
                ))),
            };
        };

        let config = self.config.clone();
        let contents = name.to_string();
        tokio::task::spawn_blocking(move || write_atomically(&config, &contents))
            .await
            .map_err(|e| MigrateError::IoError(format!("State writer task failed: {}", e)))??;
        debug!("Saved migration state '{}' to {}", name, path.display());
        Ok(())
    }
}

fn write_atomically(config: &FileStoreConfig, contents: &str) -> Result<()> {
    let path = &config.path;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if config.create_dirs {
        fs::create_dir_all(&parent).map_err(|e| {
            MigrateError::IoError(format!(
                "Failed to create state directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut temp = NamedTempFile::new_in(&parent).map_err(|e| {
        MigrateError::IoError(format!(
            "Failed to create temp file in '{}': {}",
            parent.display(),
            e
        ))
    })?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| MigrateError::IoError(format!("Failed to write state: {}", e)))?;
    temp.flush()
        .map_err(|e| MigrateError::IoError(format!("Failed to flush state: {}", e)))?;
    if config.durability == DurabilityMode::Sync {
        temp.as_file()
            .sync_all()
            .map_err(|e| MigrateError::IoError(format!("Failed to sync state: {}", e)))?;
    }
    temp.persist(path).map_err(|e| {
        MigrateError::IoError(format!(
            "Failed to replace state file '{}': {}",
            path.display(),
            e.error
        ))
    })?;
    Ok(())
}
