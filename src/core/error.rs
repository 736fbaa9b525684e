use crate::core::types::Direction;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("{0} is not a migration")]
    UnknownMigration(String),

    #[error("Migration {0} cannot be undone")]
    UndoableMigration(String),

    #[error("Migration '{0}' is declared more than once")]
    DuplicateMigration(String),

    #[error("Migration at position {position} has an empty name")]
    EmptyMigrationName { position: usize },

    #[error("Migration {name} has no {direction} operation")]
    MissingOperation { name: String, direction: Direction },

    #[error("Migration {name} failed while running {direction}: {source}")]
    MigrationFailed {
        name: String,
        direction: Direction,
        #[source]
        source: anyhow::Error,
    },

    #[error("A migration run is already in progress on this migrator")]
    AlreadyRunning,

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, MigrateError>;

impl<T> From<std::sync::PoisonError<T>> for MigrateError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl MigrateError {
    /// Name of the migration this error is about, if any.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            Self::UnknownMigration(name)
            | Self::UndoableMigration(name)
            | Self::DuplicateMigration(name) => Some(name),
            Self::MissingOperation { name, .. } | Self::MigrationFailed { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_migration() {
        assert_eq!(
            MigrateError::UnknownMigration("invalid-name".into()).to_string(),
            "invalid-name is not a migration"
        );
        assert_eq!(
            MigrateError::UndoableMigration("create-user-collection".into()).to_string(),
            "Migration create-user-collection cannot be undone"
        );
    }

    #[test]
    fn migration_failed_keeps_source() {
        let err = MigrateError::MigrationFailed {
            name: "trim-names".into(),
            direction: Direction::Up,
            source: anyhow::anyhow!("connection reset"),
        };
        assert_eq!(
            err.to_string(),
            "Migration trim-names failed while running up: connection reset"
        );
        assert_eq!(err.migration_name(), Some("trim-names"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn poisoned_lock_maps_to_lock_error() {
        let lock = std::sync::Mutex::new(());
        let _ = std::panic::catch_unwind(|| {
            let _guard = lock.lock().unwrap();
            panic!("poison");
        });
        let err: MigrateError = lock.lock().unwrap_err().into();
        assert!(matches!(err, MigrateError::LockError(_)));
    }
}
