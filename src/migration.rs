//! Migration descriptors.

use crate::core::Direction;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// A zero-argument unit of work run by the migrator and awaited to completion.
pub type MigrationFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wraps an async closure into a [`MigrationFn`].
pub fn operation<F, Fut>(f: F) -> MigrationFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

/// The operations a migration supports.
///
/// Reversibility is a capability of the variant, so the runner never has to
/// look for a missing reverse operation at call time.
#[derive(Clone)]
pub enum MigrationOps {
    ForwardOnly { forward: MigrationFn },
    Reversible { forward: MigrationFn, reverse: MigrationFn },
}

/// A named, ordered unit of work with a mandatory forward operation and an
/// optional reverse operation.
#[derive(Clone)]
pub struct Migration {
    name: String,
    ops: MigrationOps,
}

impl std::fmt::Debug for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}

impl Migration {
    /// Creates a forward-only migration.
    pub fn new<F, Fut>(name: impl Into<String>, up: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_ops(
            name,
            MigrationOps::ForwardOnly {
                forward: operation(up),
            },
        )
    }

    /// Creates a migration that can be both applied and undone.
    pub fn reversible<U, UFut, D, DFut>(name: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn() -> UFut + Send + Sync + 'static,
        UFut: Future<Output = anyhow::Result<()>> + Send + 'static,
        D: Fn() -> DFut + Send + Sync + 'static,
        DFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_ops(
            name,
            MigrationOps::Reversible {
                forward: operation(up),
                reverse: operation(down),
            },
        )
    }

    pub fn from_ops(name: impl Into<String>, ops: MigrationOps) -> Self {
        Self {
            name: name.into(),
            ops,
        }
    }

    /// Adds (or replaces) the reverse operation, making the migration reversible.
    pub fn with_down<F, Fut>(self, down: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let forward = match self.ops {
            MigrationOps::ForwardOnly { forward } | MigrationOps::Reversible { forward, .. } => {
                forward
            }
        };
        Self {
            name: self.name,
            ops: MigrationOps::Reversible {
                forward,
                reverse: operation(down),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ops(&self) -> &MigrationOps {
        &self.ops
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self.ops, MigrationOps::Reversible { .. })
    }

    /// Returns the operation to run for `direction`, if this migration has one.
    pub fn operation(&self, direction: Direction) -> Option<&MigrationFn> {
        match (&self.ops, direction) {
            (MigrationOps::ForwardOnly { forward }, Direction::Up)
            | (MigrationOps::Reversible { forward, .. }, Direction::Up) => Some(forward),
            (MigrationOps::Reversible { reverse, .. }, Direction::Down) => Some(reverse),
            (MigrationOps::ForwardOnly { .. }, Direction::Down) => None,
        }
    }
}
