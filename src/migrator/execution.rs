/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MigrationReport {
    pub direction: Direction,
    /// Migrations executed, in execution order.
    pub executed: Vec<String>,
    /// Name persisted after the last step, or the untouched state for an empty run.
    pub state: Option<String>,
}

/// Marks the migrator busy for the lifetime of a run.
struct RunGuard<'a> {
    running: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(running: &'a AtomicBool) -> Result<Self> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MigrateError::AlreadyRunning)?;
        Ok(Self { running })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Migrator {
    /// Applies migrations up to and including `target` (default: the last one).
    pub async fn up(&self, target: Option<&str>) -> Result<MigrationReport> {
        self.migrate(Direction::Up, target).await
    }

    /// Undoes migrations down to and including `target` (default: the first one).
    pub async fn down(&self, target: Option<&str>) -> Result<MigrationReport> {
        self.migrate(Direction::Down, target).await
    }

    /// Runs the plan for `direction` and `target` one step at a time.
    ///
    /// The store is written after each step's operation completes and before
    /// its `migrationEnd` event, so the persisted name always reflects exactly
    /// the steps that finished. A failing operation or store write stops the
    /// run; nothing is retried.
    pub async fn migrate(
        &self,
        direction: Direction,
        target: Option<&str>,
    ) -> Result<MigrationReport> {
        let _guard = RunGuard::acquire(&self.running)?;
        let span = info_span!(
            "migrator.migrate",
            direction = %direction,
            to = target.unwrap_or("<default>")
        );
        self.run(direction, target).instrument(span).await
    }

    async fn run(&self, direction: Direction, target: Option<&str>) -> Result<MigrationReport> {
        let plan = self.plan(direction, target).await?;
        event!(
            Level::DEBUG,
            steps = ?plan.step_names(),
            final_state = ?plan.final_state_name(),
            "migration plan computed"
        );

        if direction == Direction::Down {
            if let Some(undoable) = plan.steps().iter().find(|m| !m.is_reversible()) {
                event!(Level::WARN, migration = %undoable.name(), "migration cannot be undone");
                return Err(MigrateError::UndoableMigration(undoable.name().to_string()));
            }
        }

        if plan.is_empty() {
            return Ok(MigrationReport {
                direction,
                executed: Vec::new(),
                state: self.store.load().await?,
            });
        }

        let mut executed = Vec::with_capacity(plan.len());
        let mut state = None;
        for (index, migration) in plan.steps().iter().enumerate() {
            let payload = MigrationEvent {
                direction,
                index,
                name: migration.name().to_string(),
            };
            self.emit(&MigratorEvent::Begin(payload.clone()))?;

            let operation = migration.operation(direction).ok_or_else(|| {
                MigrateError::MissingOperation {
                    name: migration.name().to_string(),
                    direction,
                }
            })?;
            if let Err(source) = operation().await {
                event!(
                    Level::WARN,
                    migration = %migration.name(),
                    error = %source,
                    "migration failed"
                );
                return Err(MigrateError::MigrationFailed {
                    name: migration.name().to_string(),
                    direction,
                    source,
                });
            }

            state = plan.state_after(index);
            if let Err(err) = self.store.save(state).await {
                event!(
                    Level::ERROR,
                    migration = %migration.name(),
                    error = %err,
                    "failed to persist migration state"
                );
                return Err(err);
            }
            event!(Level::INFO, migration = %migration.name(), "migration {}", direction);

            self.emit(&MigratorEvent::End(payload))?;
            executed.push(migration.name().to_string());
        }

        Ok(MigrationReport {
            direction,
            executed,
            state: state.map(str::to_string),
        })
    }
}
