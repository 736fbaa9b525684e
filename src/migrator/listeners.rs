/// Observer notified synchronously of every lifecycle event.
pub type EventListener = Arc<dyn Fn(&MigratorEvent) + Send + Sync>;

/// Handle returned by [`Migrator::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl Migrator {
    /// Registers a listener for both `migrationBegin` and `migrationEnd` events.
    ///
    /// Listeners run on the migrating task, in registration order, and the
    /// runner does not continue until every listener has returned.
    pub fn subscribe<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&MigratorEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write()?.push((id, Arc::new(listener)));
        Ok(id)
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> Result<bool> {
        let mut listeners = self.listeners.write()?;
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        Ok(listeners.len() != before)
    }

    pub fn on_migration_begin<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&MigrationEvent) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let MigratorEvent::Begin(payload) = event {
                listener(payload);
            }
        })
    }

    pub fn on_migration_end<F>(&self, listener: F) -> Result<ListenerId>
    where
        F: Fn(&MigrationEvent) + Send + Sync + 'static,
    {
        self.subscribe(move |event| {
            if let MigratorEvent::End(payload) = event {
                listener(payload);
            }
        })
    }

    fn emit(&self, event: &MigratorEvent) -> Result<()> {
        // Snapshot so a listener may (un)subscribe without deadlocking.
        let listeners: Vec<EventListener> = self
            .listeners
            .read()?
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
        Ok(())
    }
}
