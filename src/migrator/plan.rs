/// The steps a single run will execute, in execution order, plus the
/// migration that marks where a reversal ends.
#[derive(Debug, Clone)]
pub struct RunPlan<'a> {
    direction: Direction,
    steps: Vec<&'a Migration>,
    final_state: Option<&'a Migration>,
}

impl<'a> RunPlan<'a> {
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn steps(&self) -> &[&'a Migration] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&'a str> {
        self.steps.iter().map(|m| m.name()).collect()
    }

    /// Migration just past the end of the plan: after `last` for up, before
    /// `last` for down.
    pub fn final_state(&self) -> Option<&'a Migration> {
        self.final_state
    }

    pub fn final_state_name(&self) -> Option<&'a str> {
        self.final_state.map(|m| m.name())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Name to persist once step `i` has completed.
    ///
    /// Always the migration immediately preceding the new position: the step
    /// itself when going up, the next step (or `final_state`) when going down.
    pub fn state_after(&self, i: usize) -> Option<&'a str> {
        match self.direction {
            Direction::Up => self.steps.get(i).map(|m| m.name()),
            Direction::Down => self
                .steps
                .get(i + 1)
                .copied()
                .or(self.final_state)
                .map(|m| m.name()),
        }
    }
}

impl Migrator {
    /// Computes which migrations a run in `direction` toward `target` would
    /// execute. Without a target, up runs to the last migration and down runs
    /// to the first.
    pub async fn plan(&self, direction: Direction, target: Option<&str>) -> Result<RunPlan<'_>> {
        match direction {
            Direction::Up => self.plan_up(target).await,
            Direction::Down => self.plan_down(target).await,
        }
    }

    async fn plan_up(&self, target: Option<&str>) -> Result<RunPlan<'_>> {
        let last = match target {
            Some(name) => Some(self.index_of(name)?),
            None => self.migrations.len().checked_sub(1),
        };
        let first = self.current_index().await?.map_or(0, |index| index + 1);

        let Some(last) = last else {
            return Ok(RunPlan {
                direction: Direction::Up,
                steps: Vec::new(),
                final_state: None,
            });
        };

        let steps = if first <= last {
            self.migrations[first..=last].iter().collect()
        } else {
            Vec::new()
        };

        Ok(RunPlan {
            direction: Direction::Up,
            steps,
            final_state: self.migrations.get(last + 1),
        })
    }

    async fn plan_down(&self, target: Option<&str>) -> Result<RunPlan<'_>> {
        let last = match target {
            Some(name) => self.index_of(name)?,
            None => 0,
        };
        let current = self.current_index().await?;

        let steps = match current {
            Some(current) if current >= last => {
                self.migrations[last..=current].iter().rev().collect()
            }
            _ => Vec::new(),
        };

        Ok(RunPlan {
            direction: Direction::Down,
            steps,
            final_state: last.checked_sub(1).and_then(|index| self.migrations.get(index)),
        })
    }
}
