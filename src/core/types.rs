use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a run moves through the migration list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply forward operations toward the end of the list.
    Up,
    /// Apply reverse operations toward the start of the list.
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by both lifecycle events of a single step.
///
/// `index` is the position of the step inside the current run, not the
/// migration's position in the declared list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationEvent {
    pub direction: Direction,
    pub index: usize,
    pub name: String,
}

/// Lifecycle notification published by the migrator around every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum MigratorEvent {
    #[serde(rename = "migrationBegin")]
    Begin(MigrationEvent),
    #[serde(rename = "migrationEnd")]
    End(MigrationEvent),
}

impl MigratorEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MigratorEvent::Begin(_) => "migrationBegin",
            MigratorEvent::End(_) => "migrationEnd",
        }
    }

    pub fn payload(&self) -> &MigrationEvent {
        match self {
            MigratorEvent::Begin(payload) | MigratorEvent::End(payload) => payload,
        }
    }

    pub fn is_begin(&self) -> bool {
        matches!(self, MigratorEvent::Begin(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_serializes_with_kind_tag() {
        let event = MigratorEvent::End(MigrationEvent {
            direction: Direction::Down,
            index: 1,
            name: "split-names".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "migrationEnd",
                "payload": {"direction": "down", "index": 1, "name": "split-names"}
            })
        );
        assert_eq!(event.kind(), "migrationEnd");
        assert!(!event.is_begin());
    }
}
