use serde::{Deserialize, Serialize};

/// Emitted once per migration step, after its statement ran and before the
/// bookkeeping row changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MigrationEvent {
    Applied { name: String, version: u32 },
    RolledBack { name: String },
}

impl MigrationEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::Applied { name, .. } | Self::RolledBack { name } => name,
        }
    }
}

pub type EventHandler = Box<dyn Fn(&MigrationEvent) + Send + Sync>;

/// Ordered list of subscribers, called synchronously in the order they were
/// added. A panicking handler unwinds through the enclosing migrator call.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<EventHandler>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&MigrationEvent) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn dispatch(&self, event: &MigrationEvent) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
