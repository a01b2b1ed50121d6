use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::notify::{BatchGuard, Observers, SubscriptionId};
use super::{read, write};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialShare {
    pub name: String,
    /// Percentage of the asteroid, 0..=100.
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProspectRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub materials: Vec<MaterialShare>,
    /// Content band: "Low", "Medium" or "High".
    pub content: Option<String>,
    pub motherlode: Option<String>,
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProspectingChange {
    Appended { total: usize },
    Cleared,
}

/// Append-only list of prospector readings with an explicit reset.
#[derive(Debug, Default)]
pub struct ProspectingLog {
    records: RwLock<Vec<ProspectRecord>>,
    observers: Observers<ProspectingChange>,
}

impl ProspectingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, record: ProspectRecord) {
        let total = {
            let mut records = write(&self.records);
            records.push(record);
            records.len()
        };
        self.observers.notify(ProspectingChange::Appended { total });
    }

    pub fn clear(&self) {
        write(&self.records).clear();
        self.observers.notify(ProspectingChange::Cleared);
    }

    pub fn snapshot(&self) -> Vec<ProspectRecord> {
        read(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ProspectingChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn batch(&self) -> BatchGuard<'_, ProspectingChange> {
        self.observers.batch()
    }
}
