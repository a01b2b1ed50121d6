use std::sync::RwLock;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use super::notify::{BatchGuard, Observers, SubscriptionId};
use super::{read, write};

/// Cross-tab key for combat mission statistics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CombatKey {
    pub origin: String,
    pub destination: String,
    pub category: String,
}

impl CombatKey {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            category: category.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombatAggregate {
    pub completed_missions: u32,
    pub total_kills: u64,
    pub total_reward: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl CombatAggregate {
    fn merge(&mut self, kills: u64, reward: u64, at: Option<DateTime<Utc>>) {
        self.completed_missions = self.completed_missions.saturating_add(1);
        self.total_kills = self.total_kills.saturating_add(kills);
        self.total_reward = self.total_reward.saturating_add(reward);
        // Journals can arrive out of order on replay; keep the latest.
        self.last_completed_at = match (self.last_completed_at, at) {
            (Some(current), Some(incoming)) => Some(current.max(incoming)),
            (current, incoming) => current.or(incoming),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatChange {
    Recorded(CombatKey),
}

/// Aggregates keyed by (origin, destination, category). Created on the
/// first completion for a key, never removed.
#[derive(Debug, Default)]
pub struct CombatRegistry {
    aggregates: RwLock<HashMap<CombatKey, CombatAggregate>>,
    observers: Observers<CombatChange>,
}

impl CombatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(
        &self,
        key: CombatKey,
        kills: u64,
        reward: u64,
        at: Option<DateTime<Utc>>,
    ) {
        {
            let mut aggregates = write(&self.aggregates);
            aggregates
                .entry(key.clone())
                .or_default()
                .merge(kills, reward, at);
        }
        self.observers.notify(CombatChange::Recorded(key));
    }

    pub fn get(&self, key: &CombatKey) -> Option<CombatAggregate> {
        read(&self.aggregates).get(key).cloned()
    }

    /// Every aggregate, ordered by key.
    pub fn snapshot(&self) -> Vec<(CombatKey, CombatAggregate)> {
        let mut rows: Vec<_> = read(&self.aggregates)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }

    /// Sum across every key.
    pub fn totals(&self) -> CombatAggregate {
        let aggregates = read(&self.aggregates);
        aggregates
            .values()
            .fold(CombatAggregate::default(), |mut total, agg| {
                total.completed_missions =
                    total.completed_missions.saturating_add(agg.completed_missions);
                total.total_kills = total.total_kills.saturating_add(agg.total_kills);
                total.total_reward = total.total_reward.saturating_add(agg.total_reward);
                total.last_completed_at = total.last_completed_at.max(agg.last_completed_at);
                total
            })
    }

    pub fn len(&self) -> usize {
        read(&self.aggregates).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&CombatChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn batch(&self) -> BatchGuard<'_, CombatChange> {
        self.observers.batch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_two_completions_merge() {
        let registry = CombatRegistry::new();
        let key = CombatKey::new("A", "B", "PIRATE");
        registry.record_completion(key.clone(), 3, 1000, Some(at(10)));
        registry.record_completion(key.clone(), 2, 1500, Some(at(11)));

        let agg = registry.get(&key).unwrap();
        assert_eq!(agg.completed_missions, 2);
        assert_eq!(agg.total_kills, 5);
        assert_eq!(agg.total_reward, 2500);
        assert_eq!(agg.last_completed_at, Some(at(11)));
    }

    #[test]
    fn test_last_completion_is_max_regardless_of_order() {
        let registry = CombatRegistry::new();
        let key = CombatKey::new("A", "B", "PIRATE");
        registry.record_completion(key.clone(), 1, 0, Some(at(15)));
        registry.record_completion(key.clone(), 1, 0, Some(at(9)));
        registry.record_completion(key.clone(), 1, 0, None);
        assert_eq!(registry.get(&key).unwrap().last_completed_at, Some(at(15)));
    }

    #[test]
    fn test_keys_are_independent() {
        let registry = CombatRegistry::new();
        registry.record_completion(CombatKey::new("A", "B", "PIRATE"), 1, 10, None);
        registry.record_completion(CombatKey::new("A", "B", "THARGOID"), 4, 40, Some(at(8)));
        registry.record_completion(CombatKey::new("A", "C", "PIRATE"), 2, 20, None);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].0, CombatKey::new("A", "B", "PIRATE"));
        assert_eq!(snapshot[2].0, CombatKey::new("A", "C", "PIRATE"));

        let totals = registry.totals();
        assert_eq!(totals.completed_missions, 3);
        assert_eq!(totals.total_kills, 7);
        assert_eq!(totals.total_reward, 70);
        assert_eq!(totals.last_completed_at, Some(at(8)));
    }

    #[test]
    fn test_notifies_with_key() {
        use std::sync::{Arc, Mutex};
        let registry = CombatRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(move |change: &CombatChange| sink.lock().unwrap().push(change.clone()));

        let key = CombatKey::new("A", "B", "PIRATE");
        registry.record_completion(key.clone(), 1, 1, None);
        assert_eq!(*seen.lock().unwrap(), vec![CombatChange::Recorded(key)]);
    }

    #[test]
    fn test_batch_delivers_last_change_once() {
        use std::sync::{Arc, Mutex};
        let registry = CombatRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.subscribe(move |change: &CombatChange| sink.lock().unwrap().push(change.clone()));

        {
            let _batch = registry.batch();
            registry.record_completion(CombatKey::new("A", "B", "PIRATE"), 1, 10, None);
            registry.record_completion(CombatKey::new("A", "B", "PIRATE"), 2, 20, None);
            registry.record_completion(CombatKey::new("A", "C", "PIRATE"), 3, 30, None);
            assert!(seen.lock().unwrap().is_empty());
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec![CombatChange::Recorded(CombatKey::new("A", "C", "PIRATE"))]
        );
        assert_eq!(registry.totals().total_kills, 6);
    }
}
