//! Hierarchical kill statistics: target type → target faction → source faction.

use std::sync::RwLock;

use hashbrown::HashMap;
use serde::Serialize;

use super::notify::{BatchGuard, Observers, SubscriptionId};
use super::{read, write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TargetType {
    Thargoid,
    Guardian,
    Pirate,
    Federation,
    Empire,
    Alliance,
    Independent,
    Unknown,
}

impl TargetType {
    pub fn label(self) -> &'static str {
        match self {
            TargetType::Thargoid => "Thargoid",
            TargetType::Guardian => "Guardian",
            TargetType::Pirate => "Pirate",
            TargetType::Federation => "Federation",
            TargetType::Empire => "Empire",
            TargetType::Alliance => "Alliance",
            TargetType::Independent => "Independent",
            TargetType::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Codes checked against a tag, first match wins. Codes are lowercase; the
/// tag is lowercased before matching.
const TARGET_CODES: &[(&str, TargetType)] = &[
    ("thargoid", TargetType::Thargoid),
    ("guardian", TargetType::Guardian),
    ("pirate", TargetType::Pirate),
    ("federation", TargetType::Federation),
    ("empire", TargetType::Empire),
    ("alliance", TargetType::Alliance),
    ("independent", TargetType::Independent),
];

/// Map a faction tag such as `$faction_Pirate;` onto a target type.
pub fn classify_target_type(tag: &str) -> TargetType {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        tracing::debug!("[KILLS] empty target tag, classified as Unknown");
        return TargetType::Unknown;
    }
    let lowered = trimmed.to_ascii_lowercase();
    match TARGET_CODES
        .iter()
        .find(|(code, _)| lowered.contains(code))
    {
        Some((_, target)) => *target,
        None => {
            tracing::warn!(tag = trimmed, "[KILLS] unrecognised target tag, classified as Unknown");
            TargetType::Unknown
        }
    }
}

/// One flattened leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillRow {
    pub target_type: TargetType,
    pub target_faction: String,
    pub source_faction: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillChange {
    Recorded {
        target_type: TargetType,
        target_faction: String,
        source_faction: String,
        count: u64,
    },
}

pub type SourceCounts = HashMap<String, u64>;
pub type FactionTree = HashMap<String, SourceCounts>;

#[derive(Debug, Default)]
pub struct KillStatistics {
    tree: RwLock<HashMap<TargetType, FactionTree>>,
    observers: Observers<KillChange>,
}

impl KillStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment one leaf, creating missing levels on the way down.
    pub fn record_kill(&self, target_type: TargetType, target_faction: &str, source_faction: &str) {
        let count = {
            let mut tree = write(&self.tree);
            let leaf = tree
                .entry(target_type)
                .or_default()
                .entry(target_faction.to_string())
                .or_default()
                .entry(source_faction.to_string())
                .or_insert(0);
            *leaf = leaf.saturating_add(1);
            *leaf
        };
        self.observers.notify(KillChange::Recorded {
            target_type,
            target_faction: target_faction.to_string(),
            source_faction: source_faction.to_string(),
            count,
        });
    }

    /// Classify `tag` and record the kill under the result.
    pub fn record_tagged_kill(&self, tag: &str, target_faction: &str, source_faction: &str) -> TargetType {
        let target_type = classify_target_type(tag);
        self.record_kill(target_type, target_faction, source_faction);
        target_type
    }

    pub fn count(&self, target_type: TargetType, target_faction: &str, source_faction: &str) -> u64 {
        read(&self.tree)
            .get(&target_type)
            .and_then(|factions| factions.get(target_faction))
            .and_then(|sources| sources.get(source_faction))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_for_type(&self, target_type: TargetType) -> u64 {
        read(&self.tree)
            .get(&target_type)
            .map(|factions| factions.values().flat_map(|s| s.values()).sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        read(&self.tree)
            .values()
            .flat_map(|factions| factions.values())
            .flat_map(|sources| sources.values())
            .sum()
    }

    /// Flattened leaves ordered by type, target faction, then source faction.
    pub fn rows(&self) -> Vec<KillRow> {
        let tree = read(&self.tree);
        let mut rows = Vec::new();
        for (target_type, factions) in tree.iter() {
            for (target_faction, sources) in factions {
                for (source_faction, count) in sources {
                    rows.push(KillRow {
                        target_type: *target_type,
                        target_faction: target_faction.clone(),
                        source_faction: source_faction.clone(),
                        count: *count,
                    });
                }
            }
        }
        drop(tree);
        rows.sort_by(|a, b| {
            a.target_type
                .cmp(&b.target_type)
                .then_with(|| a.target_faction.cmp(&b.target_faction))
                .then_with(|| a.source_faction.cmp(&b.source_faction))
        });
        rows
    }

    /// Deep copy of the hierarchy.
    pub fn snapshot(&self) -> HashMap<TargetType, FactionTree> {
        read(&self.tree).clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&KillChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn batch(&self) -> BatchGuard<'_, KillChange> {
        self.observers.batch()
    }
}
