//! Aggregate state derived from the journal.
//!
//! Each registry guards its data with its own `RwLock` and publishes a change
//! descriptor through [`Observers`] once the write is committed and the lock
//! released. Readers on other threads only ever see whole updates.

pub mod combat;
pub mod kills;
pub mod missions;
pub mod navigation;
pub mod notify;
pub mod prospecting;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use combat::{CombatAggregate, CombatChange, CombatKey, CombatRegistry};
pub use kills::{KillChange, KillRow, KillStatistics, TargetType, classify_target_type};
pub use missions::{
    Mission, MissionChange, MissionRegistry, MissionStatus, NewMission, ProgressUpdate,
    sort_missions,
};
pub use navigation::{NavRoute, NavigationRegistry, RouteChange, RouteEntry, RouteSystem};
pub use notify::{BatchGuard, Observers, SubscriptionId};
pub use prospecting::{MaterialShare, ProspectRecord, ProspectingChange, ProspectingLog};

/// Every registry the engine maintains. Shared with readers via `Arc`.
#[derive(Debug, Default)]
pub struct Registries {
    pub missions: MissionRegistry,
    pub combat: CombatRegistry,
    pub kills: KillStatistics,
    pub navigation: NavigationRegistry,
    pub prospecting: ProspectingLog,
}

/// Point-in-time copy of every registry, comparable for equality.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistriesSnapshot {
    pub missions: Vec<Mission>,
    pub combat: Vec<(CombatKey, CombatAggregate)>,
    pub kills: Vec<KillRow>,
    pub route: Arc<NavRoute>,
    pub current_system: Option<String>,
    pub history: Vec<String>,
    pub prospects: Vec<ProspectRecord>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot each registry in turn. Each part is internally consistent;
    /// the parts are not taken under one global lock.
    pub fn snapshot(&self) -> RegistriesSnapshot {
        RegistriesSnapshot {
            missions: self.missions.snapshot(),
            combat: self.combat.snapshot(),
            kills: self.kills.rows(),
            route: self.navigation.route(),
            current_system: self.navigation.current_system(),
            history: self.navigation.history(),
            prospects: self.prospecting.snapshot(),
        }
    }
}

// A panicking handler poisons whatever lock it held. Handlers validate before
// mutating, so the data behind a poisoned lock is still consistent.
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
