//! Mission lifecycle store.
//!
//! Missions are created on acceptance and only ever move forward:
//!
//! ```text
//! Active ──► Completed
//!        ├─► Failed
//!        └─► Abandoned
//! ```
//!
//! Anything that would move a mission out of a terminal state is ignored.

use std::cmp::Ordering;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;
use vigil_types::{MissionSort, SortDirection};

use super::notify::{BatchGuard, Observers, SubscriptionId};
use super::{read, write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MissionStatus {
    Active,
    Completed,
    Failed,
    Abandoned,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MissionStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mission {
    pub id: String,
    pub kind: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub faction: Option<String>,
    pub target_count: u32,
    pub progress: u32,
    pub reward: u64,
    pub status: MissionStatus,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// When the mission reached its terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Mission {
    /// `progress / target`, or 0.0 when there is no target.
    pub fn progress_ratio(&self) -> f64 {
        if self.target_count == 0 {
            0.0
        } else {
            self.progress as f64 / self.target_count as f64
        }
    }

    /// More progress than the target asked for. Not an error.
    pub fn is_exceeded(&self) -> bool {
        self.target_count > 0 && self.progress > self.target_count
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// Fields known at acceptance time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMission {
    pub id: String,
    pub kind: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub faction: Option<String>,
    pub target_count: u32,
    pub reward: u64,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewMission {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    fn into_mission(self) -> Mission {
        Mission {
            id: self.id,
            kind: self.kind,
            origin: self.origin,
            destination: self.destination,
            faction: self.faction,
            target_count: self.target_count,
            progress: 0,
            reward: self.reward,
            status: MissionStatus::Active,
            accepted_at: self.accepted_at,
            expires_at: self.expires_at,
            finished_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUpdate {
    /// Journal reported an absolute count.
    Set(u32),
    Increment(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionChange {
    Accepted(String),
    Progressed { id: String, progress: u32 },
    Redirected { id: String },
    Finished { id: String, status: MissionStatus },
    Reconciled { transitioned: usize },
}

#[derive(Debug, Default)]
struct MissionBook {
    by_id: HashMap<String, Mission>,
    /// Acceptance order, for stable snapshots.
    order: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MissionRegistry {
    book: RwLock<MissionBook>,
    observers: Observers<MissionChange>,
}

impl MissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Mutation ---

    /// Start tracking a mission. A second acceptance of the same id is ignored.
    pub fn accept(&self, new: NewMission) -> bool {
        let id = new.id.clone();
        {
            let mut book = write(&self.book);
            if book.by_id.contains_key(&id) {
                tracing::debug!(id = %id, "[MISSIONS] duplicate acceptance ignored");
                return false;
            }
            book.order.push(id.clone());
            book.by_id.insert(id.clone(), new.into_mission());
        }
        self.observers.notify(MissionChange::Accepted(id));
        true
    }

    pub fn record_progress(&self, id: &str, update: ProgressUpdate) -> bool {
        let progress = {
            let mut book = write(&self.book);
            let Some(mission) = active_mut(&mut book, id) else {
                return false;
            };
            mission.progress = match update {
                ProgressUpdate::Set(value) => value,
                ProgressUpdate::Increment(by) => mission.progress.saturating_add(by),
            };
            mission.progress
        };
        self.observers.notify(MissionChange::Progressed {
            id: id.to_string(),
            progress,
        });
        true
    }

    pub fn redirect(&self, id: &str, destination: impl Into<String>) -> bool {
        {
            let mut book = write(&self.book);
            let Some(mission) = active_mut(&mut book, id) else {
                return false;
            };
            mission.destination = Some(destination.into());
        }
        self.observers.notify(MissionChange::Redirected { id: id.to_string() });
        true
    }

    pub fn complete(&self, id: &str, at: Option<DateTime<Utc>>) -> bool {
        self.finish(id, MissionStatus::Completed, at)
    }

    pub fn fail(&self, id: &str, at: Option<DateTime<Utc>>) -> bool {
        self.finish(id, MissionStatus::Failed, at)
    }

    pub fn abandon(&self, id: &str, at: Option<DateTime<Utc>>) -> bool {
        self.finish(id, MissionStatus::Abandoned, at)
    }

    /// Move an active mission to a terminal status. Unknown ids and missions
    /// that already finished are left alone and return false.
    pub fn finish(&self, id: &str, status: MissionStatus, at: Option<DateTime<Utc>>) -> bool {
        if !status.is_terminal() {
            return false;
        }
        {
            let mut book = write(&self.book);
            let Some(mission) = active_mut(&mut book, id) else {
                return false;
            };
            mission.status = status;
            mission.finished_at = at;
        }
        self.observers.notify(MissionChange::Finished {
            id: id.to_string(),
            status,
        });
        true
    }

    /// Apply the login summary: listed missions still Active move to the
    /// listed terminal status, finishing at `at`. Returns how many transitioned.
    pub fn reconcile(
        &self,
        failed: &[String],
        completed: &[String],
        at: Option<DateTime<Utc>>,
    ) -> usize {
        let transitioned = {
            let mut book = write(&self.book);
            let mut count = 0;
            let listed = failed
                .iter()
                .map(|id| (id, MissionStatus::Failed))
                .chain(completed.iter().map(|id| (id, MissionStatus::Completed)));
            for (id, status) in listed {
                if let Some(mission) = active_mut(&mut book, id) {
                    mission.status = status;
                    mission.finished_at = at;
                    count += 1;
                }
            }
            count
        };
        if transitioned > 0 {
            tracing::info!(transitioned, "[MISSIONS] reconciled with login summary");
            self.observers
                .notify(MissionChange::Reconciled { transitioned });
        }
        transitioned
    }

    // --- Queries ---

    pub fn get(&self, id: &str) -> Option<Mission> {
        read(&self.book).by_id.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.book).order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All missions in acceptance order.
    pub fn snapshot(&self) -> Vec<Mission> {
        let book = read(&self.book);
        book.order
            .iter()
            .filter_map(|id| book.by_id.get(id).cloned())
            .collect()
    }

    pub fn active(&self) -> Vec<Mission> {
        self.snapshot()
            .into_iter()
            .filter(|m| m.status == MissionStatus::Active)
            .collect()
    }

    pub fn sorted(&self, mode: MissionSort) -> Vec<Mission> {
        let mut missions = self.snapshot();
        sort_missions(&mut missions, mode);
        missions
    }

    /// Active missions whose expiry has passed. They stay Active until the
    /// journal says otherwise.
    pub fn expired_active(&self, now: DateTime<Utc>) -> Vec<Mission> {
        self.active()
            .into_iter()
            .filter(|m| m.is_expired(now))
            .collect()
    }

    // --- Observers ---

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&MissionChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn batch(&self) -> BatchGuard<'_, MissionChange> {
        self.observers.batch()
    }
}

fn active_mut<'a>(book: &'a mut MissionBook, id: &str) -> Option<&'a mut Mission> {
    match book.by_id.get_mut(id) {
        Some(mission) if mission.status == MissionStatus::Active => Some(mission),
        Some(mission) => {
            tracing::debug!(
                id,
                status = ?mission.status,
                "[MISSIONS] ignoring update for finished mission"
            );
            None
        }
        None => {
            tracing::debug!(id, "[MISSIONS] ignoring update for unknown mission");
            None
        }
    }
}

/// Order missions for display. The sort is stable, so equal keys keep
/// acceptance order.
pub fn sort_missions(missions: &mut [Mission], mode: MissionSort) {
    match mode {
        MissionSort::ProgressRatio => missions.sort_by(|a, b| {
            b.progress_ratio()
                .total_cmp(&a.progress_ratio())
                .then_with(|| cmp_accepted(a, b, SortDirection::Ascending))
        }),
        MissionSort::Accepted(direction) => {
            missions.sort_by(|a, b| cmp_accepted(a, b, direction))
        }
    }
}

/// Missions without an acceptance time go last in either direction.
fn cmp_accepted(a: &Mission, b: &Mission, direction: SortDirection) -> Ordering {
    match (a.accepted_at, b.accepted_at) {
        (Some(x), Some(y)) => match direction {
            SortDirection::Ascending => x.cmp(&y),
            SortDirection::Descending => y.cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn accepted(id: &str, target: u32, hour: Option<u32>) -> NewMission {
        NewMission {
            id: id.to_string(),
            kind: "Mission_Massacre".to_string(),
            target_count: target,
            accepted_at: hour.map(at),
            ..Default::default()
        }
    }

    fn ids(missions: &[Mission]) -> Vec<&str> {
        missions.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_accept_then_complete_leaves_progress_alone() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("M1", 5, Some(10)));
        registry.record_progress("M1", ProgressUpdate::Set(3));
        assert!(registry.complete("M1", Some(at(11))));

        let mission = registry.get("M1").unwrap();
        assert_eq!(mission.status, MissionStatus::Completed);
        assert_eq!(mission.progress, 3);
        assert_eq!(mission.finished_at, Some(at(11)));
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("M1", 5, Some(10)));
        assert!(registry.fail("M1", None));

        assert!(!registry.complete("M1", None));
        assert!(!registry.abandon("M1", None));
        assert!(!registry.fail("M1", None));
        assert!(!registry.record_progress("M1", ProgressUpdate::Increment(1)));
        assert!(!registry.redirect("M1", "Elsewhere"));
        assert_eq!(registry.get("M1").unwrap().status, MissionStatus::Failed);
    }

    #[test]
    fn test_unknown_mission_updates_are_ignored() {
        let registry = MissionRegistry::new();
        assert!(!registry.complete("ghost", None));
        assert!(!registry.record_progress("ghost", ProgressUpdate::Set(1)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_acceptance_keeps_original() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("M1", 5, Some(10)));
        registry.record_progress("M1", ProgressUpdate::Set(2));
        assert!(!registry.accept(accepted("M1", 9, Some(12))));

        let mission = registry.get("M1").unwrap();
        assert_eq!(mission.target_count, 5);
        assert_eq!(mission.progress, 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_progress_past_target_is_exceeded_not_error() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("M1", 2, Some(10)));
        registry.record_progress("M1", ProgressUpdate::Increment(3));
        let mission = registry.get("M1").unwrap();
        assert_eq!(mission.progress, 3);
        assert!(mission.is_exceeded());
        assert_eq!(mission.progress_ratio(), 1.5);
    }

    #[test]
    fn test_zero_target_ratio_is_zero() {
        let mut mission = accepted("M0", 0, Some(10)).into_mission();
        mission.progress = 4;
        assert_eq!(mission.progress_ratio(), 0.0);
        assert!(!mission.is_exceeded());
    }

    #[test]
    fn test_progress_ratio_sort() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("half-late", 4, Some(12)));
        registry.accept(accepted("zero-target", 0, Some(8)));
        registry.accept(accepted("half-early", 10, Some(9)));
        registry.accept(accepted("done", 2, Some(11)));
        registry.accept(accepted("half-undated", 2, None));
        registry.record_progress("half-late", ProgressUpdate::Set(2));
        registry.record_progress("half-early", ProgressUpdate::Set(5));
        registry.record_progress("done", ProgressUpdate::Set(2));
        registry.record_progress("half-undated", ProgressUpdate::Set(1));

        let sorted = registry.sorted(MissionSort::ProgressRatio);
        assert_eq!(
            ids(&sorted),
            vec!["done", "half-early", "half-late", "half-undated", "zero-target"]
        );
    }

    #[test]
    fn test_accepted_sort_puts_undated_last_both_ways() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("undated", 1, None));
        registry.accept(accepted("b", 1, Some(11)));
        registry.accept(accepted("a", 1, Some(10)));
        registry.accept(accepted("c", 1, Some(12)));

        let asc = registry.sorted(MissionSort::Accepted(SortDirection::Ascending));
        assert_eq!(ids(&asc), vec!["a", "b", "c", "undated"]);

        let desc = registry.sorted(MissionSort::Accepted(SortDirection::Descending));
        assert_eq!(ids(&desc), vec!["c", "b", "a", "undated"]);
    }

    #[test]
    fn test_reconcile_moves_only_active_missions() {
        let registry = MissionRegistry::new();
        registry.accept(accepted("A", 1, Some(10)));
        registry.accept(accepted("B", 1, Some(10)));
        registry.accept(accepted("C", 1, Some(10)));
        registry.abandon("C", None);

        let moved = registry.reconcile(
            &["A".to_string(), "C".to_string()],
            &["B".to_string(), "missing".to_string()],
            Some(at(14)),
        );
        assert_eq!(moved, 2);
        let a = registry.get("A").unwrap();
        assert_eq!((a.status, a.finished_at), (MissionStatus::Failed, Some(at(14))));
        let b = registry.get("B").unwrap();
        assert_eq!((b.status, b.finished_at), (MissionStatus::Completed, Some(at(14))));
        let c = registry.get("C").unwrap();
        assert_eq!((c.status, c.finished_at), (MissionStatus::Abandoned, None));
    }

    #[test]
    fn test_expired_active() {
        let registry = MissionRegistry::new();
        let mut soon = accepted("soon", 1, Some(10));
        soon.expires_at = Some(at(12));
        let mut later = accepted("later", 1, Some(10));
        later.expires_at = Some(at(20));
        registry.accept(soon);
        registry.accept(later);

        let expired = registry.expired_active(at(13));
        assert_eq!(ids(&expired), vec!["soon"]);
    }

    #[test]
    fn test_listener_sees_committed_state() {
        let registry = Arc::new(MissionRegistry::new());
        let observed = Arc::new(Mutex::new(Vec::new()));
        let (reader, sink) = (registry.clone(), observed.clone());
        registry.subscribe(move |change| {
            if let MissionChange::Finished { id, .. } = change {
                sink.lock().unwrap().push(reader.get(id).map(|m| m.status));
            }
        });

        registry.accept(accepted("M1", 1, Some(10)));
        registry.complete("M1", None);
        assert_eq!(
            *observed.lock().unwrap(),
            vec![Some(MissionStatus::Completed)]
        );
    }

    #[test]
    fn test_no_notification_for_noop() {
        let registry = MissionRegistry::new();
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        registry.subscribe(move |_| *sink.lock().unwrap() += 1);

        registry.complete("ghost", None);
        registry.accept(accepted("M1", 1, None));
        registry.accept(accepted("M1", 1, None));
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
