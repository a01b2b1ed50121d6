use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use super::notify::{BatchGuard, Observers, SubscriptionId};
use super::{read, write};

/// Number of visited systems kept in the jump history.
const HISTORY_CAPACITY: usize = 50;

/// A route hop as it appears in the journal, before distances are known.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub name: String,
    pub address: u64,
    pub star_class: String,
    pub position: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSystem {
    pub name: String,
    pub address: u64,
    pub star_class: String,
    pub position: [f64; 3],
    /// Light years from the previous hop; 0 for the first.
    pub distance_from_previous: f64,
}

impl RouteSystem {
    /// Build a route from raw entries, computing hop distances.
    pub fn chain(entries: Vec<RouteEntry>) -> Vec<RouteSystem> {
        let mut previous: Option<[f64; 3]> = None;
        entries
            .into_iter()
            .map(|entry| {
                let distance_from_previous = previous
                    .map(|from| euclidean(from, entry.position))
                    .unwrap_or(0.0);
                previous = Some(entry.position);
                RouteSystem {
                    name: entry.name,
                    address: entry.address,
                    star_class: entry.star_class,
                    position: entry.position,
                    distance_from_previous,
                }
            })
            .collect()
    }
}

fn euclidean(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavRoute {
    pub systems: Vec<RouteSystem>,
}

impl NavRoute {
    pub fn new(systems: Vec<RouteSystem>) -> Self {
        Self { systems }
    }

    pub fn total_distance(&self) -> f64 {
        self.systems.iter().map(|s| s.distance_from_previous).sum()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn destination(&self) -> Option<&RouteSystem> {
        self.systems.last()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteChange {
    Replaced { len: usize },
    Cleared,
    Arrived { system: String },
}

#[derive(Debug, Default)]
struct NavigationState {
    route: Arc<NavRoute>,
    current_system: Option<String>,
    history: VecDeque<String>,
}

/// Plotted route plus where the ship currently is.
///
/// The route is held behind an `Arc` and swapped whole, so a reader holding
/// an older route keeps a consistent view.
#[derive(Debug, Default)]
pub struct NavigationRegistry {
    state: RwLock<NavigationState>,
    observers: Observers<RouteChange>,
}

impl NavigationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_route(&self, systems: Vec<RouteSystem>) {
        if systems.is_empty() {
            self.clear_route();
            return;
        }
        let len = systems.len();
        write(&self.state).route = Arc::new(NavRoute::new(systems));
        self.observers.notify(RouteChange::Replaced { len });
    }

    pub fn clear_route(&self) {
        write(&self.state).route = Arc::new(NavRoute::default());
        self.observers.notify(RouteChange::Cleared);
    }

    /// Record the ship arriving in `system`. Repeated arrivals in the same
    /// system (a `Location` after an `FSDJump`) are collapsed in the history.
    pub fn record_arrival(&self, system: &str) {
        {
            let mut state = write(&self.state);
            state.current_system = Some(system.to_string());
            if state.history.back().map(String::as_str) != Some(system) {
                if state.history.len() == HISTORY_CAPACITY {
                    state.history.pop_front();
                }
                state.history.push_back(system.to_string());
            }
        }
        self.observers.notify(RouteChange::Arrived {
            system: system.to_string(),
        });
    }

    pub fn route(&self) -> Arc<NavRoute> {
        Arc::clone(&read(&self.state).route)
    }

    pub fn current_system(&self) -> Option<String> {
        read(&self.state).current_system.clone()
    }

    /// Visited systems, oldest first.
    pub fn history(&self) -> Vec<String> {
        read(&self.state).history.iter().cloned().collect()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RouteChange) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn batch(&self) -> BatchGuard<'_, RouteChange> {
        self.observers.batch()
    }
}
