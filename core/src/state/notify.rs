//! Publish/subscribe for registry changes.
//!
//! Registries call [`Observers::notify`] after their write lock is released,
//! so a listener may read (or even mutate) the registry that notified it.
//! Listeners run synchronously on the mutating thread; moving work onto a UI
//! thread is the listener's business.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type Listener<C> = Arc<dyn Fn(&C) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct ObserverState<C> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<C>)>,
    batch_depth: u32,
    /// Latest change suppressed while a batch was open.
    pending: Option<C>,
}

pub struct Observers<C> {
    state: Mutex<ObserverState<C>>,
}

impl<C> Default for Observers<C> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ObserverState {
                next_id: 0,
                listeners: Vec::new(),
                batch_depth: 0,
                pending: None,
            }),
        }
    }
}

impl<C> std::fmt::Debug for Observers<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Observers")
            .field("listeners", &state.listeners.len())
            .field("batch_depth", &state.batch_depth)
            .finish()
    }
}

impl<C> Observers<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ObserverState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(existing, _)| *existing != id);
        state.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    pub fn notify(&self, change: C) {
        let listeners = {
            let mut state = self.lock();
            if state.batch_depth > 0 {
                state.pending = Some(change);
                return;
            }
            snapshot_listeners(&state)
        };
        for listener in listeners {
            listener(&change);
        }
    }

    pub fn begin_batch(&self) {
        self.lock().batch_depth += 1;
    }

    /// Close a batch. When the outermost batch closes, listeners receive the
    /// last change suppressed during it, once.
    pub fn end_batch(&self) {
        let (change, listeners) = {
            let mut state = self.lock();
            state.batch_depth = state.batch_depth.saturating_sub(1);
            if state.batch_depth > 0 {
                return;
            }
            let Some(change) = state.pending.take() else {
                return;
            };
            (change, snapshot_listeners(&state))
        };
        for listener in listeners {
            listener(&change);
        }
    }

    pub fn is_batching(&self) -> bool {
        self.lock().batch_depth > 0
    }

    /// Open a batch that closes when the guard drops.
    pub fn batch(&self) -> BatchGuard<'_, C> {
        self.begin_batch();
        BatchGuard { observers: self }
    }
}

fn snapshot_listeners<C>(state: &ObserverState<C>) -> Vec<Listener<C>> {
    state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
}

#[must_use = "the batch ends as soon as the guard is dropped"]
pub struct BatchGuard<'a, C> {
    observers: &'a Observers<C>,
}

impl<C> Drop for BatchGuard<'_, C> {
    fn drop(&mut self) {
        self.observers.end_batch();
    }
}
