use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use hashbrown::HashMap;

use super::handler::{EventHandler, HandlerError};
use crate::journal::RawEvent;
use crate::state::Registries;

/// What happened to one event at the dispatcher boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// No handler for this kind. Expected for most journal events.
    Unhandled,
    Failed(HandlerError),
}

/// Maps an event kind to at most one handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn EventHandler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds = self.kinds();
        kinds.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`, returning whatever it replaced.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        handler: impl EventHandler + 'static,
    ) -> Option<Box<dyn EventHandler>> {
        let kind = kind.into();
        if handler.kind() != kind {
            tracing::warn!(
                registered_as = %kind,
                declared = handler.kind(),
                "[DISPATCH] handler registered under a different kind than it declares"
            );
        }
        let previous = self.handlers.insert(kind.clone(), Box::new(handler));
        if previous.is_some() {
            tracing::warn!(kind = %kind, "[DISPATCH] replaced existing handler");
        }
        previous
    }

    /// Register under the handler's own declared kind.
    pub fn add(&mut self, handler: impl EventHandler + 'static) -> Option<Box<dyn EventHandler>> {
        let kind = handler.kind().to_string();
        self.register(kind, handler)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `event` to its handler.
    ///
    /// Handler errors and panics stop here: they are logged with the event
    /// kind and returned as [`DispatchOutcome::Failed`].
    pub fn dispatch(&self, event: &RawEvent, registries: &Registries) -> DispatchOutcome {
        let Some(handler) = self.handlers.get(event.kind.as_str()) else {
            return DispatchOutcome::Unhandled;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event, registries))) {
            Ok(Ok(())) => DispatchOutcome::Handled,
            Ok(Err(error)) => {
                tracing::warn!(kind = %event.kind, %error, "[DISPATCH] handler failed");
                DispatchOutcome::Failed(error)
            }
            Err(payload) => {
                let error = HandlerError::Panicked {
                    kind: event.kind.clone(),
                    message: panic_message(payload.as_ref()),
                };
                tracing::error!(kind = %event.kind, %error, "[DISPATCH] handler panicked");
                DispatchOutcome::Failed(error)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
