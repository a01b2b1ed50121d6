//! Event handler trait and middleware.
//!
//! A handler owns one event kind. Cross-cutting work (tracing, metrics,
//! test hooks) is layered on by wrapping a handler in another handler; the
//! wrapper reports the inner handler's kind and forwards its result untouched.
//!
//! ```text
//! with_tracing(around(base, pre, post))
//!   trace "start" -> pre -> base.handle -> post -> trace "done"
//! ```

use std::time::Instant;

use crate::journal::RawEvent;
use crate::state::Registries;

/// A handler could not apply an event. Registries are left as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("{kind}: missing field `{field}`")]
    MissingField { kind: String, field: String },
    #[error("{kind}: invalid field `{field}`: {reason}")]
    InvalidField {
        kind: String,
        field: String,
        reason: String,
    },
    #[error("{kind}: handler panicked: {message}")]
    Panicked { kind: String, message: String },
}

/// Applies one kind of journal event to the registries.
///
/// Implementations must validate everything they read before the first
/// mutation so a failure never leaves a registry half-updated.
pub trait EventHandler: Send + Sync {
    /// The event kind this handler was written for.
    fn kind(&self) -> &str;

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError>;
}

impl<H: EventHandler + ?Sized> EventHandler for Box<H> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        (**self).handle(event, registries)
    }
}

/// Handler backed by a plain function or closure.
pub struct FnHandler<F> {
    kind: String,
    f: F,
}

pub fn handler_fn<F>(kind: impl Into<String>, f: F) -> FnHandler<F>
where
    F: Fn(&RawEvent, &Registries) -> Result<(), HandlerError> + Send + Sync,
{
    FnHandler {
        kind: kind.into(),
        f,
    }
}

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&RawEvent, &Registries) -> Result<(), HandlerError> + Send + Sync,
{
    fn kind(&self) -> &str {
        &self.kind
    }

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        (self.f)(event, registries)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Emits a trace event before and after the inner handler runs.
pub struct Traced<H> {
    inner: H,
}

pub fn with_tracing<H: EventHandler>(inner: H) -> Traced<H> {
    Traced { inner }
}

impl<H: EventHandler> EventHandler for Traced<H> {
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        let kind = self.inner.kind();
        tracing::trace!(kind, timestamp = ?event.timestamp, "[DISPATCH] handling");
        let started = Instant::now();
        let result = self.inner.handle(event, registries);
        tracing::trace!(
            kind,
            ok = result.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "[DISPATCH] handled"
        );
        result
    }
}

/// General pre/post wrapper. `pre` runs before delegation, `post` sees the
/// inner result; neither can alter it.
pub struct Around<H, Pre, Post> {
    inner: H,
    pre: Pre,
    post: Post,
}

pub fn around<H, Pre, Post>(inner: H, pre: Pre, post: Post) -> Around<H, Pre, Post>
where
    H: EventHandler,
    Pre: Fn(&RawEvent) + Send + Sync,
    Post: Fn(&RawEvent, &Result<(), HandlerError>) + Send + Sync,
{
    Around { inner, pre, post }
}

impl<H, Pre, Post> EventHandler for Around<H, Pre, Post>
where
    H: EventHandler,
    Pre: Fn(&RawEvent) + Send + Sync,
    Post: Fn(&RawEvent, &Result<(), HandlerError>) + Send + Sync,
{
    fn kind(&self) -> &str {
        self.inner.kind()
    }

    fn handle(&self, event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        (self.pre)(event);
        let result = self.inner.handle(event, registries);
        (self.post)(event, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn count_prospects(event: &RawEvent, registries: &Registries) -> Result<(), HandlerError> {
        let remaining = event.f64_field(&["Remaining"]).unwrap_or(100.0);
        registries.prospecting.append(crate::state::ProspectRecord {
            timestamp: None,
            materials: Vec::new(),
            content: None,
            motherlode: None,
            remaining,
        });
        Ok(())
    }

    #[test]
    fn test_wrappers_preserve_kind() {
        let base = handler_fn("ProspectedAsteroid", count_prospects);
        let wrapped = with_tracing(around(base, |_| {}, |_, _| {}));
        assert_eq!(wrapped.kind(), "ProspectedAsteroid");
    }

    #[test]
    fn test_wrappers_preserve_effects_and_result() {
        let registries = Registries::default();
        let wrapped = with_tracing(handler_fn("ProspectedAsteroid", count_prospects));
        let event = RawEvent::new("ProspectedAsteroid").with_field("Remaining", 42.0);

        assert!(wrapped.handle(&event, &registries).is_ok());
        assert_eq!(registries.prospecting.len(), 1);
        assert_eq!(registries.prospecting.snapshot()[0].remaining, 42.0);
    }

    #[test]
    fn test_nested_middleware_order_is_explicit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a_pre, a_post, b_pre, b_post) = (log.clone(), log.clone(), log.clone(), log.clone());
        let base_log = log.clone();

        let base = handler_fn("Wrapped", move |_: &RawEvent, _: &Registries| {
            base_log.lock().unwrap().push("base");
            Ok(())
        });
        let inner = around(
            base,
            move |_| a_pre.lock().unwrap().push("inner-pre"),
            move |_, _| a_post.lock().unwrap().push("inner-post"),
        );
        let outer = around(
            inner,
            move |_| b_pre.lock().unwrap().push("outer-pre"),
            move |_, _| b_post.lock().unwrap().push("outer-post"),
        );

        outer
            .handle(&RawEvent::new("Wrapped"), &Registries::default())
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["outer-pre", "inner-pre", "base", "inner-post", "outer-post"]
        );
    }

    #[test]
    fn test_post_sees_inner_failure() {
        let seen = Arc::new(Mutex::new(None));
        let seen_in_post = seen.clone();
        let failing = handler_fn("Broken", |event: &RawEvent, _: &Registries| {
            event.require_str(&["Needed"]).map(|_| ())
        });
        let wrapped = around(
            failing,
            |_| {},
            move |_, result: &Result<(), HandlerError>| {
                *seen_in_post.lock().unwrap() = Some(result.is_err());
            },
        );

        let result = wrapped.handle(&RawEvent::new("Broken"), &Registries::default());
        assert!(matches!(result, Err(HandlerError::MissingField { .. })));
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }
}
