//! Correlation identifier and its task-local scope
//!
//! The identifier is a UUIDv7: time-ordered, unique, and carrying its own
//! creation timestamp, which the end/error events later use to compute
//! elapsed time. The task-local slot is the async replacement for the
//! per-request thread-local of classic servlet stacks; `with_scope` drops
//! it on every exit path, so nothing leaks onto a reused worker.

use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use uuid::Uuid;

/// Time-ordered token linking all log events of one logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a fresh identifier; UUIDv7 embeds the creation instant
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The creation instant embedded in the identifier
    pub fn issued_at(&self) -> DateTime<Utc> {
        match self.0.get_timestamp() {
            Some(ts) => {
                let (secs, nanos) = ts.to_unix();
                Utc.timestamp_opt(secs as i64, nanos)
                    .single()
                    .unwrap_or_else(Utc::now)
            }
            None => Utc::now(),
        }
    }

    /// Wall-clock milliseconds since the identifier was issued, never negative
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.issued_at()).num_milliseconds().max(0)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Default)]
struct Scope {
    id: Option<CorrelationId>,
    errored: bool,
}

tokio::task_local! {
    static SCOPE: RefCell<Scope>;
}

/// Run a future with a fresh correlation scope.
///
/// The slot exists only for the duration of the future and is dropped on
/// both the normal and the error path.
pub async fn with_scope<F>(fut: F) -> F::Output
where
    F: Future,
{
    SCOPE.scope(RefCell::new(Scope::default()), fut).await
}

/// The identifier of the current scope, if one has been assigned
pub fn current() -> Option<CorrelationId> {
    SCOPE.try_with(|slot| slot.borrow().id).ok().flatten()
}

/// Get the current identifier, generating and storing one lazily.
///
/// Outside of a scope this degrades to a one-off identifier, so the
/// observer still works for unscoped calls.
pub fn ensure() -> CorrelationId {
    SCOPE
        .try_with(|slot| {
            let mut scope = slot.borrow_mut();
            *scope.id.get_or_insert_with(CorrelationId::new)
        })
        .unwrap_or_else(|_| CorrelationId::new())
}

/// Mark the current invocation as errored, suppressing the end event
pub fn mark_errored() {
    let _ = SCOPE.try_with(|slot| slot.borrow_mut().errored = true);
}

pub fn is_errored() -> bool {
    SCOPE
        .try_with(|slot| slot.borrow().errored)
        .unwrap_or(false)
}

/// Reset the errored flag at the start of an invocation
pub fn reset_errored() {
    let _ = SCOPE.try_with(|slot| slot.borrow_mut().errored = false);
}

/// Clear identifier and errored flag; runs on every exit path
pub fn clear() {
    let _ = SCOPE.try_with(|slot| {
        let mut scope = slot.borrow_mut();
        scope.id = None;
        scope.errored = false;
    });
}
