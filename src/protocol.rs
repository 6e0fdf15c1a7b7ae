//! Protocol state: session phases, correlation ids, pending requests.
//!
//! The conversation moves strictly forward through [`Phase`] values; the
//! only backward-reachable state is [`Phase::Closed`], entered from
//! anywhere on transport failure or cancellation. Correlation ids are
//! allocated from a per-run counter and never reused, so a reply can
//! always be attributed to exactly one request.

use std::fmt;

/// Coarse-grained authentication/readiness state of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Connected, nothing received yet. The peer speaks first.
    Unauthenticated,
    /// Credential sent, waiting for the auth verdict.
    AwaitingAuthResult,
    /// Authenticated; bootstrap requests issued, demultiplexing replies.
    Ready,
    /// Terminal. No further sends are attempted.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AwaitingAuthResult => "awaiting_auth_result",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What an outstanding correlation id denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Long-lived state-change subscription; produces `event` messages for
    /// the rest of the run and is never retired.
    Subscribe,
    /// One-shot templated query; may stream `event` messages before its
    /// terminal `result` retires it.
    RenderQuery,
}

/// Monotonic correlation id allocator.
///
/// The counter starts at 1 and is pre-incremented on allocation, so the
/// first issued id is 2 (id 1 is reserved for the session bootstrap
/// exchange, which carries no correlation id on this protocol version).
#[derive(Debug)]
pub struct CorrelationIds {
    next: u64,
}

impl CorrelationIds {
    /// New allocator for a fresh connection.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Reserve the next id. Strictly increasing, never reused within a run.
    pub fn allocate(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

impl Default for CorrelationIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Outstanding-request table keyed by correlation id.
///
/// Ids are dense and monotonically assigned within a run, so the table is
/// a `Vec` indexed by `id - base` rather than a general map. The base is
/// fixed by the first insert.
#[derive(Debug, Default)]
pub struct PendingRequests {
    base: Option<u64>,
    slots: Vec<Option<RequestKind>>,
}

impl PendingRequests {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as outstanding.
    ///
    /// Must be called before the corresponding request is transmitted, so
    /// a reply can never arrive for an unrecorded id.
    pub fn insert(&mut self, id: u64, kind: RequestKind) {
        let base = *self.base.get_or_insert(id);
        let Some(offset) = id.checked_sub(base) else {
            // Ids below the base cannot come from this run's allocator.
            return;
        };
        let Ok(index) = usize::try_from(offset) else {
            return;
        };
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(kind);
    }

    /// Look up an outstanding id without removing it.
    #[must_use]
    pub fn get(&self, id: u64) -> Option<RequestKind> {
        let base = self.base?;
        let index = usize::try_from(id.checked_sub(base)?).ok()?;
        self.slots.get(index).copied().flatten()
    }

    /// Remove an id from the table, returning what it denoted.
    ///
    /// Used for one-shot requests once their terminal `result` arrives;
    /// subscriptions stay in the table for the run's duration.
    pub fn retire(&mut self, id: u64) -> Option<RequestKind> {
        let base = self.base?;
        let index = usize::try_from(id.checked_sub(base)?).ok()?;
        self.slots.get_mut(index)?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_allocated_id_is_two() {
        let mut ids = CorrelationIds::new();
        assert_eq!(ids.allocate(), 2);
    }

    #[test]
    fn ids_strictly_increase_and_never_repeat() {
        let mut ids = CorrelationIds::new();
        let mut seen = Vec::new();
        for _ in 0..8 {
            let id = ids.allocate();
            assert!(seen.last().map_or(true, |&last| id > last));
            seen.push(id);
        }
        assert_eq!(seen, vec![2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn insert_then_get() {
        let mut pending = PendingRequests::new();
        pending.insert(2, RequestKind::Subscribe);
        pending.insert(3, RequestKind::RenderQuery);

        assert_eq!(pending.get(2), Some(RequestKind::Subscribe));
        assert_eq!(pending.get(3), Some(RequestKind::RenderQuery));
        assert_eq!(pending.get(4), None);
        assert_eq!(pending.get(1), None);
    }

    #[test]
    fn lookup_does_not_remove() {
        let mut pending = PendingRequests::new();
        pending.insert(2, RequestKind::Subscribe);

        assert_eq!(pending.get(2), Some(RequestKind::Subscribe));
        assert_eq!(pending.get(2), Some(RequestKind::Subscribe));
    }

    #[test]
    fn retire_removes_only_the_target() {
        let mut pending = PendingRequests::new();
        pending.insert(2, RequestKind::Subscribe);
        pending.insert(3, RequestKind::RenderQuery);

        assert_eq!(pending.retire(3), Some(RequestKind::RenderQuery));
        assert_eq!(pending.get(3), None);
        assert_eq!(pending.get(2), Some(RequestKind::Subscribe));
        assert_eq!(pending.retire(3), None);
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::Unauthenticated.to_string(), "unauthenticated");
        assert_eq!(Phase::AwaitingAuthResult.to_string(), "awaiting_auth_result");
        assert_eq!(Phase::Ready.to_string(), "ready");
        assert_eq!(Phase::Closed.to_string(), "closed");
    }
}
