//! Change debouncing — coalesce bursts of raw change notifications into
//! single reconciliation triggers.

use std::time::Duration;

use tokio::time::Instant;

/// Two-state debouncer: *idle* until a notification arrives, then *armed*
/// for exactly one quiet period.
///
/// Notifications observed while armed are coalesced — they neither restart
/// nor extend the deadline, and at most one reconciliation is ever pending.
/// The caller drives the timer, so tests can run on a virtual clock.
#[derive(Debug)]
pub struct ChangeDebouncer {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl ChangeDebouncer {
    pub fn new(quiet_period: Duration) -> Self {
        ChangeDebouncer {
            quiet_period,
            deadline: None,
        }
    }

    /// Record a raw notification at `now`.
    ///
    /// Arms the debouncer when idle; returns `true` exactly when the state
    /// moved idle → armed.
    pub fn observe(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.quiet_period);
        true
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The instant the pending reconciliation becomes due, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending request, returning to idle.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
