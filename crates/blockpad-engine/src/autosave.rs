//! Debounced autosave scheduling.
//!
//! A burst of content-change notifications collapses into one save: every
//! change (re)arms a single deadline of `delay` from now, and `poll` fires
//! at most once when the deadline passes. The scheduler holds no timer of
//! its own — the host drives it with explicit instants, which keeps the
//! engine single-threaded and makes the timing testable.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct AutosaveScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// A content change happened at `now`. Restarts the quiet period.
    pub fn note_change(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True when a save deadline is armed.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once per armed deadline, when `now` has reached
    /// it. The caller performs the save.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without saving (explicit save already ran, or teardown — a
    /// save must never fire after destroy).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}
