//! Single-shot timers driven by the caller's clock
//!
//! The engine never sleeps or spawns. Callers pass `now` into every entry
//! point, ask for [`next_deadline`](crate::HumanInput::next_deadline) and call
//! [`tick`](crate::HumanInput::tick) once it has passed.

use std::time::{Duration, Instant};

/// Fires once after a period without activity. Re-arming always replaces the
/// pending deadline.
#[derive(Debug, Clone)]
pub struct InactivityTimer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl InactivityTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn rearm(&mut self, now: Instant) {
        self.deadline = Some(now + self.timeout);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Consume the deadline if it has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Periodic sampling tick for continuous sources, with a slower interval
/// while nothing has been detected yet.
#[derive(Debug, Clone)]
pub struct PollTimer {
    active_interval: Duration,
    idle_interval: Duration,
    next: Option<Instant>,
}

impl PollTimer {
    pub fn new(active_interval: Duration, idle_interval: Duration) -> Self {
        Self {
            active_interval,
            idle_interval,
            next: None,
        }
    }

    /// Schedule the next tick, replacing any pending one.
    pub fn schedule(&mut self, now: Instant, active: bool) {
        let interval = if active {
            self.active_interval
        } else {
            self.idle_interval
        };
        self.next = Some(now + interval);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.next
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next.is_some_and(|next| now >= next)
    }
}
