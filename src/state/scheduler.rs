//! Coalescing scheduler: at most one pending request, last write wins

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Pending<T> {
    request: T,
    due: Instant,
}

/// Holds at most one scheduled request. Scheduling again replaces the
/// pending request and restarts the delay; the request fires once the
/// delay has elapsed without a newer one arriving.
///
/// Time is passed in by the caller so the scheduler stays deterministic.
#[derive(Debug, Clone)]
pub struct CoalescingScheduler<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> CoalescingScheduler<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace the pending request, due `delay` after `now`
    pub fn schedule(&mut self, request: T, now: Instant) {
        self.pending = Some(Pending {
            request,
            due: now + self.delay,
        });
    }

    /// Take the pending request if it is due
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref().is_some_and(|p| p.due <= now) {
            self.pending.take().map(|p| p.request)
        } else {
            None
        }
    }

    /// When the pending request becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending request, returning it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.request)
    }
}
