//! Cancellable timers on a logical clock.
//!
//! The controller never sleeps. It advances a [`Scheduler`] by the frame
//! delta and runs whatever came due. Every timer carries a
//! [`CancellationToken`]; cancelling the token drops all timers scheduled
//! under it, which is how a new trigger supersedes pending debounces and
//! auto-regeneration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancel flag for one generation attempt.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a live token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the token and every clone of it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether the token was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Timer<A> {
    due: Duration,
    seq: u64,
    action: A,
    token: CancellationToken,
}

/// A due action together with the token it was scheduled under.
#[derive(Debug)]
pub struct Fired<A> {
    /// The scheduled action
    pub action: A,
    /// Token to reschedule follow-ups under
    pub token: CancellationToken,
}

/// Timer queue driven by [`Scheduler::advance`].
#[derive(Debug)]
pub struct Scheduler<A> {
    now: Duration,
    next_seq: u64,
    timers: Vec<Timer<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            timers: Vec::new(),
        }
    }
}

impl<A> Scheduler<A> {
    /// Creates an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `action` to fire `delay` from now.
    pub fn schedule_after(&mut self, delay: Duration, action: A, token: CancellationToken) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due: self.now + delay,
            seq,
            action,
            token,
        });
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
    }

    /// Removes and returns every timer that is due, in firing order.
    /// Cancelled timers are dropped silently.
    pub fn take_due(&mut self) -> Vec<Fired<A>> {
        self.timers.retain(|timer| !timer.token.is_cancelled());
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.timers).into_iter().partition(|timer| timer.due <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.due, timer.seq));
        due.into_iter()
            .map(|timer| Fired {
                action: timer.action,
                token: timer.token,
            })
            .collect()
    }

    /// Number of live timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.iter().filter(|timer| !timer.token.is_cancelled()).count()
    }

    /// Time until the next live timer fires.
    #[must_use]
    pub fn next_due_in(&self) -> Option<Duration> {
        self.timers
            .iter()
            .filter(|timer| !timer.token.is_cancelled())
            .map(|timer| timer.due.saturating_sub(self.now))
            .min()
    }

    /// Drops every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }
}
