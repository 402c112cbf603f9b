//! Identifier types for generation requests and worker jobs.
//!
//! Every asynchronous result is tagged with the [`RequestId`] that asked for
//! it. The receiver keeps a single "currently accepted" id and drops anything
//! else, which is how overlapping regenerations are cancelled.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one generation request issued by the main thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a request ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// The id in effect before any request has been issued.
    pub const INITIAL: Self = Self(0);
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

/// Monotonic source of [`RequestId`]s.
///
/// Owned by whoever issues requests; ids never go backwards.
#[derive(Debug, Default)]
pub struct RequestCounter(AtomicU64);

impl RequestCounter {
    /// Creates a counter positioned at [`RequestId::INITIAL`].
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU64::new(RequestId::INITIAL.raw()))
    }

    /// Advances the counter, invalidating every id handed out so far.
    pub fn advance(&self) -> RequestId {
        RequestId(self.0.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns the currently accepted id.
    #[must_use]
    pub fn current(&self) -> RequestId {
        RequestId(self.0.load(Ordering::Acquire))
    }

    /// Checks whether `id` is the currently accepted id.
    #[must_use]
    pub fn is_current(&self, id: RequestId) -> bool {
        self.current() == id
    }
}

/// Worker-internal job number. Incremented for every generation trigger the
/// worker receives, independent of the request id it was tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct JobId(u64);

impl JobId {
    /// Creates a job ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns the job id that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job#{}", self.0)
    }
}
