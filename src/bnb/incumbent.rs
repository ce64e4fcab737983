//! Best schedule found so far, shared between search workers.
//!
//! The makespan is mirrored in an atomic so that workers can read the
//! current upper bound without locking; the schedule itself lives behind a
//! mutex, which is the source of truth when installing.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};

/// A complete schedule and its makespan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incumbent {
    pub makespan: i64,
    /// Start time per task id.
    pub starts: Vec<i64>,
}

/// Concurrent holder of the best [`Incumbent`].
///
/// `upper_bound` starts at `i64::MAX`, meaning "no schedule yet". Only
/// strictly shorter schedules are installed.
#[derive(Debug)]
pub struct SharedIncumbent {
    upper_bound: AtomicI64,
    best: Mutex<Option<Incumbent>>,
}

impl Default for SharedIncumbent {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SharedIncumbent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Incumbent(upper_bound: {})", self.upper_bound())
    }
}

impl SharedIncumbent {
    pub fn new() -> Self {
        Self {
            upper_bound: AtomicI64::new(i64::MAX),
            best: Mutex::new(None),
        }
    }

    /// Makespan of the installed schedule, or `i64::MAX`.
    #[inline]
    pub fn upper_bound(&self) -> i64 {
        self.upper_bound.load(Ordering::Relaxed)
    }

    /// Clone of the installed schedule, if any.
    pub fn snapshot(&self) -> Option<Incumbent> {
        self.best
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `candidate` if it is strictly better than the current one.
    ///
    /// Returns `true` when installed.
    pub fn try_install(&self, candidate: Incumbent) -> bool {
        if candidate.makespan >= self.upper_bound() {
            return false;
        }

        let mut guard = self.best.lock().unwrap_or_else(PoisonError::into_inner);
        // The atomic may be stale; compare against the locked value.
        if let Some(current) = guard.as_ref() {
            if candidate.makespan >= current.makespan {
                return false;
            }
        }

        self.upper_bound.store(candidate.makespan, Ordering::Relaxed);
        *guard = Some(candidate);
        true
    }

    /// Consumes the holder and returns the installed schedule.
    pub fn into_inner(self) -> Option<Incumbent> {
        self.best
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
