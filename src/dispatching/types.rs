//! Core types for dispatching.

use crate::model::TaskId;

/// A task that is ready to be dispatched.
///
/// Built by the schedule builder for every job whose previous task has been
/// placed; rules rank these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub task: TaskId,
    pub job: usize,
    pub machine: usize,
    pub duration: i64,
    /// Earliest start given the placed tasks of its job and machine.
    pub earliest_start: i64,
    /// Work left in the job, this task included.
    pub remaining_work: i64,
}

impl Candidate {
    /// Earliest completion if dispatched now.
    pub fn earliest_end(&self) -> i64 {
        self.earliest_start + self.duration
    }
}

/// State of the partial schedule at a dispatching decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchContext {
    /// Earliest completion time over all ready tasks. The conflict set holds
    /// the candidates on that task's machine that could start before it.
    pub conflict_end: i64,
}

/// A scoring rule that assigns a priority value to an item.
///
/// Rules return `f64` scores where **lower is higher priority**.
///
/// # Examples
///
/// ```
/// use u_jobshop::dispatching::{Candidate, DispatchContext, PriorityRule};
///
/// struct LongestFirst;
///
/// impl PriorityRule<Candidate, DispatchContext> for LongestFirst {
///     fn name(&self) -> &str { "LPT" }
///     fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
///         -(c.duration as f64)
///     }
/// }
/// ```
pub trait PriorityRule<T, C>: Send + Sync {
    /// Returns the name of this rule.
    fn name(&self) -> &str;

    /// Computes a priority score for the given item.
    ///
    /// Lower scores indicate higher priority.
    fn score(&self, item: &T, context: &C) -> f64;
}
