//! Error types.
//!
//! Only malformed input and malformed configuration surface as errors.
//! Infeasible search branches are handled inside the solver and never
//! reach the caller.

use thiserror::Error;

/// A job-shop instance that cannot be modelled.
///
/// Raised by [`ProblemModel::new`](crate::model::ProblemModel::new);
/// never produced while solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    /// The declared machine count is zero.
    #[error("machine count must be positive")]
    NoMachines,

    /// A job has no tasks.
    #[error("job {job} has no tasks")]
    EmptyJob { job: usize },

    /// A task has a zero or negative duration.
    #[error("task {task} of job {job} has non-positive duration {duration}")]
    NonPositiveDuration { job: usize, task: usize, duration: i64 },

    /// A task references a machine outside `[0, machine_count)`.
    #[error(
        "task {task} of job {job} uses machine {machine}, \
         but only {machine_count} machines exist"
    )]
    MachineOutOfRange {
        job: usize,
        task: usize,
        machine: usize,
        machine_count: usize,
    },

    /// The sum of all durations does not fit the time type.
    #[error("sum of task durations overflows the scheduling horizon")]
    HorizonOverflow,
}

/// An invalid [`BnbConfig`](crate::bnb::BnbConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("node check interval must be at least 1")]
    ZeroCheckInterval,

    #[error("split depth {depth} exceeds the maximum of {max}")]
    SplitDepthTooLarge { depth: usize, max: usize },

    #[error("warm start requires at least one dispatching rule")]
    NoDispatchRules,
}
