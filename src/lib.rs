//! Exact job-shop scheduling by constraint propagation and branch-and-bound.
//!
//! Given jobs, each an ordered list of tasks that need one machine for a
//! fixed time, finds start times minimizing the makespan such that tasks of a
//! job run in order and no machine runs two tasks at once.
//!
//! - **Model**: validated, immutable instances and a seeded generator.
//! - **CP (Constraint Propagation)**: start-time domains with scoped
//!   checkpoints; precedence and disjunctive propagation to a fixed point;
//!   makespan lower bounds.
//! - **Branch-and-Bound**: depth-first search on machine pair orders with
//!   most-constrained branching, a shared incumbent, a time budget and
//!   optional parallel subtrees.
//! - **Dispatching**: priority rules and a Giffler–Thompson builder that
//!   seeds the search with a feasible schedule.
//! - **Report**: per-machine schedules, optimality flag, statistics and an
//!   independent schedule checker.
//!
//! # Examples
//!
//! ```
//! use u_jobshop::model::ProblemModel;
//!
//! let problem = ProblemModel::new(
//!     vec![
//!         vec![(0, 3), (1, 2), (2, 2)],
//!         vec![(0, 2), (2, 1), (1, 4)],
//!         vec![(1, 4), (2, 3)],
//!     ],
//!     3,
//! )
//! .unwrap();
//!
//! let result = u_jobshop::solve(&problem, 10.0);
//! let solution = result.solution().unwrap();
//! assert_eq!(solution.makespan, 11);
//! assert!(solution.is_optimal);
//! ```

pub mod bnb;
pub mod cp;
pub mod dispatching;
pub mod error;
pub mod model;
pub mod report;

pub use error::{ConfigError, InstanceError};
pub use model::ProblemModel;
pub use report::{ScheduleViolation, ScheduledTask, SolveResult, Solution};

use bnb::{BnbConfig, BnbRunner};

/// Solves `problem` within `time_limit_seconds` using the default
/// configuration.
///
/// A negative or NaN budget is treated as zero; an infinite one searches to
/// completion. When the budget runs out the best schedule found is returned
/// with `is_optimal = false`.
pub fn solve(problem: &ProblemModel, time_limit_seconds: f64) -> SolveResult {
    let mut config = BnbConfig::default();
    if time_limit_seconds != f64::INFINITY {
        // NaN and negative values saturate to 0 in the cast.
        config.time_limit_ms = Some((time_limit_seconds * 1000.0) as u64);
    }

    // The default configuration always validates.
    BnbRunner::run(problem, &config).unwrap_or(SolveResult::Unknown)
}
