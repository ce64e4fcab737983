//! Branch-and-bound search over machine orderings.
//!
//! Each node fixes the relative order of some pairs of tasks sharing a
//! machine. Propagation tightens start-time domains under those orders and
//! the current best makespan; nodes that become infeasible or whose lower
//! bound cannot beat the incumbent are pruned. A node with every pair
//! ordered is a complete schedule.
//!
//! # Key Components
//!
//! - [`BnbConfig`]: time budget, warm start, parallelism, logging
//! - [`BnbRunner`]: executes the search
//! - [`SharedIncumbent`]: best schedule, safe to share between workers
//! - [`BnbStatistics`]: node and pruning counters

mod branching;
mod config;
mod incumbent;
mod runner;
mod stats;

pub use branching::{select_branch, Branch};
pub use config::{BnbConfig, MAX_SPLIT_DEPTH};
pub use incumbent::{Incumbent, SharedIncumbent};
pub use runner::BnbRunner;
pub use stats::BnbStatistics;
