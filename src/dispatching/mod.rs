//! Priority rule dispatching for job-shop warm starts.
//!
//! The rule engine ranks candidates with scoring rules applied in order;
//! later rules act as tie-breakers when earlier rules cannot differentiate,
//! and the candidate index settles any remaining tie.
//!
//! [`ActiveScheduleBuilder`] drives the engine through a Giffler–Thompson
//! construction, producing a feasible active schedule. The branch-and-bound
//! search uses the best of these as its first incumbent.
//!
//! # References
//!
//! Dispatching rule composition: Pinedo (2016), "Scheduling: Theory,
//! Algorithms, and Systems"

mod engine;
mod rules;
mod types;

pub use engine::{best_dispatch_schedule, ActiveScheduleBuilder, DispatchSchedule, RuleEngine};
pub use rules::{DispatchRuleKind, EarliestCompletion, EarliestStart, Fifo, Lpt, Mwkr, Spt};
pub use types::{Candidate, DispatchContext, PriorityRule};
