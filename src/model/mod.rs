//! Job-shop problem model.
//!
//! - **[`ProblemModel`]**: validated, immutable instance (jobs, tasks,
//!   machines, durations, horizon).
//! - **[`GeneratorConfig`]**: seeded random instances for tests and benchmarks.

mod generator;
mod problem;

pub use generator::GeneratorConfig;
pub use problem::{InstanceSpec, Operation, ProblemModel, TaskId};
