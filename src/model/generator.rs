//! Seeded random instance generator.
//!
//! Produces reproducible job-shop instances for benchmarks and property
//! tests. Two shapes are supported:
//!
//! - **Permutation** (`operations_per_job = None`): every job visits every
//!   machine exactly once in a random order, as in Taillard's benchmark set.
//! - **Free** (`operations_per_job = Some(k)`): every job has `k` tasks on
//!   uniformly drawn machines; a job may revisit a machine.
//!
//! # References
//!
//! Taillard (1993), "Benchmarks for basic scheduling problems"

use super::problem::ProblemModel;
use crate::error::InstanceError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Shape and randomness of generated instances.
///
/// # Examples
///
/// ```
/// use u_jobshop::model::GeneratorConfig;
///
/// let problem = GeneratorConfig::default()
///     .with_size(4, 3)
///     .with_durations(1, 9)
///     .with_seed(7)
///     .generate()
///     .unwrap();
///
/// assert_eq!(problem.job_count(), 4);
/// assert_eq!(problem.task_count(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of jobs.
    pub jobs: usize,
    /// Number of machines.
    pub machines: usize,
    /// Shortest task duration (inclusive).
    pub min_duration: i64,
    /// Longest task duration (inclusive). Raised to `min_duration` if lower.
    pub max_duration: i64,
    /// Tasks per job; `None` generates a permutation shop.
    pub operations_per_job: Option<usize>,
    /// Random seed.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            jobs: 3,
            machines: 3,
            min_duration: 1,
            max_duration: 10,
            operations_per_job: None,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    pub fn with_size(mut self, jobs: usize, machines: usize) -> Self {
        self.jobs = jobs;
        self.machines = machines;
        self
    }

    pub fn with_durations(mut self, min: i64, max: i64) -> Self {
        self.min_duration = min;
        self.max_duration = max;
        self
    }

    pub fn with_operations_per_job(mut self, n: usize) -> Self {
        self.operations_per_job = Some(n);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Draws an instance. The same config always yields the same instance.
    ///
    /// # Errors
    ///
    /// Propagates [`InstanceError`] when the shape itself is invalid
    /// (zero machines, zero tasks per job, non-positive durations).
    pub fn generate(&self) -> Result<ProblemModel, InstanceError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let lo = self.min_duration;
        let hi = self.max_duration.max(lo);

        let mut jobs = Vec::with_capacity(self.jobs);
        for _ in 0..self.jobs {
            let machines: Vec<usize> = match self.operations_per_job {
                None => {
                    let mut order: Vec<usize> = (0..self.machines).collect();
                    order.shuffle(&mut rng);
                    order
                }
                Some(_) if self.machines == 0 => Vec::new(),
                Some(k) => (0..k).map(|_| rng.random_range(0..self.machines)).collect(),
            };
            let job = machines
                .into_iter()
                .map(|m| (m, rng.random_range(lo..=hi)))
                .collect();
            jobs.push(job);
        }

        ProblemModel::new(jobs, self.machines)
    }
}
