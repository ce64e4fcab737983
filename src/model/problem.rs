//! Immutable job-shop instance.

use crate::error::InstanceError;
use std::ops::Range;

/// Flat index of a task inside a [`ProblemModel`].
///
/// Tasks of one job occupy a contiguous id range in job order.
pub type TaskId = usize;

/// One task of a job: a fixed-duration visit to one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Operation {
    /// Owning job.
    pub job: usize,
    /// Position inside the job.
    pub index: usize,
    /// Machine this task occupies exclusively.
    pub machine: usize,
    /// Processing time, always positive.
    pub duration: i64,
}

/// Raw instance as received from a loader: jobs of `(machine, duration)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceSpec {
    pub machine_count: usize,
    pub jobs: Vec<Vec<(usize, i64)>>,
}

/// A validated job-shop instance.
///
/// Built once and never mutated. Besides the tasks themselves it caches the
/// per-machine task lists, the remaining work ("tail") of every task and the
/// horizon, so the solver never recomputes them.
///
/// # Examples
///
/// ```
/// use u_jobshop::model::ProblemModel;
///
/// let problem = ProblemModel::new(
///     vec![
///         vec![(0, 3), (1, 2), (2, 2)],
///         vec![(0, 2), (2, 1), (1, 4)],
///         vec![(1, 4), (2, 3)],
///     ],
///     3,
/// )
/// .unwrap();
///
/// assert_eq!(problem.task_count(), 8);
/// assert_eq!(problem.horizon(), 21);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "InstanceSpec", into = "InstanceSpec")
)]
pub struct ProblemModel {
    machine_count: usize,
    tasks: Vec<Operation>,
    job_starts: Vec<TaskId>,
    machine_tasks: Vec<Vec<TaskId>>,
    tails: Vec<i64>,
    horizon: i64,
}

impl ProblemModel {
    /// Validates and builds an instance.
    ///
    /// # Errors
    ///
    /// Returns an [`InstanceError`] if the machine count is zero, a job is
    /// empty, a duration is not positive, a machine id is out of range, or
    /// the total duration overflows.
    pub fn new(jobs: Vec<Vec<(usize, i64)>>, machine_count: usize) -> Result<Self, InstanceError> {
        if machine_count == 0 {
            return Err(InstanceError::NoMachines);
        }

        let mut tasks = Vec::with_capacity(jobs.iter().map(Vec::len).sum());
        let mut job_starts = Vec::with_capacity(jobs.len() + 1);
        let mut machine_tasks = vec![Vec::new(); machine_count];
        let mut horizon: i64 = 0;

        for (job, ops) in jobs.iter().enumerate() {
            if ops.is_empty() {
                return Err(InstanceError::EmptyJob { job });
            }
            job_starts.push(tasks.len());

            for (index, &(machine, duration)) in ops.iter().enumerate() {
                if duration <= 0 {
                    return Err(InstanceError::NonPositiveDuration {
                        job,
                        task: index,
                        duration,
                    });
                }
                if machine >= machine_count {
                    return Err(InstanceError::MachineOutOfRange {
                        job,
                        task: index,
                        machine,
                        machine_count,
                    });
                }
                horizon = horizon
                    .checked_add(duration)
                    .ok_or(InstanceError::HorizonOverflow)?;

                machine_tasks[machine].push(tasks.len());
                tasks.push(Operation {
                    job,
                    index,
                    machine,
                    duration,
                });
            }
        }
        job_starts.push(tasks.len());

        // Remaining work from each task to the end of its job, own duration included.
        let mut tails = vec![0; tasks.len()];
        for job in 0..jobs.len() {
            let mut acc = 0;
            for id in (job_starts[job]..job_starts[job + 1]).rev() {
                acc += tasks[id].duration;
                tails[id] = acc;
            }
        }

        Ok(Self {
            machine_count,
            tasks,
            job_starts,
            machine_tasks,
            tails,
            horizon,
        })
    }

    /// Number of machines.
    pub fn machine_count(&self) -> usize {
        self.machine_count
    }

    /// Number of jobs.
    pub fn job_count(&self) -> usize {
        self.job_starts.len() - 1
    }

    /// Total number of tasks over all jobs.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Sum of all durations; no start or end time ever needs to exceed it.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// All tasks, indexed by [`TaskId`].
    pub fn tasks(&self) -> &[Operation] {
        &self.tasks
    }

    /// The task with the given id.
    ///
    /// # Panics
    /// Panics if `id >= task_count()`.
    pub fn task(&self, id: TaskId) -> &Operation {
        &self.tasks[id]
    }

    /// Duration of a task.
    pub fn duration(&self, id: TaskId) -> i64 {
        self.tasks[id].duration
    }

    /// Task ids of a job, in processing order.
    pub fn job_tasks(&self, job: usize) -> Range<TaskId> {
        self.job_starts[job]..self.job_starts[job + 1]
    }

    /// Looks up the id of task `index` of `job`.
    pub fn task_id(&self, job: usize, index: usize) -> Option<TaskId> {
        if job >= self.job_count() {
            return None;
        }
        let range = self.job_tasks(job);
        let id = range.start + index;
        range.contains(&id).then_some(id)
    }

    /// The job successor of a task, if any.
    pub fn next_in_job(&self, id: TaskId) -> Option<TaskId> {
        let next = id + 1;
        (next < self.job_starts[self.tasks[id].job + 1]).then_some(next)
    }

    /// Tasks that use the given machine, in ascending id order.
    pub fn machine_tasks(&self, machine: usize) -> &[TaskId] {
        &self.machine_tasks[machine]
    }

    /// Work remaining in the job from `id` on, including `id` itself.
    pub fn tail(&self, id: TaskId) -> i64 {
        self.tails[id]
    }

    /// Total processing time requested on a machine.
    pub fn machine_load(&self, machine: usize) -> i64 {
        self.machine_tasks[machine]
            .iter()
            .map(|&id| self.tasks[id].duration)
            .sum()
    }

    /// Converts back to the loader representation.
    pub fn to_spec(&self) -> InstanceSpec {
        let jobs = (0..self.job_count())
            .map(|job| {
                self.job_tasks(job)
                    .map(|id| (self.tasks[id].machine, self.tasks[id].duration))
                    .collect()
            })
            .collect();
        InstanceSpec {
            machine_count: self.machine_count,
            jobs,
        }
    }
}

impl TryFrom<InstanceSpec> for ProblemModel {
    type Error = InstanceError;

    fn try_from(spec: InstanceSpec) -> Result<Self, Self::Error> {
        ProblemModel::new(spec.jobs, spec.machine_count)
    }
}

impl From<ProblemModel> for InstanceSpec {
    fn from(problem: ProblemModel) -> Self {
        problem.to_spec()
    }
}
