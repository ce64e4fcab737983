//! Solve results and per-machine schedules.
//!
//! The solver works on start times indexed by task id; this module turns
//! them into the caller-facing shape: for every machine, the tasks it runs
//! ordered by start time.

use crate::bnb::BnbStatistics;
use crate::model::ProblemModel;
use std::collections::BTreeMap;
use thiserror::Error;

/// Outcome of a solve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolveResult {
    /// A complete schedule; see [`Solution::is_optimal`].
    Solved(Solution),
    /// No schedule exists.
    Infeasible,
    /// The budget ran out before any schedule was found.
    Unknown,
}

impl SolveResult {
    /// The schedule, if one was found.
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveResult::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SolveResult::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.solution().is_some_and(|s| s.is_optimal)
    }
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveResult::Solved(s) if s.is_optimal => write!(f, "Optimal(makespan={})", s.makespan),
            SolveResult::Solved(s) => write!(
                f,
                "Feasible(makespan={}, lower_bound={})",
                s.makespan, s.lower_bound
            ),
            SolveResult::Infeasible => write!(f, "Infeasible"),
            SolveResult::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One task placed on a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduledTask {
    pub job_id: usize,
    pub task_index: usize,
    pub start: i64,
    pub duration: i64,
}

impl ScheduledTask {
    pub fn end(&self) -> i64 {
        self.start + self.duration
    }
}

impl std::fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(Job: {}, Task: {}, Start: {}, End: {})",
            self.job_id,
            self.task_index,
            self.start,
            self.end()
        )
    }
}

/// A complete schedule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Solution {
    /// Completion time of the last task.
    pub makespan: i64,
    /// Whether no shorter schedule exists.
    pub is_optimal: bool,
    /// Best proven lower bound; equals `makespan` when optimal.
    pub lower_bound: i64,
    /// Tasks per machine id, ordered by `(start, job_id, task_index)`.
    /// Every machine has an entry, possibly empty.
    pub schedule: BTreeMap<usize, Vec<ScheduledTask>>,
    pub stats: BnbStatistics,
}

/// A defect found by [`Solution::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error("task {task_index} of job {job_id} is missing or scheduled more than once")]
    TaskCount { job_id: usize, task_index: usize },

    #[error("task {task_index} of job {job_id} is listed on machine {found}, expected {expected}")]
    WrongMachine {
        job_id: usize,
        task_index: usize,
        expected: usize,
        found: usize,
    },

    #[error("task {task_index} of job {job_id} has duration {found}, expected {expected}")]
    WrongDuration {
        job_id: usize,
        task_index: usize,
        expected: i64,
        found: i64,
    },

    #[error("task {task_index} of job {job_id} starts at negative time {start}")]
    NegativeStart {
        job_id: usize,
        task_index: usize,
        start: i64,
    },

    #[error("task {task_index} of job {job_id} starts before its predecessor ends")]
    Precedence { job_id: usize, task_index: usize },

    #[error("tasks of jobs {first_job} and {second_job} overlap on machine {machine}")]
    Overlap {
        machine: usize,
        first_job: usize,
        second_job: usize,
    },

    #[error("reported makespan {reported} differs from the schedule's {actual}")]
    Makespan { reported: i64, actual: i64 },
}

impl Solution {
    /// Builds the per-machine view from start times indexed by task id.
    pub(crate) fn from_starts(
        problem: &ProblemModel,
        starts: &[i64],
        is_optimal: bool,
        lower_bound: i64,
        stats: BnbStatistics,
    ) -> Self {
        let mut schedule: BTreeMap<usize, Vec<ScheduledTask>> =
            (0..problem.machine_count()).map(|m| (m, Vec::new())).collect();
        let mut makespan = 0;

        for (op, &start) in problem.tasks().iter().zip(starts) {
            let task = ScheduledTask {
                job_id: op.job,
                task_index: op.index,
                start,
                duration: op.duration,
            };
            makespan = makespan.max(task.end());
            schedule.entry(op.machine).or_default().push(task);
        }
        for tasks in schedule.values_mut() {
            tasks.sort_by_key(|t| (t.start, t.job_id, t.task_index));
        }

        Self {
            makespan,
            is_optimal,
            lower_bound: if is_optimal { makespan } else { lower_bound.min(makespan) },
            schedule,
            stats,
        }
    }

    /// Relative optimality gap `(makespan - lower_bound) / makespan`.
    pub fn gap(&self) -> f64 {
        if self.makespan <= 0 {
            return 0.0;
        }
        (self.makespan - self.lower_bound) as f64 / self.makespan as f64
    }

    /// The scheduled task for `(job, index)`, with its machine.
    pub fn find(&self, job_id: usize, task_index: usize) -> Option<(usize, &ScheduledTask)> {
        self.schedule.iter().find_map(|(&machine, tasks)| {
            tasks
                .iter()
                .find(|t| t.job_id == job_id && t.task_index == task_index)
                .map(|t| (machine, t))
        })
    }

    /// Checks the schedule against `problem` without trusting the solver.
    ///
    /// Every task must appear exactly once on its own machine with its own
    /// duration; job order and machine exclusivity must hold; `makespan`
    /// must match the latest end. Two tasks starting at the same time on
    /// one machine count as an overlap.
    pub fn verify(&self, problem: &ProblemModel) -> Result<(), ScheduleViolation> {
        let mut starts: Vec<Option<i64>> = vec![None; problem.task_count()];

        for (&machine, tasks) in &self.schedule {
            for t in tasks {
                let id = problem
                    .task_id(t.job_id, t.task_index)
                    .ok_or(ScheduleViolation::TaskCount {
                        job_id: t.job_id,
                        task_index: t.task_index,
                    })?;
                let op = problem.task(id);
                if op.machine != machine {
                    return Err(ScheduleViolation::WrongMachine {
                        job_id: t.job_id,
                        task_index: t.task_index,
                        expected: op.machine,
                        found: machine,
                    });
                }
                if op.duration != t.duration {
                    return Err(ScheduleViolation::WrongDuration {
                        job_id: t.job_id,
                        task_index: t.task_index,
                        expected: op.duration,
                        found: t.duration,
                    });
                }
                if t.start < 0 {
                    return Err(ScheduleViolation::NegativeStart {
                        job_id: t.job_id,
                        task_index: t.task_index,
                        start: t.start,
                    });
                }
                if starts[id].replace(t.start).is_some() {
                    return Err(ScheduleViolation::TaskCount {
                        job_id: t.job_id,
                        task_index: t.task_index,
                    });
                }
            }

            let mut ordered: Vec<&ScheduledTask> = tasks.iter().collect();
            ordered.sort_by_key(|t| t.start);
            for w in ordered.windows(2) {
                if w[0].end() > w[1].start || w[0].start == w[1].start {
                    return Err(ScheduleViolation::Overlap {
                        machine,
                        first_job: w[0].job_id,
                        second_job: w[1].job_id,
                    });
                }
            }
        }

        let mut actual = 0;
        for (id, op) in problem.tasks().iter().enumerate() {
            let start = starts[id].ok_or(ScheduleViolation::TaskCount {
                job_id: op.job,
                task_index: op.index,
            })?;
            if let Some(next) = problem.next_in_job(id) {
                if let Some(next_start) = starts[next] {
                    if start + op.duration > next_start {
                        return Err(ScheduleViolation::Precedence {
                            job_id: op.job,
                            task_index: op.index + 1,
                        });
                    }
                }
            }
            actual = actual.max(start + op.duration);
        }

        if actual != self.makespan {
            return Err(ScheduleViolation::Makespan {
                reported: self.makespan,
                actual,
            });
        }
        Ok(())
    }
}
