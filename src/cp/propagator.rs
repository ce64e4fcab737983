//! Bounds propagation for precedence and no-overlap constraints.
//!
//! Three rules run in every pass until a pass changes nothing:
//!
//! 1. **Deadline**: with an upper bound `D` on the makespan, a task cannot
//!    start after `D - tail(t)`, where `tail(t)` is the work left in its job.
//! 2. **Precedence**: for job neighbours `a -> b`,
//!    `start_min(b) >= end_min(a)` and `start_max(a) <= start_max(b) - d(a)`.
//! 3. **Disjunction**: for every pair on one machine, an order that no longer
//!    fits the domains is excluded; if one order remains it is fixed and
//!    enforced like a precedence; if none remains the node is infeasible.
//!
//! Domains only shrink and are bounded, so the loop terminates. A positive
//! cycle through fixed orders keeps pushing start times up until some domain
//! empties, so cyclic orientations are detected as infeasible.
//!
//! # References
//!
//! Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling", ch. 2
//! Carlier & Pinson (1989), "An algorithm for solving the job-shop problem"

use super::variables::{DomainEmpty, Sequence, VariableStore};
use crate::model::{ProblemModel, TaskId};

/// What one call to [`Propagator::propagate`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Passes over all constraints, the final quiet or failing pass included.
    pub passes: u64,
    /// Machine pairs whose order was forced by the domains.
    pub sequences_fixed: u64,
}

/// Fixpoint propagation engine over a [`VariableStore`].
#[derive(Debug, Clone, Copy)]
pub struct Propagator<'p> {
    problem: &'p ProblemModel,
}

impl<'p> Propagator<'p> {
    pub fn new(problem: &'p ProblemModel) -> Self {
        Self { problem }
    }

    /// Tightens `store` until nothing changes, assuming makespan `<= deadline`.
    ///
    /// # Errors
    /// [`DomainEmpty`] when the node admits no schedule within `deadline`.
    /// The store is left partially narrowed; callers run this inside a
    /// [`Checkpoint`](super::Checkpoint) to discard the changes.
    pub fn propagate(
        &self,
        store: &mut VariableStore,
        deadline: i64,
    ) -> Result<Propagation, DomainEmpty> {
        let mut outcome = Propagation::default();
        self.propagate_into(store, deadline, &mut outcome)?;
        Ok(outcome)
    }

    /// Like [`propagate`](Self::propagate), but adds its work to `outcome`
    /// so a failed call still reports the passes it ran.
    ///
    /// # Errors
    /// [`DomainEmpty`] as for [`propagate`](Self::propagate).
    pub fn propagate_into(
        &self,
        store: &mut VariableStore,
        deadline: i64,
        outcome: &mut Propagation,
    ) -> Result<(), DomainEmpty> {
        loop {
            outcome.passes += 1;
            let mut changed = false;

            for task in 0..self.problem.task_count() {
                changed |= store.narrow_start_max(task, deadline - self.problem.tail(task))?;
            }

            for job in 0..self.problem.job_count() {
                let tasks = self.problem.job_tasks(job);
                for a in tasks.start..tasks.end - 1 {
                    changed |= enforce_before(store, a, a + 1)?;
                }
            }

            for pair in 0..store.disjuncts().len() {
                let disjunct = store.disjuncts()[pair];
                let (a, b) = (disjunct.first, disjunct.second);
                match store.sequence(pair) {
                    Sequence::FirstBeforeSecond => changed |= enforce_before(store, a, b)?,
                    Sequence::SecondBeforeFirst => changed |= enforce_before(store, b, a)?,
                    Sequence::Open => {
                        let a_first = store.end_min(a) <= store.start_max(b);
                        let b_first = store.end_min(b) <= store.start_max(a);
                        let forced = match (a_first, b_first) {
                            (false, false) => return Err(DomainEmpty { task: b }),
                            (true, false) => Sequence::FirstBeforeSecond,
                            (false, true) => Sequence::SecondBeforeFirst,
                            (true, true) => continue,
                        };
                        store.fix_sequence(pair, forced)?;
                        outcome.sequences_fixed += 1;
                        changed = true;
                        match forced {
                            Sequence::FirstBeforeSecond => enforce_before(store, a, b)?,
                            _ => enforce_before(store, b, a)?,
                        };
                    }
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }
}

/// Applies `end(before) <= start(after)` in both directions.
fn enforce_before(
    store: &mut VariableStore,
    before: TaskId,
    after: TaskId,
) -> Result<bool, DomainEmpty> {
    let forward = store.narrow_start_min(after, store.end_min(before))?;
    let backward =
        store.narrow_start_max(before, store.start_max(after) - store.duration(before))?;
    Ok(forward || backward)
}
