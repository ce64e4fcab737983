//! Rule composition engine and active schedule construction.

use std::cmp::Ordering;

use tracing::debug;

use super::rules::DispatchRuleKind;
use super::types::{Candidate, DispatchContext, PriorityRule};
use crate::model::{ProblemModel, TaskId};

/// Score differences at or below this are ties.
const SCORE_EPSILON: f64 = 1e-9;

/// Engine for composing and applying multiple priority rules.
///
/// Rules are applied in order. A later rule is only consulted when every
/// earlier rule produces a tie; remaining ties go to the lower item index.
///
/// # Examples
///
/// ```
/// use u_jobshop::dispatching::{Candidate, DispatchContext, Mwkr, RuleEngine, Spt};
///
/// let engine: RuleEngine<Candidate, DispatchContext> =
///     RuleEngine::new().with_rule(Spt).with_rule(Mwkr);
/// assert_eq!(engine.rule_names(), vec!["SPT", "MWKR"]);
/// ```
pub struct RuleEngine<T, C> {
    rules: Vec<Box<dyn PriorityRule<T, C>>>,
}

impl<T, C> RuleEngine<T, C> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule<R: PriorityRule<T, C> + 'static>(self, rule: R) -> Self {
        self.with_boxed_rule(Box::new(rule))
    }

    /// Adds an already boxed rule.
    pub fn with_boxed_rule(mut self, rule: Box<dyn PriorityRule<T, C>>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Sorts items by priority (lowest score first = highest priority).
    ///
    /// Returns indices into the original slice.
    pub fn sort_indices(&self, items: &[T], context: &C) -> Vec<usize> {
        let scores: Vec<Vec<f64>> = items
            .iter()
            .map(|item| self.rules.iter().map(|r| r.score(item, context)).collect())
            .collect();

        let mut indices: Vec<usize> = (0..items.len()).collect();
        indices.sort_by(|&a, &b| {
            for (va, vb) in scores[a].iter().zip(scores[b].iter()) {
                if (va - vb).abs() > SCORE_EPSILON {
                    return va.partial_cmp(vb).unwrap_or(Ordering::Equal);
                }
            }
            a.cmp(&b)
        });

        indices
    }

    /// Returns the index of the highest-priority item, `None` if empty.
    pub fn select_best(&self, items: &[T], context: &C) -> Option<usize> {
        self.sort_indices(items, context).first().copied()
    }
}

impl<T, C> Default for RuleEngine<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete, feasible schedule produced by dispatching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSchedule {
    /// Start time per [`TaskId`].
    pub starts: Vec<i64>,
    pub makespan: i64,
}

/// Giffler–Thompson active schedule builder.
///
/// At each step it finds the ready task with the earliest possible
/// completion `C*` on machine `M*`, collects the ready tasks on `M*` that can
/// start before `C*`, and lets the rule engine pick one of them. Every task
/// is appended behind the last task of its machine and job, so the result is
/// always feasible.
///
/// # References
///
/// Giffler & Thompson (1960), "Algorithms for solving production-scheduling problems"
pub struct ActiveScheduleBuilder {
    engine: RuleEngine<Candidate, DispatchContext>,
}

impl ActiveScheduleBuilder {
    pub fn new(engine: RuleEngine<Candidate, DispatchContext>) -> Self {
        Self { engine }
    }

    /// Engine with `primary` first and `tie_breakers` consulted in order on ties.
    pub fn from_rules(primary: DispatchRuleKind, tie_breakers: &[DispatchRuleKind]) -> Self {
        let mut engine = RuleEngine::new().with_boxed_rule(primary.rule());
        for kind in tie_breakers.iter().filter(|&&k| k != primary) {
            engine = engine.with_boxed_rule(kind.rule());
        }
        Self::new(engine)
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.engine.rule_names()
    }

    /// Builds one schedule for `problem`.
    pub fn build(&self, problem: &ProblemModel) -> DispatchSchedule {
        let n = problem.task_count();
        let mut starts = vec![0; n];
        let mut next: Vec<Option<TaskId>> = (0..problem.job_count())
            .map(|j| Some(problem.job_tasks(j).start))
            .collect();
        let mut job_ready = vec![0i64; problem.job_count()];
        let mut machine_ready = vec![0i64; problem.machine_count()];
        let mut makespan = 0;

        let mut ready = Vec::with_capacity(problem.job_count());
        let mut conflict = Vec::with_capacity(problem.job_count());

        for _ in 0..n {
            ready.clear();
            for (job, slot) in next.iter().enumerate() {
                if let Some(task) = *slot {
                    let op = problem.task(task);
                    ready.push(Candidate {
                        task,
                        job,
                        machine: op.machine,
                        duration: op.duration,
                        earliest_start: job_ready[job].max(machine_ready[op.machine]),
                        remaining_work: problem.tail(task),
                    });
                }
            }

            let Some(pivot) = ready.iter().min_by_key(|c| (c.earliest_end(), c.task)) else {
                break;
            };
            let machine = pivot.machine;
            let context = DispatchContext {
                conflict_end: pivot.earliest_end(),
            };

            conflict.clear();
            conflict.extend(
                ready
                    .iter()
                    .filter(|c| c.machine == machine && c.earliest_start < context.conflict_end)
                    .copied(),
            );

            let chosen = self
                .engine
                .select_best(&conflict, &context)
                .map_or(*pivot, |i| conflict[i]);

            let end = chosen.earliest_end();
            starts[chosen.task] = chosen.earliest_start;
            job_ready[chosen.job] = end;
            machine_ready[chosen.machine] = end;
            next[chosen.job] = problem.next_in_job(chosen.task);
            makespan = makespan.max(end);
        }

        DispatchSchedule { starts, makespan }
    }
}

/// Builds one schedule per rule (each rule primary, the others as tie-breakers)
/// and keeps the shortest. Returns `None` only when `rules` is empty.
pub fn best_dispatch_schedule(
    problem: &ProblemModel,
    rules: &[DispatchRuleKind],
) -> Option<DispatchSchedule> {
    rules
        .iter()
        .map(|&primary| {
            let builder = ActiveScheduleBuilder::from_rules(primary, rules);
            let schedule = builder.build(problem);
            debug!(
                rules = ?builder.rule_names(),
                makespan = schedule.makespan,
                "dispatch schedule built"
            );
            schedule
        })
        .min_by_key(|s| s.makespan)
}
