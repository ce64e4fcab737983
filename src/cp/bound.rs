//! Makespan lower bounds for a search node.

use super::variables::VariableStore;
use crate::model::ProblemModel;

/// Lower bound on the makespan of any completion of `store`.
///
/// The maximum of two relaxations:
///
/// - **Head + tail**: a task cannot start before `start_min` and its job
///   still needs `tail` time units from there.
/// - **Machine load**: a machine cannot start before the earliest head of
///   its tasks, must process all of them, and the last one still has at
///   least the shortest remaining job tail after it.
///
/// On a fully propagated, fully sequenced node the head + tail term equals the
/// makespan of the earliest-start schedule.
pub fn makespan_lower_bound(problem: &ProblemModel, store: &VariableStore) -> i64 {
    let critical_path = (0..problem.task_count())
        .map(|t| store.start_min(t) + problem.tail(t))
        .max()
        .unwrap_or(0);

    let machine_load = (0..problem.machine_count())
        .filter_map(|m| machine_bound(problem, store, m))
        .max()
        .unwrap_or(0);

    critical_path.max(machine_load)
}

fn machine_bound(problem: &ProblemModel, store: &VariableStore, machine: usize) -> Option<i64> {
    let tasks = problem.machine_tasks(machine);
    let head = tasks.iter().map(|&t| store.start_min(t)).min()?;
    let after = tasks
        .iter()
        .map(|&t| problem.tail(t) - problem.duration(t))
        .min()?;
    Some(head + problem.machine_load(machine) + after)
}
