//! Property tests for the branch-and-bound solver.
//!
//! Optimality is checked against exhaustive enumeration of machine orders,
//! so the instances here are kept tiny.

use proptest::prelude::*;
use u_jobshop::bnb::{BnbConfig, BnbRunner};
use u_jobshop::model::{GeneratorConfig, ProblemModel, TaskId};
use u_jobshop::Solution;

type Jobs = Vec<Vec<(usize, i64)>>;

fn solve(problem: &ProblemModel) -> Solution {
    BnbRunner::run(problem, &BnbConfig::default())
        .unwrap()
        .into_solution()
        .expect("every valid instance has a schedule")
}

fn permutations(items: &[TaskId]) -> Vec<Vec<TaskId>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Makespan of the semi-active schedule for fixed machine orders, or `None`
/// if the orders contradict the job orders.
fn evaluate_orders(problem: &ProblemModel, orders: &[&Vec<TaskId>]) -> Option<i64> {
    let n = problem.task_count();
    let mut arcs: Vec<(TaskId, TaskId)> = (0..n)
        .filter_map(|t| problem.next_in_job(t).map(|next| (t, next)))
        .collect();
    for order in orders {
        arcs.extend(order.windows(2).map(|w| (w[0], w[1])));
    }

    let mut starts = vec![0i64; n];
    for _ in 0..=n {
        let mut changed = false;
        for &(a, b) in &arcs {
            let earliest = starts[a] + problem.duration(a);
            if starts[b] < earliest {
                starts[b] = earliest;
                changed = true;
            }
        }
        if !changed {
            return Some((0..n).map(|t| starts[t] + problem.duration(t)).max().unwrap_or(0));
        }
    }
    None
}

fn brute_force_makespan(problem: &ProblemModel) -> i64 {
    let per_machine: Vec<Vec<Vec<TaskId>>> = (0..problem.machine_count())
        .map(|m| permutations(problem.machine_tasks(m)))
        .collect();

    let mut best = i64::MAX;
    let mut choice = vec![0usize; per_machine.len()];
    loop {
        let orders: Vec<&Vec<TaskId>> = choice
            .iter()
            .zip(&per_machine)
            .map(|(&i, perms)| &perms[i])
            .collect();
        if let Some(makespan) = evaluate_orders(problem, &orders) {
            best = best.min(makespan);
        }

        // Odometer increment over the cartesian product.
        let mut m = 0;
        loop {
            if m == choice.len() {
                return best;
            }
            choice[m] += 1;
            if choice[m] < per_machine[m].len() {
                break;
            }
            choice[m] = 0;
            m += 1;
        }
    }
}

fn tiny_jobs() -> impl Strategy<Value = (Jobs, usize)> {
    (1usize..=3).prop_flat_map(|machines| {
        (
            prop::collection::vec(
                prop::collection::vec((0..machines, 1i64..=6), 1..=2),
                1..=3,
            ),
            Just(machines),
        )
    })
}

fn generated() -> impl Strategy<Value = ProblemModel> {
    (1usize..=4, 1usize..=3, any::<u64>()).prop_map(|(jobs, machines, seed)| {
        GeneratorConfig::default()
            .with_size(jobs, machines)
            .with_durations(1, 9)
            .with_seed(seed)
            .generate()
            .unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_schedule_is_feasible(problem in generated()) {
        let solution = solve(&problem);
        prop_assert!(solution.is_optimal);
        prop_assert_eq!(solution.verify(&problem), Ok(()));

        for job in 0..problem.job_count() {
            let tasks = problem.job_tasks(job);
            for index in 1..tasks.len() {
                let (_, prev) = solution.find(job, index - 1).unwrap();
                let (_, next) = solution.find(job, index).unwrap();
                prop_assert!(next.start >= prev.start + prev.duration);
            }
        }
        for tasks in solution.schedule.values() {
            for w in tasks.windows(2) {
                prop_assert!(w[0].end() <= w[1].start);
            }
        }
    }

    #[test]
    fn prop_makespan_matches_schedule(problem in generated()) {
        let solution = solve(&problem);
        let recomputed = (0..problem.job_count())
            .map(|job| {
                let last = problem.job_tasks(job).len() - 1;
                solution.find(job, last).map(|(_, t)| t.end()).unwrap()
            })
            .max()
            .unwrap_or(0);
        prop_assert_eq!(solution.makespan, recomputed);
    }

    #[test]
    fn prop_optimal_matches_enumeration((jobs, machines) in tiny_jobs()) {
        let problem = ProblemModel::new(jobs, machines).unwrap();
        let solution = solve(&problem);
        prop_assert!(solution.is_optimal);
        prop_assert_eq!(solution.makespan, brute_force_makespan(&problem));
    }

    #[test]
    fn prop_cold_search_finds_same_optimum((jobs, machines) in tiny_jobs()) {
        let problem = ProblemModel::new(jobs, machines).unwrap();
        let warm = solve(&problem);
        let cold = BnbRunner::run(&problem, &BnbConfig::default().with_warm_start(false))
            .unwrap()
            .into_solution()
            .unwrap();
        prop_assert_eq!(warm.makespan, cold.makespan);
    }

    #[test]
    fn prop_resolve_is_idempotent(problem in generated()) {
        let first = solve(&problem);
        let second = solve(&problem);
        prop_assert_eq!(first.makespan, second.makespan);
        prop_assert_eq!(first.is_optimal, second.is_optimal);
    }

    #[test]
    fn prop_longer_task_never_shortens_makespan(
        (jobs, machines) in tiny_jobs(),
        pick in any::<prop::sample::Index>(),
        extra in 1i64..=5,
    ) {
        let base = ProblemModel::new(jobs.clone(), machines).unwrap();
        let target = pick.index(base.task_count());
        let op = *base.task(target);

        let mut longer = jobs;
        longer[op.job][op.index].1 += extra;
        let longer = ProblemModel::new(longer, machines).unwrap();

        prop_assert!(solve(&longer).makespan >= solve(&base).makespan);
    }

    #[test]
    fn prop_single_machine_is_serial(durations in prop::collection::vec(1i64..=9, 1..=6)) {
        let total: i64 = durations.iter().sum();
        let jobs: Jobs = durations.iter().map(|&d| vec![(0, d)]).collect();
        let problem = ProblemModel::new(jobs, 1).unwrap();
        let solution = solve(&problem);
        prop_assert_eq!(solution.makespan, total);
        prop_assert!(solution.is_optimal);
    }
}
