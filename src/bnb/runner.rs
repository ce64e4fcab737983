//! Branch-and-bound execution engine.
//!
//! # Algorithm
//!
//! 1. Propagate the root with the horizon as deadline and record the root
//!    lower bound.
//! 2. Optionally install the best dispatching schedule as incumbent.
//! 3. Depth-first search; at each node:
//!    a. Poll the deadline and the cancel flag
//!    b. Propagate with deadline `incumbent - 1`; prune on an empty domain
//!    c. Prune if the lower bound reaches the incumbent
//!    d. If every machine pair is ordered, the earliest starts form a
//!       schedule strictly better than the incumbent; install it
//!    e. Otherwise branch on the most constrained pair, preferred order
//!       first, each child inside its own checkpoint
//! 4. A search that runs out proves the incumbent optimal.
//!
//! With the `parallel` feature, the first `split_depth` branching levels are
//! enumerated on the calling thread and the open subtrees are solved on the
//! rayon pool, sharing one [`SharedIncumbent`].
//!
//! # References
//!
//! Carlier & Pinson (1989), "An algorithm for solving the job-shop problem"
//! Brucker, Jurisch & Sievers (1994), "A branch and bound algorithm for the
//! job-shop scheduling problem"

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::branching::select_branch;
use super::config::BnbConfig;
use super::incumbent::{Incumbent, SharedIncumbent};
use super::stats::BnbStatistics;
use crate::cp::{makespan_lower_bound, Propagation, Propagator, Sequence, VariableStore};
use crate::dispatching::best_dispatch_schedule;
use crate::error::ConfigError;
use crate::model::ProblemModel;
use crate::report::{SolveResult, Solution};

/// Branch-and-bound runner.
pub struct BnbRunner;

impl BnbRunner {
    /// Solves `problem` under `config`.
    ///
    /// # Examples
    ///
    /// ```
    /// use u_jobshop::bnb::{BnbConfig, BnbRunner};
    /// use u_jobshop::model::ProblemModel;
    ///
    /// let jobs = vec![vec![(0, 3), (1, 2)], vec![(1, 4), (0, 1)]];
    /// let problem = ProblemModel::new(jobs, 2).unwrap();
    /// let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
    /// let solution = result.solution().unwrap();
    /// assert!(solution.is_optimal);
    /// assert_eq!(solution.makespan, 6);
    /// ```
    pub fn run(problem: &ProblemModel, config: &BnbConfig) -> Result<SolveResult, ConfigError> {
        Self::run_with_cancel(problem, config, None)
    }

    /// Solves `problem` with an optional cancellation token.
    ///
    /// If `cancel` is set to `true` the search stops at the next poll and
    /// returns the best schedule found so far, flagged non-optimal.
    ///
    /// # Errors
    /// [`ConfigError`] if `config` does not validate.
    pub fn run_with_cancel(
        problem: &ProblemModel,
        config: &BnbConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SolveResult, ConfigError> {
        config.validate()?;

        let started = Instant::now();
        let limits = Limits {
            deadline: config
                .time_limit_ms
                .map(|ms| started + Duration::from_millis(ms)),
            cancel,
            stopped: AtomicBool::new(false),
            check_interval: config.node_check_interval,
            log_interval: config.log_interval_ms.map(Duration::from_millis),
            started,
        };

        info!(
            jobs = problem.job_count(),
            machines = problem.machine_count(),
            tasks = problem.task_count(),
            horizon = problem.horizon(),
            "starting branch-and-bound"
        );

        let propagator = Propagator::new(problem);
        let mut stats = BnbStatistics::default();
        let mut root = VariableStore::new(problem);
        {
            let mut probe = root.checkpoint();
            let mut outcome = Propagation::default();
            let result = propagator.propagate_into(&mut probe, problem.horizon(), &mut outcome);
            stats.on_propagation(outcome);
            match result {
                Ok(()) => stats.root_lower_bound = makespan_lower_bound(problem, &probe),
                Err(_) => {
                    info!("root node is infeasible");
                    return Ok(SolveResult::Infeasible);
                }
            }
        }

        let incumbent = SharedIncumbent::new();
        if config.warm_start {
            if let Some(schedule) = best_dispatch_schedule(problem, &config.dispatch_rules) {
                debug!(
                    makespan = schedule.makespan,
                    root_lower_bound = stats.root_lower_bound,
                    "dispatching warm start"
                );
                incumbent.try_install(Incumbent {
                    makespan: schedule.makespan,
                    starts: schedule.starts,
                });
            }
        }

        let mut search = Search::new(problem, &incumbent, &limits);
        if config.parallel {
            search_parallel(&mut search, &mut root, config.split_depth);
        } else {
            search.explore(&mut root, 0);
        }
        stats.merge(&search.stats);
        stats.time_total = started.elapsed();

        let stopped = limits.stopped.load(Ordering::Relaxed);
        let root_lower_bound = stats.root_lower_bound;
        let result = match incumbent.into_inner() {
            Some(best) => {
                let is_optimal = !stopped || best.makespan <= root_lower_bound;
                SolveResult::Solved(Solution::from_starts(
                    problem,
                    &best.starts,
                    is_optimal,
                    root_lower_bound,
                    stats,
                ))
            }
            None if stopped => SolveResult::Unknown,
            None => SolveResult::Infeasible,
        };

        match &result {
            SolveResult::Solved(solution) => info!(
                makespan = solution.makespan,
                optimal = solution.is_optimal,
                lower_bound = solution.lower_bound,
                nodes = solution.stats.nodes_explored,
                elapsed_ms = solution.stats.time_total.as_millis() as u64,
                "branch-and-bound finished"
            ),
            other => info!(result = %other, stopped, "branch-and-bound finished"),
        }
        Ok(result)
    }
}

/// Deadline, cancellation and progress settings shared by all workers.
struct Limits {
    started: Instant,
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
    /// Set once any worker observes the deadline or the cancel flag.
    stopped: AtomicBool,
    check_interval: u64,
    log_interval: Option<Duration>,
}

impl Limits {
    fn poll(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if expired || cancelled {
            debug!(expired, cancelled, "search interrupted");
            self.stopped.store(true, Ordering::Relaxed);
        }
        expired || cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Depth-first search over one store; one per worker.
struct Search<'a> {
    problem: &'a ProblemModel,
    propagator: Propagator<'a>,
    incumbent: &'a SharedIncumbent,
    limits: &'a Limits,
    stats: BnbStatistics,
    nodes_since_check: u64,
    last_log: Instant,
}

impl<'a> Search<'a> {
    fn new(problem: &'a ProblemModel, incumbent: &'a SharedIncumbent, limits: &'a Limits) -> Self {
        Self {
            problem,
            propagator: Propagator::new(problem),
            incumbent,
            limits,
            stats: BnbStatistics::default(),
            nodes_since_check: 0,
            last_log: Instant::now(),
        }
    }

    /// Best makespan to beat. Without an incumbent the horizon is always
    /// reachable, so `horizon + 1` keeps the serial schedule in play.
    fn upper_bound(&self) -> i64 {
        self.incumbent
            .upper_bound()
            .min(self.problem.horizon().saturating_add(1))
    }

    fn should_stop(&mut self) -> bool {
        let poll = self.nodes_since_check % self.limits.check_interval == 0;
        self.nodes_since_check += 1;
        if !poll {
            return self.limits.stopped.load(Ordering::Relaxed);
        }
        self.log_progress();
        self.limits.poll()
    }

    fn log_progress(&mut self) {
        let Some(interval) = self.limits.log_interval else {
            return;
        };
        if self.last_log.elapsed() >= interval {
            self.last_log = Instant::now();
            debug!(
                nodes = self.stats.nodes_explored,
                upper_bound = self.incumbent.upper_bound(),
                max_depth = self.stats.max_depth,
                elapsed_ms = self.limits.started.elapsed().as_millis() as u64,
                "search progress"
            );
        }
    }

    /// Propagates `node` and decides what to do with it. Returns the branch
    /// to take, or `None` when the node is pruned or a leaf.
    fn evaluate(&mut self, node: &mut VariableStore, depth: u64) -> Option<[(usize, Sequence); 2]> {
        self.stats.on_node_explored(depth);
        let upper_bound = self.upper_bound();

        let mut outcome = Propagation::default();
        let result = self.propagator.propagate_into(node, upper_bound - 1, &mut outcome);
        self.stats.on_propagation(outcome);
        if result.is_err() {
            self.stats.on_pruning_infeasible();
            return None;
        }

        if makespan_lower_bound(self.problem, node) >= upper_bound {
            self.stats.on_pruning_bound();
            return None;
        }

        if node.is_fully_sequenced() {
            self.record_leaf(node);
            return None;
        }

        select_branch(node).map(|b| b.orders.map(|order| (b.pair, order)))
    }

    fn record_leaf(&mut self, node: &VariableStore) {
        let starts = node.earliest_starts();
        let makespan = (0..node.task_count())
            .map(|t| node.end_min(t))
            .max()
            .unwrap_or(0);

        #[cfg(debug_assertions)]
        {
            let check =
                Solution::from_starts(self.problem, &starts, false, 0, BnbStatistics::default());
            debug_assert_eq!(check.verify(self.problem), Ok(()));
        }

        if self.incumbent.try_install(Incumbent { makespan, starts }) {
            self.stats.on_solution_found();
            debug!(makespan, nodes = self.stats.nodes_explored, "new incumbent");
        }
    }

    fn explore(&mut self, node: &mut VariableStore, depth: u64) -> Flow {
        if self.should_stop() {
            return Flow::Stop;
        }
        let Some(children) = self.evaluate(node, depth) else {
            return Flow::Continue;
        };
        for (pair, order) in children {
            let mut child = node.checkpoint();
            if child.fix_sequence(pair, order).is_err() {
                self.stats.on_pruning_infeasible();
                continue;
            }
            if self.explore(&mut child, depth + 1) == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Like [`explore`](Self::explore) but stops at `split_depth` and records
    /// the decisions leading to each open subtree.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    fn collect_subtrees(
        &mut self,
        node: &mut VariableStore,
        depth: u64,
        split_depth: u64,
        path: &mut Vec<(usize, Sequence)>,
        subtrees: &mut Vec<Vec<(usize, Sequence)>>,
    ) -> Flow {
        if depth == split_depth {
            subtrees.push(path.clone());
            return Flow::Continue;
        }
        if self.should_stop() {
            return Flow::Stop;
        }
        let Some(children) = self.evaluate(node, depth) else {
            return Flow::Continue;
        };
        for (pair, order) in children {
            let mut child = node.checkpoint();
            if child.fix_sequence(pair, order).is_err() {
                self.stats.on_pruning_infeasible();
                continue;
            }
            path.push((pair, order));
            let flow = self.collect_subtrees(&mut child, depth + 1, split_depth, path, subtrees);
            path.pop();
            if flow == Flow::Stop {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }
}

#[cfg(feature = "parallel")]
fn search_parallel(search: &mut Search<'_>, root: &mut VariableStore, split_depth: usize) {
    use rayon::prelude::*;

    let mut subtrees = Vec::new();
    let flow = search.collect_subtrees(root, 0, split_depth as u64, &mut Vec::new(), &mut subtrees);
    if flow == Flow::Stop || subtrees.is_empty() {
        return;
    }
    debug!(subtrees = subtrees.len(), split_depth, "solving subtrees in parallel");

    let (problem, incumbent, limits) = (search.problem, search.incumbent, search.limits);
    let worker_stats: Vec<BnbStatistics> = subtrees
        .par_iter()
        .map(|path| {
            let mut worker = Search::new(problem, incumbent, limits);
            let mut store = VariableStore::new(problem);
            // Every recorded decision was open on its path, so fixing on a
            // fresh store succeeds; propagation then rebuilds the node.
            if path
                .iter()
                .all(|&(pair, order)| store.fix_sequence(pair, order).is_ok())
            {
                worker.explore(&mut store, split_depth as u64);
            }
            worker.stats
        })
        .collect();

    for stats in &worker_stats {
        search.stats.merge(stats);
    }
}

#[cfg(not(feature = "parallel"))]
fn search_parallel(search: &mut Search<'_>, root: &mut VariableStore, _split_depth: usize) {
    debug!("built without the `parallel` feature; searching sequentially");
    search.explore(root, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::DispatchRuleKind;
    use crate::model::GeneratorConfig;

    fn scenario() -> ProblemModel {
        ProblemModel::new(
            vec![
                vec![(0, 3), (1, 2), (2, 2)],
                vec![(0, 2), (2, 1), (1, 4)],
                vec![(1, 4), (2, 3)],
            ],
            3,
        )
        .unwrap()
    }

    fn solve(problem: &ProblemModel, config: &BnbConfig) -> Solution {
        BnbRunner::run(problem, config)
            .unwrap()
            .into_solution()
            .expect("a schedule")
    }

    #[test]
    fn test_scenario_is_optimal_at_11() {
        let p = scenario();
        let solution = solve(&p, &BnbConfig::default());
        assert_eq!(solution.makespan, 11);
        assert!(solution.is_optimal);
        assert_eq!(solution.lower_bound, 11);
        assert!(solution.verify(&p).is_ok());
    }

    #[test]
    fn test_cold_start_matches_warm_start() {
        let p = scenario();
        let cold = solve(&p, &BnbConfig::default().with_warm_start(false));
        assert_eq!(cold.makespan, 11);
        assert!(cold.is_optimal);
        assert!(cold.stats.solutions_found >= 1);
    }

    #[test]
    fn test_single_machine_is_serial() {
        let p = ProblemModel::new(vec![vec![(0, 3)], vec![(0, 4)], vec![(0, 2)]], 1).unwrap();
        let solution = solve(&p, &BnbConfig::default());
        assert_eq!(solution.makespan, 9);
        assert!(solution.is_optimal);
    }

    #[test]
    fn test_zero_jobs() {
        let p = ProblemModel::new(vec![], 2).unwrap();
        for warm in [true, false] {
            let solution = solve(&p, &BnbConfig::default().with_warm_start(warm));
            assert_eq!(solution.makespan, 0);
            assert!(solution.is_optimal);
            assert_eq!(solution.schedule.len(), 2);
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let p = scenario();
        let config = BnbConfig::default().with_node_check_interval(0);
        assert_eq!(
            BnbRunner::run(&p, &config),
            Err(ConfigError::ZeroCheckInterval)
        );
    }

    #[test]
    fn test_zero_budget_returns_warm_start() {
        let p = GeneratorConfig::default()
            .with_size(8, 5)
            .with_seed(3)
            .generate()
            .unwrap();
        let solution = solve(&p, &BnbConfig::default().with_time_limit_ms(0));
        assert!(solution.verify(&p).is_ok());
        assert_eq!(solution.stats.nodes_explored, 0);
        assert!(solution.lower_bound <= solution.makespan);
        assert_eq!(solution.is_optimal, solution.makespan == solution.lower_bound);
    }

    #[test]
    fn test_zero_budget_without_warm_start_is_unknown() {
        let p = scenario();
        let config = BnbConfig::default()
            .with_time_limit_ms(0)
            .with_warm_start(false);
        assert_eq!(BnbRunner::run(&p, &config).unwrap(), SolveResult::Unknown);
    }

    #[test]
    fn test_cancel_flag_stops_search() {
        let p = scenario();
        let cancel = Arc::new(AtomicBool::new(true));
        let config = BnbConfig::default().with_warm_start(false);
        let result = BnbRunner::run_with_cancel(&p, &config, Some(cancel)).unwrap();
        assert_eq!(result, SolveResult::Unknown);
    }

    #[test]
    fn test_parallel_config_reaches_same_optimum() {
        let p = GeneratorConfig::default()
            .with_size(4, 3)
            .with_seed(11)
            .generate()
            .unwrap();
        let sequential = solve(&p, &BnbConfig::default());
        let parallel = solve(
            &p,
            &BnbConfig::default().with_parallel(true).with_split_depth(2),
        );
        assert!(sequential.is_optimal && parallel.is_optimal);
        assert_eq!(sequential.makespan, parallel.makespan);
        assert!(parallel.verify(&p).is_ok());
    }

    #[test]
    fn test_rule_choice_does_not_change_optimum() {
        let p = scenario();
        for kind in DispatchRuleKind::ALL {
            let solution = solve(&p, &BnbConfig::default().with_dispatch_rules(vec![kind]));
            assert_eq!(solution.makespan, 11, "rule {kind:?}");
        }
    }

    #[test]
    fn test_stats_are_populated() {
        let p = GeneratorConfig::default()
            .with_size(4, 4)
            .with_seed(5)
            .generate()
            .unwrap();
        let solution = solve(&p, &BnbConfig::default().with_warm_start(false));
        assert!(solution.stats.nodes_explored >= 1);
        assert!(solution.stats.propagation_passes >= solution.stats.nodes_explored);
        assert!(solution.stats.root_lower_bound <= solution.makespan);
    }

    #[test]
    fn test_pruned_nodes_count_their_passes() {
        // Every order of three equal tasks on one machine is optimal.
        let p = ProblemModel::new(vec![vec![(0, 2)], vec![(0, 2)], vec![(0, 2)]], 1).unwrap();
        let solution = solve(&p, &BnbConfig::default().with_warm_start(false));
        let stats = &solution.stats;
        assert_eq!(solution.makespan, 6);
        assert!(stats.nodes_explored >= 1);
        // The root probe runs at least one pass on top of every node.
        assert!(stats.propagation_passes > stats.nodes_explored);
    }
}
