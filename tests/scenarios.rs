//! End-to-end scenarios through the public API.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use u_jobshop::bnb::{BnbConfig, BnbRunner};
use u_jobshop::model::{GeneratorConfig, ProblemModel};
use u_jobshop::{solve, InstanceError, SolveResult};

fn three_by_three() -> ProblemModel {
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

#[test]
fn three_job_scenario_is_optimal_at_eleven() {
    let problem = three_by_three();
    let result = solve(&problem, 10.0);
    let solution = result.solution().expect("solved");

    assert_eq!(solution.makespan, 11);
    assert!(solution.is_optimal);
    assert_eq!(solution.gap(), 0.0);
    assert_eq!(solution.verify(&problem), Ok(()));
    assert_eq!(result.to_string(), "Optimal(makespan=11)");

    let placed: usize = solution.schedule.values().map(Vec::len).sum();
    assert_eq!(placed, problem.task_count());
    for tasks in solution.schedule.values() {
        assert!(tasks.windows(2).all(|w| w[0].start < w[1].start));
    }
}

#[test]
fn fewer_machines_only_lengthen_the_schedule() {
    // The same two jobs, first on two machines, then squeezed onto one.
    let spread = ProblemModel::new(vec![vec![(0, 4), (1, 3)], vec![(1, 2), (0, 5)]], 2).unwrap();
    let squeezed = ProblemModel::new(vec![vec![(0, 4), (0, 3)], vec![(0, 2), (0, 5)]], 1).unwrap();

    let spread = solve(&spread, f64::INFINITY).into_solution().unwrap();
    let squeezed = solve(&squeezed, f64::INFINITY).into_solution().unwrap();

    assert!(spread.is_optimal && squeezed.is_optimal);
    assert_eq!(squeezed.makespan, 14);
    assert!(spread.makespan <= squeezed.makespan);
}

#[test]
fn malformed_instances_are_rejected_at_construction() {
    assert_eq!(
        ProblemModel::new(vec![vec![(0, 0)]], 1),
        Err(InstanceError::NonPositiveDuration {
            job: 0,
            task: 0,
            duration: 0
        })
    );
    assert_eq!(
        ProblemModel::new(vec![vec![(0, 1)], vec![]], 1),
        Err(InstanceError::EmptyJob { job: 1 })
    );
    assert!(matches!(
        ProblemModel::new(vec![vec![(0, 1), (3, 2)]], 3),
        Err(InstanceError::MachineOutOfRange { machine: 3, .. })
    ));
    assert_eq!(ProblemModel::new(vec![], 0), Err(InstanceError::NoMachines));
}

#[test]
fn empty_instance_solves_to_zero() {
    let problem = ProblemModel::new(vec![], 3).unwrap();
    let solution = solve(&problem, 1.0).into_solution().unwrap();
    assert_eq!(solution.makespan, 0);
    assert!(solution.is_optimal);
    assert!(solution.schedule.values().all(Vec::is_empty));
}

#[test]
fn tight_budget_still_returns_a_valid_schedule() {
    let problem = GeneratorConfig::default()
        .with_size(10, 6)
        .with_seed(2024)
        .generate()
        .unwrap();
    let solution = solve(&problem, 0.01).into_solution().unwrap();

    assert_eq!(solution.verify(&problem), Ok(()));
    assert!(solution.lower_bound <= solution.makespan);
    if !solution.is_optimal {
        assert!(solution.gap() > 0.0);
    }
}

#[test]
fn cancellation_returns_best_found() {
    let problem = GeneratorConfig::default()
        .with_size(6, 4)
        .with_seed(9)
        .generate()
        .unwrap();
    let cancel = Arc::new(AtomicBool::new(true));
    let result = BnbRunner::run_with_cancel(&problem, &BnbConfig::default(), Some(cancel)).unwrap();

    let solution = result.solution().expect("warm start survives cancellation");
    assert_eq!(solution.verify(&problem), Ok(()));
    assert_eq!(solution.stats.nodes_explored, 0);
}

#[test]
fn free_shape_instances_with_machine_revisits() {
    let problem = GeneratorConfig::default()
        .with_size(3, 2)
        .with_operations_per_job(3)
        .with_seed(17)
        .generate()
        .unwrap();
    let result = BnbRunner::run(&problem, &BnbConfig::default()).unwrap();
    assert!(matches!(result, SolveResult::Solved(ref s) if s.is_optimal));
    assert_eq!(result.solution().unwrap().verify(&problem), Ok(()));
}

#[cfg(feature = "serde")]
#[test]
fn instance_and_result_round_trip_through_json() {
    let problem = three_by_three();
    let json = serde_json::to_string(&problem).unwrap();
    let back: ProblemModel = serde_json::from_str(&json).unwrap();
    assert_eq!(back, problem);

    let invalid = r#"{"machine_count":1,"jobs":[[[2,5]]]}"#;
    assert!(serde_json::from_str::<ProblemModel>(invalid).is_err());

    let result = solve(&problem, 10.0);
    let json = serde_json::to_string(&result).unwrap();
    let back: SolveResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
