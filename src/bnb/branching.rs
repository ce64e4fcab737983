//! Most-constrained pair branching.
//!
//! Picks the open machine pair whose execution windows overlap the most:
//! those two tasks have the least room to slide past each other, so
//! deciding them first tightens the node the most and exposes failures
//! early. Ties go to the lowest pair index, which keeps the search
//! deterministic.

use crate::cp::{Disjunct, Sequence, VariableStore};

/// One branching decision: the pair and its two orders, preferred first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub pair: usize,
    pub orders: [Sequence; 2],
}

/// Selects the next pair to order, or `None` if every pair is ordered.
pub fn select_branch(store: &VariableStore) -> Option<Branch> {
    let mut best: Option<(usize, i64)> = None;
    for (pair, disjunct) in store.disjuncts().iter().enumerate() {
        if store.sequence(pair) != Sequence::Open {
            continue;
        }
        let overlap = window_overlap(store, disjunct);
        if best.map_or(true, |(_, o)| overlap > o) {
            best = Some((pair, overlap));
        }
    }

    best.map(|(pair, _)| {
        let preferred = preferred_order(store, &store.disjuncts()[pair]);
        Branch {
            pair,
            orders: [preferred, preferred.flipped()],
        }
    })
}

/// Length of the intersection of `[start_min, end_max]` of both tasks.
/// Negative when the windows are disjoint.
fn window_overlap(store: &VariableStore, d: &Disjunct) -> i64 {
    let lo = store.start_min(d.first).max(store.start_min(d.second));
    let hi = store.end_max(d.first).min(store.end_max(d.second));
    hi - lo
}

/// The order leaving more slack between the two tasks; `first` wins ties.
fn preferred_order(store: &VariableStore, d: &Disjunct) -> Sequence {
    let first_before = store.start_max(d.second) - store.end_min(d.first);
    let second_before = store.start_max(d.first) - store.end_min(d.second);
    if first_before >= second_before {
        Sequence::FirstBeforeSecond
    } else {
        Sequence::SecondBeforeFirst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProblemModel;

    #[test]
    fn test_no_branch_when_sequenced() {
        let p = ProblemModel::new(vec![vec![(0, 2)], vec![(1, 2)]], 2).unwrap();
        let store = VariableStore::new(&p);
        assert!(select_branch(&store).is_none());
    }

    #[test]
    fn test_picks_largest_overlap() {
        // Machine 0: tasks 0 and 1; machine 1: tasks 2 and 3.
        let p = ProblemModel::new(
            vec![vec![(0, 2)], vec![(0, 2)], vec![(1, 5)], vec![(1, 5)]],
            2,
        )
        .unwrap();
        let mut store = VariableStore::new(&p);
        // Shift task 1 so the machine 0 windows barely meet.
        store.narrow_start_min(1, 12).unwrap();

        let branch = select_branch(&store).unwrap();
        assert_eq!(branch.pair, store.machine_pairs(1).start);
    }

    #[test]
    fn test_ties_take_lowest_pair() {
        let p = ProblemModel::new(vec![vec![(0, 3)], vec![(0, 3)], vec![(0, 3)]], 1).unwrap();
        let store = VariableStore::new(&p);
        let branch = select_branch(&store).unwrap();
        assert_eq!(branch.pair, 0);
        assert_eq!(
            branch.orders,
            [Sequence::FirstBeforeSecond, Sequence::SecondBeforeFirst]
        );
    }

    #[test]
    fn test_prefers_order_with_more_slack() {
        let p = ProblemModel::new(vec![vec![(0, 2)], vec![(0, 2)]], 1).unwrap();
        let mut store = VariableStore::new(&p);
        // Task 0 cannot start before 1, task 1 must start by 1: task 1 goes first.
        store.narrow_start_min(0, 1).unwrap();
        store.narrow_start_max(1, 1).unwrap();
        let branch = select_branch(&store).unwrap();
        assert_eq!(branch.orders[0], Sequence::SecondBeforeFirst);
        assert_eq!(branch.orders[1], Sequence::FirstBeforeSecond);
    }

    #[test]
    fn test_skips_fixed_pairs() {
        let p = ProblemModel::new(vec![vec![(0, 3)], vec![(0, 3)], vec![(0, 3)]], 1).unwrap();
        let mut store = VariableStore::new(&p);
        store.fix_sequence(0, Sequence::FirstBeforeSecond).unwrap();
        assert_eq!(select_branch(&store).unwrap().pair, 1);
    }
}
