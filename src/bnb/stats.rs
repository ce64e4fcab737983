//! Search statistics.

use crate::cp::Propagation;
use std::time::Duration;

/// Counters collected during one branch-and-bound run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BnbStatistics {
    /// Nodes whose propagation was started.
    pub nodes_explored: u64,
    /// Nodes discarded because propagation emptied a domain.
    pub prunings_infeasible: u64,
    /// Nodes discarded because their lower bound reached the incumbent.
    pub prunings_bound: u64,
    /// Passes over all constraints, those of failed propagations included.
    pub propagation_passes: u64,
    /// Machine orders forced by propagation rather than by branching.
    pub sequences_fixed: u64,
    /// Leaves that improved the incumbent.
    pub solutions_found: u64,
    /// Deepest branching level reached.
    pub max_depth: u64,
    /// Lower bound at the root node.
    pub root_lower_bound: i64,
    /// Wall-clock time of the whole run, warm start included.
    pub time_total: Duration,
}

impl BnbStatistics {
    #[inline]
    pub fn on_node_explored(&mut self, depth: u64) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn on_propagation(&mut self, outcome: Propagation) {
        self.propagation_passes = self.propagation_passes.saturating_add(outcome.passes);
        self.sequences_fixed = self.sequences_fixed.saturating_add(outcome.sequences_fixed);
    }

    #[inline]
    pub fn on_pruning_infeasible(&mut self) {
        self.prunings_infeasible = self.prunings_infeasible.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_solution_found(&mut self) {
        self.solutions_found = self.solutions_found.saturating_add(1);
    }

    /// Adds the counters of a worker run. Root bound and time are kept.
    pub fn merge(&mut self, other: &BnbStatistics) {
        self.nodes_explored = self.nodes_explored.saturating_add(other.nodes_explored);
        self.prunings_infeasible = self
            .prunings_infeasible
            .saturating_add(other.prunings_infeasible);
        self.prunings_bound = self.prunings_bound.saturating_add(other.prunings_bound);
        self.propagation_passes = self
            .propagation_passes
            .saturating_add(other.propagation_passes);
        self.sequences_fixed = self.sequences_fixed.saturating_add(other.sequences_fixed);
        self.solutions_found = self.solutions_found.saturating_add(other.solutions_found);
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

impl std::fmt::Display for BnbStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch-and-Bound Statistics:")?;
        writeln!(f, "  Nodes explored:        {}", self.nodes_explored)?;
        writeln!(f, "  Max depth reached:     {}", self.max_depth)?;
        writeln!(f, "  Prunings (infeasible): {}", self.prunings_infeasible)?;
        writeln!(f, "  Prunings (bound):      {}", self.prunings_bound)?;
        writeln!(f, "  Propagation passes:    {}", self.propagation_passes)?;
        writeln!(f, "  Orders fixed:          {}", self.sequences_fixed)?;
        writeln!(f, "  Solutions found:       {}", self.solutions_found)?;
        writeln!(f, "  Root lower bound:      {}", self.root_lower_bound)?;
        writeln!(f, "  Total time:            {:.2?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = BnbStatistics::default();
        stats.on_node_explored(3);
        stats.on_node_explored(1);
        stats.on_pruning_bound();
        stats.on_pruning_infeasible();
        stats.on_propagation(Propagation {
            passes: 4,
            sequences_fixed: 2,
        });

        assert_eq!(stats.nodes_explored, 2);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.prunings_bound, 1);
        assert_eq!(stats.prunings_infeasible, 1);
        assert_eq!(stats.propagation_passes, 4);
        assert_eq!(stats.sequences_fixed, 2);
    }

    #[test]
    fn test_merge_keeps_root_fields() {
        let mut total = BnbStatistics {
            root_lower_bound: 9,
            max_depth: 2,
            ..Default::default()
        };
        let worker = BnbStatistics {
            nodes_explored: 10,
            solutions_found: 1,
            max_depth: 7,
            root_lower_bound: 100,
            ..Default::default()
        };
        total.merge(&worker);
        total.merge(&worker);

        assert_eq!(total.nodes_explored, 20);
        assert_eq!(total.solutions_found, 2);
        assert_eq!(total.max_depth, 7);
        assert_eq!(total.root_lower_bound, 9);
    }

    #[test]
    fn test_display_lists_counters() {
        let text = BnbStatistics::default().to_string();
        assert!(text.contains("Nodes explored"));
        assert!(text.contains("Root lower bound"));
    }
}
