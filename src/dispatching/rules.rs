//! Job-shop priority rules.
//!
//! # References
//!
//! Panwalkar & Iskander (1977), "A survey of scheduling rules"

use super::types::{Candidate, DispatchContext, PriorityRule};

/// Built-in rules, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispatchRuleKind {
    /// Shortest processing time first.
    ShortestProcessingTime,
    /// Longest processing time first.
    LongestProcessingTime,
    /// Most work remaining in the job first.
    MostWorkRemaining,
    /// Earliest possible start first.
    EarliestStart,
    /// Earliest possible completion first.
    EarliestCompletion,
    /// Lowest job index first.
    FirstInFirstOut,
}

impl DispatchRuleKind {
    /// Every built-in rule.
    pub const ALL: [DispatchRuleKind; 6] = [
        DispatchRuleKind::ShortestProcessingTime,
        DispatchRuleKind::LongestProcessingTime,
        DispatchRuleKind::MostWorkRemaining,
        DispatchRuleKind::EarliestStart,
        DispatchRuleKind::EarliestCompletion,
        DispatchRuleKind::FirstInFirstOut,
    ];

    /// Instantiates the rule.
    pub fn rule(self) -> Box<dyn PriorityRule<Candidate, DispatchContext>> {
        match self {
            DispatchRuleKind::ShortestProcessingTime => Box::new(Spt),
            DispatchRuleKind::LongestProcessingTime => Box::new(Lpt),
            DispatchRuleKind::MostWorkRemaining => Box::new(Mwkr),
            DispatchRuleKind::EarliestStart => Box::new(EarliestStart),
            DispatchRuleKind::EarliestCompletion => Box::new(EarliestCompletion),
            DispatchRuleKind::FirstInFirstOut => Box::new(Fifo),
        }
    }
}

/// Shortest processing time.
pub struct Spt;

impl PriorityRule<Candidate, DispatchContext> for Spt {
    fn name(&self) -> &str {
        "SPT"
    }
    fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
        c.duration as f64
    }
}

/// Longest processing time.
pub struct Lpt;

impl PriorityRule<Candidate, DispatchContext> for Lpt {
    fn name(&self) -> &str {
        "LPT"
    }
    fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
        -(c.duration as f64)
    }
}

/// Most work remaining.
pub struct Mwkr;

impl PriorityRule<Candidate, DispatchContext> for Mwkr {
    fn name(&self) -> &str {
        "MWKR"
    }
    fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
        -(c.remaining_work as f64)
    }
}

/// Earliest start.
pub struct EarliestStart;

impl PriorityRule<Candidate, DispatchContext> for EarliestStart {
    fn name(&self) -> &str {
        "EST"
    }
    fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
        c.earliest_start as f64
    }
}

/// Earliest completion, measured from the end of the conflict window.
///
/// The task that defines the window scores 0; tasks that would finish later
/// score their overrun.
pub struct EarliestCompletion;

impl PriorityRule<Candidate, DispatchContext> for EarliestCompletion {
    fn name(&self) -> &str {
        "ECT"
    }
    fn score(&self, c: &Candidate, ctx: &DispatchContext) -> f64 {
        (c.earliest_end() - ctx.conflict_end) as f64
    }
}

/// Lowest job index.
pub struct Fifo;

impl PriorityRule<Candidate, DispatchContext> for Fifo {
    fn name(&self) -> &str {
        "FIFO"
    }
    fn score(&self, c: &Candidate, _ctx: &DispatchContext) -> f64 {
        c.job as f64
    }
}
