//! Constraint propagation layer.
//!
//! Holds the mutable state of a solve and the rules that prune it.
//!
//! # Key Components
//!
//! - **Variables**: [`VariableStore`] with one start [`Domain`] per task and
//!   one [`Sequence`] per machine pair ([`Disjunct`]); [`Checkpoint`] scopes
//!   undo for backtracking.
//! - **Propagation**: [`Propagator`] runs precedence and disjunctive rules to
//!   a fixed point or reports [`DomainEmpty`].
//! - **Bounds**: [`makespan_lower_bound`] for pruning search nodes.
//!
//! # References
//!
//! Baptiste, Le Pape & Nuijten (2001), "Constraint-Based Scheduling"

mod bound;
mod propagator;
mod variables;

pub use bound::makespan_lower_bound;
pub use propagator::{Propagation, Propagator};
pub use variables::{Checkpoint, Disjunct, Domain, DomainEmpty, Sequence, VariableStore};
