//! Sparse Bayesian belief over a discrete set of labelled hypotheses.
//!
//! This module is composed of:
//! - `entry`: the `(key, weight)` pair type and the `Distribution` alias.
//! - `normalize`: pure normalization of weight vectors into probabilities.
//! - `sparse`: the stateful `SparseBelief` with posterior updates and pruning.
//! - `telemetry`: summary metrics (entropy, support size) over a belief.

mod entry;
mod normalize;
mod sparse;
pub mod telemetry;

pub use entry::{Distribution, WeightedEntry};
pub use normalize::{NormalizeError, by_prob, normalize, prob_sum};
pub use sparse::{BeliefError, ConstructionError, SparseBelief};
pub use telemetry::BeliefMetrics;
