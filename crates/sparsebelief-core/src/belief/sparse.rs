//! Stateful belief with Bayesian posterior updates and pruning of dead hypotheses.

use super::entry::{Distribution, WeightedEntry};
use super::normalize::{NormalizeError, by_prob, normalize};
use super::telemetry::BeliefMetrics;
use rand::Rng;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use tracing::{Level, event};

/// A prior weight failed numeric validation. `index` is the entry's position in the prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionError {
    NonNumericWeight { index: usize },
    NonFiniteWeight { index: usize },
    NegativeWeight { index: usize },
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructionError::NonNumericWeight { index } => {
                write!(f, "prior entry {index} has a weight that is not a number")
            }
            ConstructionError::NonFiniteWeight { index } => {
                write!(f, "prior entry {index} has an infinite weight")
            }
            ConstructionError::NegativeWeight { index } => {
                write!(f, "prior entry {index} has a negative weight")
            }
        }
    }
}

impl std::error::Error for ConstructionError {}

/// Failure to build a [`SparseBelief`] from a prior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeliefError {
    Construction(ConstructionError),
    Normalize(NormalizeError),
}

impl fmt::Display for BeliefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeliefError::Construction(err) => write!(f, "invalid prior: {err}"),
            BeliefError::Normalize(err) => write!(f, "prior cannot be normalized: {err}"),
        }
    }
}

impl std::error::Error for BeliefError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BeliefError::Construction(err) => Some(err),
            BeliefError::Normalize(err) => Some(err),
        }
    }
}

impl From<ConstructionError> for BeliefError {
    fn from(err: ConstructionError) -> Self {
        BeliefError::Construction(err)
    }
}

impl From<NormalizeError> for BeliefError {
    fn from(err: NormalizeError) -> Self {
        BeliefError::Normalize(err)
    }
}

/// Probability distribution over hypotheses of type `K`, updated from observations of type `X`.
///
/// Hypotheses whose posterior drops to zero are removed from the live set rather than kept
/// at probability zero, so the distribution only shrinks as observations accumulate.
pub struct SparseBelief<K, X: ?Sized, L> {
    belief: Distribution<K>,
    likelihood: L,
    _observation: PhantomData<fn(&X)>,
}

impl<K, X, L> SparseBelief<K, X, L>
where
    X: ?Sized,
    L: Fn(&X, &K) -> f64,
{
    /// Validates and normalizes `prior`, then pairs it with `likelihood`.
    ///
    /// Every prior weight must be a finite, non-negative number, and the weights must have a
    /// positive total.
    pub fn new<I, E>(prior: I, likelihood: L) -> Result<Self, BeliefError>
    where
        I: IntoIterator<Item = E>,
        E: Into<WeightedEntry<K>>,
    {
        let prior: Distribution<K> = prior.into_iter().map(Into::into).collect();
        validate_prior(&prior)?;
        Ok(Self {
            belief: normalize(prior)?,
            likelihood,
            _observation: PhantomData,
        })
    }

    /// Applies a Bayesian update for `observation`.
    ///
    /// Hypotheses whose unscaled posterior is not strictly positive are pruned. If nothing
    /// survives, or the survivors cannot be normalized, the error is returned and the
    /// current belief is left untouched.
    pub fn observe(&mut self, observation: &X) -> Result<&mut Self, NormalizeError>
    where
        K: Clone,
    {
        let before = self.belief.len();
        let unscaled: Distribution<K> = self
            .belief
            .iter()
            .map(|entry| {
                let weight = entry.weight * (self.likelihood)(observation, &entry.key);
                WeightedEntry::new(entry.key.clone(), weight)
            })
            .filter(|entry| entry.weight > 0.0)
            .collect();
        let survivors = unscaled.len();

        match normalize(unscaled) {
            Ok(posterior) => {
                self.belief = posterior;
                if tracing::enabled!(Level::DEBUG) {
                    event!(
                        target: "sparsebelief::observe",
                        Level::DEBUG,
                        before,
                        after = survivors,
                        pruned = before - survivors,
                    );
                }
                Ok(self)
            }
            Err(err) => {
                event!(
                    target: "sparsebelief::observe",
                    Level::WARN,
                    hypotheses = before,
                    survivors,
                    error = %err,
                    "observation rejected; keeping previous belief"
                );
                Err(err)
            }
        }
    }
}

impl<K, X: ?Sized, L> SparseBelief<K, X, L> {
    /// Probability of the first entry matching `key`, or `0.0` when it is absent.
    pub fn prob(&self, key: &K) -> f64
    where
        K: PartialEq,
    {
        self.belief
            .iter()
            .find(|entry| entry.key == *key)
            .map_or(0.0, |entry| entry.weight)
    }

    /// Live hypothesis keys in current order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.belief.iter().map(|entry| &entry.key)
    }

    /// Sorts hypotheses from most to least probable. Ties keep their relative order.
    pub fn sort(&mut self) -> &mut Self {
        self.sort_by(by_prob)
    }

    /// Stable sort of the hypotheses with a caller-supplied comparator. Never renormalizes.
    pub fn sort_by<F>(&mut self, compare: F) -> &mut Self
    where
        F: FnMut(&WeightedEntry<K>, &WeightedEntry<K>) -> Ordering,
    {
        self.belief.sort_by(compare);
        self
    }

    pub fn entries(&self) -> &[WeightedEntry<K>] {
        &self.belief
    }

    pub fn into_entries(self) -> Distribution<K> {
        self.belief
    }

    pub fn len(&self) -> usize {
        self.belief.len()
    }

    pub fn is_empty(&self) -> bool {
        self.belief.is_empty()
    }

    pub fn likelihood(&self) -> &L {
        &self.likelihood
    }

    pub fn metrics(&self) -> BeliefMetrics {
        BeliefMetrics::from_belief(self)
    }

    /// Draws a hypothesis with probability proportional to its current weight.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&K> {
        pick(&self.belief, rng.gen_range(0.0..1.0))
    }
}

/// Walks cumulative mass until `choice` falls inside an entry.
fn pick<K>(entries: &[WeightedEntry<K>], mut choice: f64) -> Option<&K> {
    for entry in entries {
        if choice < entry.weight {
            return Some(&entry.key);
        }
        choice -= entry.weight;
    }
    // Accumulated rounding can leave a sliver of mass past the final entry; it belongs to the
    // last hypothesis that still carries weight.
    entries
        .iter()
        .rev()
        .find(|entry| entry.weight > 0.0)
        .map(|entry| &entry.key)
}

impl<K, X, L> Clone for SparseBelief<K, X, L>
where
    K: Clone,
    X: ?Sized,
    L: Clone,
{
    fn clone(&self) -> Self {
        Self {
            belief: self.belief.clone(),
            likelihood: self.likelihood.clone(),
            _observation: PhantomData,
        }
    }
}

impl<K: fmt::Debug, X: ?Sized, L> fmt::Debug for SparseBelief<K, X, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseBelief")
            .field("belief", &self.belief)
            .finish_non_exhaustive()
    }
}

fn validate_prior<K>(prior: &[WeightedEntry<K>]) -> Result<(), ConstructionError> {
    for (index, entry) in prior.iter().enumerate() {
        if entry.weight.is_nan() {
            return Err(ConstructionError::NonNumericWeight { index });
        }
        if entry.weight.is_infinite() {
            return Err(ConstructionError::NonFiniteWeight { index });
        }
        if entry.weight < 0.0 {
            return Err(ConstructionError::NegativeWeight { index });
        }
    }
    Ok(())
}
