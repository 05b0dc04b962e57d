//! Normalization of weighted hypothesis sequences into probability distributions.

use super::entry::{Distribution, WeightedEntry};
use std::cmp::Ordering;
use std::fmt;

/// Reasons a weight sequence cannot be rescaled into a probability distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// The sum is NaN: some weight was not a number, or infinities of both signs cancelled.
    SumNotNumeric,
    /// The weights sum to exactly zero. An empty sequence also lands here.
    SumZero,
    /// The sum overflowed or an input weight was infinite.
    SumNonFinite,
    SumNegative,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::SumNotNumeric => {
                write!(f, "distribution weights did not sum to a number")
            }
            NormalizeError::SumZero => write!(f, "distribution weights sum to zero"),
            NormalizeError::SumNonFinite => write!(f, "distribution weights sum to infinity"),
            NormalizeError::SumNegative => write!(f, "distribution weights sum to a negative"),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Sums the weights of `dist` in sequence order.
pub fn prob_sum<K>(dist: &[WeightedEntry<K>]) -> f64 {
    let mut sum = 0.0;
    for entry in dist {
        sum += entry.weight;
    }
    sum
}

/// Rescales `dist` so its weights sum to one, preserving order and keys.
///
/// Only the aggregate weight is validated. Checks run in a fixed priority order:
/// NaN, exact zero, infinite, negative. An individual zero weight with a nonzero
/// total maps to exactly zero.
pub fn normalize<K>(dist: Distribution<K>) -> Result<Distribution<K>, NormalizeError> {
    let sum = prob_sum(&dist);
    // NaN is its own kind and is checked before infinity; it never maps to SumNonFinite.
    if sum.is_nan() {
        return Err(NormalizeError::SumNotNumeric);
    }
    if sum == 0.0 {
        return Err(NormalizeError::SumZero);
    }
    if sum.is_infinite() {
        return Err(NormalizeError::SumNonFinite);
    }
    if sum < 0.0 {
        return Err(NormalizeError::SumNegative);
    }
    Ok(dist
        .into_iter()
        .map(|WeightedEntry { key, weight }| WeightedEntry::new(key, weight / sum))
        .collect())
}

/// Orders entries from most to least probable.
///
/// Uses the IEEE total order so the comparator stays consistent even for
/// subnormal or non-finite weights.
pub fn by_prob<K>(a: &WeightedEntry<K>, b: &WeightedEntry<K>) -> Ordering {
    b.weight.total_cmp(&a.weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn dist(weights: &[f64]) -> Distribution<usize> {
        weights
            .iter()
            .enumerate()
            .map(|(key, &weight)| WeightedEntry::new(key, weight))
            .collect()
    }

    fn weights(dist: &[WeightedEntry<usize>]) -> Vec<f64> {
        dist.iter().map(|entry| entry.weight).collect()
    }

    #[test]
    fn rejects_negative_sum() {
        assert_eq!(normalize(dist(&[-1.0])), Err(NormalizeError::SumNegative));
        assert_eq!(
            normalize(dist(&[0.5, -2.0, 1.0])),
            Err(NormalizeError::SumNegative)
        );
    }

    #[test]
    fn rejects_infinite_sum() {
        assert_eq!(
            normalize(dist(&[1.0, f64::INFINITY, 0.5])),
            Err(NormalizeError::SumNonFinite)
        );
        assert_eq!(
            normalize(dist(&[f64::MAX, f64::MAX])),
            Err(NormalizeError::SumNonFinite)
        );
    }

    #[test]
    fn rejects_non_numeric_sum() {
        assert_eq!(
            normalize(dist(&[1.0, f64::NAN])),
            Err(NormalizeError::SumNotNumeric)
        );
        assert_eq!(
            normalize(dist(&[f64::INFINITY, f64::NEG_INFINITY])),
            Err(NormalizeError::SumNotNumeric)
        );
    }

    #[test]
    fn rejects_zero_sum() {
        assert_eq!(
            normalize(dist(&[0.0, 0.0, 0.0])),
            Err(NormalizeError::SumZero)
        );
        assert_eq!(normalize(dist(&[])), Err(NormalizeError::SumZero));
    }

    #[test]
    fn negative_infinity_reports_non_finite_before_negative() {
        assert_eq!(
            normalize(dist(&[1.0, f64::NEG_INFINITY])),
            Err(NormalizeError::SumNonFinite)
        );
    }

    #[test]
    fn uniform_weights_become_quarters() {
        let normalized = normalize(dist(&[1.0, 1.0, 1.0, 1.0])).expect("valid");
        assert_eq!(weights(&normalized), vec![0.25, 0.25, 0.25, 0.25]);
        let keys: Vec<usize> = normalized.iter().map(|entry| entry.key).collect();
        assert_eq!(keys, vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_weight_passes_through_as_exact_zero() {
        let normalized = normalize(dist(&[0.0, 0.5])).expect("valid");
        assert_eq!(
            normalized,
            vec![WeightedEntry::new(0, 0.0), WeightedEntry::new(1, 1.0)]
        );
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let normalized = normalize(dist(&[0.1, 3.7, 12.0, 1e-3, 0.0, 42.5])).expect("valid");
        assert!((prob_sum(&normalized) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn scaling_inputs_does_not_change_output() {
        let base = [0.3, 1.2, 4.0, 0.0, 7.5];
        let reference = normalize(dist(&base)).expect("valid");
        for scale in [1e-6, 0.5, 3.0, 1e6] {
            let scaled: Vec<f64> = base.iter().map(|w| w * scale).collect();
            let normalized = normalize(dist(&scaled)).expect("valid");
            for (a, b) in reference.iter().zip(&normalized) {
                assert_eq!(a.key, b.key);
                assert!((a.weight - b.weight).abs() < TOLERANCE, "scale {scale}");
            }
        }
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let once = normalize(dist(&[2.0, 5.0, 0.25, 9.0])).expect("valid");
        let twice = normalize(once.clone()).expect("still valid");
        for (a, b) in once.iter().zip(&twice) {
            assert!((a.weight - b.weight).abs() < TOLERANCE);
        }
    }

    #[test]
    fn only_the_sum_is_validated() {
        let normalized = normalize(dist(&[-1.0, 2.0])).expect("positive sum");
        assert_eq!(weights(&normalized), vec![-1.0, 2.0]);
    }

    #[test]
    fn by_prob_orders_descending() {
        let mut entries = dist(&[0.25, 0.5, 0.25]);
        entries.sort_by(by_prob);
        assert_eq!(entries[0], WeightedEntry::new(1, 0.5));
        assert_eq!(entries[1].key, 0);
        assert_eq!(entries[2].key, 2);
    }
}
