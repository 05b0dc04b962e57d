use super::{SparseBelief, WeightedEntry};
use serde::Serialize;

/// Summary statistics of a belief, used for logging and replay output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BeliefMetrics {
    pub hypotheses: usize,
    /// Shannon entropy in nats.
    pub entropy: f64,
    pub max_probability: f64,
}

impl BeliefMetrics {
    pub fn from_belief<K, X: ?Sized, L>(belief: &SparseBelief<K, X, L>) -> Self {
        Self::from_entries(belief.entries())
    }

    pub fn from_entries<K>(entries: &[WeightedEntry<K>]) -> Self {
        let mut entropy = 0.0;
        let mut max_probability: f64 = 0.0;
        for entry in entries {
            if entry.weight > 0.0 {
                entropy -= entry.weight * entry.weight.ln();
            }
            max_probability = max_probability.max(entry.weight);
        }

        Self {
            hypotheses: entries.len(),
            entropy,
            max_probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_belief_has_log_n_entropy() {
        let entries: Vec<_> = (0..4).map(|k| WeightedEntry::new(k, 0.25)).collect();
        let metrics = BeliefMetrics::from_entries(&entries);
        assert_eq!(metrics.hypotheses, 4);
        assert!((metrics.entropy - 4f64.ln()).abs() < 1e-12);
        assert_eq!(metrics.max_probability, 0.25);
    }

    #[test]
    fn belief_metrics_follow_posterior() {
        let mut belief = SparseBelief::new(
            vec![("keep", 1.0), ("drop", 1.0)],
            |_: &(), key: &&str| if *key == "keep" { 1.0 } else { 0.0 },
        )
        .expect("valid prior");
        assert_eq!(BeliefMetrics::from_belief(&belief).hypotheses, 2);

        belief.observe(&()).expect("one survivor");
        let metrics = BeliefMetrics::from_belief(&belief);
        assert_eq!(metrics, belief.metrics());
        assert_eq!(metrics.hypotheses, 1);
        assert_eq!(metrics.max_probability, 1.0);
    }

    #[test]
    fn certain_belief_has_zero_entropy() {
        let metrics = BeliefMetrics::from_entries(&[WeightedEntry::new("only", 1.0)]);
        assert_eq!(metrics.hypotheses, 1);
        assert_eq!(metrics.entropy, 0.0);
        assert_eq!(metrics.max_probability, 1.0);
    }
}
