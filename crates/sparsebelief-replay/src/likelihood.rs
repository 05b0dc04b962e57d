//! Likelihood models the replay harness can feed into a belief.

use std::collections::BTreeMap;

use crate::config::LikelihoodConfig;

/// Evaluates `P(observation | hypothesis)` for string-labelled scenarios.
#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodModel {
    UniformRange,
    Table {
        rows: BTreeMap<String, BTreeMap<String, f64>>,
        default: f64,
    },
}

impl LikelihoodModel {
    pub fn from_config(config: &LikelihoodConfig) -> Self {
        match config {
            LikelihoodConfig::UniformRange => LikelihoodModel::UniformRange,
            LikelihoodConfig::Table { rows, default } => LikelihoodModel::Table {
                rows: rows.clone(),
                default: *default,
            },
        }
    }

    /// Unparseable numbers count as impossible so the hypothesis is pruned.
    pub fn evaluate(&self, observation: &str, key: &str) -> f64 {
        match self {
            LikelihoodModel::UniformRange => {
                let (Ok(x), Ok(k)) = (
                    observation.trim().parse::<f64>(),
                    key.trim().parse::<f64>(),
                ) else {
                    return 0.0;
                };
                if (1.0..=k).contains(&x) { 1.0 / k } else { 0.0 }
            }
            LikelihoodModel::Table { rows, default } => rows
                .get(observation)
                .and_then(|row| row.get(key))
                .copied()
                .unwrap_or(*default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_range_matches_fair_die() {
        let model = LikelihoodModel::UniformRange;
        assert_eq!(model.evaluate("3", "4"), 0.25);
        assert_eq!(model.evaluate("5", "4"), 0.0);
        assert_eq!(model.evaluate("0", "4"), 0.0);
        assert_eq!(model.evaluate("x", "4"), 0.0);
    }

    #[test]
    fn table_falls_back_to_default() {
        let mut row = BTreeMap::new();
        row.insert("rainy".to_string(), 0.8);
        let mut rows = BTreeMap::new();
        rows.insert("umbrella".to_string(), row);
        let model = LikelihoodModel::Table {
            rows,
            default: 0.05,
        };

        assert_eq!(model.evaluate("umbrella", "rainy"), 0.8);
        assert_eq!(model.evaluate("umbrella", "sunny"), 0.05);
        assert_eq!(model.evaluate("coat", "rainy"), 0.05);
    }
}
