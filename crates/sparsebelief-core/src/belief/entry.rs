use serde::{Deserialize, Serialize};

/// A hypothesis key paired with its (possibly unnormalized) weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEntry<K> {
    pub key: K,
    pub weight: f64,
}

impl<K> WeightedEntry<K> {
    pub fn new(key: K, weight: f64) -> Self {
        Self { key, weight }
    }
}

impl<K> From<(K, f64)> for WeightedEntry<K> {
    fn from((key, weight): (K, f64)) -> Self {
        Self { key, weight }
    }
}

/// Ordered sequence of weighted hypotheses. Duplicate keys are kept as distinct entries.
pub type Distribution<K> = Vec<WeightedEntry<K>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_pair() {
        let entry: WeightedEntry<&str> = ("heads", 0.5).into();
        assert_eq!(entry, WeightedEntry::new("heads", 0.5));
    }

    #[test]
    fn serializes_as_key_weight_object() {
        let entry = WeightedEntry::new("k1".to_string(), 0.25);
        let json = serde_json::to_string(&entry).expect("serialize entry");
        assert_eq!(json, r#"{"key":"k1","weight":0.25}"#);
        let back: WeightedEntry<String> = serde_json::from_str(&json).expect("deserialize entry");
        assert_eq!(back, entry);
    }
}
