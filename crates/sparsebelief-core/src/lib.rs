#![deny(warnings)]
pub mod belief;

pub use belief::{
    BeliefError, BeliefMetrics, ConstructionError, Distribution, NormalizeError, SparseBelief,
    WeightedEntry, by_prob, normalize, prob_sum,
};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "sparsebelief"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "sparsebelief");
        assert!(!AppInfo::version().is_empty());
    }
}
