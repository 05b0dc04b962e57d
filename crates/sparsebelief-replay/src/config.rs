use serde::Deserialize;
use sparsebelief_core::{WeightedEntry, prob_sum};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root replay scenario loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReplayConfig {
    pub run_id: String,
    pub prior: Vec<PriorEntry>,
    pub likelihood: LikelihoodConfig,
    #[serde(default)]
    pub observations: Vec<String>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplayConfig {
    /// Load a scenario from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ReplayConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the scenario without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        validate_prior(&self.prior)?;
        self.likelihood.validate(&self.prior, &self.observations)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let jsonl = resolve_template(&self.run_id, &self.outputs.jsonl);
        let telemetry = match self.logging.telemetry_jsonl.as_deref() {
            Some(template) => resolve_template(&self.run_id, template),
            None => jsonl.with_extension("telemetry.jsonl"),
        };
        ResolvedOutputs { jsonl, telemetry }
    }
}

/// One hypothesis of the prior with its unnormalized weight.
pub type PriorEntry = WeightedEntry<String>;

/// Likelihood model selection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LikelihoodConfig {
    /// Keys are die sizes `k`; an observation `x` has likelihood `1/k` when `1 <= x <= k`.
    UniformRange,
    /// Explicit `observation -> key -> weight` lookup.
    Table {
        rows: BTreeMap<String, BTreeMap<String, f64>>,
        #[serde(default)]
        default: f64,
    },
}

impl LikelihoodConfig {
    fn validate(
        &self,
        prior: &[PriorEntry],
        observations: &[String],
    ) -> Result<(), ValidationError> {
        match self {
            LikelihoodConfig::UniformRange => {
                for entry in prior {
                    let valid = entry
                        .key
                        .trim()
                        .parse::<f64>()
                        .is_ok_and(|bound| bound.is_finite() && bound > 0.0);
                    if !valid {
                        return Err(ValidationError::InvalidField {
                            field: format!("prior[{}].key", entry.key),
                            message: "uniform_range keys must be positive numbers".to_string(),
                        });
                    }
                }
                for (index, observation) in observations.iter().enumerate() {
                    if observation.trim().parse::<f64>().is_err() {
                        return Err(ValidationError::InvalidField {
                            field: format!("observations[{index}]"),
                            message: format!("'{observation}' is not a number"),
                        });
                    }
                }
            }
            LikelihoodConfig::Table { rows, default } => {
                check_weight("likelihood.default", *default)?;
                for (observation, row) in rows {
                    for (key, weight) in row {
                        check_weight(&format!("likelihood.rows.{observation}.{key}"), *weight)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.jsonl.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.jsonl".to_string(),
                message: "path must not be empty".to_string(),
            });
        }

        let resolved = resolve_template(run_id, &self.jsonl);
        if resolved.file_name().is_none() {
            return Err(ValidationError::InvalidField {
                field: "outputs.jsonl".to_string(),
                message: "resolved path does not name a file".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration defaults to a plain stderr subscriber.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Path template for the JSON event log. Defaults to `<outputs.jsonl stem>.telemetry.jsonl`.
    #[serde(default)]
    pub telemetry_jsonl: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            telemetry_jsonl: None,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
        if self
            .telemetry_jsonl
            .as_deref()
            .is_some_and(|template| template.trim().is_empty())
        {
            self.telemetry_jsonl = None;
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn validate_prior(prior: &[PriorEntry]) -> Result<(), ValidationError> {
    if prior.is_empty() {
        return Err(ValidationError::InvalidField {
            field: "prior".to_string(),
            message: "at least one hypothesis must be specified".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for entry in prior {
        if entry.key.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "prior.key".to_string(),
                message: "hypothesis key must not be empty".to_string(),
            });
        }

        if !seen.insert(entry.key.as_str()) {
            return Err(ValidationError::InvalidField {
                field: "prior".to_string(),
                message: format!("hypothesis '{}' defined more than once", entry.key),
            });
        }

        check_weight(&format!("prior[{}].weight", entry.key), entry.weight)?;
    }

    let total = prob_sum(prior);
    if total == 0.0 {
        return Err(ValidationError::InvalidField {
            field: "prior".to_string(),
            message: "weights sum to zero; at least one hypothesis needs a positive weight"
                .to_string(),
        });
    }
    if !total.is_finite() {
        return Err(ValidationError::InvalidField {
            field: "prior".to_string(),
            message: "weights overflow when summed".to_string(),
        });
    }

    Ok(())
}

fn check_weight(field: &str, weight: f64) -> Result<(), ValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(ValidationError::InvalidField {
            field: field.to_string(),
            message: format!("weight {weight} must be finite and non-negative"),
        });
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    /// Structured tracing log; only written when `logging.enable_structured` is set.
    pub telemetry: PathBuf,
}

/// Errors surfaced when loading scenario files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
