use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sparsebelief_core::{BeliefError, BeliefMetrics, NormalizeError, SparseBelief, WeightedEntry};
use thiserror::Error;
use tracing::{Level, event, info_span};

use crate::config::{ReplayConfig, ResolvedOutputs};
use crate::likelihood::LikelihoodModel;

/// Feeds a scenario's observations through a [`SparseBelief`], one JSONL row per step.
pub struct ReplayRunner {
    config: ReplayConfig,
    outputs: ResolvedOutputs,
    model: LikelihoodModel,
}

/// Summary details returned after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub steps_applied: usize,
    pub rows_written: usize,
    pub hypotheses: usize,
    pub top: Option<WeightedEntry<String>>,
    pub jsonl_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct StepRow<'a> {
    run_id: &'a str,
    step: usize,
    observation: Option<&'a str>,
    #[serde(flatten)]
    metrics: BeliefMetrics,
    posterior: &'a [WeightedEntry<String>],
}

impl ReplayRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: ReplayConfig, outputs: ResolvedOutputs) -> Self {
        let model = LikelihoodModel::from_config(&config.likelihood);
        Self {
            config,
            outputs,
            model,
        }
    }

    /// Replay every observation, streaming the sorted posterior after each step.
    ///
    /// Row zero holds the normalized prior.
    pub fn run(&self) -> Result<ReplaySummary, ReplayError> {
        let span = info_span!(
            target: "sparsebelief_replay::run",
            "replay",
            run_id = %self.config.run_id
        );
        let _entered = span.enter();

        ensure_parent(self.outputs.jsonl.parent())?;
        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);

        let prior = self.config.prior.iter().cloned();
        let model = &self.model;
        let mut belief: SparseBelief<String, str, _> =
            SparseBelief::new(prior, |observation: &str, key: &String| {
                model.evaluate(observation, key)
            })?;

        let mut rows_written = write_row(&mut writer, &self.config.run_id, 0, None, &mut belief)?;

        for (index, observation) in self.config.observations.iter().enumerate() {
            let step = index + 1;
            if let Err(source) = belief.observe(observation) {
                writer.flush()?;
                return Err(ReplayError::Observation {
                    step,
                    observation: observation.clone(),
                    source,
                });
            }
            rows_written += write_row(
                &mut writer,
                &self.config.run_id,
                step,
                Some(observation.as_str()),
                &mut belief,
            )?;
        }

        writer.flush()?;

        belief.sort();
        Ok(ReplaySummary {
            steps_applied: self.config.observations.len(),
            rows_written,
            hypotheses: belief.len(),
            top: belief.entries().first().cloned(),
            jsonl_path: self.outputs.jsonl.clone(),
        })
    }
}

fn write_row<W, L>(
    writer: &mut W,
    run_id: &str,
    step: usize,
    observation: Option<&str>,
    belief: &mut SparseBelief<String, str, L>,
) -> Result<usize, ReplayError>
where
    W: Write,
    L: Fn(&str, &String) -> f64,
{
    belief.sort();
    let metrics = belief.metrics();
    if tracing::enabled!(Level::INFO) {
        let top = belief.entries().first().map(|entry| entry.key.as_str());
        event!(
            target: "sparsebelief_replay::step",
            Level::INFO,
            run_id,
            step,
            observation,
            hypotheses = metrics.hypotheses,
            entropy = metrics.entropy,
            top,
        );
    }

    let row = StepRow {
        run_id,
        step,
        observation,
        metrics,
        posterior: belief.entries(),
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(1)
}

fn ensure_parent(parent: Option<&Path>) -> Result<(), ReplayError> {
    if let Some(dir) = parent {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(())
}

/// Failures raised while replaying a scenario.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("prior rejected: {0}")]
    Prior(#[from] BeliefError),
    #[error("observation {step} ('{observation}') was rejected: {source}")]
    Observation {
        step: usize,
        observation: String,
        #[source]
        source: NormalizeError,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize posterior row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}
