use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Level filter for the run. `RUST_LOG` wins over the scenario's `tracing_level`.
pub fn event_filter(logging: &LoggingConfig) -> EnvFilter {
    let level = logging.level().unwrap_or(Level::INFO);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// One JSON object per event with fields flattened to the top level, tagged with the enclosing
/// `replay` span so events from `sparsebelief::observe` carry the run id.
pub fn telemetry_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish()
}

/// Installs the global subscriber: JSON events to `outputs.telemetry` for structured runs,
/// compact lines on stderr otherwise.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    let filter = event_filter(logging);

    if !logging.enable_structured {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .finish();
        // A subscriber may already be installed (e.g., when running in tests)
        let _ = tracing::subscriber::set_global_default(subscriber);
        return Ok(None);
    }

    let telemetry_path = outputs.telemetry.clone();
    if let Some(dir) = telemetry_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let _ = tracing::subscriber::set_global_default(telemetry_subscriber(filter, writer));

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}
