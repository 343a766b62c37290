//! Pipeline configuration resolved from the environment and settings file.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::ai::reliability::DEFAULT_RETRY_DELAYS;
use crate::ai::REQUEST_TIMEOUT;
use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::pipeline::DEFAULT_MAX_CONDENSE_PASSES;
use crate::utils::Settings;

/// Maximum chunk size in characters.
pub const CHUNK_SIZE_VAR: &str = "SKONSOLE_CHUNK_SIZE";
/// Cap on condense passes.
pub const MAX_CONDENSE_PASSES_VAR: &str = "SKONSOLE_MAX_CONDENSE_PASSES";
/// Concurrent generations in aggregate mode.
pub const AGGREGATE_CONCURRENCY_VAR: &str = "SKONSOLE_AGGREGATE_CONCURRENCY";
/// Per-attempt model timeout in seconds.
pub const REQUEST_TIMEOUT_SECS_VAR: &str = "SKONSOLE_REQUEST_TIMEOUT_SECS";
/// Comma-separated retry pauses in seconds.
pub const RETRY_DELAYS_SECS_VAR: &str = "SKONSOLE_RETRY_DELAYS_SECS";

/// Smallest usable chunk size: condensing splits lines at an eighth of it.
const MIN_CHUNK_SIZE: usize = 8;

/// Tunables for chunking, condensing, and model calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Cap on condense passes.
    pub max_condense_passes: usize,
    /// Concurrent generations in aggregate mode.
    pub aggregate_concurrency: usize,
    /// Per-attempt model timeout.
    pub request_timeout: Duration,
    /// Pauses between retries of throttled or timed-out requests.
    pub retry_delays: Vec<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_condense_passes: DEFAULT_MAX_CONDENSE_PASSES,
            aggregate_concurrency: 1,
            request_timeout: REQUEST_TIMEOUT,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Resolves the configuration from the environment and
    /// `$HOME/.skonsole/settings.json`.
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        Self::from_settings(&settings)
    }

    /// Resolves each value environment-first, settings-second, default last.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = settings.get_env_var(CHUNK_SIZE_VAR) {
            config.chunk_size = parse_var(CHUNK_SIZE_VAR, &value)?;
        }
        if let Some(value) = settings.get_env_var(MAX_CONDENSE_PASSES_VAR) {
            config.max_condense_passes = parse_var(MAX_CONDENSE_PASSES_VAR, &value)?;
        }
        if let Some(value) = settings.get_env_var(AGGREGATE_CONCURRENCY_VAR) {
            config.aggregate_concurrency = parse_var(AGGREGATE_CONCURRENCY_VAR, &value)?;
        }
        if let Some(value) = settings.get_env_var(REQUEST_TIMEOUT_SECS_VAR) {
            config.request_timeout =
                Duration::from_secs(parse_var(REQUEST_TIMEOUT_SECS_VAR, &value)?);
        }
        if let Some(value) = settings.get_env_var(RETRY_DELAYS_SECS_VAR) {
            config.retry_delays = parse_delays(&value)?;
        }

        config.validate()?;
        debug!(?config, "Resolved pipeline configuration");
        Ok(config)
    }

    /// Rejects values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            bail!(
                "{CHUNK_SIZE_VAR} must be at least {MIN_CHUNK_SIZE}, got {}",
                self.chunk_size
            );
        }
        if self.max_condense_passes == 0 {
            bail!("{MAX_CONDENSE_PASSES_VAR} must be at least 1");
        }
        if self.aggregate_concurrency == 0 {
            bail!("{AGGREGATE_CONCURRENCY_VAR} must be at least 1");
        }
        if self.request_timeout.is_zero() {
            bail!("{REQUEST_TIMEOUT_SECS_VAR} must be at least 1");
        }
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {key}: {value:?}"))
}

fn parse_delays(value: &str) -> Result<Vec<Duration>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_var::<u64>(RETRY_DELAYS_SECS_VAR, part).map(Duration::from_secs))
        .collect()
}
