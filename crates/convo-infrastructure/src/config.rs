//! `RunnerConfig` — every operational parameter named in spec §6, layered
//! from defaults, an optional `convo.toml`, and `CONVO_*` environment
//! variables (figment's `Toml` + `Env` providers), grounded on the
//! teacher's layered `ConfigLoader`/`AppConfig` pattern, simplified here to
//! a single flat settings struct.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use convo_domain::constants::{
    DEFAULT_BACKGROUND_TICK_SECS, DEFAULT_CONSISTENCY_CHECK_INTERVAL_SECS, DEFAULT_FUZZY_THRESHOLD,
    DEFAULT_MAX_INDEXING_ATTEMPTS_PER_MINUTE, DEFAULT_MIN_CONFIDENCE,
    DEFAULT_RECONSTRUCTION_BATCH_SIZE, DEFAULT_REPAIR_CONCURRENCY, INDEXING_CALL_TIMEOUT_SECS,
};
use convo_domain::error::{Error, Result};

/// Flat settings struct covering every spec §6 operational parameter.
/// Field names match the `CONVO_*` environment variable suffixes
/// (upper-cased) and the `convo.toml` keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Absolute paths to scan as candidate storage roots.
    pub storage_roots: Vec<String>,
    /// Background indexing tick interval, in seconds.
    pub background_tick_secs: u64,
    /// Approximate max indexing attempts per minute.
    pub max_indexing_attempts_per_minute: u64,
    /// Timeout applied to a single in-flight indexing call, in seconds.
    pub indexing_call_timeout_secs: u64,
    /// Interval between consistency reconciliation passes, in seconds.
    pub consistency_check_interval_secs: u64,
    /// Logical batch size for Hierarchy Engine passes.
    pub reconstruction_batch_size: usize,
    /// Minimum confidence to accept a Pass 2 resolution.
    pub min_confidence: f64,
    /// Minimum symmetric similarity for a fuzzy index match.
    pub fuzzy_threshold: f64,
    /// Fixed concurrency for Proactive Metadata Repair.
    pub repair_concurrency: usize,
    /// Base URL of the remote vector-store HTTP adapter, if configured.
    pub vector_store_url: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            storage_roots: Vec::new(),
            background_tick_secs: DEFAULT_BACKGROUND_TICK_SECS,
            max_indexing_attempts_per_minute: DEFAULT_MAX_INDEXING_ATTEMPTS_PER_MINUTE,
            indexing_call_timeout_secs: INDEXING_CALL_TIMEOUT_SECS,
            consistency_check_interval_secs: DEFAULT_CONSISTENCY_CHECK_INTERVAL_SECS,
            reconstruction_batch_size: DEFAULT_RECONSTRUCTION_BATCH_SIZE,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            repair_concurrency: DEFAULT_REPAIR_CONCURRENCY,
            vector_store_url: None,
        }
    }
}

impl RunnerConfig {
    /// Loads configuration layered as: built-in defaults, `<path>` if it
    /// exists, then `CONVO_*` environment variables (highest priority).
    ///
    /// # Errors
    ///
    /// Returns an error if a present `convo.toml` or an environment
    /// override fails to parse into the expected shape.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("CONVO_").split("_"));

        figment
            .extract()
            .map_err(|e| Error::Config { message: format!("failed to load runner configuration: {e}") })
    }
}
