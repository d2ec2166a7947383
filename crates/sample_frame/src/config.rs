//! Run configuration management
//!
//! Handles loading configuration from TOML files and environment variables,
//! with explicit overrides taking precedence.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use sample_core::{Gaussian, Interleaving, NormalMethod, SharedEngine};
use serde::Deserialize;

use crate::error::ConfigError;

/// Maximum number of entries in one column.
pub const MAX_ENTRIES: usize = 100_000_000;

/// Maximum number of worker threads.
pub const MAX_THREADS: usize = 1024;

/// Draw policy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum PolicyKind {
    /// One shared unsynchronised engine.
    Global,
    /// One entropy-seeded engine per thread.
    ThreadOwned,
    /// Per-thread engines reseeded from the entry id.
    #[default]
    EntrySeeded,
}

impl FromStr for PolicyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "global" => Ok(PolicyKind::Global),
            "thread-owned" | "threadsafe" => Ok(PolicyKind::ThreadOwned),
            "entry-seeded" | "deterministic" => Ok(PolicyKind::EntrySeeded),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

impl PolicyKind {
    /// Configuration name of the policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::Global => "global",
            PolicyKind::ThreadOwned => "thread-owned",
            PolicyKind::EntrySeeded => "entry-seeded",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column run configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Number of entries (work items) in the column.
    pub entries: usize,
    /// Worker thread count; 0 selects the rayon default.
    pub threads: usize,
    /// Policy used by single-policy runs.
    #[serde(deserialize_with = "deserialize_policy")]
    pub policy: PolicyKind,
    /// Seed for the global engine and offset for entry seeds.
    pub base_seed: u64,
    /// Normal method for per-thread engines.
    #[serde(deserialize_with = "deserialize_method")]
    pub method: NormalMethod,
    /// Target mean.
    pub mean: f64,
    /// Target standard deviation.
    pub std_dev: f64,
    /// Accepted deviation of sample mean and standard deviation.
    pub tolerance: f64,
    /// Number of repeated contention trials.
    pub trials: usize,
    /// Scheduling of the global engine's unsynchronised steps.
    #[serde(deserialize_with = "deserialize_interleaving")]
    pub interleaving: Interleaving,
}

/// Parses an interleaving mode name.
pub fn parse_interleaving(s: &str) -> Result<Interleaving, ConfigError> {
    match s.trim().to_lowercase().as_str() {
        "hardware" => Ok(Interleaving::Hardware),
        "forced" => Ok(Interleaving::Forced),
        _ => Err(ConfigError::InvalidInterleaving(s.to_string())),
    }
}

fn deserialize_interleaving<'de, D>(deserializer: D) -> Result<Interleaving, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_interleaving(&s).map_err(serde::de::Error::custom)
}

fn deserialize_policy<'de, D>(deserializer: D) -> Result<PolicyKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    PolicyKind::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_method<'de, D>(deserializer: D) -> Result<NormalMethod, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NormalMethod::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            entries: 1_000_000,
            threads: 0,
            policy: PolicyKind::EntrySeeded,
            base_seed: 0,
            method: NormalMethod::Polar,
            mean: 0.0,
            std_dev: 1.0,
            tolerance: 0.01,
            trials: 5,
            interleaving: Interleaving::Forced,
        }
    }
}

impl FrameConfig {
    /// Create a new FrameConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: FrameConfig = toml::from_str(content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply `SAMPLE_FRAME_*` environment variables
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply variables resolved through `lookup`
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
        where
            T::Err: fmt::Display,
        {
            value.trim().parse().map_err(|e: T::Err| ConfigError::EnvError {
                name,
                message: e.to_string(),
            })
        }

        if let Some(v) = lookup("SAMPLE_FRAME_ENTRIES") {
            self.entries = parse("SAMPLE_FRAME_ENTRIES", &v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_THREADS") {
            self.threads = parse("SAMPLE_FRAME_THREADS", &v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_POLICY") {
            self.policy = PolicyKind::from_str(&v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_SEED") {
            self.base_seed = parse("SAMPLE_FRAME_SEED", &v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_METHOD") {
            self.method = NormalMethod::from_str(&v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_TOLERANCE") {
            self.tolerance = parse("SAMPLE_FRAME_TOLERANCE", &v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_TRIALS") {
            self.trials = parse("SAMPLE_FRAME_TRIALS", &v)?;
        }
        if let Some(v) = lookup("SAMPLE_FRAME_INTERLEAVING") {
            self.interleaving = parse_interleaving(&v)?;
        }
        Ok(())
    }

    /// Merge with explicit overrides (overrides take precedence)
    pub fn merge(&mut self, overrides: &Overrides) {
        if let Some(entries) = overrides.entries {
            self.entries = entries;
        }
        if let Some(threads) = overrides.threads {
            self.threads = threads;
        }
        if let Some(policy) = overrides.policy {
            self.policy = policy;
        }
        if let Some(seed) = overrides.base_seed {
            self.base_seed = seed;
        }
    }

    /// Target distribution described by `mean` and `std_dev`
    pub fn gaussian(&self) -> Result<Gaussian, ConfigError> {
        Ok(Gaussian::new(self.mean, self.std_dev)?)
    }

    /// Global engine for this run, seeded with `seed`
    pub fn shared_engine(&self, seed: u64) -> Result<SharedEngine, ConfigError> {
        let engine = SharedEngine::with_gaussian(seed, self.gaussian()?);
        Ok(engine.with_interleaving(self.interleaving))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries == 0 || self.entries > MAX_ENTRIES {
            return Err(ConfigError::InvalidEntries(self.entries));
        }
        if self.threads > MAX_THREADS {
            return Err(ConfigError::InvalidThreads(self.threads));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if self.trials == 0 {
            return Err(ConfigError::InvalidTrials(self.trials));
        }
        self.gaussian()?;
        Ok(())
    }
}

/// Explicit overrides, e.g. from a caller's command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Entry count override
    pub entries: Option<usize>,
    /// Thread count override
    pub threads: Option<usize>,
    /// Policy override
    pub policy: Option<PolicyKind>,
    /// Base seed override
    pub base_seed: Option<u64>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. Explicit overrides
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(
    config_file: Option<&Path>,
    overrides: &Overrides,
) -> Result<FrameConfig, ConfigError> {
    let mut config = match config_file {
        Some(path) => FrameConfig::from_file(path)?,
        None => FrameConfig::default(),
    };

    config.apply_env()?;
    config.merge(overrides);
    config.validate()?;

    Ok(config)
}
