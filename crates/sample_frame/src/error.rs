//! Error types for sample_frame.

use sample_core::DistributionError;
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Entry count outside `[1, MAX_ENTRIES]`.
    #[error("Invalid entry count {0}: must be in range [1, {max}]", max = crate::config::MAX_ENTRIES)]
    InvalidEntries(usize),

    /// Thread count above `MAX_THREADS`.
    #[error("Invalid thread count {0}: must be at most {max} (0 selects the default)", max = crate::config::MAX_THREADS)]
    InvalidThreads(usize),

    /// Tolerance not a positive finite number.
    #[error("Invalid tolerance {0}: must be finite and positive")]
    InvalidTolerance(f64),

    /// Zero trials requested.
    #[error("Invalid trial count {0}: must be at least 1")]
    InvalidTrials(usize),

    /// Unknown policy name.
    #[error("Invalid policy: {0}. Must be one of: global, thread-owned, entry-seeded")]
    InvalidPolicy(String),

    /// Unknown interleaving mode.
    #[error("Invalid interleaving: {0}. Must be one of: hardware, forced")]
    InvalidInterleaving(String),

    /// Distribution parameters rejected.
    #[error("Invalid distribution: {0}")]
    Distribution(#[from] DistributionError),

    /// Configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    FileError(String),

    /// Environment variable could not be parsed.
    #[error("Environment variable {name}: {message}")]
    EnvError {
        /// Variable name.
        name: &'static str,
        /// What was wrong with its value.
        message: String,
    },
}

/// Errors raised while running columns.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid distribution parameters.
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// The worker pool could not be built.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias for sample_frame operations.
pub type Result<T> = std::result::Result<T, FrameError>;
