//! Error types for distribution construction.
//!
//! Drawing, seeding and resetting are total; only building a distribution
//! from external parameters can fail.

use thiserror::Error;

/// Invalid distribution parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    /// Mean is NaN or infinite.
    #[error("Invalid mean {0}: must be finite")]
    InvalidMean(f64),

    /// Standard deviation is not a positive finite number.
    #[error("Invalid standard deviation {0}: must be finite and positive")]
    InvalidStdDev(f64),

    /// Unrecognised normal method name.
    #[error("Unknown normal method: {0}. Must be one of: polar, ziggurat")]
    UnknownMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DistributionError::InvalidStdDev(-1.0);
        assert!(err.to_string().contains("standard deviation -1"));

        let err = DistributionError::UnknownMethod("box".to_string());
        assert!(err.to_string().contains("box"));
    }
}
