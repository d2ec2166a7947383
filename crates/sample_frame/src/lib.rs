//! # sample_frame: Parallel Column Runs for sample_core Policies
//!
//! ## Role
//!
//! sample_frame plays the part of the data-parallel scheduler that calls
//! sample_core's draw policies:
//! - Column definition over entries `0..N` on a sized rayon pool (`column`)
//! - Run configuration from TOML and environment (`config`)
//! - Parallel summary statistics (`stats`)
//! - Policy comparison and global-policy distortion trials (`report`)
//!
//! ## Usage Example
//!
//! ```rust
//! use sample_core::EntrySeededPolicy;
//! use sample_frame::{define_column, Summary};
//!
//! let policy = EntrySeededPolicy::new();
//! let on_two = define_column(&policy, 1000, 2).unwrap();
//! let on_four = define_column(&policy, 1000, 4).unwrap();
//!
//! // Entry-seeded columns do not depend on the worker count
//! assert_eq!(on_two.values(), on_four.values());
//!
//! let summary: Summary = on_four.summary();
//! assert_eq!(summary.count(), 1000);
//! ```
//!
//! ## Logging
//!
//! Runs are logged through `tracing`; install a subscriber in the binary to
//! see them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod column;
pub mod config;
pub mod error;
pub mod report;
pub mod stats;

pub use column::{
    build_pool, check_isolation, define_column, define_column_traced, Column, IsolationReport,
};
pub use config::{build_config, parse_interleaving, FrameConfig, Overrides, PolicyKind};
pub use error::{ConfigError, FrameError, Result};
pub use report::{
    compare_policies, distortion_trials, DistortionReport, DistortionTrial, PolicyReport,
};
pub use stats::{repeated_values, Summary};

use sample_core::{EntropyFactory, EntrySeededPolicy, GlobalPolicy, ThreadOwnedPolicy};

/// Number of hardware threads available to worker pools.
pub fn available_threads() -> usize {
    num_cpus::get()
}

/// Defines the column for `config.policy`.
pub fn run_configured(config: &FrameConfig) -> Result<Column> {
    config.validate()?;
    let gaussian = config.gaussian()?;
    match config.policy {
        PolicyKind::Global => {
            let policy = GlobalPolicy::new(config.shared_engine(config.base_seed)?);
            define_column(&policy, config.entries, config.threads)
        }
        PolicyKind::ThreadOwned => {
            let policy =
                ThreadOwnedPolicy::with_factory(EntropyFactory::new(gaussian, config.method));
            define_column(&policy, config.entries, config.threads)
        }
        PolicyKind::EntrySeeded => {
            let policy = EntrySeededPolicy::with_distribution(gaussian, config.method)
                .with_base_seed(config.base_seed);
            define_column(&policy, config.entries, config.threads)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_threads() {
        assert!(available_threads() >= 1);
    }

    #[test]
    fn test_run_configured_policies() {
        for policy in [
            PolicyKind::Global,
            PolicyKind::ThreadOwned,
            PolicyKind::EntrySeeded,
        ] {
            let config = FrameConfig {
                entries: 100,
                threads: 2,
                policy,
                ..Default::default()
            };
            let column = run_configured(&config).unwrap();
            assert_eq!(column.len(), 100);
            assert_eq!(column.policy(), policy.as_str());
        }
    }

    #[test]
    fn test_run_configured_entry_seeded_reproducible() {
        let config = FrameConfig {
            entries: 200,
            threads: 3,
            base_seed: 5,
            ..Default::default()
        };
        let a = run_configured(&config).unwrap();
        let b = run_configured(&FrameConfig {
            threads: 1,
            ..config.clone()
        })
        .unwrap();
        assert_eq!(a.values(), b.values());
    }
}
