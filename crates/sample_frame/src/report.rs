//! Policy comparison and distortion trials.
//!
//! [`compare_policies`] runs the same column under every policy and reports
//! how far each lands from the target distribution. [`distortion_trials`]
//! repeats the global policy under contention to expose the distortion that
//! its unsynchronised engine produces.

use sample_core::{
    EntropyFactory, EntrySeededPolicy, Gaussian, GlobalPolicy, SharedEngine, ThreadOwnedPolicy,
};
use tracing::{info, warn};

use crate::column::define_column;
use crate::config::FrameConfig;
use crate::error::Result;
use crate::stats::Summary;

/// Outcome of one policy run.
#[derive(Clone, Debug)]
pub struct PolicyReport {
    /// Human-readable label.
    pub label: &'static str,
    /// Policy name.
    pub policy: &'static str,
    /// Worker threads used.
    pub threads: usize,
    /// Column statistics.
    pub summary: Summary,
    /// Lost transitions (global policy only).
    pub lost_transitions: Option<u64>,
    /// Cached variates served more than once (global policy only).
    pub spare_overreads: Option<u64>,
    /// Bitwise repeated samples in the column.
    pub repeated_values: usize,
    /// Whether the summary is within the configured tolerance.
    pub within_tolerance: bool,
}

fn report(
    label: &'static str,
    column: &crate::column::Column,
    gaussian: &Gaussian,
    tolerance: f64,
    engine: Option<&SharedEngine>,
) -> PolicyReport {
    let summary = column.summary();
    let report = PolicyReport {
        label,
        policy: column.policy(),
        threads: column.threads(),
        summary,
        lost_transitions: engine.map(SharedEngine::lost_transitions),
        spare_overreads: engine.map(SharedEngine::spare_overreads),
        repeated_values: column.repeated_values(),
        within_tolerance: summary.within_tolerance(gaussian, tolerance),
    };
    info!(
        label,
        threads = report.threads,
        mean = report.summary.mean(),
        std_dev = report.summary.std_dev(),
        repeated = report.repeated_values,
        within_tolerance = report.within_tolerance,
        "policy run complete"
    );
    report
}

/// Runs the column under every policy.
///
/// Reports, in order:
/// 1. global policy on one thread (reference)
/// 2. global policy on `config.threads` workers
/// 3. thread-owned policy on `config.threads` workers
/// 4. entry-seeded policy on `config.threads` workers
pub fn compare_policies(config: &FrameConfig) -> Result<Vec<PolicyReport>> {
    config.validate()?;
    let gaussian = config.gaussian()?;
    let tolerance = config.tolerance;
    info!(
        entries = config.entries,
        threads = config.threads,
        method = %config.method,
        interleaving = %config.interleaving,
        "comparing policies"
    );

    let mut reports = Vec::with_capacity(4);

    let reference = GlobalPolicy::new(SharedEngine::with_gaussian(config.base_seed, gaussian));
    let column = define_column(&reference, config.entries, 1)?;
    reports.push(report(
        "global (single thread)",
        &column,
        &gaussian,
        tolerance,
        Some(reference.engine()),
    ));

    let contended = GlobalPolicy::new(config.shared_engine(config.base_seed)?);
    let column = define_column(&contended, config.entries, config.threads)?;
    reports.push(report(
        "global (parallel)",
        &column,
        &gaussian,
        tolerance,
        Some(contended.engine()),
    ));

    let thread_owned =
        ThreadOwnedPolicy::with_factory(EntropyFactory::new(gaussian, config.method));
    let column = define_column(&thread_owned, config.entries, config.threads)?;
    reports.push(report(
        "thread-owned (parallel)",
        &column,
        &gaussian,
        tolerance,
        None,
    ));

    let entry_seeded = EntrySeededPolicy::with_distribution(gaussian, config.method)
        .with_base_seed(config.base_seed);
    let column = define_column(&entry_seeded, config.entries, config.threads)?;
    reports.push(report(
        "entry-seeded (parallel)",
        &column,
        &gaussian,
        tolerance,
        None,
    ));

    Ok(reports)
}

/// One contention trial of the global policy.
#[derive(Clone, Debug)]
pub struct DistortionTrial {
    /// Trial index.
    pub trial: usize,
    /// Generator steps overwritten by concurrent callers.
    pub lost_transitions: u64,
    /// Cached variates served more than once.
    pub spare_overreads: u64,
    /// Bitwise repeated samples.
    pub repeated_values: usize,
    /// Column statistics.
    pub summary: Summary,
    /// Deviation from the target distribution.
    pub deviation: f64,
}

impl DistortionTrial {
    /// Returns true if the trial shows corrupted sequencing.
    pub fn is_corrupted(&self) -> bool {
        self.lost_transitions > 0 || self.spare_overreads > 0 || self.repeated_values > 0
    }
}

/// Results of repeated contention trials.
#[derive(Clone, Debug)]
pub struct DistortionReport {
    /// Tolerance that the safe policies meet.
    pub tolerance: f64,
    /// Worker threads used per trial.
    pub threads: usize,
    /// Individual trials.
    pub trials: Vec<DistortionTrial>,
}

impl DistortionReport {
    /// Number of trials with corrupted sequencing.
    pub fn corrupted_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.is_corrupted()).count()
    }

    /// Number of trials whose statistics exceed the tolerance.
    pub fn distorted_trials(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.deviation > self.tolerance)
            .count()
    }

    /// Largest deviation over all trials.
    pub fn worst_deviation(&self) -> f64 {
        self.trials
            .iter()
            .map(|t| t.deviation)
            .fold(0.0, f64::max)
    }
}

/// Runs the global policy `config.trials` times on `config.threads` workers.
///
/// Trial `i` seeds its engine with `config.base_seed + i`. With
/// [`Interleaving::Forced`](sample_core::Interleaving::Forced) contention
/// arises even on a single core.
pub fn distortion_trials(config: &FrameConfig) -> Result<DistortionReport> {
    config.validate()?;
    let gaussian = config.gaussian()?;
    let mut trials = Vec::with_capacity(config.trials);
    info!(
        entries = config.entries,
        threads = config.threads,
        trials = config.trials,
        interleaving = %config.interleaving,
        "running distortion trials"
    );
    let mut threads = 0;

    for trial in 0..config.trials {
        let seed = config.base_seed.wrapping_add(trial as u64);
        let policy = GlobalPolicy::new(config.shared_engine(seed)?);
        let column = define_column(&policy, config.entries, config.threads)?;
        threads = column.threads();

        let summary = column.summary();
        let result = DistortionTrial {
            trial,
            lost_transitions: policy.engine().lost_transitions(),
            spare_overreads: policy.engine().spare_overreads(),
            repeated_values: column.repeated_values(),
            deviation: summary.deviation(&gaussian),
            summary,
        };

        if result.is_corrupted() {
            warn!(
                trial,
                lost = result.lost_transitions,
                overreads = result.spare_overreads,
                repeated = result.repeated_values,
                deviation = result.deviation,
                "global policy corrupted under contention"
            );
        }
        trials.push(result);
    }

    Ok(DistortionReport {
        tolerance: config.tolerance,
        threads,
        trials,
    })
}
