//! Statistical fidelity of the safe policies and distortion of the global
//! policy.

use sample_core::{EntrySeededPolicy, Gaussian, GlobalPolicy, Interleaving, ThreadOwnedPolicy};
use sample_frame::{define_column, distortion_trials, FrameConfig};

const ENTRIES: usize = 1_000_000;
const TOLERANCE: f64 = 0.01;

#[test]
fn test_thread_owned_fidelity() {
    let policy = ThreadOwnedPolicy::new();
    let summary = define_column(&policy, ENTRIES, 4).unwrap().summary();

    assert_eq!(summary.count(), ENTRIES as u64);
    assert!(
        summary.within_tolerance(&Gaussian::STANDARD, TOLERANCE),
        "mean {:.4} std {:.4}",
        summary.mean(),
        summary.std_dev()
    );
}

#[test]
fn test_entry_seeded_fidelity() {
    let policy = EntrySeededPolicy::new();
    let column = define_column(&policy, ENTRIES, 4).unwrap();
    let summary = column.summary();

    assert!(
        summary.within_tolerance(&Gaussian::STANDARD, TOLERANCE),
        "mean {:.4} std {:.4}",
        summary.mean(),
        summary.std_dev()
    );
    assert_eq!(column.repeated_values(), 0);
}

#[test]
fn test_global_single_thread_fidelity() {
    let policy = GlobalPolicy::seeded(2025);
    let column = define_column(&policy, ENTRIES, 1).unwrap();
    let summary = column.summary();

    assert!(summary.within_tolerance(&Gaussian::STANDARD, TOLERANCE));
    assert_eq!(policy.engine().lost_transitions(), 0);
    assert_eq!(column.repeated_values(), 0);
}

#[test]
fn test_global_policy_distorted_under_contention() {
    let config = FrameConfig {
        entries: ENTRIES,
        threads: 8,
        base_seed: 1,
        tolerance: TOLERANCE,
        trials: 3,
        interleaving: Interleaving::Forced,
        ..Default::default()
    };
    let report = distortion_trials(&config).unwrap();

    for trial in &report.trials {
        eprintln!(
            "trial {}: lost {} overreads {} repeated {} mean {:.4} std {:.4} deviation {:.4}",
            trial.trial,
            trial.lost_transitions,
            trial.spare_overreads,
            trial.repeated_values,
            trial.summary.mean(),
            trial.summary.std_dev(),
            trial.deviation
        );
    }

    assert!(report.corrupted_trials() > 0);
    assert!(
        report.distorted_trials() > 0,
        "worst deviation {:.4} within {} over {} trials",
        report.worst_deviation(),
        TOLERANCE,
        report.trials.len()
    );
}

#[test]
fn test_safe_policies_not_distorted_at_same_scale() {
    // Same entries and threads as the contention trials
    let policy = EntrySeededPolicy::new().with_base_seed(1);
    let summary = define_column(&policy, ENTRIES, 8).unwrap().summary();
    assert!(summary.deviation(&Gaussian::STANDARD) <= TOLERANCE);
}
