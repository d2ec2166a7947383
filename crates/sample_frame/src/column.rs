//! Parallel column definition.
//!
//! Stands in for the data-parallel scheduler: entries `0..N` are partitioned
//! across a rayon pool of a chosen size, each entry's draw runs on whichever
//! worker picks it up, and results are collected in entry order.

use std::collections::HashMap;
use std::thread::ThreadId;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use sample_core::{DrawPolicy, EngineId, TracedSample, WorkItemId};
use tracing::info;

use crate::error::Result;
use crate::stats::{repeated_values, Summary};

/// Builds a worker pool; `threads == 0` selects the rayon default.
pub fn build_pool(threads: usize) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    Ok(builder.build()?)
}

/// Samples for entries `0..len`, indexed by entry id.
#[derive(Clone, Debug)]
pub struct Column {
    policy: &'static str,
    threads: usize,
    values: Vec<f64>,
}

impl Column {
    /// Name of the policy that produced the column.
    #[inline]
    pub fn policy(&self) -> &'static str {
        self.policy
    }

    /// Number of worker threads used.
    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sample for entry `id`.
    pub fn get(&self, id: WorkItemId) -> Option<f64> {
        usize::try_from(id).ok().and_then(|i| self.values.get(i).copied())
    }

    /// All samples in entry order.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Summary statistics of the column.
    pub fn summary(&self) -> Summary {
        Summary::from_slice(&self.values)
    }

    /// Number of bitwise repeated samples.
    pub fn repeated_values(&self) -> usize {
        repeated_values(&self.values)
    }
}

/// Evaluates `policy` for every entry in `0..entries` on a pool of `threads`
/// workers.
///
/// # Examples
///
/// ```rust
/// use sample_core::EntrySeededPolicy;
/// use sample_frame::define_column;
///
/// let policy = EntrySeededPolicy::new();
/// let column = define_column(&policy, 100, 4).unwrap();
/// assert_eq!(column.len(), 100);
/// assert_eq!(column.get(42), Some(policy.draw_deterministic(42)));
/// ```
pub fn define_column<P>(policy: &P, entries: usize, threads: usize) -> Result<Column>
where
    P: DrawPolicy + ?Sized,
{
    let pool = build_pool(threads)?;
    let workers = pool.current_num_threads();
    info!(
        policy = policy.name(),
        entries,
        threads = workers,
        "defining column"
    );

    let values: Vec<f64> = pool.install(|| {
        (0..entries)
            .into_par_iter()
            .map(|i| policy.draw(i as WorkItemId))
            .collect()
    });

    Ok(Column {
        policy: policy.name(),
        threads: workers,
        values,
    })
}

/// Like [`define_column`], recording the engine and thread behind every
/// sample.
pub fn define_column_traced<P>(
    policy: &P,
    entries: usize,
    threads: usize,
) -> Result<Vec<TracedSample>>
where
    P: DrawPolicy + ?Sized,
{
    let pool = build_pool(threads)?;
    info!(
        policy = policy.name(),
        entries,
        threads = pool.current_num_threads(),
        "defining traced column"
    );

    Ok(pool.install(|| {
        (0..entries)
            .into_par_iter()
            .map(|i| policy.draw_traced(i as WorkItemId))
            .collect()
    }))
}

/// Which threads each engine served.
#[derive(Clone, Debug, Default)]
pub struct IsolationReport {
    engines: HashMap<EngineId, Vec<ThreadId>>,
}

impl IsolationReport {
    /// Number of distinct engines observed.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// Engines observed on more than one thread.
    pub fn shared_engines(&self) -> Vec<EngineId> {
        let mut shared: Vec<EngineId> = self
            .engines
            .iter()
            .filter(|(_, threads)| threads.len() > 1)
            .map(|(engine, _)| *engine)
            .collect();
        shared.sort();
        shared
    }

    /// Returns true if every engine was used by exactly one thread.
    pub fn is_isolated(&self) -> bool {
        self.engines.values().all(|threads| threads.len() == 1)
    }
}

/// Groups traced samples by engine and checks thread exclusivity.
pub fn check_isolation(traces: &[TracedSample]) -> IsolationReport {
    let mut engines: HashMap<EngineId, Vec<ThreadId>> = HashMap::new();
    for trace in traces {
        let threads = engines.entry(trace.engine).or_default();
        if !threads.contains(&trace.thread) {
            threads.push(trace.thread);
        }
    }
    IsolationReport { engines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sample_core::{EntrySeededPolicy, GlobalPolicy, SharedEngine, ThreadOwnedPolicy};

    #[test]
    fn test_build_pool_sizes() {
        assert_eq!(build_pool(3).unwrap().current_num_threads(), 3);
        assert!(build_pool(0).unwrap().current_num_threads() >= 1);
    }

    #[test]
    fn test_column_in_entry_order() {
        let policy = EntrySeededPolicy::new();
        let column = define_column(&policy, 500, 4).unwrap();

        assert_eq!(column.policy(), "entry-seeded");
        assert_eq!(column.threads(), 4);
        for (id, &value) in column.values().iter().enumerate() {
            assert_eq!(value, policy.draw_deterministic(id as u64));
        }
        assert_eq!(column.get(500), None);
    }

    #[test]
    fn test_single_thread_global_column_is_sequential() {
        let policy = GlobalPolicy::seeded(11);
        let column = define_column(&policy, 1000, 1).unwrap();

        let reference = SharedEngine::new(11);
        for &value in column.values() {
            assert_eq!(value, reference.draw());
        }
        assert_eq!(policy.engine().lost_transitions(), 0);
        assert_eq!(column.repeated_values(), 0);
    }

    #[test]
    fn test_dyn_policy() {
        let policy: Box<dyn DrawPolicy> = Box::new(ThreadOwnedPolicy::new());
        let column = define_column(policy.as_ref(), 100, 2).unwrap();
        assert_eq!(column.len(), 100);
        assert!(!column.is_empty());
    }

    #[test]
    fn test_thread_owned_isolated() {
        let policy = ThreadOwnedPolicy::new();
        let traces = define_column_traced(&policy, 10_000, 4).unwrap();
        let report = check_isolation(&traces);

        assert!(report.is_isolated());
        assert!(report.shared_engines().is_empty());
        assert!(report.engine_count() <= 4);
        assert_eq!(report.engine_count(), policy.registry().slots_created());
    }

    #[test]
    fn test_global_not_isolated_across_threads() {
        let policy = GlobalPolicy::seeded(1);
        let mut traces = define_column_traced(&policy, 1, 1).unwrap();
        // Same engine reported from a second thread
        traces.push(
            std::thread::spawn(move || policy.draw_traced(1))
                .join()
                .unwrap(),
        );

        let report = check_isolation(&traces);
        assert_eq!(report.engine_count(), 1);
        assert!(!report.is_isolated());
        assert_eq!(report.shared_engines().len(), 1);
    }
}
