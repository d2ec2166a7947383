//! Thread-owned policy: one lazily created engine per worker thread.

use std::thread;

use crate::policy::DrawPolicy;
use crate::registry::{EngineFactory, EntropyFactory, ThreadSlotRegistry};
use crate::types::{TracedSample, WorkItemId};

/// Draws from the calling thread's own engine.
///
/// No two threads ever touch the same engine, so the aggregate distribution
/// is correct. Which work item receives which value still depends on how the
/// scheduler partitions items, so per-item values are not reproducible
/// between runs or thread counts.
///
/// # Example
///
/// ```rust
/// use sample_core::ThreadOwnedPolicy;
///
/// let policy = ThreadOwnedPolicy::new();
/// let x = policy.draw_threadsafe();
/// assert!(x.is_finite());
/// assert_eq!(policy.registry().slots_created(), 1);
/// ```
pub struct ThreadOwnedPolicy<F: EngineFactory = EntropyFactory> {
    registry: ThreadSlotRegistry<F>,
}

impl ThreadOwnedPolicy<EntropyFactory> {
    /// Creates a policy whose engines are seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_factory(EntropyFactory::default())
    }
}

impl Default for ThreadOwnedPolicy<EntropyFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: EngineFactory> ThreadOwnedPolicy<F> {
    /// Creates a policy whose engines come from `factory`.
    pub fn with_factory(factory: F) -> Self {
        Self {
            registry: ThreadSlotRegistry::new(factory),
        }
    }

    /// Returns the slot registry.
    #[inline]
    pub fn registry(&self) -> &ThreadSlotRegistry<F> {
        &self.registry
    }

    /// Returns the slot registry mutably, e.g. for teardown.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut ThreadSlotRegistry<F> {
        &mut self.registry
    }

    /// Draws the next sample from the calling thread's engine.
    #[inline]
    pub fn draw_threadsafe(&self) -> f64 {
        self.registry.with_engine(|engine| engine.draw())
    }
}

impl<F: EngineFactory> DrawPolicy for ThreadOwnedPolicy<F> {
    fn name(&self) -> &'static str {
        "thread-owned"
    }

    fn draw(&self, _id: WorkItemId) -> f64 {
        self.draw_threadsafe()
    }

    fn draw_traced(&self, id: WorkItemId) -> TracedSample {
        let (value, engine) = self
            .registry
            .with_engine(|engine| (engine.draw(), engine.id()));
        TracedSample {
            id,
            value,
            engine,
            thread: thread::current().id(),
        }
    }
}
