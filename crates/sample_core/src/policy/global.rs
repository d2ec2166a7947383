//! Global policy: every caller shares one unsynchronised engine.

use std::thread;

use crate::policy::DrawPolicy;
use crate::shared::SharedEngine;
use crate::types::{TracedSample, WorkItemId};

/// Draws from a single [`SharedEngine`] with no mutual exclusion.
///
/// Correct when one thread draws at a time. Under contention callers
/// overwrite each other's generator steps; see
/// [`SharedEngine::lost_transitions`].
#[derive(Debug)]
pub struct GlobalPolicy {
    engine: SharedEngine,
}

impl GlobalPolicy {
    /// Wraps an existing shared engine.
    pub fn new(engine: SharedEngine) -> Self {
        Self { engine }
    }

    /// Creates a policy over a standard normal engine seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SharedEngine::new(seed))
    }

    /// Creates a policy over an entropy-seeded standard normal engine.
    pub fn from_entropy() -> Self {
        Self::new(SharedEngine::from_entropy())
    }

    /// Returns the shared engine.
    #[inline]
    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    /// Draws the next sample from the shared engine.
    #[inline]
    pub fn draw_global(&self) -> f64 {
        self.engine.draw()
    }
}

impl DrawPolicy for GlobalPolicy {
    fn name(&self) -> &'static str {
        "global"
    }

    fn draw(&self, _id: WorkItemId) -> f64 {
        self.draw_global()
    }

    fn draw_traced(&self, id: WorkItemId) -> TracedSample {
        TracedSample {
            id,
            value: self.draw_global(),
            engine: self.engine.id(),
            thread: thread::current().id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_engine_sequence() {
        let policy = GlobalPolicy::seeded(8);
        let reference = SharedEngine::new(8);
        for id in 0..100 {
            assert_eq!(policy.draw(id), reference.draw());
        }
    }

    #[test]
    fn test_ignores_id() {
        let a = GlobalPolicy::seeded(1);
        let b = GlobalPolicy::seeded(1);
        assert_eq!(a.draw(0), b.draw(999));
    }

    #[test]
    fn test_traced_reports_single_engine() {
        let policy = GlobalPolicy::seeded(1);
        let t0 = policy.draw_traced(0);
        let t1 = policy.draw_traced(1);
        assert_eq!(t0.engine, t1.engine);
        assert_eq!(t0.engine, policy.engine().id());
        assert!(!policy.is_deterministic());
    }
}
