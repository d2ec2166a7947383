//! Identifier types shared by engines and policies.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;

/// Stable identity of one work item within a single execution.
///
/// Assigned by the scheduler and used only as seed input.
pub type WorkItemId = u64;

/// Process-unique identity of an engine instance.
///
/// Recorded alongside samples so that tests can check which engine served
/// which call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(u64);

impl EngineId {
    /// Allocates the next identity.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

/// A sample together with the engine and thread that produced it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TracedSample {
    /// Work item the sample was drawn for.
    pub id: WorkItemId,
    /// The sample value.
    pub value: f64,
    /// Engine that produced the value.
    pub engine: EngineId,
    /// Thread that executed the draw.
    pub thread: ThreadId,
}
