//! Draw policies invoked by the scheduler once per work item.
//!
//! | Policy | Engine ownership | Per-call work |
//! |--------|------------------|---------------|
//! | [`GlobalPolicy`] | one shared engine, unsynchronised | draw |
//! | [`ThreadOwnedPolicy`] | one engine per thread, entropy seeded | draw |
//! | [`EntrySeededPolicy`] | one engine per thread | reseed, reset, draw |
//!
//! All three implement [`DrawPolicy`] so a scheduler can drive them through
//! one signature. Policies that do not use the work item id ignore it.

mod entry_seeded;
mod global;
mod thread_owned;

pub use entry_seeded::{pure_draw, EntrySeededPolicy, ResetMode};
pub use global::GlobalPolicy;
pub use thread_owned::ThreadOwnedPolicy;

use crate::types::{TracedSample, WorkItemId};

/// A draw function callable concurrently from any number of worker threads.
pub trait DrawPolicy: Sync {
    /// Short policy name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Draws the sample for work item `id`.
    fn draw(&self, id: WorkItemId) -> f64;

    /// Draws the sample for work item `id`, recording the engine and thread.
    fn draw_traced(&self, id: WorkItemId) -> TracedSample;

    /// Returns true if [`draw`](Self::draw) is a pure function of `id`.
    fn is_deterministic(&self) -> bool {
        false
    }
}
