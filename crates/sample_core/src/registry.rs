//! Per-thread engine ownership.
//!
//! [`ThreadSlotRegistry`] is an explicit map from thread identity to exactly
//! one [`SampleEngine`], built on the `thread_local` crate's `ThreadLocal`.
//! Lookups after the first are lock-free and each engine is only ever
//! borrowed by the thread that owns its slot.
//!
//! # Slot Lifecycle
//!
//! 1. **Creation**: on a thread's first draw the registry asks its
//!    [`EngineFactory`] for an engine and binds it to the calling thread.
//! 2. **Use**: every later draw on that thread borrows the same engine.
//! 3. **Teardown**: slots are dropped with the registry or by
//!    [`ThreadSlotRegistry::clear`]. Storage of an exited thread may be
//!    recycled for a new thread; the new thread never inherits the old
//!    engine, a fresh one is created from the factory instead.

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, ThreadId};

use thread_local::ThreadLocal;
use tracing::debug;

use crate::distribution::{Gaussian, NormalMethod};
use crate::engine::SampleEngine;
use crate::types::EngineId;

/// Factory trait for creating per-thread engines.
///
/// Implement this trait to customise how slot engines are seeded.
pub trait EngineFactory: Send + Sync {
    /// Creates the engine for a new slot.
    fn create(&self) -> SampleEngine;
}

/// Seeds every slot engine from OS entropy.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropyFactory {
    gaussian: Gaussian,
    method: NormalMethod,
}

impl EntropyFactory {
    /// Creates a factory producing engines for `gaussian` using `method`.
    pub fn new(gaussian: Gaussian, method: NormalMethod) -> Self {
        Self { gaussian, method }
    }
}

impl EngineFactory for EntropyFactory {
    fn create(&self) -> SampleEngine {
        SampleEngine::from_entropy().with_distribution(self.gaussian, self.method)
    }
}

/// Seeds every slot engine with the same fixed seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSeedFactory {
    seed: u64,
    gaussian: Gaussian,
    method: NormalMethod,
}

impl FixedSeedFactory {
    /// Creates a factory producing engines seeded with `seed`.
    pub fn new(seed: u64, gaussian: Gaussian, method: NormalMethod) -> Self {
        Self {
            seed,
            gaussian,
            method,
        }
    }
}

impl EngineFactory for FixedSeedFactory {
    fn create(&self) -> SampleEngine {
        SampleEngine::from_seed(self.seed).with_distribution(self.gaussian, self.method)
    }
}

/// One thread's binding to its engine.
#[derive(Debug)]
pub struct ThreadSlot {
    owner: Cell<ThreadId>,
    engine: RefCell<SampleEngine>,
}

impl ThreadSlot {
    fn new(engine: SampleEngine) -> Self {
        Self {
            owner: Cell::new(thread::current().id()),
            engine: RefCell::new(engine),
        }
    }

    /// Returns the thread that owns this slot.
    #[inline]
    pub fn owner(&self) -> ThreadId {
        self.owner.get()
    }

    /// Returns the identity of the slot's engine.
    pub fn engine_id(&self) -> EngineId {
        self.engine.borrow().id()
    }
}

/// Registry of per-thread engines.
///
/// The registry itself is `Send + Sync` and is shared by reference between
/// worker threads; individual engines are accessed thread-locally without
/// synchronisation.
///
/// # Example
///
/// ```rust
/// use sample_core::{EntropyFactory, ThreadSlotRegistry};
///
/// let registry = ThreadSlotRegistry::new(EntropyFactory::default());
///
/// let first = registry.with_engine(|engine| engine.id());
/// let second = registry.with_engine(|engine| engine.id());
/// assert_eq!(first, second);
/// assert_eq!(registry.slots_created(), 1);
/// ```
pub struct ThreadSlotRegistry<F: EngineFactory = EntropyFactory> {
    slots: ThreadLocal<ThreadSlot>,
    factory: F,
    slots_created: AtomicUsize,
}

impl<F: EngineFactory> ThreadSlotRegistry<F> {
    /// Creates an empty registry.
    pub fn new(factory: F) -> Self {
        Self {
            slots: ThreadLocal::new(),
            factory,
            slots_created: AtomicUsize::new(0),
        }
    }

    /// Returns the engine factory.
    #[inline]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Returns the number of engines created so far.
    #[inline]
    pub fn slots_created(&self) -> usize {
        self.slots_created.load(Ordering::Relaxed)
    }

    fn create_engine(&self) -> SampleEngine {
        let engine = self.factory.create();
        self.slots_created.fetch_add(1, Ordering::Relaxed);
        debug!(
            thread = ?thread::current().id(),
            engine = %engine.id(),
            "created thread slot"
        );
        engine
    }

    /// Executes a closure with the calling thread's engine.
    ///
    /// The engine is created on the thread's first call; later calls reuse it.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from within `f` on the same thread.
    pub fn with_engine<T>(&self, f: impl FnOnce(&mut SampleEngine) -> T) -> T {
        let slot = self
            .slots
            .get_or(|| ThreadSlot::new(self.create_engine()));

        let current = thread::current().id();
        if slot.owner() != current {
            // Recycled storage from an exited thread
            *slot.engine.borrow_mut() = self.create_engine();
            slot.owner.set(current);
        }

        let mut engine = slot.engine.borrow_mut();
        f(&mut engine)
    }

    /// Lists `(owner, engine)` pairs for every live slot.
    ///
    /// Slots are not `Sync`, so this needs exclusive access and can only run
    /// between columns. Use `draw_traced` to observe engines during a run.
    pub fn engine_ids(&mut self) -> Vec<(ThreadId, EngineId)> {
        self.slots
            .iter_mut()
            .map(|slot| (slot.owner(), slot.engine.get_mut().id()))
            .collect()
    }

    /// Drops every slot. Threads get a fresh engine on their next draw.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<F: EngineFactory + Default> Default for ThreadSlotRegistry<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}
