//! Process-wide engine with no synchronisation.
//!
//! [`SharedEngine`] keeps its generator state, cached variate and cache flag
//! in separate relaxed atomics. Every generator step is a plain
//! load–compute–store, so two threads stepping at once can both read the
//! same state: one transition is lost and the same uniform value is handed
//! out twice.
//!
//! The cached variate behaves like an `Option<f64>` spread over two words.
//! Taking it checks the flag, reads the payload, then empties the slot
//! (payload zeroed, flag cleared) in separate stores. Two callers that both
//! pass the flag check before either clears it are served the same slot:
//! the later one reads the emptied payload and returns exactly the mean.
//! Those surplus values shrink the sample standard deviation, which is the
//! statistical distortion the safe policies avoid. No undefined behaviour
//! is involved.
//!
//! The generator is SplitMix64, whose state after `k` steps is
//! `seed + k * GAMMA`. Because `GAMMA` is odd it is invertible modulo 2^64,
//! so the number of transitions that actually landed can be recovered from
//! the state and compared with the number attempted.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::distribution::{polar_pair, Gaussian};
use crate::types::EngineId;

const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
const GAMMA_INV: u64 = mod_inverse(GAMMA);

/// Multiplicative inverse of an odd number modulo 2^64 (Newton iteration).
const fn mod_inverse(a: u64) -> u64 {
    let mut x = a;
    let mut i = 0;
    while i < 5 {
        x = x.wrapping_mul(2u64.wrapping_sub(a.wrapping_mul(x)));
        i += 1;
    }
    x
}

#[inline]
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// How the unsynchronised read and write of each step are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interleaving {
    /// Steps run back to back. Callers overlap only when they truly run in
    /// parallel, so corruption depends on core count and timing.
    #[default]
    Hardware,
    /// The calling thread yields between reading and writing shared state,
    /// so concurrent callers interleave even on a single core.
    Forced,
}

impl Interleaving {
    /// Returns the configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interleaving::Hardware => "hardware",
            Interleaving::Forced => "forced",
        }
    }
}

impl fmt::Display for Interleaving {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine shared by reference between any number of threads.
///
/// All methods take `&self`. Single-threaded use is fully reproducible;
/// concurrent use is not, and [`lost_transitions`](Self::lost_transitions)
/// reports how much sequencing was corrupted.
///
/// # Examples
///
/// ```rust
/// use sample_core::SharedEngine;
///
/// let engine = SharedEngine::new(42);
/// for _ in 0..1000 {
///     engine.draw();
/// }
/// assert_eq!(engine.lost_transitions(), 0);
/// ```
#[derive(Debug)]
pub struct SharedEngine {
    id: EngineId,
    seed: u64,
    gaussian: Gaussian,
    state: AtomicU64,
    spare_bits: AtomicU64,
    has_spare: AtomicBool,
    interleaving: Interleaving,
    attempted: AtomicU64,
    spares_cached: AtomicU64,
    spares_served: AtomicU64,
}

impl SharedEngine {
    /// Creates a standard normal engine from `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_gaussian(seed, Gaussian::STANDARD)
    }

    /// Creates an engine targeting `gaussian`.
    pub fn with_gaussian(seed: u64, gaussian: Gaussian) -> Self {
        Self {
            id: EngineId::next(),
            seed,
            gaussian,
            state: AtomicU64::new(seed),
            spare_bits: AtomicU64::new(0),
            has_spare: AtomicBool::new(false),
            interleaving: Interleaving::Hardware,
            attempted: AtomicU64::new(0),
            spares_cached: AtomicU64::new(0),
            spares_served: AtomicU64::new(0),
        }
    }

    /// Sets how concurrent steps are interleaved.
    pub fn with_interleaving(mut self, interleaving: Interleaving) -> Self {
        self.interleaving = interleaving;
        self
    }

    /// Creates a standard normal engine seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(OsRng.next_u64())
    }

    /// Returns the engine identity.
    #[inline]
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Returns the initial seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the target distribution.
    #[inline]
    pub fn gaussian(&self) -> Gaussian {
        self.gaussian
    }

    /// Returns the interleaving mode.
    #[inline]
    pub fn interleaving(&self) -> Interleaving {
        self.interleaving
    }

    /// Gap between reading and writing shared state.
    #[inline]
    fn race_window(&self) {
        if self.interleaving == Interleaving::Forced {
            thread::yield_now();
        }
    }

    /// Advances the generator one step and returns a uniform in `[0, 1)`.
    fn next_uniform(&self) -> f64 {
        self.attempted.fetch_add(1, Ordering::Relaxed);
        // Not a fetch_add: concurrent steps may overwrite each other.
        let state = self.state.load(Ordering::Relaxed).wrapping_add(GAMMA);
        self.race_window();
        self.state.store(state, Ordering::Relaxed);
        (mix(state) >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Takes the cached variate, leaving the slot empty.
    fn take_spare(&self) -> Option<f64> {
        if !self.has_spare.load(Ordering::Relaxed) {
            return None;
        }
        self.race_window();
        let z = f64::from_bits(self.spare_bits.load(Ordering::Relaxed));
        self.spare_bits.store(0, Ordering::Relaxed);
        self.has_spare.store(false, Ordering::Relaxed);
        self.spares_served.fetch_add(1, Ordering::Relaxed);
        Some(z)
    }

    fn put_spare(&self, z: f64) {
        self.spare_bits.store(z.to_bits(), Ordering::Relaxed);
        self.has_spare.store(true, Ordering::Relaxed);
        self.spares_cached.fetch_add(1, Ordering::Relaxed);
    }

    /// Draws one sample.
    pub fn draw(&self) -> f64 {
        let z = match self.take_spare() {
            Some(z) => z,
            None => {
                let (z0, z1) = polar_pair(|| self.next_uniform());
                self.put_spare(z1);
                z0
            }
        };
        self.gaussian.scale(z)
    }

    /// Number of generator steps callers attempted.
    pub fn transitions_attempted(&self) -> u64 {
        self.attempted.load(Ordering::Relaxed)
    }

    /// Number of generator steps reflected in the current state.
    pub fn transitions_recorded(&self) -> u64 {
        self.state
            .load(Ordering::Relaxed)
            .wrapping_sub(self.seed)
            .wrapping_mul(GAMMA_INV)
    }

    /// Steps that were attempted but overwritten by a concurrent caller.
    ///
    /// Always zero when the engine is used from one thread at a time.
    pub fn lost_transitions(&self) -> u64 {
        self.transitions_attempted()
            .saturating_sub(self.transitions_recorded())
    }

    /// Cached variates served more than once, or served after being emptied.
    ///
    /// Always zero when the engine is used from one thread at a time.
    pub fn spare_overreads(&self) -> u64 {
        self.spares_served
            .load(Ordering::Relaxed)
            .saturating_sub(self.spares_cached.load(Ordering::Relaxed))
    }
}
