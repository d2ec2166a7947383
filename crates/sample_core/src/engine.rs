//! Sample engine: a seeded bit generator paired with a Gaussian transform.
//!
//! This module provides [`SampleEngine`], the leaf primitive every policy
//! draws from. Generator state and distribution state are owned together so
//! that callers can reseed and reset them as one unit.
//!
//! The engine is generic over any seedable bit generator and defaults to
//! [`StdRng`]. Values reproduced from a seed are only stable for a fixed
//! generator algorithm, so the default is part of the reproducibility
//! contract of the entry-seeded policy.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::distribution::{Gaussian, NormalMethod, NormalTransform};
use crate::types::EngineId;

/// Seeded generator plus distribution state.
///
/// # Invariant
///
/// The cached variate of a [`NormalMethod::Polar`] transform was derived from
/// the generator's past output. Reseeding the generator without calling
/// [`reset_distribution`](Self::reset_distribution) lets that stale variate
/// leak into the next draw. [`reseed_and_draw`](Self::reseed_and_draw) does
/// both in the required order.
///
/// # Examples
///
/// ```rust
/// use sample_core::SampleEngine;
///
/// let mut engine = SampleEngine::from_seed(42);
/// let first = engine.draw();
///
/// engine.initialise(42);
/// engine.reset_distribution();
/// assert_eq!(engine.draw(), first);
/// ```
#[derive(Debug)]
pub struct SampleEngine<R = StdRng> {
    /// Identity used for isolation tracking.
    id: EngineId,
    /// The underlying PRNG instance.
    rng: R,
    /// Gaussian transform and its cached state.
    transform: NormalTransform,
    /// The last explicit seed (`None` when seeded from entropy).
    seed: Option<u64>,
}

impl SampleEngine<StdRng> {
    /// Creates a standard normal engine initialised with the given seed.
    ///
    /// The same seed always produces the same sequence of samples.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sample_core::SampleEngine;
    ///
    /// let mut a = SampleEngine::from_seed(12345);
    /// let mut b = SampleEngine::from_seed(12345);
    /// assert_eq!(a.draw(), b.draw());
    /// ```
    pub fn from_seed(seed: u64) -> Self {
        Self::with_generator_seed(seed)
    }

    /// Creates a standard normal engine seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_generator_entropy()
    }
}

impl<R: RngCore + SeedableRng> SampleEngine<R> {
    /// Creates a standard normal engine over generator `R` seeded with
    /// `seed`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rand::rngs::StdRng;
    /// use sample_core::SampleEngine;
    ///
    /// let mut a = SampleEngine::<StdRng>::with_generator_seed(3);
    /// let mut b = SampleEngine::from_seed(3);
    /// assert_eq!(a.draw(), b.draw());
    /// ```
    pub fn with_generator_seed(seed: u64) -> Self {
        Self {
            id: EngineId::next(),
            rng: R::seed_from_u64(seed),
            transform: NormalTransform::default(),
            seed: Some(seed),
        }
    }

    /// Creates a standard normal engine over generator `R` seeded from OS
    /// entropy.
    pub fn with_generator_entropy() -> Self {
        Self {
            id: EngineId::next(),
            rng: R::from_entropy(),
            transform: NormalTransform::default(),
            seed: None,
        }
    }

    /// Replaces the target distribution and method, discarding cached state.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sample_core::{Gaussian, NormalMethod, SampleEngine};
    ///
    /// let engine = SampleEngine::from_seed(1)
    ///     .with_distribution(Gaussian::new(10.0, 2.0).unwrap(), NormalMethod::Ziggurat);
    /// assert_eq!(engine.gaussian().mean(), 10.0);
    /// ```
    pub fn with_distribution(mut self, gaussian: Gaussian, method: NormalMethod) -> Self {
        self.transform = NormalTransform::new(gaussian, method);
        self
    }

    /// Returns the engine identity.
    #[inline]
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Returns the last explicit seed, or `None` for an entropy-seeded engine.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the target distribution.
    #[inline]
    pub fn gaussian(&self) -> Gaussian {
        self.transform.gaussian()
    }

    /// Returns the normal method.
    #[inline]
    pub fn method(&self) -> NormalMethod {
        self.transform.method()
    }

    /// Returns true if distribution state is cached from an earlier draw.
    #[inline]
    pub fn has_cached_state(&self) -> bool {
        self.transform.has_spare()
    }

    /// Reinitialises the generator state from `seed`.
    ///
    /// Distribution state is left untouched; pair with
    /// [`reset_distribution`](Self::reset_distribution).
    #[inline]
    pub fn initialise(&mut self, seed: u64) {
        self.rng = R::seed_from_u64(seed);
        self.seed = Some(seed);
    }

    /// Clears cached distribution state without touching the generator.
    #[inline]
    pub fn reset_distribution(&mut self) {
        self.transform.reset();
    }

    /// Draws one sample from the configured distribution.
    #[inline]
    pub fn draw(&mut self) -> f64 {
        self.transform.sample(&mut self.rng)
    }

    /// Reseeds, resets the distribution state and draws one sample.
    ///
    /// The result depends on `seed` and the distribution configuration only.
    #[inline]
    pub fn reseed_and_draw(&mut self, seed: u64) -> f64 {
        self.initialise(seed);
        self.reset_distribution();
        self.draw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;

    #[test]
    fn test_seed_reproducibility() {
        let mut a = SampleEngine::from_seed(12345);
        let mut b = SampleEngine::from_seed(12345);
        for _ in 0..100 {
            assert_eq!(a.draw(), b.draw());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SampleEngine::from_seed(1);
        let mut b = SampleEngine::from_seed(2);
        let xs: Vec<f64> = (0..10).map(|_| a.draw()).collect();
        let ys: Vec<f64> = (0..10).map(|_| b.draw()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn test_seed_tracking() {
        let mut engine = SampleEngine::from_seed(7);
        assert_eq!(engine.seed(), Some(7));
        engine.initialise(9);
        assert_eq!(engine.seed(), Some(9));
        assert_eq!(SampleEngine::from_entropy().seed(), None);
    }

    #[test]
    fn test_initialise_keeps_distribution_state() {
        let mut engine = SampleEngine::from_seed(3);
        engine.draw();
        assert!(engine.has_cached_state());

        engine.initialise(4);
        assert!(engine.has_cached_state());

        engine.reset_distribution();
        assert!(!engine.has_cached_state());
    }

    #[test]
    fn test_reset_does_not_touch_generator() {
        let mut reference = SampleEngine::from_seed(11);
        let mut engine = SampleEngine::from_seed(11);

        // Reference consumes a whole pair; engine discards its spare instead
        reference.draw();
        reference.draw();
        engine.draw();
        engine.reset_distribution();
        assert_eq!(engine.draw(), reference.draw());
    }

    #[test]
    fn test_initialise_without_reset_leaks_spare() {
        let mut fresh = SampleEngine::from_seed(100);
        let expected = fresh.draw();

        let mut engine = SampleEngine::from_seed(200);
        engine.draw();
        engine.initialise(100);
        assert_ne!(engine.draw(), expected);
    }

    #[test]
    fn test_reseed_and_draw_is_history_free() {
        let mut fresh = SampleEngine::from_seed(100);
        let expected = fresh.draw();

        let mut engine = SampleEngine::from_entropy();
        for _ in 0..5 {
            engine.draw();
        }
        assert_eq!(engine.reseed_and_draw(100), expected);
        assert_eq!(engine.reseed_and_draw(100), expected);
    }

    #[test]
    fn test_engine_ids_distinct() {
        let a = SampleEngine::from_seed(0);
        let b = SampleEngine::from_seed(0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_with_distribution_discards_state() {
        let mut engine = SampleEngine::from_seed(0);
        engine.draw();
        let engine = engine.with_distribution(Gaussian::STANDARD, NormalMethod::Polar);
        assert!(!engine.has_cached_state());
    }

    #[test]
    fn test_default_generator_stream_is_pinned() {
        // ChaCha12 keyed through seed_from_u64; a change here breaks every
        // previously recorded entry-seeded column
        let cases = [
            (0u64, 0xbb2a_3fb2_cd2c_6f7f_u64),
            (42, 0x86cc_7763_2227_24a2),
            (u64::MAX, 0x0fa7_9848_2e3d_5fb8),
        ];
        for (seed, first) in cases {
            assert_eq!(StdRng::seed_from_u64(seed).next_u64(), first, "seed {}", seed);
        }
    }

    #[test]
    fn test_alternative_generator() {
        let mut small = SampleEngine::<SmallRng>::with_generator_seed(42);
        let mut standard = SampleEngine::from_seed(42);
        assert_eq!(small.seed(), Some(42));

        let xs: Vec<f64> = (0..10).map(|_| small.draw()).collect();
        let ys: Vec<f64> = (0..10).map(|_| standard.draw()).collect();
        assert_ne!(xs, ys);

        let mut fresh = SampleEngine::<SmallRng>::with_generator_seed(7);
        let expected = fresh.draw();
        assert_eq!(small.reseed_and_draw(7), expected);
    }

    #[test]
    fn test_alternative_generator_from_entropy() {
        let mut engine = SampleEngine::<SmallRng>::with_generator_entropy()
            .with_distribution(Gaussian::new(5.0, 0.1).unwrap(), NormalMethod::Ziggurat);
        assert_eq!(engine.seed(), None);
        assert!((engine.draw() - 5.0).abs() < 2.0);
    }
}
