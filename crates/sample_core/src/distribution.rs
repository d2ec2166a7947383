//! Gaussian distribution and the transforms that turn uniform bits into
//! normal variates.
//!
//! Two methods are offered:
//!
//! - [`NormalMethod::Polar`]: Marsaglia's polar method. Each rejection loop
//!   yields a pair of independent variates; the second is cached in the
//!   transform and returned by the next call. This cached value is the
//!   distribution state that must be reset together with any reseed.
//! - [`NormalMethod::Ziggurat`]: the ZIGNOR Ziggurat method via
//!   `rand_distr::StandardNormal`. Stateless, so resetting is a no-op.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::DistributionError;

/// Normal distribution parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gaussian {
    mean: f64,
    std_dev: f64,
}

impl Gaussian {
    /// The standard normal distribution N(0, 1).
    pub const STANDARD: Self = Self {
        mean: 0.0,
        std_dev: 1.0,
    };

    /// Creates a normal distribution with the given mean and standard
    /// deviation.
    ///
    /// # Errors
    ///
    /// Returns an error if `mean` is not finite or `std_dev` is not a
    /// positive finite number.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sample_core::Gaussian;
    ///
    /// let g = Gaussian::new(1.5, 0.5).unwrap();
    /// assert_eq!(g.mean(), 1.5);
    /// assert!(Gaussian::new(0.0, 0.0).is_err());
    /// ```
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, DistributionError> {
        if !mean.is_finite() {
            return Err(DistributionError::InvalidMean(mean));
        }
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return Err(DistributionError::InvalidStdDev(std_dev));
        }
        Ok(Self { mean, std_dev })
    }

    /// Returns the mean.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the standard deviation.
    #[inline]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Maps a standard normal variate onto this distribution.
    #[inline]
    pub fn scale(&self, z: f64) -> f64 {
        self.mean + self.std_dev * z
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Algorithm used to produce standard normal variates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormalMethod {
    /// Marsaglia polar method with a cached second variate.
    #[default]
    Polar,
    /// Ziggurat method; no cached state.
    Ziggurat,
}

impl NormalMethod {
    /// Returns the configuration name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalMethod::Polar => "polar",
            NormalMethod::Ziggurat => "ziggurat",
        }
    }

    /// Returns true if the method keeps state between draws.
    pub fn is_stateful(&self) -> bool {
        matches!(self, NormalMethod::Polar)
    }
}

impl FromStr for NormalMethod {
    type Err = DistributionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polar" | "marsaglia" => Ok(NormalMethod::Polar),
            "ziggurat" | "zignor" => Ok(NormalMethod::Ziggurat),
            _ => Err(DistributionError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for NormalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces a pair of independent standard normal variates from a source of
/// uniform values in `[0, 1)`.
///
/// Candidate points are drawn in the square `[-1, 1)²` until one falls
/// strictly inside the unit disc (excluding the origin).
///
/// # Examples
///
/// ```rust
/// use sample_core::polar_pair;
///
/// let mut uniforms = [0.75, 0.5].into_iter().cycle();
/// let (z0, z1) = polar_pair(|| uniforms.next().unwrap());
/// assert!(z0 > 0.0);
/// assert_eq!(z1, 0.0);
/// ```
pub fn polar_pair<F>(mut uniform: F) -> (f64, f64)
where
    F: FnMut() -> f64,
{
    loop {
        let u = 2.0 * uniform() - 1.0;
        let v = 2.0 * uniform() - 1.0;
        let s = u * u + v * v;
        if s > 0.0 && s < 1.0 {
            let factor = (-2.0 * s.ln() / s).sqrt();
            return (u * factor, v * factor);
        }
    }
}

/// Stateful transform from uniform bits to a [`Gaussian`].
///
/// Holds the distribution state of a [`SampleEngine`](crate::SampleEngine).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalTransform {
    gaussian: Gaussian,
    method: NormalMethod,
    spare: Option<f64>,
}

impl NormalTransform {
    /// Creates a transform with no cached state.
    pub fn new(gaussian: Gaussian, method: NormalMethod) -> Self {
        Self {
            gaussian,
            method,
            spare: None,
        }
    }

    /// Returns the target distribution.
    #[inline]
    pub fn gaussian(&self) -> Gaussian {
        self.gaussian
    }

    /// Returns the normal method.
    #[inline]
    pub fn method(&self) -> NormalMethod {
        self.method
    }

    /// Returns true if a cached variate is waiting to be returned.
    #[inline]
    pub fn has_spare(&self) -> bool {
        self.spare.is_some()
    }

    /// Discards any cached variate.
    #[inline]
    pub fn reset(&mut self) {
        self.spare = None;
    }

    /// Draws one sample, consuming uniform values from `rng` as needed.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        let z = match self.method {
            NormalMethod::Polar => match self.spare.take() {
                Some(z) => z,
                None => {
                    let (z0, z1) = polar_pair(|| rng.gen::<f64>());
                    self.spare = Some(z1);
                    z0
                }
            },
            NormalMethod::Ziggurat => StandardNormal.sample(rng),
        };
        self.gaussian.scale(z)
    }
}
