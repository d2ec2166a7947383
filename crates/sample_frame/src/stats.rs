//! Summary statistics for sample columns.
//!
//! Uses Welford's online update per worker and Chan's pairwise merge to
//! combine partial summaries from a parallel reduction.

use rayon::prelude::*;
use sample_core::Gaussian;

/// Count, mean, standard deviation and range of a set of samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self::empty()
    }
}

impl Summary {
    /// A summary of no samples.
    pub const fn empty() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// Adds one sample.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
        self.min = self.min.min(x);
        self.max = self.max.max(x);
    }

    /// Combines two partial summaries.
    pub fn merge(self, other: Self) -> Self {
        if self.count == 0 {
            return other;
        }
        if other.count == 0 {
            return self;
        }
        let count = self.count + other.count;
        let delta = other.mean - self.mean;
        let mean = self.mean + delta * other.count as f64 / count as f64;
        let m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64) / count as f64;
        Self {
            count,
            mean,
            m2,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Summarises a slice in parallel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sample_frame::Summary;
    ///
    /// let s = Summary::from_slice(&[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(s.count(), 4);
    /// assert_eq!(s.mean(), 2.5);
    /// ```
    pub fn from_slice(values: &[f64]) -> Self {
        values
            .par_iter()
            .fold(Summary::empty, |mut s, &x| {
                s.push(x);
                s
            })
            .reduce(Summary::empty, Summary::merge)
    }

    /// Number of samples.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sample mean (0 when empty).
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population variance (0 when empty).
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest sample.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Larger of the absolute mean and standard deviation errors against
    /// `gaussian`.
    pub fn deviation(&self, gaussian: &Gaussian) -> f64 {
        let mean_err = (self.mean - gaussian.mean()).abs();
        let sd_err = (self.std_dev() - gaussian.std_dev()).abs();
        mean_err.max(sd_err)
    }

    /// Returns true if mean and standard deviation are both within
    /// `tolerance` of `gaussian`.
    pub fn within_tolerance(&self, gaussian: &Gaussian, tolerance: f64) -> bool {
        self.count > 0 && self.deviation(gaussian) <= tolerance
    }
}

/// Number of values that equal an earlier value in the slice (bitwise).
///
/// A healthy stream of continuous samples has no repeats; an unsynchronised
/// engine serving the same state twice produces them.
pub fn repeated_values(values: &[f64]) -> usize {
    let mut bits: Vec<u64> = values.par_iter().map(|v| v.to_bits()).collect();
    bits.par_sort_unstable();
    bits.windows(2).filter(|w| w[0] == w[1]).count()
}
