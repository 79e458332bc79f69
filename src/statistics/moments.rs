//! Running moments (count, mean, sample variance, min, max)
//!
//! Computes streaming statistics using Welford's numerically stable online algorithm.
//! Supports merging for distributed computation.

use crate::math;
use crate::traits::{MomentSketch, Sketch};

/// Running moment accumulator using Welford's algorithm
///
/// Tracks count, mean, the running sum of squared deviations (M2), min and
/// max in a single pass with O(1) memory, without retaining observations.
///
/// All queries follow the same zero convention: with no observations the
/// mean, variance and extrema read as `0.0`, and the variance stays `0.0`
/// until a second value arrives.
///
/// # Example
///
/// ```
/// use devstream::statistics::Moments;
///
/// let mut stats = Moments::new();
///
/// for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
///     stats.push(value);
/// }
///
/// assert!((stats.mean() - 5.0).abs() < 1e-9);
/// assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-9);
/// assert_eq!(stats.min(), 2.0);
/// assert_eq!(stats.max(), 9.0);
/// ```
///
/// # Distributed Usage
///
/// ```
/// use devstream::statistics::Moments;
/// use devstream::traits::Sketch;
///
/// let mut stats1 = Moments::new();
/// let mut stats2 = Moments::new();
///
/// for v in [1.0, 2.0, 3.0] {
///     stats1.push(v);
/// }
/// for v in [4.0, 5.0, 6.0] {
///     stats2.push(v);
/// }
///
/// stats1.merge(&stats2);
/// assert!((stats1.mean() - 3.5).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Moments {
    /// Number of values seen
    pub(crate) count: u64,
    /// Running mean
    pub(crate) mean: f64,
    /// Sum of squared differences from mean (M2 in Welford's algorithm)
    pub(crate) m2: f64,
    /// Minimum value
    pub(crate) min: f64,
    /// Maximum value
    pub(crate) max: f64,
}

impl Default for Moments {
    fn default() -> Self {
        Self::new()
    }
}

impl Moments {
    /// Create an empty accumulator
    pub const fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    /// Rebuild an accumulator from previously captured fields
    ///
    /// No validation is done here; the snapshot decoder checks its input
    /// before calling this.
    pub const fn from_parts(count: u64, mean: f64, m2: f64, min: f64, max: f64) -> Self {
        Self {
            count,
            mean,
            m2,
            min,
            max,
        }
    }

    /// Add a value
    ///
    /// Every value is counted, NaN and infinities included.
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.mean = value;
            self.min = value;
            self.max = value;
            self.m2 = 0.0;
            return;
        }

        // The M2 term pairs the prior mean with the updated one.
        let prior_mean = self.mean;
        self.mean = prior_mean + (value - prior_mean) / self.count as f64;
        self.m2 += (value - prior_mean) * (value - self.mean);

        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Zero every field
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Number of values pushed
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Arithmetic mean, `0.0` when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance (Bessel's correction), `0.0` below two values
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Population variance (divisor `count`), `0.0` when empty
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Sample standard deviation
    pub fn standard_deviation(&self) -> f64 {
        math::sqrt(self.variance())
    }

    /// Smallest value seen, `0.0` when empty
    pub fn min(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.min
        }
    }

    /// Largest value seen, `0.0` when empty
    pub fn max(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// `max - min`
    ///
    /// `0.0` when empty, and also while the extrema still hold the
    /// placeholders of a restored extrema-less snapshot (`min > max`).
    pub fn range(&self) -> f64 {
        let (min, max) = (self.min(), self.max());
        if min > max {
            0.0
        } else {
            max - min
        }
    }

    /// Sum of all values
    pub fn sum(&self) -> f64 {
        self.mean() * self.count as f64
    }

    /// Running sum of squared deviations from the mean
    pub fn moment_accumulator(&self) -> f64 {
        self.m2
    }

    /// Merge with another accumulator using the parallel algorithm
    ///
    /// Uses Chan et al.'s pairwise update for combining moments.
    pub fn merge_moments(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }

        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let combined_count = self.count + other.count;
        let delta = other.mean - self.mean;

        let combined_mean = self.mean + delta * (other.count as f64 / combined_count as f64);
        let combined_m2 = self.m2
            + other.m2
            + delta * delta * (self.count as f64 * other.count as f64 / combined_count as f64);

        self.count = combined_count;
        self.mean = combined_mean;
        self.m2 = combined_m2;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }
}

impl Sketch for Moments {
    type Item = f64;

    fn update(&mut self, item: &Self::Item) {
        self.push(*item);
    }

    fn merge(&mut self, other: &Self) {
        self.merge_moments(other);
    }

    fn clear(&mut self) {
        self.reset();
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl MomentSketch for Moments {
    fn mean(&self) -> f64 {
        Moments::mean(self)
    }

    fn variance(&self) -> f64 {
        Moments::variance(self)
    }

    fn min(&self) -> f64 {
        Moments::min(self)
    }

    fn max(&self) -> f64 {
        Moments::max(self)
    }
}
