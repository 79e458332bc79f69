//! Core traits for streaming accumulators
//!
//! Accumulators implement the base [`Sketch`] trait, with [`MomentSketch`]
//! adding the first/second moment and extrema queries.

use core::fmt::Debug;

#[cfg(feature = "std")]
use std::string::String;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::string::String;

/// Error while decoding a persisted snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not valid, or lacks a required field
    Malformed(String),
    /// The squared-deviation sum is negative
    NegativeMoment,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DecodeError::Malformed(msg) => write!(f, "malformed snapshot: {}", msg),
            DecodeError::NegativeMoment => write!(f, "negative moment accumulator"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// Core trait for all streaming accumulators
pub trait Sketch: Clone + Debug {
    /// The type of item this accumulator processes
    type Item: ?Sized;

    /// Add an item
    fn update(&mut self, item: &Self::Item);

    /// Merge another accumulator into this one
    ///
    /// The result is the accumulator that would have seen both streams.
    fn merge(&mut self, other: &Self);

    /// Reset to empty state
    fn clear(&mut self);

    /// Memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if nothing has been added
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Accumulators answering moment and extrema queries
///
/// Every query returns `0.0` where the underlying quantity is not yet
/// defined (no observations for mean and extrema, fewer than two for
/// variance).
pub trait MomentSketch: Sketch {
    /// Arithmetic mean
    fn mean(&self) -> f64;

    /// Sample variance (divisor `count - 1`)
    fn variance(&self) -> f64;

    /// Sample standard deviation
    fn standard_deviation(&self) -> f64 {
        crate::math::sqrt(self.variance())
    }

    /// Smallest value seen
    fn min(&self) -> f64;

    /// Largest value seen
    fn max(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display() {
        assert_eq!(
            DecodeError::NegativeMoment.to_string(),
            "negative moment accumulator"
        );

        let err = DecodeError::Malformed("expected value at line 1 column 1".into());
        assert!(err.to_string().starts_with("malformed snapshot"));
    }
}
