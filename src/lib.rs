//! # Devstream
//!
//! Single-pass streaming statistics with durable snapshots.
//!
//! Devstream keeps the count, mean, sample variance, standard deviation,
//! minimum and maximum of a stream of numbers without storing the numbers
//! themselves, and can save that running state to a keyed store with expiry
//! so accumulation survives restarts or is shared between processes.
//!
//! ## Features
//!
//! - **Running Moments**: Welford's numerically stable single-pass update
//! - **Mergeability**: Partial accumulations combine exactly
//! - **Snapshots**: JSON encode/decode, reading older extrema-less payloads
//! - **Keyed Persistence**: Save/restore/clear against any [`SnapshotStore`](persistence::SnapshotStore)
//!
//! ## Quick Start
//!
//! ```rust
//! use devstream::prelude::*;
//!
//! let mut stats = Moments::new();
//! for v in [0.0, 100.0, 0.0, 100.0] {
//!     stats.push(v);
//! }
//! assert!((stats.mean() - 50.0).abs() < 1e-9);
//! println!("stddev: {}", stats.standard_deviation());
//! ```
//!
//! ## Persistence
//!
//! ```rust
//! use devstream::persistence::{DeviationStream, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let mut stream = DeviationStream::with_store("requests:latency", store.clone());
//! stream.push(120.0);
//!
//! pollster::block_on(stream.save()).unwrap();
//!
//! let mut restored = DeviationStream::with_store("requests:latency", store);
//! pollster::block_on(restored.restore()).unwrap();
//! assert_eq!(restored.mean(), 120.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `persistence` (default): Snapshot codec, store contract and
//!   [`DeviationStream`](persistence::DeviationStream); implies `std`
//!
//! Without `std` the statistics core builds for `no_std`, using libm.

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod math;

// Core traits always available
pub mod traits;

pub mod statistics;

#[cfg(feature = "persistence")]
#[cfg_attr(docsrs, doc(cfg(feature = "persistence")))]
pub mod persistence;

pub mod prelude {
    pub use crate::statistics::Moments;
    pub use crate::traits::*;

    #[cfg(feature = "persistence")]
    pub use crate::persistence::{DeviationStream, MemoryStore, SnapshotStore, StreamError};
}

pub use statistics::Moments;

#[cfg(feature = "persistence")]
pub use persistence::DeviationStream;
