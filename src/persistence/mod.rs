//! Snapshot persistence for running statistics
//!
//! A [`DeviationStream`] pairs a [`Moments`](crate::statistics::Moments)
//! accumulator with a store key. Its state can be saved to a
//! [`SnapshotStore`] and restored later, by the same process after a
//! restart or by another process sharing the key.
//!
//! # Example
//!
//! ```
//! use devstream::persistence::{DeviationStream, MemoryStore, StreamError};
//!
//! let mut stream = DeviationStream::with_store("orders:value", MemoryStore::new());
//! stream.push(19.99);
//! stream.push(5.49);
//!
//! pollster::block_on(async {
//!     stream.save().await.unwrap();
//!     stream.clear().await.unwrap();
//! });
//! assert_eq!(stream.count(), 0);
//!
//! // Without a store, persistence fails but in-memory use works
//! let mut local = DeviationStream::new("scratch");
//! local.push(1.0);
//! assert!(matches!(pollster::block_on(local.save()), Err(StreamError::NotConfigured)));
//! ```

pub mod snapshot;
mod store;
mod stream;

pub use snapshot::{EncodeError, LEGACY_MAX, LEGACY_MIN};
pub use store::{MemoryStore, SnapshotStore, MAX_TTL_SECS, PURGE_INTERVAL};
pub use stream::{DeviationStream, StreamError, SNAPSHOT_TTL_SECS};
