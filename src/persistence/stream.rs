//! Keyed running statistics with snapshot persistence

use log::{debug, warn};

use super::snapshot::{self, EncodeError};
use super::store::{MemoryStore, SnapshotStore};
use crate::statistics::Moments;
use crate::traits::DecodeError;

/// Expiry applied to every saved snapshot, restarted on each save
pub const SNAPSHOT_TTL_SECS: u64 = 3600;

/// Failure of a persistence operation on a [`DeviationStream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError<E> {
    /// The stream was built without a store
    NotConfigured,
    /// The store call failed
    Store(E),
    /// The stored snapshot could not be decoded
    Decode(DecodeError),
    /// The current state could not be encoded
    Encode(EncodeError),
}

impl<E: core::fmt::Display> core::fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StreamError::NotConfigured => {
                write!(f, "no snapshot store was configured for this stream")
            }
            StreamError::Store(e) => write!(f, "snapshot store error: {}", e),
            StreamError::Decode(e) => write!(f, "{}", e),
            StreamError::Encode(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for StreamError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::NotConfigured => None,
            StreamError::Store(e) => Some(e),
            StreamError::Decode(e) => Some(e),
            StreamError::Encode(e) => Some(e),
        }
    }
}

/// Running mean, variance and extrema bound to a store key
///
/// [`push`](Self::push) and the queries touch memory only. [`save`](Self::save),
/// [`restore`](Self::restore) and [`reset`](Self::reset) each make exactly one
/// store call. A stream without a store is fully usable in memory; its
/// persistence operations fail with [`StreamError::NotConfigured`].
///
/// Not synchronized: share a stream across threads behind a lock. Streams
/// in different processes saving under one key overwrite each other.
///
/// # Example
///
/// ```
/// use devstream::persistence::{DeviationStream, MemoryStore};
///
/// let store = MemoryStore::new();
/// let mut writer = DeviationStream::with_store("latency:api", store.clone());
/// let mut reader = DeviationStream::with_store("latency:api", store);
///
/// for ms in [12.0, 15.0, 11.0, 30.0] {
///     writer.push(ms);
/// }
///
/// pollster::block_on(async {
///     writer.save().await.unwrap();
///     reader.restore().await.unwrap();
/// });
///
/// assert_eq!(reader.count(), 4);
/// assert_eq!(reader.max(), 30.0);
/// ```
#[derive(Debug, Clone)]
pub struct DeviationStream<S = MemoryStore> {
    key: String,
    state: Moments,
    store: Option<S>,
}

impl DeviationStream {
    /// Create a stream with no store
    ///
    /// Only in-memory accumulation is available.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: Moments::new(),
            store: None,
        }
    }
}

impl<S: SnapshotStore> DeviationStream<S> {
    /// Create a stream persisted under `key` in `store`
    pub fn with_store(key: impl Into<String>, store: S) -> Self {
        Self {
            key: key.into(),
            state: Moments::new(),
            store: Some(store),
        }
    }

    /// Store key for this stream's snapshot
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current in-memory state
    pub fn state(&self) -> &Moments {
        &self.state
    }

    /// Check if a store is attached
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Add an observation
    pub fn push(&mut self, value: f64) {
        self.state.push(value);
    }

    /// Number of observations since the last reset
    pub fn count(&self) -> u64 {
        self.state.count()
    }

    /// Arithmetic mean, `0.0` when empty
    pub fn mean(&self) -> f64 {
        self.state.mean()
    }

    /// Sample variance, `0.0` below two observations
    pub fn variance(&self) -> f64 {
        self.state.variance()
    }

    /// Sample standard deviation
    pub fn standard_deviation(&self) -> f64 {
        self.state.standard_deviation()
    }

    /// Smallest observation, `0.0` when empty
    pub fn min(&self) -> f64 {
        self.state.min()
    }

    /// Largest observation, `0.0` when empty
    pub fn max(&self) -> f64 {
        self.state.max()
    }

    fn store(&self, op: &str) -> Result<&S, StreamError<S::Error>> {
        self.store.as_ref().ok_or_else(|| {
            warn!("{} on stream {:?} without a snapshot store", op, self.key);
            StreamError::NotConfigured
        })
    }

    /// Write the current state under the stream's key
    ///
    /// The snapshot expires [`SNAPSHOT_TTL_SECS`] after the write.
    pub async fn save(&self) -> Result<(), StreamError<S::Error>> {
        let store = self.store("save")?;
        let payload = snapshot::encode(&self.state).map_err(StreamError::Encode)?;

        debug!("saving stream {:?} ({} values)", self.key, self.state.count());
        store
            .set_with_expiry(&self.key, &payload, SNAPSHOT_TTL_SECS)
            .await
            .map_err(StreamError::Store)
    }

    /// Replace the in-memory state with the stored snapshot
    ///
    /// A missing snapshot leaves the state as it is. A snapshot that fails
    /// to decode also leaves it untouched and is reported as
    /// [`StreamError::Decode`].
    pub async fn restore(&mut self) -> Result<(), StreamError<S::Error>> {
        let store = self.store("restore")?;
        let payload = store.get(&self.key).await.map_err(StreamError::Store)?;

        let Some(payload) = payload else {
            debug!("no snapshot for stream {:?}", self.key);
            return Ok(());
        };

        let restored = snapshot::decode(&payload).map_err(|e| {
            warn!("discarding undecodable snapshot for stream {:?}: {}", self.key, e);
            StreamError::Decode(e)
        })?;

        debug!("restored stream {:?} ({} values)", self.key, restored.count());
        self.state = restored;
        Ok(())
    }

    /// Zero the in-memory state and delete the stored snapshot
    ///
    /// The in-memory state is zeroed even when no store is attached or the
    /// delete fails.
    pub async fn reset(&mut self) -> Result<(), StreamError<S::Error>> {
        self.state.reset();

        let store = self.store("reset")?;
        debug!("deleting snapshot for stream {:?}", self.key);
        store.delete(&self.key).await.map_err(StreamError::Store)
    }

    /// Same as [`reset`](Self::reset)
    pub async fn clear(&mut self) -> Result<(), StreamError<S::Error>> {
        self.reset().await
    }
}
