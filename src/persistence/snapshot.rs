//! Snapshot codec for [`Moments`]
//!
//! Snapshots are JSON objects with the fields `count`, `mean`,
//! `momentAccumulator`, `min` and `max`.
//!
//! Streams written before extrema tracking stored `newMean`/`newVariance`
//! (plus `oldMean`/`oldVariance` working copies) and no extrema. Those are
//! still accepted: the `new*` names alias the current fields, the `old*`
//! fields are ignored, and the absent extrema decode to [`LEGACY_MIN`] and
//! [`LEGACY_MAX`].

use serde::{Deserialize, Serialize};

use crate::statistics::Moments;
use crate::traits::DecodeError;

/// Minimum assumed for snapshots without extrema
///
/// The largest finite value, so the first push after a restore replaces it.
/// Until then `min > max`, and [`Moments::range`] reads `0.0`.
pub const LEGACY_MIN: f64 = f64::MAX;

/// Maximum assumed for snapshots without extrema
///
/// The most negative finite value, so the first push after a restore
/// replaces it. Deliberately the opposite end from [`LEGACY_MIN`]: a max
/// seeded at the top could never move again.
pub const LEGACY_MAX: f64 = f64::MIN;

/// Error while encoding a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A field holds NaN or an infinity, which JSON cannot carry
    NonFinite(&'static str),
    /// Serializer failure
    Json(String),
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EncodeError::NonFinite(field) => {
                write!(f, "cannot encode non-finite value in field {}", field)
            }
            EncodeError::Json(msg) => write!(f, "snapshot serialization failed: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    count: u64,
    #[serde(alias = "newMean")]
    mean: f64,
    #[serde(alias = "newVariance")]
    moment_accumulator: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

fn finite_for_encode(field: &'static str, value: f64) -> Result<f64, EncodeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EncodeError::NonFinite(field))
    }
}

/// Encode the accumulator state as a JSON snapshot
pub fn encode(state: &Moments) -> Result<String, EncodeError> {
    let snapshot = Snapshot {
        count: state.count,
        mean: finite_for_encode("mean", state.mean)?,
        moment_accumulator: finite_for_encode("momentAccumulator", state.m2)?,
        min: Some(finite_for_encode("min", state.min)?),
        max: Some(finite_for_encode("max", state.max)?),
    };

    serde_json::to_string(&snapshot).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Decode a JSON snapshot into accumulator state
///
/// Nothing is produced unless the whole payload validates. Every float
/// comes out finite: JSON has no NaN or infinity literal, and the parser
/// rejects out-of-range numbers such as `1e400` as malformed.
pub fn decode(payload: &str) -> Result<Moments, DecodeError> {
    let snapshot: Snapshot =
        serde_json::from_str(payload).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if snapshot.moment_accumulator < 0.0 {
        return Err(DecodeError::NegativeMoment);
    }

    // Extrema-less snapshots get sentinels rather than zero; a zero min
    // would stick for any all-positive stream.
    let min = snapshot.min.unwrap_or(LEGACY_MIN);
    let max = snapshot.max.unwrap_or(LEGACY_MAX);

    Ok(Moments::from_parts(
        snapshot.count,
        snapshot.mean,
        snapshot.moment_accumulator,
        min,
        max,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Moments {
        let mut stats = Moments::new();
        for v in [0.0, 25.0, 50.0, 75.0, 100.0] {
            stats.push(v);
        }
        stats
    }

    #[test]
    fn test_encode_field_names() {
        let json = encode(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();

        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["count", "max", "mean", "min", "momentAccumulator"]);
        assert_eq!(obj["count"], 5);
        assert_eq!(obj["mean"], 50.0);
        assert_eq!(obj["min"], 0.0);
        assert_eq!(obj["max"], 100.0);
    }

    #[test]
    fn test_decode_restores_every_field() {
        let original = sample();
        let decoded = decode(&encode(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_empty_state() {
        let decoded = decode(&encode(&Moments::new()).unwrap()).unwrap();
        assert_eq!(decoded, Moments::new());
    }

    #[test]
    fn test_legacy_payload() {
        let legacy = r#"{"newMean":50,"newVariance":72500,"oldMean":50,"oldVariance":72500,"count":30}"#;
        let decoded = decode(legacy).unwrap();

        assert_eq!(decoded.count(), 30);
        assert_eq!(decoded.mean(), 50.0);
        assert_eq!(decoded.moment_accumulator(), 72500.0);
        assert_eq!(decoded.min, LEGACY_MIN);
        assert_eq!(decoded.max, LEGACY_MAX);
    }

    #[test]
    fn test_legacy_payload_reseeds_extrema_on_push() {
        let legacy = r#"{"newMean":5,"newVariance":0,"oldMean":5,"oldVariance":0,"count":1}"#;
        let mut decoded = decode(legacy).unwrap();

        decoded.push(7.0);
        assert_eq!(decoded.min(), 7.0);
        assert_eq!(decoded.max(), 7.0);

        decoded.push(3.0);
        assert_eq!(decoded.min(), 3.0);
        assert_eq!(decoded.max(), 7.0);
        assert_eq!(decoded.mean(), 5.0);
    }

    #[test]
    fn test_partial_extrema() {
        let decoded = decode(r#"{"count":2,"mean":1,"momentAccumulator":2,"min":0}"#).unwrap();
        assert_eq!(decoded.min(), 0.0);
        assert_eq!(decoded.max, LEGACY_MAX);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let decoded =
            decode(r#"{"count":1,"mean":3,"momentAccumulator":0,"min":3,"max":3,"extra":true}"#)
                .unwrap();
        assert_eq!(decoded.count(), 1);
        assert_eq!(decoded.mean(), 3.0);
    }

    #[test]
    fn test_malformed() {
        for payload in [
            "",
            "not json",
            "[]",
            "42",
            r#"{"mean":1,"momentAccumulator":0}"#,
            r#"{"count":1,"momentAccumulator":0}"#,
            r#"{"count":-1,"mean":1,"momentAccumulator":0}"#,
            r#"{"count":1,"mean":null,"momentAccumulator":0}"#,
            r#"{"count":1,"mean":"1","momentAccumulator":0}"#,
        ] {
            assert!(
                matches!(decode(payload), Err(DecodeError::Malformed(_))),
                "payload {:?} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_out_of_range_numbers_are_malformed() {
        for payload in [
            r#"{"count":1,"mean":1e400,"momentAccumulator":0}"#,
            r#"{"count":1,"mean":-1e400,"momentAccumulator":0}"#,
            r#"{"count":2,"mean":1,"momentAccumulator":1e400}"#,
            r#"{"count":1,"mean":1,"momentAccumulator":0,"min":1e999,"max":1}"#,
            r#"{"count":1,"mean":1,"momentAccumulator":0,"min":1,"max":-1e999}"#,
        ] {
            assert!(
                matches!(decode(payload), Err(DecodeError::Malformed(_))),
                "payload {:?} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_legacy_range_before_push() {
        let decoded = decode(r#"{"newMean":5,"newVariance":2,"count":3}"#).unwrap();
        assert_eq!(decoded.range(), 0.0);
        assert!(decoded.range().is_finite());
    }

    #[test]
    fn test_negative_moment_rejected() {
        assert_eq!(
            decode(r#"{"count":3,"mean":1,"momentAccumulator":-4}"#),
            Err(DecodeError::NegativeMoment)
        );
    }

    #[test]
    fn test_non_finite_not_encoded() {
        let mut stats = Moments::new();
        stats.push(1.0);
        stats.push(f64::INFINITY);
        assert!(matches!(encode(&stats), Err(EncodeError::NonFinite(_))));

        let mut stats = Moments::new();
        stats.push(f64::NAN);
        assert_eq!(encode(&stats), Err(EncodeError::NonFinite("mean")));
    }

    #[test]
    fn test_extreme_finite_values_survive() {
        let state = Moments::from_parts(2, 1.0e300, 0.0, f64::MIN, f64::MAX);
        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }
}
