//! # Response Normalization
//!
//! Converts the raw JSON lists returned by the forecasting API into typed
//! [`Dataset`]s.
//!
//! Timestamps arrive in the backend's RFC-1123-like form
//! (`"Tue, 21 Nov 2024 06:10:00 GMT"`). A timestamp that fails to parse is
//! logged and nulled, but its record is kept. Structurally invalid input (not a
//! list, items that are not objects, missing or mistyped keys) fails the whole
//! call with a [`NormalizeError`]; an empty list yields an empty dataset with
//! its columns declared.

use crate::{Dataset, FeatureRecord, OvertoppingRecord};
use chrono::NaiveDateTime;
use log::warn;
use serde_json::{Map, Value};
use thiserror::Error;

/// Timestamp layout used by the backend
pub const TIME_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub const OVERTOPPING_COLUMNS: [&str; 3] = ["time", "overtopping_count", "confidence"];

#[derive(Error, Debug, PartialEq)]
pub enum NormalizeError {
    /// Payload absent or not a JSON array
    #[error("expected a list of records, got {found}")]
    NotAList { found: &'static str },

    #[error("record {index} is not an object")]
    NotAnObject { index: usize },

    #[error("record {index} is missing key '{key}'")]
    MissingKey { index: usize, key: String },

    #[error("record {index} has an invalid '{key}' value: {value}")]
    InvalidValue {
        index: usize,
        key: String,
        value: String,
    },
}

/// Normalize an overtopping list into `(time, overtopping_count, confidence)`.
pub fn normalize_overtopping(
    raw: Option<&Value>,
) -> Result<Dataset<OvertoppingRecord>, NormalizeError> {
    let items = as_list(raw)?;
    let mut dataset = Dataset::empty(&OVERTOPPING_COLUMNS);
    dataset.records.reserve(items.len());

    for (index, item) in items.iter().enumerate() {
        let fields = item
            .as_object()
            .ok_or(NormalizeError::NotAnObject { index })?;
        let time = parse_time(index, fields)?;
        let count_value = field(index, fields, "overtopping_count")?;
        let overtopping_count = count_value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(index, "overtopping_count", count_value))?;
        let confidence_value = field(index, fields, "confidence")?;
        let confidence = confidence_value
            .as_f64()
            .ok_or_else(|| invalid(index, "confidence", confidence_value))?;

        dataset.records.push(OvertoppingRecord {
            time,
            overtopping_count,
            confidence,
        });
    }

    Ok(dataset)
}

/// Normalize a feature list into `(time, <feature_name>)`.
pub fn normalize_feature(
    raw: Option<&Value>,
    feature_name: &str,
) -> Result<Dataset<FeatureRecord>, NormalizeError> {
    let items = as_list(raw)?;
    let mut dataset = Dataset::empty(&["time", feature_name]);
    dataset.records.reserve(items.len());

    for (index, item) in items.iter().enumerate() {
        let fields = item
            .as_object()
            .ok_or(NormalizeError::NotAnObject { index })?;
        let time = parse_time(index, fields)?;
        let raw_value = field(index, fields, feature_name)?;
        let value = raw_value
            .as_f64()
            .ok_or_else(|| invalid(index, feature_name, raw_value))?;

        dataset.records.push(FeatureRecord { time, value });
    }

    Ok(dataset)
}

/// Parse a backend timestamp.
pub fn parse_backend_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT).ok()
}

fn as_list(raw: Option<&Value>) -> Result<&Vec<Value>, NormalizeError> {
    match raw {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(NormalizeError::NotAList {
            found: json_kind(other),
        }),
        None => Err(NormalizeError::NotAList { found: "nothing" }),
    }
}

fn field<'a>(
    index: usize,
    fields: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Value, NormalizeError> {
    fields.get(key).ok_or_else(|| NormalizeError::MissingKey {
        index,
        key: key.to_string(),
    })
}

fn parse_time(
    index: usize,
    fields: &Map<String, Value>,
) -> Result<Option<NaiveDateTime>, NormalizeError> {
    let raw = field(index, fields, "time")?;
    let text = raw.as_str().ok_or_else(|| invalid(index, "time", raw))?;
    let time = parse_backend_time(text);
    if time.is_none() {
        warn!("Invalid time format: {}", text);
    }
    Ok(time)
}

fn invalid(index: usize, key: &str, value: &Value) -> NormalizeError {
    NormalizeError::InvalidValue {
        index,
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_overtopping_preserves_count_and_order() {
        let raw = json!([
            {"time": "Thu, 21 Nov 2024 06:10:00 GMT", "overtopping_count": 0, "confidence": 0.4},
            {"time": "Thu, 21 Nov 2024 06:00:00 GMT", "overtopping_count": 12, "confidence": 0.9},
            {"time": "Thu, 21 Nov 2024 06:20:00 GMT", "overtopping_count": 3, "confidence": 0.6}
        ]);
        let dataset = normalize_overtopping(Some(&raw)).unwrap();

        assert_eq!(dataset.len(), 3);
        let counts: Vec<u32> = dataset.records.iter().map(|r| r.overtopping_count).collect();
        assert_eq!(counts, vec![0, 12, 3]);
        assert_eq!(
            dataset.records[0].time,
            NaiveDate::from_ymd_opt(2024, 11, 21).and_then(|d| d.and_hms_opt(6, 10, 0))
        );
    }

    #[test]
    fn test_empty_list_declares_columns() {
        let dataset = normalize_overtopping(Some(&json!([]))).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(
            dataset.columns,
            vec!["time", "overtopping_count", "confidence"]
        );

        let feature = normalize_feature(Some(&json!([])), "wind_speed").unwrap();
        assert_eq!(feature.columns, vec!["time", "wind_speed"]);
    }

    #[test]
    fn test_absent_or_non_list_payload_fails() {
        assert_eq!(
            normalize_overtopping(None),
            Err(NormalizeError::NotAList { found: "nothing" })
        );
        assert_eq!(
            normalize_overtopping(Some(&json!("HTTP error: 502"))),
            Err(NormalizeError::NotAList { found: "a string" })
        );
        assert!(normalize_feature(Some(&json!({"time": 1})), "tidal_level").is_err());
    }

    #[test]
    fn test_bad_timestamp_keeps_record() {
        let raw = json!([
            {"time": "2024-11-21 06:10", "overtopping_count": 1, "confidence": 0.7},
            {"time": "Thu, 21 Nov 2024 06:20:00 GMT", "overtopping_count": 2, "confidence": 0.7}
        ]);
        let dataset = normalize_overtopping(Some(&raw)).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.records[0].time.is_none());
        assert!(dataset.records[1].time.is_some());
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let raw = json!([
            {"time": "Thu, 21 Nov 2024 06:10:00 GMT", "overtopping_count": 1}
        ]);
        assert_eq!(
            normalize_overtopping(Some(&raw)),
            Err(NormalizeError::MissingKey {
                index: 0,
                key: "confidence".to_string()
            })
        );
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let raw = json!([
            {"time": "Thu, 21 Nov 2024 06:10:00 GMT", "overtopping_count": -1, "confidence": 0.5}
        ]);
        assert!(matches!(
            normalize_overtopping(Some(&raw)),
            Err(NormalizeError::InvalidValue { index: 0, .. })
        ));
    }

    #[test]
    fn test_feature_values() {
        let raw = json!([
            {"time": "Thu, 21 Nov 2024 06:10:00 GMT", "significant_wave_height": 2.5},
            {"time": "Thu, 21 Nov 2024 06:20:00 GMT", "significant_wave_height": 3}
        ]);
        let dataset = normalize_feature(Some(&raw), "significant_wave_height").unwrap();
        let values: Vec<f64> = dataset.records.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![2.5, 3.0]);
    }

    #[test]
    fn test_non_object_item_is_an_error() {
        let raw = json!([42]);
        assert_eq!(
            normalize_feature(Some(&raw), "tidal_level"),
            Err(NormalizeError::NotAnObject { index: 0 })
        );
    }
}
