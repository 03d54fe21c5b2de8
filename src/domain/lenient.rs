//! Lenient numeric decoding for upstream payloads.
//!
//! The quote servers are not strict about numbers: greeks and volatility
//! come back as JSON numbers, as numeric strings, as `"NaN"`, or as
//! `null` depending on the instrument and the API revision.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(f64),
    Text(String),
}

/// Deserialize an `f64` from a number, a numeric string or `null`.
///
/// `null` and empty strings become `0.0`; `"NaN"` becomes `f64::NAN`.
pub fn f64_lenient<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberLike>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(NumberLike::Number(value)) => Ok(value),
        Some(NumberLike::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed.parse::<f64>().map_err(serde::de::Error::custom)
        }
    }
}

/// Deserialize an `i64` from an integer, a float, a numeric string or `null`.
#[allow(clippy::cast_possible_truncation)]
pub fn i64_lenient<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64_lenient(deserializer)?;
    if value.is_finite() {
        Ok(value as i64)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "f64_lenient")]
        value: f64,
        #[serde(default, deserialize_with = "i64_lenient")]
        count: i64,
    }

    #[test]
    fn test_accepts_numbers_strings_and_null() {
        let p: Probe = serde_json::from_str(r#"{"value": 1.5, "count": 7}"#).unwrap();
        assert!((p.value - 1.5).abs() < f64::EPSILON);
        assert_eq!(p.count, 7);

        let p: Probe = serde_json::from_str(r#"{"value": "-0.25", "count": "12"}"#).unwrap();
        assert!((p.value + 0.25).abs() < f64::EPSILON);
        assert_eq!(p.count, 12);

        let p: Probe = serde_json::from_str(r#"{"value": null, "count": null}"#).unwrap();
        assert!(p.value.abs() < f64::EPSILON);
        assert_eq!(p.count, 0);
    }

    #[test]
    fn test_nan_string_and_missing_fields() {
        let p: Probe = serde_json::from_str(r#"{"value": "NaN"}"#).unwrap();
        assert!(p.value.is_nan());
        assert_eq!(p.count, 0);
    }

    #[test]
    fn test_garbage_string_is_an_error() {
        let result = serde_json::from_str::<Probe>(r#"{"value": "abc"}"#);
        assert!(result.is_err());
    }
}
