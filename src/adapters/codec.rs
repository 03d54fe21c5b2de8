//! JSON codec for upstream payloads.
//!
//! Unknown fields are ignored and missing optional fields fall back to
//! their defaults through the serde attributes on the domain types. A body
//! that is not the expected JSON shape is a decode error.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Decode a whole body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Decode a JSON object keyed by symbol.
pub fn decode_keyed(body: &[u8]) -> Result<Map<String, Value>, serde_json::Error> {
    serde_json::from_slice(body)
}

/// Decode the entry under `key`, if present. The map is left intact so a
/// key can be read more than once.
pub fn entry<T: DeserializeOwned>(
    entries: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>, serde_json::Error> {
    entries.get(key).map(T::deserialize).transpose()
}

/// Encode a request body.
pub fn encode<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OptionChain;

    #[test]
    fn test_decode_tolerates_unknown_and_missing_fields() {
        let chain: OptionChain =
            decode(br#"{"symbol":"SPY","isDelayed":false,"callExpDateMap":{}}"#).unwrap();
        assert_eq!(chain.symbol.as_deref(), Some("SPY"));
        assert!(chain.calls_by_expiration.is_some());
        assert!(chain.puts_by_expiration.is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(decode::<OptionChain>(b"[1,2,3]").is_err());
        assert!(decode::<OptionChain>(b"<html>").is_err());
    }

    #[test]
    fn test_entry_can_be_read_twice() {
        let entries = decode_keyed(br#"{"SPY":{"symbol":"SPY"},"AAPL":{"symbol":"AAPL"}}"#).unwrap();
        let first: Option<Value> = entry(&entries, "SPY").unwrap();
        let second: Option<Value> = entry(&entries, "SPY").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap()["symbol"], "SPY");
        assert!(entry::<Value>(&entries, "QQQ").unwrap().is_none());
        assert_eq!(entries.len(), 2);
    }
}
