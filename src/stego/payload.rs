//! The JSON document hidden inside each carrier
//!
//! ```json
//! { "Hero #2 - Swift": "Swift", "Stats": [{"P/S": 10}, {"S/A": 20}, {"W/M": 30}] }
//! ```

use crate::core::error::{LedgerError, Result};
use crate::core::stats::Stats;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Payload embedded into a carrier image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPayload {
    pub name: String,
    pub notable: String,
    pub stats: Stats,
}

impl EmbeddedPayload {
    pub fn new(name: impl Into<String>, notable: impl Into<String>, stats: Stats) -> Self {
        Self {
            name: name.into(),
            notable: notable.into(),
            stats,
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| LedgerError::InvalidEncoding(format!("payload serialization failed: {}", e)))
    }
}

impl Serialize for EmbeddedPayload {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let stats = [
            json!({ "P/S": self.stats.power }),
            json!({ "S/A": self.stats.speed }),
            json!({ "W/M": self.stats.wisdom }),
        ];
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.name, &self.notable)?;
        map.serialize_entry("Stats", &stats)?;
        map.end()
    }
}

/// Render recovered payload bytes for display and saving
///
/// JSON payloads are pretty-printed; anything else is returned as lossy text.
pub fn render_revealed(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = EmbeddedPayload::new("Hero #2 - Swift", "Swift", Stats::new(10, 20, 30));
        let value: Value = serde_json::from_slice(&payload.to_json_bytes().unwrap()).unwrap();

        assert_eq!(value["Hero #2 - Swift"], "Swift");
        assert_eq!(value["Stats"][0]["P/S"], 10);
        assert_eq!(value["Stats"][1]["S/A"], 20);
        assert_eq!(value["Stats"][2]["W/M"], 30);
    }

    #[test]
    fn test_name_comes_first() {
        let payload = EmbeddedPayload::new("Zed", "Zed", Stats::new(1, 2, 3));
        let text = String::from_utf8(payload.to_json_bytes().unwrap()).unwrap();
        assert!(text.starts_with(r#"{"Zed":"Zed","Stats":"#));
    }

    #[test]
    fn test_render_revealed() {
        assert_eq!(render_revealed(br#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(render_revealed(b"plain text"), "plain text");
    }
}
