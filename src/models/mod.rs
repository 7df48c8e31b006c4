pub mod auth;
pub mod claims;
pub mod config;
pub mod labs;
pub mod notices;
pub mod role;
pub mod timetable;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Backend record identifier. The API hands out both numeric and string ids;
/// the textual form is kept for paths and comparisons, and numeric ids are
/// sent back as JSON numbers.
#[derive(Debug, Clone)]
pub struct RecordId {
    raw: String,
    numeric: bool,
}

impl RecordId {
    /// Ids typed into forms or paths. All-digit values count as numeric.
    pub fn new(id: impl Into<String>) -> Self {
        let raw = id.into();
        let numeric = raw.parse::<u64>().is_ok() && raw.bytes().all(|b| b.is_ascii_digit());
        Self { raw, numeric }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.numeric {
            if let Ok(n) = self.raw.parse::<u64>() {
                return serializer.serialize_u64(n);
            }
            if let Ok(n) = self.raw.parse::<i64>() {
                return serializer.serialize_i64(n);
            }
        }
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        let (raw, numeric) = match Raw::deserialize(deserializer)? {
            Raw::Text(text) => (text, false),
            Raw::Signed(n) => (n.to_string(), true),
            Raw::Unsigned(n) => (n.to_string(), true),
        };
        Ok(RecordId { raw, numeric })
    }
}

/// Anything with a backend id, so panels can replace or drop it after a write.
pub trait Identified {
    fn id(&self) -> &RecordId;
}

/// Paged listing envelope used by the user endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        let limit = u64::from(self.limit);
        ((self.total + limit - 1) / limit).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_accepts_numbers_and_strings() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[7, "lab-3"]"#).unwrap();
        assert_eq!(ids[0].as_str(), "7");
        assert_eq!(ids[1].as_str(), "lab-3");
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"[7,"lab-3"]"#);
    }

    #[test]
    fn record_id_keeps_its_json_kind_on_the_way_back() {
        let text: RecordId = serde_json::from_str(r#""3""#).unwrap();
        let number: RecordId = serde_json::from_str("3").unwrap();
        assert_eq!(text, number);
        assert_eq!(serde_json::to_string(&text).unwrap(), r#""3""#);
        assert_eq!(serde_json::to_string(&number).unwrap(), "3");

        assert_eq!(serde_json::to_value(RecordId::new("12")).unwrap(), serde_json::json!(12));
        assert_eq!(serde_json::to_value(RecordId::new("lab-12")).unwrap(), serde_json::json!("lab-12"));
        assert_eq!(serde_json::to_value(RecordId::new("")).unwrap(), serde_json::json!(""));
    }

    #[test]
    fn page_counts_partial_last_page() {
        let page: Page<u8> = serde_json::from_str(r#"{"data":[1,2],"total":21,"page":3,"limit":10}"#).unwrap();
        assert_eq!(page.total_pages(), 3);

        let unbounded: Page<u8> = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert_eq!(unbounded.page, 1);
        assert_eq!(unbounded.total_pages(), 1);
    }
}
