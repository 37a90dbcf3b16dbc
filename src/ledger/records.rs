//! Ledger record types and their JSON shapes
//!
//! The metadata document is a JSON array of [`MetadataRecord`] ordered by
//! `index`. The lookup document is a JSON object keyed by carrier file name;
//! its key order is significant, so [`LookupTable`] keeps entries in a `Vec`
//! and (de)serializes the map by hand instead of going through a sorted map.

use crate::core::attributes::Attribute;
use crate::encoding::ContentHash;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One entry of the metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Free-form identifier, filled in by the operator
    #[serde(default)]
    pub id: String,

    /// Position in the ordinal-sorted ledger
    pub index: usize,

    /// Deduplication key
    #[serde(rename = "sha")]
    pub content_hash: ContentHash,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// External reference number, filled in by the operator
    #[serde(rename = "ethscription_number", default)]
    pub external_ref: String,

    pub attributes: Vec<Attribute>,
}

impl MetadataRecord {
    /// A fresh record; its index is assigned on reconciliation
    pub fn new(content_hash: ContentHash, name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            id: String::new(),
            index: 0,
            content_hash,
            name: name.into(),
            description: String::new(),
            external_ref: String::new(),
            attributes,
        }
    }
}

/// One value of the lookup document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRecord {
    /// Mirrors the index of the metadata record with the same hash
    pub index: usize,
    pub uri: String,
    pub uri_hex: String,
    pub sha: ContentHash,
    pub owner: String,
}

/// Lookup documents written before hashes were recorded lack `sha`; it is
/// recomputed from the URI, which is exactly what it hashes.
#[derive(Deserialize)]
struct StoredLookupRecord {
    #[serde(default)]
    index: usize,
    uri: String,
    #[serde(default)]
    uri_hex: Option<String>,
    #[serde(default)]
    sha: Option<ContentHash>,
    #[serde(default)]
    owner: String,
}

impl From<StoredLookupRecord> for LookupRecord {
    fn from(stored: StoredLookupRecord) -> Self {
        let sha = stored
            .sha
            .unwrap_or_else(|| ContentHash::of_data_uri(&stored.uri));
        let uri_hex = stored
            .uri_hex
            .unwrap_or_else(|| crate::encoding::transcoder::to_hex(&stored.uri));
        Self {
            index: stored.index,
            uri: stored.uri,
            uri_hex,
            sha,
            owner: stored.owner,
        }
    }
}

impl<'de> Deserialize<'de> for LookupRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        StoredLookupRecord::deserialize(deserializer).map(LookupRecord::from)
    }
}

/// Filename-keyed lookup entries in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: Vec<(String, LookupRecord)>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LookupRecord> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, record)| record)
    }

    /// Insert or overwrite an entry; an overwritten key keeps its position
    pub fn insert(&mut self, key: String, record: LookupRecord) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = record,
            None => self.entries.push((key, record)),
        }
    }

    /// Remove every entry with the given hash except the one under `keep_key`
    pub fn remove_hash_except(&mut self, sha: &ContentHash, keep_key: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(k, record)| record.sha != *sha || k == keep_key);
        before - self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LookupRecord)> {
        self.entries.iter().map(|(k, record)| (k.as_str(), record))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<(String, LookupRecord)> {
        &mut self.entries
    }
}

impl Serialize for LookupTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, record) in &self.entries {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LookupTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = LookupTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of lookup records keyed by file name")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut table = LookupTable::new();
                while let Some((key, record)) = access.next_entry::<String, LookupRecord>()? {
                    table.insert(key, record);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attributes::TraitValue;

    fn lookup(uri: &str, index: usize) -> LookupRecord {
        LookupRecord {
            index,
            uri: uri.to_string(),
            uri_hex: crate::encoding::transcoder::to_hex(uri),
            sha: ContentHash::of_data_uri(uri),
            owner: "owner".to_string(),
        }
    }

    #[test]
    fn test_metadata_record_json_shape() {
        let hash = ContentHash::of_data_uri("data:image/png;base64,AAAA");
        let mut record = MetadataRecord::new(
            hash,
            "Hero #1",
            vec![Attribute::int("Power/Strength", 10)],
        );
        record.index = 3;

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "");
        assert_eq!(value["index"], 3);
        assert_eq!(value["sha"], hash.to_hex());
        assert_eq!(value["ethscription_number"], "");
        assert_eq!(value["attributes"][0]["trait_type"], "Power/Strength");
        assert_eq!(value["attributes"][0]["value"], 10);
    }

    #[test]
    fn test_metadata_record_optional_fields_default() {
        let json = format!(
            r#"{{"index":0,"sha":"{}","name":"Hero #1","attributes":[{{"trait_type":"Notable","value":"Bold"}}]}}"#,
            ContentHash::of_data_uri("x").to_hex()
        );
        let record: MetadataRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.external_ref, "");
        assert_eq!(record.attributes[0].value, TraitValue::Text("Bold".to_string()));
    }

    #[test]
    fn test_lookup_table_preserves_key_order() {
        let mut table = LookupTable::new();
        table.insert("Zed #2_steggy.png".to_string(), lookup("data:a;base64,QQ==", 1));
        table.insert("Abe #1_steggy.png".to_string(), lookup("data:b;base64,Qg==", 0));

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.find("Zed #2").unwrap() < json.find("Abe #1").unwrap());

        let back: LookupTable = serde_json::from_str(&json).unwrap();
        assert_eq!(
            back.keys().collect::<Vec<_>>(),
            vec!["Zed #2_steggy.png", "Abe #1_steggy.png"]
        );
        assert_eq!(back, table);
    }

    #[test]
    fn test_lookup_insert_overwrites_in_place() {
        let mut table = LookupTable::new();
        table.insert("a".to_string(), lookup("data:a;base64,QQ==", 0));
        table.insert("b".to_string(), lookup("data:b;base64,Qg==", 1));
        table.insert("a".to_string(), lookup("data:c;base64,Qw==", 5));

        assert_eq!(table.len(), 2);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.get("a").unwrap().index, 5);
    }

    #[test]
    fn test_remove_hash_except() {
        let mut table = LookupTable::new();
        let record = lookup("data:a;base64,QQ==", 0);
        let sha = record.sha;
        table.insert("old name".to_string(), record.clone());
        table.insert("new name".to_string(), record);
        table.insert("other".to_string(), lookup("data:b;base64,Qg==", 1));

        assert_eq!(table.remove_hash_except(&sha, "new name"), 1);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["new name", "other"]);
    }

    #[test]
    fn test_legacy_lookup_record_without_sha() {
        let uri = "data:image/png;base64,AAAA";
        let json = format!(r#"{{"Hero #1_steggy.png":{{"index":0,"uri":"{}","uri_hex":"0x00"}}}}"#, uri);
        let table: LookupTable = serde_json::from_str(&json).unwrap();
        let record = table.get("Hero #1_steggy.png").unwrap();

        assert_eq!(record.sha, ContentHash::of_data_uri(uri));
        assert_eq!(record.owner, "");
        assert_eq!(record.uri_hex, "0x00");
    }

    #[test]
    fn test_lookup_table_rejects_array() {
        assert!(serde_json::from_str::<LookupTable>("[]").is_err());
    }
}
