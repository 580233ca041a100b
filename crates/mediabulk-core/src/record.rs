//! Input records: one per CSV row, columns accessible by name.
//!
//! Column order matters for the report (original input columns come first, in
//! file order), so the record keeps its fields as an ordered list rather than
//! a hash map and serializes to a JSON object in that order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single row of the input CSV, immutable once yielded by the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputRecord {
    fields: Vec<(String, String)>,
}

impl InputRecord {
    /// Pair up headers with row values. Short rows get empty values for the
    /// trailing columns; extra values beyond the headers are dropped.
    pub fn from_row(headers: &[String], values: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { fields }
    }

    /// Value of the named column, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Column names in file order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// `(column, value)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, String)> for InputRecord {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for InputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InputRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = InputRecord;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of column names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    fields.push((k, v));
                }
                Ok(InputRecord { fields })
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["Id".into(), "Url".into(), "Tags".into()]
    }

    #[test]
    fn from_row_pairs_headers_with_values() {
        let rec = InputRecord::from_row(
            &headers(),
            &["a1".to_string(), "https://x/a.jpg".to_string(), "t".to_string()],
        );
        assert_eq!(rec.get("Id"), Some("a1"));
        assert_eq!(rec.get("Url"), Some("https://x/a.jpg"));
        assert_eq!(rec.get("Missing"), None);
    }

    #[test]
    fn short_row_yields_empty_trailing_fields() {
        let rec = InputRecord::from_row(&headers(), &["a1".to_string()]);
        assert_eq!(rec.get("Url"), Some(""));
        assert_eq!(rec.get("Tags"), Some(""));
        assert_eq!(rec.len(), 3);
    }

    #[test]
    fn serde_round_trip_preserves_column_order() {
        let rec = InputRecord::from_row(
            &headers(),
            &["a1".to_string(), "u".to_string(), "t".to_string()],
        );
        let json = serde_json::to_string(&rec).unwrap();
        // Field order in the JSON text follows file order.
        assert_eq!(json, r#"{"Id":"a1","Url":"u","Tags":"t"}"#);

        let back: InputRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
        assert_eq!(
            back.columns().collect::<Vec<_>>(),
            vec!["Id", "Url", "Tags"]
        );
    }
}
