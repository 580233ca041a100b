//! Default CSV-to-payload mappings.
//!
//! These are the pluggable "shape the API call" seam: adjust the option set
//! here when your input file carries different columns. The core engine only
//! sees the resulting JSON value.

use mediabulk_core::{InputRecord, ItemError};
use serde_json::{json, Value};

fn required(rec: &InputRecord, column: &str) -> Result<String, ItemError> {
    rec.get(column)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ItemError::Transform(format!("input record has no '{column}' value")))
}

/// Map one input record to upload-API parameters.
///
/// Expects a `Url` column with the asset reference; `Id`, `Tags` and
/// `Description` feed the upload options.
pub fn migrate_payload(rec: &InputRecord) -> Result<Value, ItemError> {
    let file = required(rec, "Url")?;
    Ok(json!({
        "file": file,
        "options": {
            "public_id": rec.get("Id"),
            "unique_filename": false,
            "resource_type": "auto",
            "type": "upload",
            "tags": rec.get("Tags"),
            "context": {
                "caption": rec.get("Description"),
            },
        },
    }))
}

/// Map one input record to explicit-update parameters for an existing asset.
pub fn update_payload(rec: &InputRecord) -> Result<Value, ItemError> {
    let public_id = required(rec, "Id")?;
    Ok(json!({
        "public_id": public_id,
        "options": {
            "type": "upload",
            "tags": rec.get("Tags"),
            "context": {
                "caption": rec.get("Description"),
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> InputRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn migrate_payload_maps_expected_columns() {
        let rec = record(&[
            ("Id", "sample"),
            ("Url", "https://cdn.example/sample.jpg"),
            ("Tags", "demo,test"),
            ("Description", "A sample"),
        ]);
        let payload = migrate_payload(&rec).unwrap();
        assert_eq!(payload["file"], "https://cdn.example/sample.jpg");
        assert_eq!(payload["options"]["public_id"], "sample");
        assert_eq!(payload["options"]["unique_filename"], false);
        assert_eq!(payload["options"]["tags"], "demo,test");
        assert_eq!(payload["options"]["context"]["caption"], "A sample");
    }

    #[test]
    fn migrate_payload_requires_url() {
        let rec = record(&[("Id", "sample"), ("Url", "")]);
        let err = migrate_payload(&rec).err().unwrap();
        assert!(matches!(err, ItemError::Transform(_)));
        assert!(err.to_string().contains("Url"));
    }

    #[test]
    fn update_payload_requires_id() {
        let rec = record(&[("Tags", "x")]);
        let err = update_payload(&rec).err().unwrap();
        assert!(err.to_string().contains("Id"));
    }
}
