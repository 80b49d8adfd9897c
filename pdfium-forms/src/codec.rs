//! JSON encoding of [`FormSnapshot`]s.
//!
//! ```json
//! {
//!   "formKind": 1,
//!   "timestamp": 1700000000123,
//!   "fields": [
//!     { "name": "country", "type": 4, "value": "Japan", "defaultValue": "",
//!       "isRequired": false, "isReadOnly": false, "maxLength": -1,
//!       "options": [ { "label": "Japan", "value": "Japan", "isSelected": true, "index": 1 } ] }
//!   ]
//! }
//! ```
//!
//! `options` is left out when a field has none.

use crate::field::FieldType;
use crate::form::FormKind;
use crate::snapshot::{FieldOption, FieldRecord, FormSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why snapshot text could not be decoded.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Not JSON, or not the snapshot shape
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field type {0} out of range")]
    InvalidFieldType(i32),

    #[error("form kind {0} out of range")]
    InvalidFormKind(i32),

    /// A non-choice field carries options
    #[error("field {name:?} has options but is not a combo or list box")]
    UnexpectedOptions { name: String },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotWire {
    form_kind: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    fields: Vec<FieldWire>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldWire {
    name: String,
    #[serde(rename = "type")]
    field_type: i32,
    value: String,
    default_value: String,
    is_required: bool,
    is_read_only: bool,
    #[serde(default = "no_max_length")]
    max_length: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<OptionWire>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptionWire {
    label: String,
    value: String,
    is_selected: bool,
    index: usize,
}

fn no_max_length() -> i32 {
    -1
}

impl From<&FormSnapshot> for SnapshotWire {
    fn from(snapshot: &FormSnapshot) -> Self {
        Self {
            form_kind: snapshot.form_kind().into(),
            timestamp: snapshot.captured_at(),
            fields: snapshot.records().iter().map(FieldWire::from).collect(),
        }
    }
}

impl From<&FieldRecord> for FieldWire {
    fn from(record: &FieldRecord) -> Self {
        Self {
            name: record.name.clone(),
            field_type: record.field_type.into(),
            value: record.value.clone(),
            default_value: record.default_value.clone(),
            is_required: record.is_required,
            is_read_only: record.is_read_only,
            max_length: record.max_length,
            options: record
                .options
                .iter()
                .map(|o| OptionWire {
                    label: o.label.clone(),
                    value: o.value.clone(),
                    is_selected: o.is_selected,
                    index: o.index,
                })
                .collect(),
        }
    }
}

impl TryFrom<FieldWire> for FieldRecord {
    type Error = DecodeError;

    fn try_from(wire: FieldWire) -> Result<Self, DecodeError> {
        let field_type = FieldType::try_from(wire.field_type).map_err(DecodeError::InvalidFieldType)?;
        if !wire.options.is_empty() && !field_type.is_choice() {
            return Err(DecodeError::UnexpectedOptions { name: wire.name });
        }
        Ok(Self {
            name: wire.name,
            field_type,
            value: wire.value,
            default_value: wire.default_value,
            is_required: wire.is_required,
            is_read_only: wire.is_read_only,
            max_length: wire.max_length,
            options: wire
                .options
                .into_iter()
                .map(|o| FieldOption {
                    label: o.label,
                    value: o.value,
                    is_selected: o.is_selected,
                    index: o.index,
                })
                .collect(),
        })
    }
}

/// Encode a snapshot as compact JSON.
pub fn encode(snapshot: &FormSnapshot) -> String {
    // Plain structs of strings and numbers always serialize.
    serde_json::to_string(&SnapshotWire::from(snapshot)).unwrap_or_default()
}

/// Encode a snapshot as indented JSON.
pub fn encode_pretty(snapshot: &FormSnapshot) -> String {
    serde_json::to_string_pretty(&SnapshotWire::from(snapshot)).unwrap_or_default()
}

/// Decode a snapshot produced by [`encode`].
pub fn decode(text: &str) -> Result<FormSnapshot, DecodeError> {
    let wire: SnapshotWire = serde_json::from_str(text)?;
    let form_kind = FormKind::try_from(wire.form_kind).map_err(DecodeError::InvalidFormKind)?;
    let records = wire
        .fields
        .into_iter()
        .map(FieldRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FormSnapshot::new(form_kind, wire.timestamp, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Value;

    fn sample() -> FormSnapshot {
        let mut name = FieldRecord::new("firstName", FieldType::TextField);
        name.value = "Ada".into();
        name.is_required = true;
        name.max_length = 32;

        let mut subscribe = FieldRecord::new("subscribe", FieldType::CheckBox);
        subscribe.value = "Yes".into();
        subscribe.default_value = "Off".into();

        let mut country = FieldRecord::new("country", FieldType::ComboBox);
        country.value = "Japan".into();
        country.options = vec![
            FieldOption::new("France", 0, false),
            FieldOption::new("Japan", 1, true),
            FieldOption::new("Peru", 2, false),
        ];

        FormSnapshot::new(
            FormKind::AcroForm,
            Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            vec![name, subscribe, country],
        )
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let snapshot = sample();
        assert_eq!(decode(&encode(&snapshot)).unwrap(), snapshot);
        assert_eq!(decode(&encode_pretty(&snapshot)).unwrap(), snapshot);
    }

    #[test]
    fn test_options_on_non_choice_record_are_not_encoded() {
        let mut name = FieldRecord::new("a", FieldType::TextField);
        name.options = vec![FieldOption::new("x", 0, false)];
        let snapshot = FormSnapshot::new(FormKind::AcroForm, Utc::now(), vec![name]);
        assert!(snapshot.records()[0].options.is_empty());

        let text = encode(&snapshot);
        assert!(!text.contains("options"));
        assert_eq!(decode(&text).unwrap(), snapshot);
    }

    #[test]
    fn test_wire_shape() {
        let json: Value = serde_json::from_str(&encode(&sample())).unwrap();
        assert_eq!(json["formKind"], 1);
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        let fields = json["fields"].as_array().unwrap();
        assert_eq!(fields[0]["type"], 6);
        assert_eq!(fields[0]["maxLength"], 32);
        assert_eq!(fields[0]["isRequired"], true);
        assert!(fields[0].get("options").is_none());
        assert_eq!(fields[1]["defaultValue"], "Off");
        assert_eq!(fields[2]["options"][1]["isSelected"], true);
        assert_eq!(fields[2]["options"][1]["value"], "Japan");
    }

    #[test]
    fn test_missing_options_and_max_length_default() {
        let text = r#"{"formKind":0,"timestamp":0,"fields":[
            {"name":"a","type":6,"value":"","defaultValue":"","isRequired":false,"isReadOnly":false}
        ]}"#;
        let snapshot = decode(text).unwrap();
        let record = &snapshot.records()[0];
        assert_eq!(record.max_length, -1);
        assert!(record.options.is_empty());
        assert_eq!(snapshot.form_kind(), FormKind::None);
    }

    #[test]
    fn test_decode_rejections() {
        assert!(matches!(decode("{not json"), Err(DecodeError::Json(_))));
        assert!(matches!(decode(r#"{"formKind":1}"#), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode(r#"{"formKind":4,"timestamp":0,"fields":[]}"#),
            Err(DecodeError::InvalidFormKind(4))
        ));

        let bad_type = r#"{"formKind":1,"timestamp":0,"fields":[
            {"name":"a","type":8,"value":"","defaultValue":"","isRequired":false,"isReadOnly":false}
        ]}"#;
        assert!(matches!(decode(bad_type), Err(DecodeError::InvalidFieldType(8))));

        let stray_options = r#"{"formKind":1,"timestamp":0,"fields":[
            {"name":"a","type":6,"value":"","defaultValue":"","isRequired":false,"isReadOnly":false,
             "options":[{"label":"x","value":"x","isSelected":false,"index":0}]}
        ]}"#;
        match decode(stray_options) {
            Err(DecodeError::UnexpectedOptions { name }) => assert_eq!(name, "a"),
            other => panic!("expected UnexpectedOptions, got {:?}", other.map(|s| s.records().len())),
        }
    }
}
