//! marc-in-json mapping of MARC records.
//!
//! This is the field-keyed mapping the JSON serializer encodes. A record
//! becomes an object with the leader and an ordered list of single-key field
//! objects:
//!
//! ```json
//! {
//!   "leader": "00000nam a2200000 a 4500",
//!   "fields": [
//!     {"001": "12345"},
//!     {"245": {"ind1": "1", "ind2": "0", "subfields": [{"a": "Title"}]}}
//!   ]
//! }
//! ```
//!
//! Key order follows insertion order (`serde_json` is built with
//! `preserve_order`), so encoding the mapping keeps the record's field order.

use crate::error::{MarcError, Result};
use crate::leader::Leader;
use crate::record::{is_control_tag, Field, Record};
use serde_json::{Map, Value};

/// Build the marc-in-json mapping for a record.
///
/// Control fields come first, then data fields, each in record order.
///
/// # Errors
///
/// Returns an error if the leader cannot be rendered.
pub fn record_to_hash(record: &Record) -> Result<Map<String, Value>> {
    let mut fields = Vec::with_capacity(record.field_count());

    for (tag, value) in record.control_fields_iter() {
        let mut entry = Map::new();
        entry.insert(tag.to_string(), Value::String(value.to_string()));
        fields.push(Value::Object(entry));
    }

    for field in record.fields() {
        let subfields = field
            .subfields()
            .map(|sf| {
                let mut entry = Map::new();
                entry.insert(sf.code.to_string(), Value::String(sf.value.clone()));
                Value::Object(entry)
            })
            .collect();

        let mut body = Map::new();
        body.insert("ind1".to_string(), Value::String(field.indicator1.to_string()));
        body.insert("ind2".to_string(), Value::String(field.indicator2.to_string()));
        body.insert("subfields".to_string(), Value::Array(subfields));

        let mut entry = Map::new();
        entry.insert(field.tag.clone(), Value::Object(body));
        fields.push(Value::Object(entry));
    }

    let mut hash = Map::new();
    hash.insert(
        "leader".to_string(),
        Value::String(record.leader.to_leader_string()?),
    );
    hash.insert("fields".to_string(), Value::Array(fields));
    Ok(hash)
}

/// Encode a record as a marc-in-json string.
///
/// # Errors
///
/// Returns an error if the leader cannot be rendered or JSON encoding fails.
pub fn record_to_json_string(record: &Record) -> Result<String> {
    let hash = record_to_hash(record)?;
    serde_json::to_string(&hash)
        .map_err(|e| MarcError::ParseError(format!("Failed to encode marc-in-json: {e}")))
}

/// Rebuild a record from a marc-in-json mapping.
///
/// # Errors
///
/// Returns an error if the leader or `fields` list is missing or a field entry
/// does not have the expected shape.
pub fn hash_to_record(hash: &Map<String, Value>) -> Result<Record> {
    let leader_str = hash
        .get("leader")
        .and_then(Value::as_str)
        .ok_or_else(|| MarcError::InvalidRecord("Missing leader field".to_string()))?;
    let mut record = Record::new(Leader::from_bytes(leader_str.as_bytes())?);

    let fields = hash
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| MarcError::InvalidRecord("Missing fields array".to_string()))?;

    for item in fields {
        let obj = item
            .as_object()
            .ok_or_else(|| MarcError::InvalidRecord("Field must be object".to_string()))?;

        for (tag, value) in obj {
            if is_control_tag(tag) {
                let text = value.as_str().ok_or_else(|| {
                    MarcError::InvalidField(format!("Control field {tag} must be a string"))
                })?;
                record.add_control_field(tag.clone(), text.to_string());
            } else {
                record.add_field(data_field_from_value(tag, value)?);
            }
        }
    }

    Ok(record)
}

/// Parse a marc-in-json string back into a record.
///
/// # Errors
///
/// Returns an error if the input is not a JSON object or does not describe a record.
pub fn json_string_to_record(json: &str) -> Result<Record> {
    let hash: Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| MarcError::ParseError(format!("Failed to parse marc-in-json: {e}")))?;
    hash_to_record(&hash)
}

fn data_field_from_value(tag: &str, value: &Value) -> Result<Field> {
    let body = value
        .as_object()
        .ok_or_else(|| MarcError::InvalidField(format!("Field {tag} must be object")))?;

    let indicator = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.chars().next())
            .unwrap_or(' ')
    };

    let mut field = Field::new(tag.to_string(), indicator("ind1"), indicator("ind2"));

    if let Some(subfields) = body.get("subfields").and_then(Value::as_array) {
        for sf in subfields {
            let sf_obj = sf.as_object().ok_or_else(|| {
                MarcError::InvalidField(format!("Subfield of {tag} must be object"))
            })?;
            for (code, value) in sf_obj {
                let code = code.chars().next().ok_or_else(|| {
                    MarcError::InvalidField(format!("Missing subfield code in {tag}"))
                })?;
                let text = value.as_str().ok_or_else(|| {
                    MarcError::InvalidField(format!("Subfield {tag}${code} must be a string"))
                })?;
                field.add_subfield(code, text.to_string());
            }
        }
    }

    Ok(field)
}
