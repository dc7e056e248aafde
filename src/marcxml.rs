//! MARCXML rendering of MARC records.
//!
//! Output follows the LOC MARCXML slim schema
//! (<https://www.loc.gov/standards/marcxml/>): `tag`, `ind1`, `ind2` and
//! `code` are attributes and the root `<record>` carries
//! `xmlns="http://www.loc.gov/MARC21/slim"`.
//!
//! Parsing accepts default-namespace, prefixed (`marc:record`) and
//! namespace-free records.
//!
//! # Examples
//!
//! ```
//! use marc_extract::{marcxml, Field, Leader, Record};
//!
//! let mut record = Record::new(Leader::default());
//! let mut field = Field::new("245".to_string(), '1', '0');
//! field.add_subfield('a', "Title".to_string());
//! record.add_field(field);
//!
//! let xml = marcxml::record_to_marcxml(&record)?;
//! let restored = marcxml::marcxml_to_record(&xml)?;
//! assert_eq!(restored, record);
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::{MarcError, Result};
use crate::leader::Leader;
use crate::record::{Field, Record};
use lazy_static::lazy_static;
use quick_xml::de::from_str as xml_from_str;
use quick_xml::se::to_string as xml_to_string;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The MARCXML namespace URI.
pub const MARCXML_NS: &str = "http://www.loc.gov/MARC21/slim";

lazy_static! {
    static ref XMLNS_RE: Regex = Regex::new(r#"\s+xmlns(?::\w+)?="[^"]*""#).unwrap();
    static ref PREFIX_RE: Regex = Regex::new(r"<(/?)(\w+):").unwrap();
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "record")]
struct MarcxmlRecord {
    leader: String,
    #[serde(default)]
    controlfield: Vec<MarcxmlControlField>,
    #[serde(default)]
    datafield: Vec<MarcxmlDataField>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarcxmlControlField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "$value", default)]
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarcxmlDataField {
    #[serde(rename = "@tag")]
    tag: String,
    #[serde(rename = "@ind1")]
    ind1: String,
    #[serde(rename = "@ind2")]
    ind2: String,
    #[serde(default)]
    subfield: Vec<MarcxmlSubfield>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarcxmlSubfield {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "$value", default)]
    value: String,
}

/// Strip namespace declarations and element prefixes so one set of serde
/// structs can read every namespace style.
fn strip_marcxml_ns(xml: &str) -> String {
    let stripped = XMLNS_RE.replace_all(xml, "");
    PREFIX_RE.replace_all(&stripped, "<$1").to_string()
}

/// Convert a MARC record to a standard MARCXML string.
///
/// The output starts with an XML declaration; control fields precede data
/// fields, each in record order.
///
/// # Errors
///
/// Returns an error if the leader cannot be rendered or XML serialization fails.
pub fn record_to_marcxml(record: &Record) -> Result<String> {
    let controlfield = record
        .control_fields_iter()
        .map(|(tag, value)| MarcxmlControlField {
            tag: tag.to_string(),
            value: value.to_string(),
        })
        .collect();

    let datafield = record
        .fields()
        .map(|field| MarcxmlDataField {
            tag: field.tag.clone(),
            ind1: field.indicator1.to_string(),
            ind2: field.indicator2.to_string(),
            subfield: field
                .subfields()
                .map(|sf| MarcxmlSubfield {
                    code: sf.code.to_string(),
                    value: sf.value.clone(),
                })
                .collect(),
        })
        .collect();

    let xml_record = MarcxmlRecord {
        leader: record.leader.to_leader_string()?,
        controlfield,
        datafield,
    };

    let body = xml_to_string(&xml_record)
        .map_err(|e| MarcError::ParseError(format!("Failed to serialize to MARCXML: {e}")))?;
    let body = body.replacen("<record>", &format!("<record xmlns=\"{MARCXML_NS}\">"), 1);

    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{body}"))
}

/// Convert a MARCXML `<record>` string to a MARC record.
///
/// # Errors
///
/// Returns an error if the XML is invalid or missing required elements.
pub fn marcxml_to_record(xml: &str) -> Result<Record> {
    let cleaned = strip_marcxml_ns(xml);
    let xml_record: MarcxmlRecord = xml_from_str(&cleaned)
        .map_err(|e| MarcError::ParseError(format!("Failed to parse MARCXML: {e}")))?;

    let mut record = Record::new(Leader::from_bytes(xml_record.leader.as_bytes())?);

    for cf in xml_record.controlfield {
        record.add_control_field(cf.tag, cf.value);
    }

    for df in xml_record.datafield {
        let ind1 = df.ind1.chars().next().unwrap_or(' ');
        let ind2 = df.ind2.chars().next().unwrap_or(' ');
        let mut field = Field::new(df.tag, ind1, ind2);

        for sf in df.subfield {
            let code = sf
                .code
                .chars()
                .next()
                .ok_or_else(|| MarcError::InvalidField("Missing subfield code".to_string()))?;
            field.add_subfield(code, sf.value);
        }

        record.add_field(field);
    }

    Ok(record)
}
