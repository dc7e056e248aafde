//! Whole-record serialization rules.
//!
//! A [`SerializationRule`] renders a record into one string so it can be
//! stored next to the extracted fields:
//!
//! - `binary`: ISO 2709 bytes, base64 encoded (standard alphabet, no line
//!   breaks) unless `binary_escape` is turned off
//! - `xml`: a MARCXML document
//! - `json`: marc-in-json
//!
//! # Examples
//!
//! ```
//! use marc_extract::{Leader, Record, SerializationRule, SerializeOptions};
//!
//! let rule = SerializationRule::build("json", SerializeOptions::default())?;
//! let json = rule.serialize(&Record::new(Leader::default()))?;
//! assert_eq!(json, r#"{"leader":"00000nam a2200000 a 4500","fields":[]}"#);
//!
//! assert!(SerializationRule::build("marc8", SerializeOptions::default()).is_err());
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::{MarcError, Result};
use crate::marc_record::MarcRecord;
use crate::rule::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Output format of a serialization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// ISO 2709 transmission format
    Binary,
    /// MARCXML
    Xml,
    /// marc-in-json
    Json,
}

impl SerializationFormat {
    /// The format's configuration name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SerializationFormat::Binary => "binary",
            SerializationFormat::Xml => "xml",
            SerializationFormat::Json => "json",
        }
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SerializationFormat {
    type Err = MarcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binary" => Ok(SerializationFormat::Binary),
            "xml" => Ok(SerializationFormat::Xml),
            "json" => Ok(SerializationFormat::Json),
            _ => Err(MarcError::ConfigurationError(format!(
                "Unknown serialization format '{s}', expected binary, xml or json"
            ))),
        }
    }
}

fn default_binary_escape() -> bool {
    true
}

/// Options of a serialization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializeOptions {
    /// Base64 encode binary output (binary format only)
    #[serde(default = "default_binary_escape")]
    pub binary_escape: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            binary_escape: default_binary_escape(),
        }
    }
}

/// A built serialization rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationRule {
    format: SerializationFormat,
    options: SerializeOptions,
}

impl SerializationRule {
    /// Create a rule for a known format.
    #[must_use]
    pub fn new(format: SerializationFormat, options: SerializeOptions) -> Self {
        SerializationRule { format, options }
    }

    /// Create a rule from a format name (`binary`, `xml` or `json`, any case).
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] for any other name.
    pub fn build(format: &str, options: SerializeOptions) -> Result<Self> {
        let format = format.parse()?;
        debug!(%format, binary_escape = options.binary_escape, "built serialization rule");
        Ok(Self::new(format, options))
    }

    /// The output format.
    #[must_use]
    pub fn format(&self) -> SerializationFormat {
        self.format
    }

    /// The rule's options.
    #[must_use]
    pub fn options(&self) -> SerializeOptions {
        self.options
    }

    /// Serialize one record.
    ///
    /// # Errors
    ///
    /// Returns the record's encoding error, or [`MarcError::InvalidRecord`]
    /// when unescaped binary output is not valid UTF-8.
    pub fn serialize<R: MarcRecord + ?Sized>(&self, record: &R) -> Result<String> {
        match self.format {
            SerializationFormat::Binary => {
                let bytes = record.to_marc()?;
                if self.options.binary_escape {
                    Ok(STANDARD.encode(bytes))
                } else {
                    String::from_utf8(bytes).map_err(|e| {
                        MarcError::InvalidRecord(format!(
                            "Binary record is not valid UTF-8, enable binary_escape: {e}"
                        ))
                    })
                }
            },
            SerializationFormat::Xml => record.to_marcxml(),
            SerializationFormat::Json => {
                let hash = record.to_hash()?;
                serde_json::to_string(&hash).map_err(|e| {
                    MarcError::ParseError(format!("Failed to encode marc-in-json: {e}"))
                })
            },
        }
    }

    /// Serialize `record` and append the result to `accumulator`.
    ///
    /// # Errors
    ///
    /// Same as [`SerializationRule::serialize`]; nothing is appended on error.
    pub fn run<R: MarcRecord + ?Sized>(
        &self,
        record: &R,
        accumulator: &mut Vec<String>,
        _context: &Context,
    ) -> Result<()> {
        accumulator.push(self.serialize(record)?);
        Ok(())
    }
}

/// Serialize `record` in the named format.
///
/// # Errors
///
/// Returns [`MarcError::ConfigurationError`] for an unknown format name and
/// the record's encoding error otherwise.
pub fn serialize<R: MarcRecord + ?Sized>(
    record: &R,
    format: &str,
    binary_escape: bool,
) -> Result<String> {
    SerializationRule::build(format, SerializeOptions { binary_escape })?.serialize(record)
}
