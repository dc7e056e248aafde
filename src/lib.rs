#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # marc-extract
//!
//! Rules that turn MARC21 bibliographic records into indexable values.
//!
//! ## Extracting fields
//!
//! ```
//! use marc_extract::{Context, ExtractionOptions, ExtractionRule, Field, Leader, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let author = ExtractionRule::build(
//!     "100abcd:700abcd",
//!     ExtractionOptions::default().with_first().with_trim_punctuation(),
//! )?;
//!
//! let record = Record::builder(Leader::default())
//!     .field(
//!         Field::builder("100".to_string(), '1', ' ')
//!             .subfield_str('a', "Cormen, Thomas H.,")
//!             .build(),
//!     )
//!     .build();
//!
//! let mut values = Vec::new();
//! author.run(&record, &mut values, &Context::new(0))?;
//! assert_eq!(values, vec!["Cormen, Thomas H."]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Serializing records
//!
//! ```
//! use marc_extract::{Leader, Record, SerializationRule, SerializeOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rule = SerializationRule::build("binary", SerializeOptions::default())?;
//! let base64 = rule.serialize(&Record::new(Leader::default()))?;
//! assert!(base64.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`rule`]: Extraction rules, options and per-record context
//! - [`extractor`]: Field spec grammar and the MARC field extractor
//! - [`trim`]: Punctuation trimming and the take-first helper
//! - [`translation_map`]: Translation maps and their registry
//! - [`serialize`]: Whole-record serialization rules
//! - [`config`]: YAML rule sets
//! - [`record`]: Core MARC record structures (`Record`, `Field`, `Subfield`)
//! - [`leader`]: MARC record leader (24-byte header)
//! - [`field_linkage`]: Subfield 6 linkage for 880 alternate script fields
//! - [`marc_record`]: Record capabilities the serializer needs
//! - [`reader`] / [`writer`]: ISO 2709 binary format
//! - [`marcxml`]: MARCXML
//! - [`marcjson`]: marc-in-json
//! - [`error`]: Error types and result type

pub mod config;
pub mod error;
pub mod extractor;
pub mod field_linkage;
pub mod leader;
pub mod marc_record;
pub mod marcjson;
pub mod marcxml;
pub mod reader;
/// Core MARC record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod rule;
pub mod serialize;
pub mod translation_map;
pub mod trim;
pub mod writer;

pub use config::{FieldRule, NamedRule, RulesConfig};
pub use error::{MarcError, Result};
pub use extractor::{extract_by_spec, AlternateScript, FieldExtractor, FieldSpec, MarcExtractor};
pub use field_linkage::LinkageInfo;
pub use leader::Leader;
pub use marc_record::MarcRecord;
pub use reader::MarcReader;
pub use record::{Field, FieldBuilder, Record, RecordBuilder, Subfield};
pub use rule::{Context, ExtractionOptions, ExtractionRule, TranslationMapRef};
pub use serialize::{SerializationFormat, SerializationRule, SerializeOptions};
pub use translation_map::{MissPolicy, TranslationMap, TranslationMapRegistry};
pub use trim::{retain_first, trim_punctuation};
pub use writer::MarcWriter;
