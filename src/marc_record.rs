//! Capabilities a record must offer to be serialized.
//!
//! The record serializer is generic over [`MarcRecord`]: anything that can
//! render itself as ISO 2709 bytes, a MARCXML document and a marc-in-json
//! mapping can be embedded in an output document. [`Record`] implements it
//! with the [`writer`](crate::writer), [`marcxml`](crate::marcxml) and
//! [`marcjson`](crate::marcjson) modules.
//!
//! # Examples
//!
//! ```
//! use marc_extract::{Leader, MarcRecord, Record};
//!
//! fn hash_leader<T: MarcRecord>(record: &T) -> marc_extract::Result<String> {
//!     let hash = record.to_hash()?;
//!     Ok(hash["leader"].as_str().unwrap_or_default().to_string())
//! }
//!
//! let record = Record::new(Leader::default());
//! assert_eq!(hash_leader(&record)?, "00000nam a2200000 a 4500");
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::Result;
use crate::record::Record;
use crate::{marcjson, marcxml, writer};
use serde_json::{Map, Value};

/// A record that can be rendered in every serialization format.
pub trait MarcRecord {
    /// ISO 2709 transmission bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded, e.g. it is longer
    /// than the format allows.
    fn to_marc(&self) -> Result<Vec<u8>>;

    /// A standalone MARCXML document for this record.
    ///
    /// # Errors
    ///
    /// Returns an error if XML rendering fails.
    fn to_marcxml(&self) -> Result<String>;

    /// The marc-in-json mapping for this record.
    ///
    /// # Errors
    ///
    /// Returns an error if the leader cannot be rendered.
    fn to_hash(&self) -> Result<Map<String, Value>>;
}

impl MarcRecord for Record {
    fn to_marc(&self) -> Result<Vec<u8>> {
        writer::encode_record(self)
    }

    fn to_marcxml(&self) -> Result<String> {
        marcxml::record_to_marcxml(self)
    }

    fn to_hash(&self) -> Result<Map<String, Value>> {
        marcjson::record_to_hash(self)
    }
}
