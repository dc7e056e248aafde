//! Reading MARC records from binary streams.
//!
//! [`parse_record`] decodes one complete ISO 2709 record from a byte slice and
//! [`MarcReader`] reads records one at a time from any [`std::io::Read`].
//! Parsing is strict: a malformed directory or field is an error, never a
//! partially recovered record.
//!
//! # Examples
//!
//! ```
//! use marc_extract::MarcReader;
//! use std::io::Cursor;
//!
//! let mut reader = MarcReader::new(Cursor::new(Vec::new()));
//! assert!(reader.read_record()?.is_none());
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::{MarcError, Result};
use crate::leader::Leader;
use crate::record::{is_control_tag, Field, Record};
use crate::writer::{FIELD_TERMINATOR, SUBFIELD_DELIMITER};
use memchr::{memchr, memchr2};
use std::io::Read;

/// Reader for ISO 2709 binary MARC format.
#[derive(Debug)]
pub struct MarcReader<R: Read> {
    reader: R,
    records_read: usize,
}

impl<R: Read> MarcReader<R> {
    /// Create a new MARC reader over any source implementing [`std::io::Read`].
    pub fn new(reader: R) -> Self {
        MarcReader {
            reader,
            records_read: 0,
        }
    }

    /// Read a single MARC record.
    ///
    /// Returns `Ok(None)` at a clean end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input ends inside a record, the binary data is
    /// malformed, or an I/O error occurs.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        let mut record_bytes = vec![0u8; 24];
        match self.reader.read_exact(&mut record_bytes) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(MarcError::IoError(e)),
        }

        let leader = Leader::from_bytes(&record_bytes)?;
        leader.validate_for_reading()?;

        record_bytes.resize(leader.record_length as usize, 0);
        match self.reader.read_exact(&mut record_bytes[24..]) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(MarcError::TruncatedRecord(
                    "Unexpected end of file while reading record data".to_string(),
                ));
            },
            Err(e) => return Err(MarcError::IoError(e)),
        }

        let record = parse_record(&record_bytes)?;
        self.records_read += 1;
        Ok(Some(record))
    }

    /// Returns the number of records read so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }
}

/// Decode one ISO 2709 record from `bytes`.
///
/// `bytes` must hold at least the record length announced by the leader;
/// anything after it is ignored.
///
/// # Errors
///
/// Returns an error if the leader, directory or any field is malformed, or the
/// slice is shorter than the record.
pub fn parse_record(bytes: &[u8]) -> Result<Record> {
    let leader = Leader::from_bytes(bytes)?;
    leader.validate_for_reading()?;

    let record_length = leader.record_length as usize;
    let base_address = leader.data_base_address as usize;
    if bytes.len() < record_length {
        return Err(MarcError::TruncatedRecord(format!(
            "Leader announces {record_length} bytes, got {}",
            bytes.len()
        )));
    }

    let directory = &bytes[24..base_address];
    let data = &bytes[base_address..record_length];
    let directory_end = memchr(FIELD_TERMINATOR, directory).ok_or_else(|| {
        MarcError::InvalidRecord("Directory is not terminated".to_string())
    })?;
    let directory = &directory[..directory_end];

    if directory.len() % 12 != 0 {
        return Err(MarcError::InvalidRecord(
            "Incomplete directory entry".to_string(),
        ));
    }

    let mut record = Record::new(leader);

    // Directory entries: tag(3) + length(4) + start position(5)
    for entry in directory.chunks_exact(12) {
        let tag = String::from_utf8_lossy(&entry[0..3]).to_string();
        let field_length = parse_digits(&entry[3..7])?;
        let start_position = parse_digits(&entry[7..12])?;

        let end_position = start_position + field_length;
        if end_position > data.len() {
            return Err(MarcError::InvalidRecord(format!(
                "Field {tag} exceeds data area"
            )));
        }

        let field_data = &data[start_position..end_position];
        let field_data = field_data
            .strip_suffix(&[FIELD_TERMINATOR])
            .unwrap_or(field_data);

        if is_control_tag(&tag) {
            let value = String::from_utf8_lossy(field_data).to_string();
            record.add_control_field(tag, value);
        } else {
            let field = parse_data_field(field_data, &tag)
                .map_err(|e| MarcError::InvalidField(format!("Tag {tag}: {e}")))?;
            record.add_field(field);
        }
    }

    Ok(record)
}

/// Parse a data field body (indicators and subfields, terminator removed)
fn parse_data_field(data: &[u8], tag: &str) -> Result<Field> {
    if data.len() < 2 {
        return Err(MarcError::InvalidField(
            "Data field too short (needs indicators)".to_string(),
        ));
    }

    let indicator1 = ascii_char(data[0], "indicator")?;
    let indicator2 = ascii_char(data[1], "indicator")?;
    let mut field = Field::new(tag.to_string(), indicator1, indicator2);
    let mut rest = &data[2..];

    while let Some((&first, tail)) = rest.split_first() {
        if first != SUBFIELD_DELIMITER {
            return Err(MarcError::InvalidField(
                "Expected subfield delimiter".to_string(),
            ));
        }
        let Some((&code, tail)) = tail.split_first() else {
            break;
        };

        let end = memchr2(SUBFIELD_DELIMITER, FIELD_TERMINATOR, tail).unwrap_or(tail.len());
        field.add_subfield(
            ascii_char(code, "subfield code")?,
            String::from_utf8_lossy(&tail[..end]).to_string(),
        );
        rest = &tail[end..];
    }

    Ok(field)
}

// Indicators and subfield codes are single ASCII bytes
fn ascii_char(byte: u8, what: &str) -> Result<char> {
    if byte.is_ascii() {
        Ok(char::from(byte))
    } else {
        Err(MarcError::InvalidField(format!("Non-ASCII {what} byte 0x{byte:02X}")))
    }
}

/// Parse a fixed-width ASCII number from a directory entry
fn parse_digits(bytes: &[u8]) -> Result<usize> {
    bytes.iter().try_fold(0usize, |acc, &b| {
        if b.is_ascii_digit() {
            Ok(acc * 10 + usize::from(b - b'0'))
        } else {
            Err(MarcError::InvalidRecord(format!(
                "Invalid digit in directory entry: '{}'",
                String::from_utf8_lossy(bytes)
            )))
        }
    })
}
