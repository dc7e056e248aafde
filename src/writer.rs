//! Writing MARC records to binary format.
//!
//! [`encode_record`] turns one [`Record`] into ISO 2709 bytes; the binary
//! serializer builds on it. [`MarcWriter`] streams encoded records to any
//! destination implementing [`std::io::Write`].
//!
//! # Examples
//!
//! ```
//! use marc_extract::{Field, Leader, MarcWriter, Record};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut buffer = Vec::new();
//! {
//!     let mut writer = MarcWriter::new(&mut buffer);
//!     let mut record = Record::new(Leader::default());
//!     let mut field = Field::new("245".to_string(), '1', '0');
//!     field.add_subfield('a', "Title".to_string());
//!     record.add_field(field);
//!     writer.write_record(&record)?;
//! }
//! assert_eq!(buffer.last(), Some(&0x1D));
//! # Ok(())
//! # }
//! ```

use crate::error::{MarcError, Result};
use crate::leader::MAX_RECORD_LENGTH;
use crate::record::Record;
use std::io::Write;

pub(crate) const FIELD_TERMINATOR: u8 = 0x1E;
pub(crate) const SUBFIELD_DELIMITER: u8 = 0x1F;
pub(crate) const RECORD_TERMINATOR: u8 = 0x1D;

/// Largest field length a 4-digit directory entry can hold.
const MAX_FIELD_LENGTH: usize = 9_999;

/// Encode a record as ISO 2709 bytes.
///
/// Control fields are written first, then data fields in record order. The
/// leader's record length and base address are recomputed; every other leader
/// position is copied from the record.
///
/// # Errors
///
/// Returns an error if a field is longer than 9999 bytes, the record is longer
/// than 99999 bytes, or the leader is malformed.
pub fn encode_record(record: &Record) -> Result<Vec<u8>> {
    let mut data_area = Vec::new();
    let mut directory = Vec::new();

    for (tag, value) in record.control_fields_iter() {
        let start = data_area.len();
        data_area.extend_from_slice(value.as_bytes());
        data_area.push(FIELD_TERMINATOR);
        push_directory_entry(&mut directory, tag, data_area.len() - start, start)?;
    }

    for field in record.fields() {
        let start = data_area.len();
        push_char(&mut data_area, field.indicator1);
        push_char(&mut data_area, field.indicator2);

        for subfield in &field.subfields {
            data_area.push(SUBFIELD_DELIMITER);
            push_char(&mut data_area, subfield.code);
            data_area.extend_from_slice(subfield.value.as_bytes());
        }

        data_area.push(FIELD_TERMINATOR);
        push_directory_entry(&mut directory, &field.tag, data_area.len() - start, start)?;
    }

    directory.push(FIELD_TERMINATOR);

    let base_address = 24 + directory.len();
    let record_length = base_address + data_area.len() + 1;
    if record_length > MAX_RECORD_LENGTH as usize {
        return Err(MarcError::InvalidRecord(format!(
            "Record length {record_length} exceeds the ISO 2709 maximum of {MAX_RECORD_LENGTH}"
        )));
    }

    let mut leader = record.leader.clone();
    leader.record_length = u32::try_from(record_length)
        .map_err(|_| MarcError::InvalidRecord("Record length overflow".to_string()))?;
    leader.data_base_address = u32::try_from(base_address)
        .map_err(|_| MarcError::InvalidRecord("Base address overflow".to_string()))?;

    let mut bytes = Vec::with_capacity(record_length);
    bytes.extend_from_slice(&leader.as_bytes()?);
    bytes.extend_from_slice(&directory);
    bytes.extend_from_slice(&data_area);
    bytes.push(RECORD_TERMINATOR);
    Ok(bytes)
}

fn push_char(buf: &mut Vec<u8>, c: char) {
    let mut utf8 = [0u8; 4];
    buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
}

fn push_directory_entry(
    directory: &mut Vec<u8>,
    tag: &str,
    length: usize,
    position: usize,
) -> Result<()> {
    if tag.len() != 3 {
        return Err(MarcError::InvalidField(format!(
            "Tag must be 3 bytes, got '{tag}'"
        )));
    }
    if length > MAX_FIELD_LENGTH {
        return Err(MarcError::InvalidField(format!(
            "Field {tag} is {length} bytes, longer than {MAX_FIELD_LENGTH}"
        )));
    }
    if position > MAX_RECORD_LENGTH as usize {
        return Err(MarcError::InvalidRecord(format!(
            "Field {tag} starts at offset {position}, beyond {MAX_RECORD_LENGTH}"
        )));
    }

    directory.extend_from_slice(tag.as_bytes());
    directory.extend_from_slice(format!("{length:04}").as_bytes());
    directory.extend_from_slice(format!("{position:05}").as_bytes());
    Ok(())
}

/// Writer for ISO 2709 binary MARC format.
///
/// Records are written one at a time to any destination implementing
/// [`std::io::Write`].
#[derive(Debug)]
pub struct MarcWriter<W: Write> {
    writer: W,
    records_written: usize,
    finished: bool,
}

impl<W: Write> MarcWriter<W> {
    /// Create a new MARC writer.
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_extract::MarcWriter;
    /// let buffer = Vec::new();
    /// let writer = MarcWriter::new(buffer);
    /// assert_eq!(writer.records_written(), 0);
    /// ```
    pub fn new(writer: W) -> Self {
        MarcWriter {
            writer,
            records_written: 0,
            finished: false,
        }
    }

    /// Encode and write a single MARC record.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer was finished, the record cannot be
    /// encoded, or an I/O error occurs.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        if self.finished {
            return Err(MarcError::InvalidRecord(
                "Cannot write to a finished writer".to_string(),
            ));
        }

        let bytes = encode_record(record)?;
        self.writer.write_all(&bytes)?;
        self.records_written += 1;
        Ok(())
    }

    /// Flush the writer and mark it as finished.
    ///
    /// After calling `finish`, no more records can be written.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing the underlying writer fails.
    pub fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.finished = true;
        Ok(())
    }

    /// Returns the number of records written so far.
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::reader::MarcReader;
    use crate::record::Field;
    use std::io::Cursor;

    fn make_test_record() -> Record {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield('a', "Test title".to_string());
        record.add_field(field);
        record
    }

    #[test]
    fn test_encode_simple_record() {
        let bytes = encode_record(&make_test_record()).unwrap();

        // 24 leader + 13 directory + 15 field data + 1 record terminator
        assert_eq!(bytes.len(), 53);
        assert_eq!(&bytes[0..5], b"00053");
        assert_eq!(&bytes[12..17], b"00037");
        assert_eq!(&bytes[24..36], b"245001500000");
        assert_eq!(bytes[36], FIELD_TERMINATOR);
        assert_eq!(bytes[52], RECORD_TERMINATOR);
    }

    #[test]
    fn test_encode_keeps_other_leader_positions() {
        let mut record = make_test_record();
        record.leader.record_status = 'c';
        record.leader.record_type = 'j';

        let bytes = encode_record(&record).unwrap();
        assert_eq!(&bytes[5..12], b"cjm a22");
        assert_eq!(&bytes[17..24], b" a 4500");
    }

    #[test]
    fn test_control_fields_precede_data_fields() {
        let mut record = make_test_record();
        record.add_control_field("001".to_string(), "12345".to_string());

        let bytes = encode_record(&record).unwrap();
        assert_eq!(&bytes[24..27], b"001");
        assert_eq!(&bytes[36..39], b"245");
    }

    #[test]
    fn test_oversized_record_is_rejected() {
        let mut record = Record::new(Leader::default());
        for _ in 0..15 {
            let mut field = Field::new("500".to_string(), ' ', ' ');
            field.add_subfield('a', "x".repeat(8_000));
            record.add_field(field);
        }

        let err = encode_record(&record).unwrap_err().to_string();
        assert!(err.contains("exceeds the ISO 2709 maximum"), "got: {err}");
    }

    #[test]
    fn test_oversized_field_is_rejected() {
        let mut record = Record::new(Leader::default());
        let mut field = Field::new("500".to_string(), ' ', ' ');
        field.add_subfield('a', "x".repeat(10_000));
        record.add_field(field);

        assert!(matches!(
            encode_record(&record),
            Err(MarcError::InvalidField(_))
        ));
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let mut record = Record::new(Leader::default());
        record.add_control_field("001".to_string(), "12345".to_string());
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield('a', "Test title".to_string());
        field.add_subfield('c', "Author".to_string());
        record.add_field(field);

        let mut buffer = Vec::new();
        {
            let mut writer = MarcWriter::new(&mut buffer);
            writer.write_record(&record).unwrap();
        }

        let mut reader = MarcReader::new(Cursor::new(buffer));
        let read_record = reader.read_record().unwrap().unwrap();

        assert_eq!(read_record.get_control_field("001"), Some("12345"));
        let fields = read_record.get_fields("245");
        assert_eq!(fields[0].indicator1, '1');
        assert_eq!(fields[0].indicator2, '0');
        assert_eq!(fields[0].get_subfield('a'), Some("Test title"));
        assert_eq!(fields[0].get_subfield('c'), Some("Author"));
    }

    #[test]
    fn test_write_multiple_records() {
        let record = make_test_record();

        let mut buffer = Vec::new();
        {
            let mut writer = MarcWriter::new(&mut buffer);
            assert_eq!(writer.records_written(), 0);
            writer.write_record(&record).unwrap();
            writer.write_record(&record).unwrap();
            assert_eq!(writer.records_written(), 2);
            writer.finish().unwrap();
        }

        let mut reader = MarcReader::new(Cursor::new(buffer));
        assert!(reader.read_record().unwrap().is_some());
        assert!(reader.read_record().unwrap().is_some());
        assert!(reader.read_record().unwrap().is_none());
    }

    #[test]
    fn test_writer_cannot_write_after_finish() {
        let mut buffer = Vec::new();
        let mut writer = MarcWriter::new(&mut buffer);
        writer.finish().unwrap();

        assert!(writer.write_record(&make_test_record()).is_err());
    }
}
