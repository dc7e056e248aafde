//! MARC bibliographic record structures.
//!
//! This module provides the record types every rule operates on:
//! - [`Record`]: leader, control fields and data fields
//! - [`Field`]: variable data fields (010+)
//! - [`Subfield`]: coded data elements within a field
//!
//! # Examples
//!
//! ```
//! use marc_extract::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::default())
//!     .control_field_str("001", "12345")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Title")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.get_control_field("001"), Some("12345"));
//! ```

use crate::field_linkage::LinkageInfo;
use crate::leader::Leader;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Tag of the alternate graphical representation field.
pub const ALTERNATE_SCRIPT_TAG: &str = "880";

/// Returns true for control field tags (000-009).
#[must_use]
pub fn is_control_tag(tag: &str) -> bool {
    tag.len() == 3 && tag.starts_with("00")
}

/// A MARC bibliographic record
///
/// Control fields and data fields are each kept in arrival order. Tags may
/// repeat and interleave (`650`, `651`, `650`); nothing is regrouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record leader (24 bytes)
    pub leader: Leader,
    /// Control fields (000-009) as (tag, value) pairs, in arrival order
    pub control_fields: Vec<(String, String)>,
    /// Data fields (010+), in arrival order
    pub fields: Vec<Field>,
}

/// A data field in a MARC record (fields 010 and higher)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields (inline `SmallVec` storage for up to 4)
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

impl Record {
    /// Create a new MARC record with the given leader
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Create a builder for fluently constructing MARC records
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// Add a control field (000-009)
    ///
    /// A repeated tag (two `007`s) is kept as a second field.
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.control_fields.push((tag, value));
    }

    /// Add a control field using string slices
    pub fn add_control_field_str(&mut self, tag: &str, value: &str) {
        self.add_control_field(tag.to_string(), value.to_string());
    }

    /// Get the first control field value with a given tag
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields_iter()
            .find(|(field_tag, _)| *field_tag == tag)
            .map(|(_, value)| value)
    }

    /// Iterate over all control fields as (tag, value) pairs
    pub fn control_fields_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.control_fields
            .iter()
            .map(|(tag, value)| (tag.as_str(), value.as_str()))
    }

    /// Add a data field
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    /// Get all fields with a given tag, in record order
    #[must_use]
    pub fn get_fields(&self, tag: &str) -> Vec<&Field> {
        self.fields.iter().filter(|field| field.tag == tag).collect()
    }

    /// Get first field with a given tag
    #[must_use]
    pub fn get_field(&self, tag: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.tag == tag)
    }

    /// Iterate over all data fields in record order
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Iterate over fields matching a specific tag
    pub fn fields_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().filter(move |field| field.tag == tag)
    }

    /// Number of control and data fields in the record
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.control_fields.len() + self.fields.len()
    }

    /// Find the 880 field linked to `field` through subfield 6.
    ///
    /// Returns `None` when the field has no (well-formed) `$6` or no 880 with the
    /// same occurrence number exists.
    #[must_use]
    pub fn get_linked_field(&self, field: &Field) -> Option<&Field> {
        let linkage = LinkageInfo::parse(field.get_subfield('6')?)?;

        self.fields_by_tag(ALTERNATE_SCRIPT_TAG).find(|field_880| {
            field_880
                .get_subfield('6')
                .and_then(LinkageInfo::parse)
                .is_some_and(|linked| linked.occurrence == linkage.occurrence)
        })
    }
}

/// Builder for fluently constructing MARC records
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field to the record being built
    #[must_use]
    pub fn control_field(mut self, tag: String, value: String) -> Self {
        self.record.add_control_field(tag, value);
        self
    }

    /// Add a control field using string slices
    #[must_use]
    pub fn control_field_str(mut self, tag: &str, value: &str) -> Self {
        self.record.add_control_field_str(tag, value);
        self
    }

    /// Add a data field to the record being built
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a new data field
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for constructing fields fluently
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_extract::Field;
    ///
    /// let field = Field::builder("245".to_string(), '1', '0')
    ///     .subfield('a', "The Great Gatsby".to_string())
    ///     .subfield('c', "F. Scott Fitzgerald".to_string())
    ///     .build();
    /// assert_eq!(field.get_subfield('c'), Some("F. Scott Fitzgerald"));
    /// ```
    #[must_use]
    pub fn builder(tag: String, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag, indicator1, indicator2),
        }
    }

    /// Add a subfield
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// Add a subfield using a string slice
    pub fn add_subfield_str(&mut self, code: char, value: &str) {
        self.add_subfield(code, value.to_string());
    }

    /// Get first value for a subfield code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Iterate over all subfields
    pub fn subfields(&self) -> impl Iterator<Item = &Subfield> {
        self.subfields.iter()
    }

    /// Iterate over subfield values with a specific code
    pub fn subfields_by_code(&self, code: char) -> impl Iterator<Item = &str> {
        self.subfields
            .iter()
            .filter(move |sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// Get all subfield values matching any of the given codes, in field order
    #[must_use]
    pub fn get_subfields(&self, codes: &[char]) -> Vec<&str> {
        self.subfields
            .iter()
            .filter(|sf| codes.contains(&sf.code))
            .map(|sf| sf.value.as_str())
            .collect()
    }
}

/// Builder for fluently constructing MARC fields
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield to the field being built
    #[must_use]
    pub fn subfield(mut self, code: char, value: String) -> Self {
        self.field.add_subfield(code, value);
        self
    }

    /// Add a subfield using a string slice
    #[must_use]
    pub fn subfield_str(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield_str(code, value);
        self
    }

    /// Build the field
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = Record::new(Leader::default());
        assert!(record.control_fields.is_empty());
        assert!(record.fields.is_empty());
        assert_eq!(record.field_count(), 0);
    }

    #[test]
    fn test_add_control_field() {
        let mut record = Record::new(Leader::default());
        record.add_control_field("001".to_string(), "12345".to_string());
        assert_eq!(record.get_control_field("001"), Some("12345"));
        assert_eq!(record.get_control_field("003"), None);
    }

    #[test]
    fn test_repeated_control_fields_kept() {
        let record = Record::builder(Leader::default())
            .control_field_str("001", "12345")
            .control_field_str("007", "ta")
            .control_field_str("007", "cr")
            .build();

        let values: Vec<_> = record.control_fields_iter().collect();
        assert_eq!(values, vec![("001", "12345"), ("007", "ta"), ("007", "cr")]);
        assert_eq!(record.get_control_field("007"), Some("ta"));
        assert_eq!(record.field_count(), 3);
    }

    #[test]
    fn test_field_subfields() {
        let mut field = Field::new("245".to_string(), '1', '0');
        field.add_subfield('a', "Title".to_string());
        field.add_subfield('c', "Author".to_string());
        field.add_subfield('a', "Title continued".to_string());

        assert_eq!(field.get_subfield('a'), Some("Title"));
        let a_values: Vec<_> = field.subfields_by_code('a').collect();
        assert_eq!(a_values, vec!["Title", "Title continued"]);
        assert_eq!(
            field.get_subfields(&['c', 'a']),
            vec!["Title", "Author", "Title continued"]
        );
    }

    #[test]
    fn test_multiple_fields_same_tag() {
        let mut record = Record::new(Leader::default());

        for i in 0..3 {
            let mut field = Field::new("650".to_string(), ' ', '0');
            field.add_subfield('a', format!("Subject {i}"));
            record.add_field(field);
        }

        assert_eq!(record.get_fields("650").len(), 3);
        assert_eq!(record.fields_by_tag("650").count(), 3);
        assert_eq!(record.field_count(), 3);
    }

    #[test]
    fn test_interleaved_tags_keep_arrival_order() {
        let record = Record::builder(Leader::default())
            .field(Field::builder("650".to_string(), ' ', '0').subfield_str('a', "One").build())
            .field(Field::builder("100".to_string(), '1', ' ').subfield_str('a', "Name").build())
            .field(Field::builder("650".to_string(), ' ', '0').subfield_str('a', "Two").build())
            .build();

        let tags: Vec<_> = record.fields().map(|f| f.tag.as_str()).collect();
        assert_eq!(tags, vec!["650", "100", "650"]);
        let subjects: Vec<_> = record
            .fields_by_tag("650")
            .filter_map(|f| f.get_subfield('a'))
            .collect();
        assert_eq!(subjects, vec!["One", "Two"]);
    }

    #[test]
    fn test_get_linked_field() {
        let record = Record::builder(Leader::default())
            .field(
                Field::builder("245".to_string(), '1', '0')
                    .subfield_str('6', "880-01")
                    .subfield_str('a', "Voĭna i mir")
                    .build(),
            )
            .field(
                Field::builder("880".to_string(), '1', '0')
                    .subfield_str('6', "245-01")
                    .subfield_str('a', "Война и мир")
                    .build(),
            )
            .build();

        let title = record.get_field("245").unwrap();
        let linked = record.get_linked_field(title).unwrap();
        assert_eq!(linked.get_subfield('a'), Some("Война и мир"));
    }

    #[test]
    fn test_is_control_tag() {
        assert!(is_control_tag("001"));
        assert!(is_control_tag("008"));
        assert!(!is_control_tag("010"));
        assert!(!is_control_tag("245"));
        assert!(!is_control_tag("00"));
    }
}
