//! Common test helpers shared across the integration test suite.

use marc_extract::{Field, Leader, Record};

/// Creates a default leader for test records.
pub fn create_test_leader() -> Leader {
    Leader {
        record_length: 0,
        record_status: 'n',
        record_type: 'a',
        bibliographic_level: 'm',
        control_record_type: ' ',
        character_coding: 'a',
        indicator_count: 2,
        subfield_code_count: 2,
        data_base_address: 0,
        encoding_level: ' ',
        cataloging_form: 'a',
        multipart_level: ' ',
        reserved: "4500".to_string(),
    }
}

/// Creates an empty record with the test leader.
#[allow(dead_code)]
pub fn create_test_record() -> Record {
    Record::new(create_test_leader())
}

/// Creates a realistic bibliographic record.
///
/// Includes control fields, a cataloged title and author with ISBD
/// punctuation, subjects with varied indicators and a linked 880 title.
#[allow(dead_code)]
pub fn create_realistic_record() -> Record {
    let mut record = create_test_record();
    record.add_control_field_str("001", "ocm00012345");
    record.add_control_field_str("008", "851001s1925    nyu           000 1 eng d");

    let mut field_020 = Field::new("020".to_string(), ' ', ' ');
    field_020.add_subfield_str('a', "9780743273565 (pbk.)");
    record.add_field(field_020);

    // Author with trailing comma
    let mut field_100 = Field::new("100".to_string(), '1', ' ');
    field_100.add_subfield_str('a', "Fitzgerald, F. Scott");
    field_100.add_subfield_str('d', "1896-1940,");
    field_100.add_subfield_str('e', "author.");
    record.add_field(field_100);

    // Title with ISBD punctuation and an 880 link
    let mut field_245 = Field::new("245".to_string(), '1', '4');
    field_245.add_subfield_str('6', "880-01");
    field_245.add_subfield_str('a', "The great Gatsby /");
    field_245.add_subfield_str('c', "F. Scott Fitzgerald.");
    record.add_field(field_245);

    let mut field_260 = Field::new("260".to_string(), ' ', ' ');
    field_260.add_subfield_str('a', "New York :");
    field_260.add_subfield_str('b', "Scribner,");
    field_260.add_subfield_str('c', "[1925]");
    record.add_field(field_260);

    let mut field_650_1 = Field::new("650".to_string(), ' ', '0');
    field_650_1.add_subfield_str('a', "Rich people");
    field_650_1.add_subfield_str('z', "New York (State)");
    field_650_1.add_subfield_str('v', "Fiction.");
    record.add_field(field_650_1);

    let mut field_650_2 = Field::new("650".to_string(), ' ', '7');
    field_650_2.add_subfield_str('a', "Social classes");
    field_650_2.add_subfield_str('2', "fast");
    record.add_field(field_650_2);

    let mut field_700 = Field::new("700".to_string(), '1', ' ');
    field_700.add_subfield_str('a', "Perkins, Maxwell E.,");
    field_700.add_subfield_str('e', "editor.");
    record.add_field(field_700);

    // Alternate script title linked back to 245
    let mut field_880 = Field::new("880".to_string(), '1', '4');
    field_880.add_subfield_str('6', "245-01");
    field_880.add_subfield_str('a', "Великий Гэтсби /");
    record.add_field(field_880);

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_record_valid() {
        let record = create_test_record();
        assert_eq!(record.fields().count(), 0);
        assert_eq!(record.leader.record_type, 'a');
    }

    #[test]
    fn test_create_realistic_record_valid() {
        let record = create_realistic_record();
        assert_eq!(record.get_control_field("001"), Some("ocm00012345"));
        assert_eq!(record.get_fields("650").len(), 2);
    }
}
