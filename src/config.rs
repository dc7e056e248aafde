//! YAML rule sets.
//!
//! A rules file lists the output fields and how each is produced:
//!
//! ```yaml
//! translation_map_paths: [translation_maps]
//! fields:
//!   - name: title
//!     extract_marc: "245abcd"
//!     trim_punctuation: true
//!   - name: language
//!     extract_marc: "008[35-37]"
//!     translation_map: marc_languages
//!   - name: marc_display
//!     serialized_marc:
//!       format: json
//! ```
//!
//! Any key of an `extract_marc` entry other than `name`, `first`,
//! `trim_punctuation` and `translation_map` is an extractor option
//! (`separator`, `alternate_script`).

use crate::error::{MarcError, Result};
use crate::record::Record;
use crate::rule::{Context, ExtractionOptions, ExtractionRule};
use crate::serialize::{SerializationRule, SerializeOptions};
use crate::translation_map::TranslationMapRegistry;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed rules file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// Directories searched for translation maps; empty means the global
    /// registry
    #[serde(default)]
    pub translation_map_paths: Vec<PathBuf>,
    /// Output field definitions, in output order
    #[serde(default)]
    pub fields: Vec<FieldRuleConfig>,
}

/// One output field definition.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRuleConfig {
    /// Output field name
    pub name: String,
    /// Field spec to extract
    #[serde(default)]
    pub extract_marc: Option<String>,
    /// Whole-record serialization instead of extraction
    #[serde(default)]
    pub serialized_marc: Option<SerializedMarcConfig>,
    /// Extraction options
    #[serde(flatten)]
    pub options: ExtractionOptions,
}

/// Serialization settings of an output field.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SerializedMarcConfig {
    /// `binary`, `xml` or `json`
    pub format: String,
    /// Base64 encode binary output, defaults to true
    #[serde(default)]
    pub binary_escape: Option<bool>,
}

impl SerializedMarcConfig {
    /// The serialization options this entry describes.
    #[must_use]
    pub fn options(&self) -> SerializeOptions {
        let defaults = SerializeOptions::default();
        SerializeOptions {
            binary_escape: self.binary_escape.unwrap_or(defaults.binary_escape),
        }
    }
}

/// A built rule of either kind.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Extracts values through a field spec
    Extract(ExtractionRule),
    /// Serializes the whole record
    Serialize(SerializationRule),
}

impl FieldRule {
    /// Run the rule on one record, appending to `accumulator`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying rule's error.
    pub fn run(
        &self,
        record: &Record,
        accumulator: &mut Vec<String>,
        context: &Context,
    ) -> Result<()> {
        match self {
            FieldRule::Extract(rule) => rule.run(record, accumulator, context),
            FieldRule::Serialize(rule) => rule.run(record, accumulator, context),
        }
    }
}

/// A built rule with its output field name.
#[derive(Debug, Clone)]
pub struct NamedRule {
    /// Output field name
    pub name: String,
    /// The rule
    pub rule: FieldRule,
}

impl RulesConfig {
    /// Parse a rules file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the YAML is invalid or
    /// does not describe a rule set.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| MarcError::ConfigurationError(format!("Invalid rules config: {e}")))
    }

    /// Read and parse a rules file.
    ///
    /// Relative `translation_map_paths` are resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the file cannot be read or
    /// parsed.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            MarcError::ConfigurationError(format!(
                "Failed to read rules config {}: {e}",
                path.display()
            ))
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        if let Some(base) = path.parent() {
            for dir in &mut config.translation_map_paths {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }

    /// Build every rule, in definition order.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] for a duplicate field name, an
    /// entry with both or neither of `extract_marc` and `serialized_marc`, or
    /// any rule that fails to build.
    pub fn build_rules(&self) -> Result<Vec<NamedRule>> {
        let local_registry;
        let registry = if self.translation_map_paths.is_empty() {
            TranslationMapRegistry::global()
        } else {
            local_registry = TranslationMapRegistry::new(self.translation_map_paths.clone());
            &local_registry
        };

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(MarcError::ConfigurationError(format!(
                    "Duplicate field '{}'",
                    field.name
                )));
            }
            let rule = field.build(registry).map_err(|e| match e {
                MarcError::ConfigurationError(msg) => {
                    MarcError::ConfigurationError(format!("Field '{}': {msg}", field.name))
                },
                other => other,
            })?;
            rules.push(NamedRule {
                name: field.name.clone(),
                rule,
            });
        }

        debug!(count = rules.len(), "built rules");
        Ok(rules)
    }
}

impl FieldRuleConfig {
    fn build(&self, registry: &TranslationMapRegistry) -> Result<FieldRule> {
        match (&self.extract_marc, &self.serialized_marc) {
            (Some(spec), None) => Ok(FieldRule::Extract(ExtractionRule::build_with_registry(
                spec,
                self.options.clone(),
                registry,
            )?)),
            (None, Some(serialized)) => {
                if self.has_extraction_options() {
                    return Err(MarcError::ConfigurationError(
                        "extraction options given for serialized_marc".to_string(),
                    ));
                }
                Ok(FieldRule::Serialize(SerializationRule::build(
                    &serialized.format,
                    serialized.options(),
                )?))
            },
            (Some(_), Some(_)) => Err(MarcError::ConfigurationError(
                "extract_marc and serialized_marc are mutually exclusive".to_string(),
            )),
            (None, None) => Err(MarcError::ConfigurationError(
                "one of extract_marc or serialized_marc is required".to_string(),
            )),
        }
    }

    fn has_extraction_options(&self) -> bool {
        self.options.first
            || self.options.trim_punctuation
            || self.options.translation_map.is_some()
            || !self.options.extra.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leader::Leader;
    use crate::record::Field;
    use crate::serialize::SerializationFormat;
    use tempfile::tempdir;

    fn make_test_record() -> Record {
        Record::builder(Leader::default())
            .control_field_str("001", "12345")
            .control_field_str("008", "850101s1985    nyu           000 0 eng  ")
            .field(
                Field::builder("245".to_string(), '1', '0')
                    .subfield_str('a', "Test title /")
                    .subfield_str('c', "Author.")
                    .build(),
            )
            .build()
    }

    #[test]
    fn test_parse_rules_config() {
        let config = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: title
    extract_marc: "245a"
    trim_punctuation: true
    separator: ~
  - name: marc_display
    serialized_marc:
      format: binary
      binary_escape: false
"#,
        )
        .unwrap();

        assert_eq!(config.fields.len(), 2);
        let title = &config.fields[0];
        assert_eq!(title.extract_marc.as_deref(), Some("245a"));
        assert!(title.options.trim_punctuation);
        assert!(title.options.extra.contains_key("separator"));

        let display = config.fields[1].serialized_marc.as_ref().unwrap();
        assert_eq!(display.format, "binary");
        assert!(!display.options().binary_escape);
    }

    #[test]
    fn test_build_and_run_rules() {
        let config = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: id
    extract_marc: "001"
    first: true
  - name: title
    extract_marc: "245a"
    trim_punctuation: true
  - name: marc_display
    serialized_marc:
      format: json
"#,
        )
        .unwrap();

        let rules = config.build_rules().unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["id", "title", "marc_display"]);
        assert!(matches!(
            &rules[2].rule,
            FieldRule::Serialize(rule) if rule.format() == SerializationFormat::Json
        ));

        let record = make_test_record();
        let mut outputs = Vec::new();
        for rule in &rules {
            let mut accumulator = Vec::new();
            rule.rule
                .run(&record, &mut accumulator, &Context::default())
                .unwrap();
            outputs.push(accumulator);
        }
        assert_eq!(outputs[0], vec!["12345"]);
        assert_eq!(outputs[1], vec!["Test title"]);
        assert!(outputs[2][0].starts_with(r#"{"leader""#));
    }

    #[test]
    fn test_translation_map_paths_relative_to_file() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("maps")).unwrap();
        fs::write(dir.path().join("maps/marc_languages.yaml"), "eng: English\n").unwrap();
        let rules_path = dir.path().join("rules.yaml");
        fs::write(
            &rules_path,
            r#"
translation_map_paths: [maps]
fields:
  - name: language
    extract_marc: "008[35-37]"
    translation_map: marc_languages
"#,
        )
        .unwrap();

        let config = RulesConfig::load_from_file(&rules_path).unwrap();
        let rules = config.build_rules().unwrap();
        let mut accumulator = Vec::new();
        rules[0]
            .rule
            .run(&make_test_record(), &mut accumulator, &Context::default())
            .unwrap();
        assert_eq!(accumulator, vec!["English"]);
    }

    #[test]
    fn test_ambiguous_entries_rejected() {
        let both = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: x
    extract_marc: "245a"
    serialized_marc:
      format: xml
"#,
        )
        .unwrap();
        assert!(both.build_rules().unwrap_err().is_configuration());

        let neither = RulesConfig::from_yaml_str("fields:\n  - name: x\n").unwrap();
        assert!(neither.build_rules().unwrap_err().is_configuration());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let config = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: title
    extract_marc: "245a"
  - name: title
    extract_marc: "245b"
"#,
        )
        .unwrap();
        let err = config.build_rules().unwrap_err();
        assert!(err.to_string().contains("Duplicate field 'title'"));
    }

    #[test]
    fn test_bad_rule_names_field_in_error() {
        let config = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: display
    serialized_marc:
      format: marc8
"#,
        )
        .unwrap();
        let err = config.build_rules().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("Field 'display'"));
    }

    #[test]
    fn test_serialized_marc_rejects_extraction_options() {
        let config = RulesConfig::from_yaml_str(
            r#"
fields:
  - name: display
    first: true
    serialized_marc:
      format: xml
"#,
        )
        .unwrap();
        assert!(config.build_rules().unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        assert!(RulesConfig::from_yaml_str("feilds: []\n").is_err());
    }
}
