//! Extraction rules: field spec plus post-processing, built once and run per
//! record.
//!
//! Building an [`ExtractionRule`] parses the field spec, validates the
//! extractor options and resolves the translation map, so every
//! misconfiguration surfaces before the first record. Running it appends the
//! extracted values to the record's accumulator and then post-processes the
//! accumulator in a fixed order:
//!
//! 1. extract (values appended in extraction order)
//! 2. `first`: keep only the first value
//! 3. `translation_map`: translate every value in place
//! 4. `trim_punctuation`: trim every value
//!
//! # Examples
//!
//! ```
//! use marc_extract::{Context, ExtractionOptions, ExtractionRule, Field, Leader, Record};
//!
//! let rule = ExtractionRule::build(
//!     "245ab",
//!     ExtractionOptions::default().with_trim_punctuation(),
//! )?;
//!
//! let record = Record::builder(Leader::default())
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Introduction to algorithms /")
//!             .build(),
//!     )
//!     .build();
//!
//! let mut title = Vec::new();
//! rule.run(&record, &mut title, &Context::default())?;
//! assert_eq!(title, vec!["Introduction to algorithms"]);
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::{MarcError, Result};
use crate::extractor::{FieldExtractor, MarcExtractor};
use crate::record::Record;
use crate::translation_map::{TranslationMap, TranslationMapRegistry};
use crate::trim::{retain_first, trim_punctuation};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// A translation map given by name or already built.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "String")]
pub enum TranslationMapRef {
    /// Resolved through a [`TranslationMapRegistry`] when the rule is built
    Named(String),
    /// Used as is
    Map(Arc<TranslationMap>),
}

impl From<String> for TranslationMapRef {
    fn from(name: String) -> Self {
        TranslationMapRef::Named(name)
    }
}

impl From<&str> for TranslationMapRef {
    fn from(name: &str) -> Self {
        TranslationMapRef::Named(name.to_string())
    }
}

impl From<TranslationMap> for TranslationMapRef {
    fn from(map: TranslationMap) -> Self {
        TranslationMapRef::Map(Arc::new(map))
    }
}

impl From<Arc<TranslationMap>> for TranslationMapRef {
    fn from(map: Arc<TranslationMap>) -> Self {
        TranslationMapRef::Map(map)
    }
}

impl TranslationMapRef {
    fn resolve(&self, registry: &TranslationMapRegistry) -> Result<Arc<TranslationMap>> {
        match self {
            TranslationMapRef::Named(name) => registry.resolve(name),
            TranslationMapRef::Map(map) => Ok(Arc::clone(map)),
        }
    }
}

/// Options of an extraction rule.
///
/// `first`, `trim_punctuation` and `translation_map` are handled by the rule;
/// every other key lands in `extra` and is handed to the extractor.
///
/// ```
/// use marc_extract::ExtractionOptions;
///
/// let options: ExtractionOptions = serde_json::from_str(
///     r#"{"first": true, "translation_map": "marc_languages", "separator": null}"#,
/// )?;
/// assert!(options.first);
/// assert!(!options.trim_punctuation);
/// assert_eq!(options.extra.len(), 1);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Keep only the first extracted value
    pub first: bool,
    /// Trim cataloging punctuation from every value
    pub trim_punctuation: bool,
    /// Translate values through this map
    pub translation_map: Option<TranslationMapRef>,
    /// Extractor options (`separator`, `alternate_script`)
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ExtractionOptions {
    /// Keep only the first value.
    #[must_use]
    pub fn with_first(mut self) -> Self {
        self.first = true;
        self
    }

    /// Trim punctuation from every value.
    #[must_use]
    pub fn with_trim_punctuation(mut self) -> Self {
        self.trim_punctuation = true;
        self
    }

    /// Translate values through `map`.
    #[must_use]
    pub fn with_translation_map(mut self, map: impl Into<TranslationMapRef>) -> Self {
        self.translation_map = Some(map.into());
        self
    }

    /// Add an extractor option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Per-record context supplied by the host.
///
/// Rules receive it read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Zero-based position of the record in its input
    pub position: usize,
    /// Identifier of the input the record came from
    pub source_id: Option<String>,
}

impl Context {
    /// Context for the record at `position`.
    #[must_use]
    pub fn new(position: usize) -> Self {
        Context {
            position,
            source_id: None,
        }
    }

    /// Attach the input identifier.
    #[must_use]
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

/// A built extraction rule.
///
/// Immutable after construction and shareable across threads; every run only
/// touches the accumulator it is given.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    extractor: Arc<dyn FieldExtractor>,
    first: bool,
    translation_map: Option<Arc<TranslationMap>>,
    trim_punctuation: bool,
}

impl ExtractionRule {
    /// Build a rule for `spec`, resolving named maps through the global registry.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the spec or an extractor
    /// option is invalid or the translation map cannot be resolved.
    pub fn build(spec: &str, options: ExtractionOptions) -> Result<Self> {
        Self::build_with_registry(spec, options, TranslationMapRegistry::global())
    }

    /// Build a rule for `spec`, resolving named maps through `registry`.
    ///
    /// # Errors
    ///
    /// Same as [`ExtractionRule::build`].
    pub fn build_with_registry(
        spec: &str,
        options: ExtractionOptions,
        registry: &TranslationMapRegistry,
    ) -> Result<Self> {
        let extractor = MarcExtractor::new(spec, &options.extra)?;
        let rule = Self::assemble(Arc::new(extractor), &options, registry)?;

        debug!(
            spec,
            first = rule.first,
            trim_punctuation = rule.trim_punctuation,
            translation_map = rule.translation_map.as_ref().map(|map| map.name()),
            "built extraction rule"
        );
        Ok(rule)
    }

    /// Build a rule around a custom extractor.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if `options.extra` is not
    /// empty (there is no field spec extractor to receive it) or the
    /// translation map cannot be resolved.
    pub fn with_extractor(
        extractor: Arc<dyn FieldExtractor>,
        options: ExtractionOptions,
        registry: &TranslationMapRegistry,
    ) -> Result<Self> {
        if !options.extra.is_empty() {
            let keys: Vec<&str> = options.extra.keys().map(String::as_str).collect();
            return Err(MarcError::ConfigurationError(format!(
                "Unsupported options for a custom extractor: {}",
                keys.join(", ")
            )));
        }

        let rule = Self::assemble(extractor, &options, registry)?;
        debug!(extractor = ?rule.extractor, "built extraction rule");
        Ok(rule)
    }

    fn assemble(
        extractor: Arc<dyn FieldExtractor>,
        options: &ExtractionOptions,
        registry: &TranslationMapRegistry,
    ) -> Result<Self> {
        let translation_map = options
            .translation_map
            .as_ref()
            .map(|map| map.resolve(registry))
            .transpose()?;

        Ok(ExtractionRule {
            extractor,
            first: options.first,
            translation_map,
            trim_punctuation: options.trim_punctuation,
        })
    }

    /// Whether only the first value is kept.
    #[must_use]
    pub fn first(&self) -> bool {
        self.first
    }

    /// Whether punctuation is trimmed.
    #[must_use]
    pub fn trim_punctuation(&self) -> bool {
        self.trim_punctuation
    }

    /// The resolved translation map.
    #[must_use]
    pub fn translation_map(&self) -> Option<&Arc<TranslationMap>> {
        self.translation_map.as_ref()
    }

    /// Run the rule on one record.
    ///
    /// Extracted values are appended to `accumulator`, which is then
    /// post-processed as a whole. The context is not consulted.
    ///
    /// # Errors
    ///
    /// Propagates the extractor's error; `accumulator` is left untouched.
    pub fn run(
        &self,
        record: &Record,
        accumulator: &mut Vec<String>,
        _context: &Context,
    ) -> Result<()> {
        let values = self.extractor.extract(record)?;
        accumulator.extend(values);

        if self.first {
            retain_first(accumulator);
        }

        if let Some(map) = &self.translation_map {
            map.translate_in_place(accumulator);
        }

        if self.trim_punctuation {
            for value in accumulator.iter_mut() {
                *value = trim_punctuation(value);
            }
        }

        Ok(())
    }

    /// Run the rule into a fresh accumulator.
    ///
    /// # Errors
    ///
    /// Propagates the extractor's error.
    pub fn extract(&self, record: &Record) -> Result<Vec<String>> {
        let mut accumulator = Vec::new();
        self.run(record, &mut accumulator, &Context::default())?;
        Ok(accumulator)
    }
}
