//! Field-spec driven value extraction from MARC records.
//!
//! A field spec is a compact list of selectors separated by `:`:
//!
//! | Selector        | Selects                                              |
//! |-----------------|------------------------------------------------------|
//! | `245abc`        | subfields a, b and c of every 245                    |
//! | `650`           | all subfields of every 650                           |
//! | `245\|1*\|a`    | subfield a of 245s whose first indicator is `1`      |
//! | `001`           | the whole 001 control field                          |
//! | `008[35-37]`    | characters 35 to 37 (inclusive) of the 008           |
//! | `008[7]`        | character 7 of the 008                               |
//!
//! Indicator filters and subfield codes only apply to data fields, character
//! ranges only to control fields.
//!
//! [`MarcExtractor`] takes two extra options besides the field spec:
//!
//! - `separator` (default `" "`): joins the subfields selected from one field
//!   into a single value; `null` keeps every subfield as its own value.
//! - `alternate_script` (default `true`): also select 880 fields linked
//!   through `$6` to a selected tag; `false` ignores them, `"only"` selects
//!   nothing but the linked 880s.
//!
//! # Examples
//!
//! ```
//! use indexmap::IndexMap;
//! use marc_extract::extractor::extract_by_spec;
//! use marc_extract::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::default())
//!     .control_field_str("008", "850101s1985    nyu           000 0 eng  ")
//!     .field(
//!         Field::builder("245".to_string(), '1', '0')
//!             .subfield_str('a', "Moby Dick ;")
//!             .subfield_str('b', "or, The whale.")
//!             .build(),
//!     )
//!     .build();
//!
//! let options = IndexMap::new();
//! assert_eq!(extract_by_spec(&record, "245ab", &options)?, vec!["Moby Dick ; or, The whale."]);
//! assert_eq!(extract_by_spec(&record, "008[35-37]", &options)?, vec!["eng"]);
//! # Ok::<(), marc_extract::MarcError>(())
//! ```

use crate::error::{MarcError, Result};
use crate::field_linkage::LinkageInfo;
use crate::record::{is_control_tag, Field, Record, ALTERNATE_SCRIPT_TAG};
use indexmap::IndexMap;
use nom::branch::alt;
use nom::bytes::complete::{take_while1, take_while_m_n};
use nom::character::complete::{char, digit1, multispace0, satisfy};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Produces values from a record for one output field.
///
/// Implementations must be immutable after construction; one extractor is
/// shared by every record a rule processes.
pub trait FieldExtractor: fmt::Debug + Send + Sync {
    /// Extract values from `record`, in extraction order.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ExtractionError`] when the record cannot be read.
    fn extract(&self, record: &Record) -> Result<Vec<String>>;
}

/// Inclusive character range of a control field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First position
    pub start: usize,
    /// Last position, inclusive
    pub end: usize,
}

/// What a selector takes from the fields it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorTarget {
    /// The whole field: every subfield of a data field, the whole value of a
    /// control field
    Whole,
    /// Listed subfield codes of a data field
    Subfields(Vec<char>),
    /// A character range of a control field
    Bytes(ByteRange),
}

/// One `:`-separated part of a field spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    /// Three-character field tag
    pub tag: String,
    /// Required first indicator, `None` matches any
    pub indicator1: Option<char>,
    /// Required second indicator, `None` matches any
    pub indicator2: Option<char>,
    /// Part of the matched field to take
    pub target: SelectorTarget,
}

impl FieldSelector {
    fn matches_indicators(&self, field: &Field) -> bool {
        self.indicator1.map_or(true, |ind| ind == field.indicator1)
            && self.indicator2.map_or(true, |ind| ind == field.indicator2)
    }

    fn wants_subfield(&self, code: char) -> bool {
        match &self.target {
            SelectorTarget::Subfields(codes) => codes.contains(&code),
            _ => true,
        }
    }
}

/// A parsed field spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    raw: String,
    selectors: Vec<FieldSelector>,
}

impl FieldSpec {
    /// Parse a field spec string.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the spec is empty, has
    /// unparseable text, or combines a tag with a target it cannot have
    /// (subfields on a control field, a character range on a data field).
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_extract::extractor::FieldSpec;
    ///
    /// let spec = FieldSpec::parse("100a:700a")?;
    /// assert_eq!(spec.selectors().len(), 2);
    /// assert!(FieldSpec::parse("245|1|a").is_err());
    /// # Ok::<(), marc_extract::MarcError>(())
    /// ```
    pub fn parse(spec: &str) -> Result<Self> {
        let (_, selectors) = all_consuming(selector_list)(spec).map_err(|e| {
            MarcError::ConfigurationError(format!("Invalid field spec '{spec}': {e}"))
        })?;

        for selector in &selectors {
            validate_selector(spec, selector)?;
        }

        Ok(FieldSpec {
            raw: spec.to_string(),
            selectors,
        })
    }

    /// The spec text as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed selectors, in spec order.
    #[must_use]
    pub fn selectors(&self) -> &[FieldSelector] {
        &self.selectors
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn validate_selector(spec: &str, selector: &FieldSelector) -> Result<()> {
    let control = is_control_tag(&selector.tag);
    let has_indicators = selector.indicator1.is_some() || selector.indicator2.is_some();

    let problem = match (&selector.target, control) {
        (SelectorTarget::Subfields(_), true) => Some("subfield codes on a control field"),
        (SelectorTarget::Bytes(_), false) => Some("a character range on a data field"),
        (SelectorTarget::Bytes(range), true) if range.end < range.start => {
            Some("a character range that ends before it starts")
        },
        _ if control && has_indicators => Some("indicators on a control field"),
        _ => None,
    };

    match problem {
        Some(problem) => Err(MarcError::ConfigurationError(format!(
            "Invalid field spec '{spec}': {} has {problem}",
            selector.tag
        ))),
        None => Ok(()),
    }
}

fn tag(input: &str) -> IResult<&str, &str> {
    take_while_m_n(3, 3, |c: char| c.is_ascii_alphanumeric())(input)
}

fn indicator(input: &str) -> IResult<&str, Option<char>> {
    map(satisfy(|c| c != '|'), |c| if c == '*' { None } else { Some(c) })(input)
}

// |XY|, `*` for any
fn indicators(input: &str) -> IResult<&str, (Option<char>, Option<char>)> {
    delimited(char('|'), pair(indicator, indicator), char('|'))(input)
}

fn position(input: &str) -> IResult<&str, usize> {
    map_res(digit1, str::parse::<usize>)(input)
}

// [N] or [N-M]
fn byte_range(input: &str) -> IResult<&str, ByteRange> {
    map(
        delimited(char('['), pair(position, opt(preceded(char('-'), position))), char(']')),
        |(start, end)| ByteRange {
            start,
            end: end.unwrap_or(start),
        },
    )(input)
}

fn subfield_codes(input: &str) -> IResult<&str, Vec<char>> {
    map(
        take_while1(|c: char| c.is_ascii_lowercase() || c.is_ascii_digit()),
        |codes: &str| codes.chars().collect(),
    )(input)
}

fn selector(input: &str) -> IResult<&str, FieldSelector> {
    map(
        tuple((
            tag,
            opt(indicators),
            opt(alt((
                map(byte_range, SelectorTarget::Bytes),
                map(subfield_codes, SelectorTarget::Subfields),
            ))),
        )),
        |(tag, inds, target)| {
            let (indicator1, indicator2) = inds.unwrap_or((None, None));
            FieldSelector {
                tag: tag.to_string(),
                indicator1,
                indicator2,
                target: target.unwrap_or(SelectorTarget::Whole),
            }
        },
    )(input)
}

fn selector_list(input: &str) -> IResult<&str, Vec<FieldSelector>> {
    separated_list1(char(':'), delimited(multispace0, selector, multispace0))(input)
}

/// How 880 alternate script fields take part in extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "AlternateScriptOption")]
pub enum AlternateScript {
    /// Select fields by their own tag and 880s linked to it
    #[default]
    Include,
    /// Ignore 880s linked to a selected tag
    Exclude,
    /// Select only the 880s linked to a selected tag
    Only,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AlternateScriptOption {
    Flag(bool),
    Mode(String),
}

impl TryFrom<AlternateScriptOption> for AlternateScript {
    type Error = String;

    fn try_from(value: AlternateScriptOption) -> std::result::Result<Self, Self::Error> {
        match value {
            AlternateScriptOption::Flag(true) => Ok(AlternateScript::Include),
            AlternateScriptOption::Flag(false) => Ok(AlternateScript::Exclude),
            AlternateScriptOption::Mode(mode) if mode == "only" => Ok(AlternateScript::Only),
            AlternateScriptOption::Mode(mode) => Err(format!(
                "alternate_script must be true, false or \"only\", got \"{mode}\""
            )),
        }
    }
}

fn default_separator() -> Option<String> {
    Some(" ".to_string())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtractorOptions {
    #[serde(default = "default_separator")]
    separator: Option<String>,
    #[serde(default)]
    alternate_script: AlternateScript,
}

impl ExtractorOptions {
    fn from_map(options: &IndexMap<String, Value>) -> Result<Self> {
        let object: serde_json::Map<String, Value> = options
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(object))
            .map_err(|e| MarcError::ConfigurationError(format!("Invalid extraction option: {e}")))
    }
}

/// Extracts values selected by a [`FieldSpec`].
#[derive(Debug, Clone)]
pub struct MarcExtractor {
    spec: FieldSpec,
    separator: Option<String>,
    alternate_script: AlternateScript,
}

impl MarcExtractor {
    /// Build an extractor from a spec and its options.
    ///
    /// Recognized options are `separator` (string or `null`) and
    /// `alternate_script` (`true`, `false` or `"only"`).
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the spec does not parse,
    /// an option is unknown, or an option value has the wrong type.
    pub fn new(spec: &str, options: &IndexMap<String, Value>) -> Result<Self> {
        let spec = FieldSpec::parse(spec)?;
        let options = ExtractorOptions::from_map(options)?;
        Ok(MarcExtractor {
            spec,
            separator: options.separator,
            alternate_script: options.alternate_script,
        })
    }

    /// Build an extractor with default options.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::ConfigurationError`] if the spec does not parse.
    pub fn from_spec(spec: &str) -> Result<Self> {
        Self::new(spec, &IndexMap::new())
    }

    /// The parsed spec.
    #[must_use]
    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Separator joining subfields of one field, `None` keeps them apart.
    #[must_use]
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Alternate script handling.
    #[must_use]
    pub fn alternate_script(&self) -> AlternateScript {
        self.alternate_script
    }

    /// Collect every selected value from `record`.
    ///
    /// Fields are visited in record order (control fields, then data fields);
    /// a field matched by several selectors contributes once per selector, in
    /// spec order.
    #[must_use]
    pub fn extract_values(&self, record: &Record) -> Vec<String> {
        let mut values = Vec::new();

        for (tag, value) in record.control_fields_iter() {
            for selector in self.spec.selectors.iter().filter(|s| s.tag == tag) {
                self.collect_control(selector, value, &mut values);
            }
        }

        for field in record.fields() {
            let linked_tag = self.linked_tag(field);
            for selector in &self.spec.selectors {
                if self.selects_data_field(selector, field, linked_tag.as_deref()) {
                    self.collect_data(selector, field, &mut values);
                }
            }
        }

        values
    }

    fn linked_tag(&self, field: &Field) -> Option<String> {
        if field.tag != ALTERNATE_SCRIPT_TAG || self.alternate_script == AlternateScript::Exclude {
            return None;
        }
        field
            .get_subfield('6')
            .and_then(LinkageInfo::parse)
            .map(|linkage| linkage.tag)
    }

    fn selects_data_field(
        &self,
        selector: &FieldSelector,
        field: &Field,
        linked_tag: Option<&str>,
    ) -> bool {
        if is_control_tag(&selector.tag) || !selector.matches_indicators(field) {
            return false;
        }
        let direct = selector.tag == field.tag && self.alternate_script != AlternateScript::Only;
        let linked = linked_tag == Some(selector.tag.as_str());
        direct || linked
    }

    fn collect_control(&self, selector: &FieldSelector, value: &str, out: &mut Vec<String>) {
        match &selector.target {
            SelectorTarget::Bytes(range) => {
                let slice: String = value
                    .chars()
                    .skip(range.start)
                    .take((range.end - range.start).saturating_add(1))
                    .collect();
                if !slice.is_empty() {
                    out.push(slice);
                }
            },
            _ => out.push(value.to_string()),
        }
    }

    fn collect_data(&self, selector: &FieldSelector, field: &Field, out: &mut Vec<String>) {
        let selected = field
            .subfields()
            .filter(|sf| selector.wants_subfield(sf.code))
            .map(|sf| sf.value.as_str());

        match &self.separator {
            Some(separator) => {
                let parts: Vec<&str> = selected.collect();
                if !parts.is_empty() {
                    out.push(parts.join(separator));
                }
            },
            None => out.extend(selected.map(str::to_string)),
        }
    }
}

impl FieldExtractor for MarcExtractor {
    fn extract(&self, record: &Record) -> Result<Vec<String>> {
        Ok(self.extract_values(record))
    }
}

/// Parse `spec` and extract its values from `record` in one call.
///
/// Rules should build a [`MarcExtractor`] once instead; this parses the spec
/// on every call.
///
/// # Errors
///
/// Returns [`MarcError::ConfigurationError`] if the spec or options are invalid.
pub fn extract_by_spec(
    record: &Record,
    spec: &str,
    options: &IndexMap<String, Value>,
) -> Result<Vec<String>> {
    let extractor = MarcExtractor::new(spec, options)?;
    extractor.extract(record)
}
