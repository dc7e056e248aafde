//! Subfield 6 linkage between fields and their 880 alternate script forms.
//!
//! An 880 field carries an alternate graphical representation (original
//! script or romanization) of another field. The pair is tied together by
//! subfield 6:
//!
//! - `245: $6 880-01 $a Voĭna i mir`
//! - `880: $6 245-01 $a Война и мир`
//!
//! The extractor uses the tag inside an 880's `$6` to decide which field spec
//! the 880 answers to.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // TAG-OCC[/SCRIPT][/r]
    //   TAG    = 3-digit field tag
    //   OCC    = 2-3 digit occurrence number
    //   SCRIPT = "(" or "$" followed by one code character, e.g. (2, (3, (N, $1
    static ref LINKAGE_RE: Regex =
        Regex::new(r"^(\d{3})-(\d{2,3})(?:/([\(\$][A-Za-z0-9]))?(?:/r)?$").unwrap();
}

/// Parsed contents of a subfield 6 (Linkage) value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageInfo {
    /// The linked field tag (e.g. "880" in an original field, "245" in an 880)
    pub tag: String,

    /// Occurrence number shared by both halves of the pair
    pub occurrence: String,

    /// Script identification code, empty when absent
    pub script_id: String,

    /// Whether the right-to-left flag (`/r`) is present
    pub is_reverse: bool,
}

impl LinkageInfo {
    /// Parse a subfield 6 value.
    ///
    /// Returns `None` when the value does not have the `TAG-OCC[/script][/r]` shape.
    ///
    /// # Examples
    ///
    /// ```
    /// use marc_extract::field_linkage::LinkageInfo;
    ///
    /// let info = LinkageInfo::parse("245-02/(2/r").unwrap();
    /// assert_eq!(info.tag, "245");
    /// assert_eq!(info.occurrence, "02");
    /// assert_eq!(info.script_id, "(2");
    /// assert!(info.is_reverse);
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let caps = LINKAGE_RE.captures(value)?;

        Some(LinkageInfo {
            tag: caps.get(1)?.as_str().to_string(),
            occurrence: caps.get(2)?.as_str().to_string(),
            script_id: caps
                .get(3)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            is_reverse: value.ends_with("/r"),
        })
    }
}
