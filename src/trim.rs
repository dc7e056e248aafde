//! Punctuation trimming and accumulator helpers.
//!
//! [`trim_punctuation`] cleans up the cataloging punctuation MARC subfields
//! usually end with (ISBD separators, abbreviation periods, bracketed
//! supplied text). It removes
//!
//! - a trailing run of commas, slashes, semicolons and colons (and whitespace);
//! - a trailing period preceded by at least three word characters, so
//!   `"Smith, J."` keeps its initial while `"Mystery."` loses the period;
//! - a single leading `[` and/or trailing `]` when no other square bracket
//!   appears inside.
//!
//! # Examples
//!
//! ```
//! use marc_extract::trim::trim_punctuation;
//!
//! assert_eq!(trim_punctuation("Introduction to algorithms /"), "Introduction to algorithms");
//! assert_eq!(trim_punctuation("Cormen, Thomas H."), "Cormen, Thomas H.");
//! assert_eq!(trim_punctuation("[Boston]"), "Boston");
//! ```

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_SEPARATORS: Regex = Regex::new(r"[\s,/;:]+\z").unwrap();
    static ref TRAILING_PERIOD: Regex = Regex::new(r"(\w{3})\.\s*\z").unwrap();
    static ref ENCLOSING_BRACKETS: Regex = Regex::new(r"\A\[?([^\[\]]+)\]?\z").unwrap();
}

/// Trim cataloging punctuation from a value.
///
/// The three rules run in order, each on the result of the previous one, and
/// the whole pass repeats until the value stops changing. Unwrapping brackets
/// can expose more trailing punctuation (`"[Boston :]"`), so repeating keeps
/// `trim_punctuation(trim_punctuation(s)) == trim_punctuation(s)`.
#[must_use]
pub fn trim_punctuation(input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = trim_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn trim_pass(input: &str) -> String {
    let s = TRAILING_SEPARATORS.replace(input, "");
    let s = TRAILING_PERIOD.replace(&s, "${1}");
    ENCLOSING_BRACKETS.replace(&s, "${1}").into_owned()
}

/// Keep at most the first value of an accumulator, in place.
///
/// An empty accumulator stays empty.
pub fn retain_first(values: &mut Vec<String>) {
    values.truncate(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_trailing_separators() {
        assert_eq!(trim_punctuation("Title /"), "Title");
        assert_eq!(trim_punctuation("Title :  "), "Title");
        assert_eq!(trim_punctuation("one, two;"), "one, two");
        assert_eq!(trim_punctuation("Subtitle, / "), "Subtitle");
        assert_eq!(trim_punctuation("a:b"), "a:b");
    }

    #[test]
    fn test_trailing_period_after_three_word_chars() {
        assert_eq!(trim_punctuation("Mystery."), "Mystery");
        assert_eq!(trim_punctuation("Mystery.  "), "Mystery");
        assert_eq!(trim_punctuation("abc."), "abc");
        assert_eq!(trim_punctuation("Smith, J."), "Smith, J.");
        assert_eq!(trim_punctuation("ab."), "ab.");
        assert_eq!(trim_punctuation("1st ed."), "1st ed.");
        assert_eq!(trim_punctuation("Москва."), "Москва");
    }

    #[test]
    fn test_trailing_tab_and_newline_whitespace() {
        assert_eq!(trim_punctuation("Title /\t"), "Title");
        assert_eq!(trim_punctuation("Title :\n"), "Title");
        assert_eq!(trim_punctuation("Mystery.\r\n"), "Mystery");
        assert_eq!(trim_punctuation("Title\tpart"), "Title\tpart");
    }

    #[test]
    fn test_period_exposed_by_separator_removal() {
        assert_eq!(trim_punctuation("London. ;"), "London");
        assert_eq!(trim_punctuation("Cormen, Thomas H. ,"), "Cormen, Thomas H.");
    }

    #[test]
    fn test_brackets() {
        assert_eq!(trim_punctuation("[interior]"), "interior");
        assert_eq!(trim_punctuation("[only-left"), "only-left");
        assert_eq!(trim_punctuation("only-right]"), "only-right");
        assert_eq!(trim_punctuation("[a[b]c]"), "[a[b]c]");
        assert_eq!(trim_punctuation("[]"), "[]");
    }

    #[test]
    fn test_bracket_unwrap_exposes_punctuation() {
        assert_eq!(trim_punctuation("[Boston :]"), "Boston");
        assert_eq!(trim_punctuation("[abc,]"), "abc");
    }

    #[test]
    fn test_untouched_values() {
        assert_eq!(trim_punctuation(""), "");
        assert_eq!(trim_punctuation("Plain title"), "Plain title");
        assert_eq!(trim_punctuation("U.S.A."), "U.S.A.");
    }

    #[test]
    fn test_input_not_mutated() {
        let input = String::from("Title /");
        let trimmed = trim_punctuation(&input);
        assert_eq!(input, "Title /");
        assert_eq!(trimmed, "Title");
    }

    #[test]
    fn test_retain_first() {
        let mut values = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        retain_first(&mut values);
        assert_eq!(values, vec!["a".to_string()]);

        let mut empty: Vec<String> = Vec::new();
        retain_first(&mut empty);
        assert!(empty.is_empty());
    }

    proptest! {
        #[test]
        fn prop_trim_is_idempotent(s in "[a-zA-Z0-9 .,/;:\\[\\]]{0,24}") {
            let once = trim_punctuation(&s);
            prop_assert_eq!(trim_punctuation(&once), once);
        }

        #[test]
        fn prop_trailing_separator_run_removed(
            body in "[a-z]{0,3}[a-z ]{0,8}[a-z]",
            run in "[,/;:]{1,3} {0,3}",
        ) {
            // body ends in a letter and holds no periods or brackets
            let input = format!("{body}{run}");
            prop_assert_eq!(trim_punctuation(&input), body);
        }

        #[test]
        fn prop_retain_first_keeps_prefix(values in proptest::collection::vec("[a-z]{1,4}", 0..6)) {
            let mut acc = values.clone();
            retain_first(&mut acc);
            prop_assert_eq!(acc, values.into_iter().take(1).collect::<Vec<_>>());
        }
    }
}
