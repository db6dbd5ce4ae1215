// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Stripping normalization
//!
//! Removes run-to-run noise from a document before it is compared:
//! comments, script and style bodies, volatile attributes, dates and
//! clock times, whitespace, or anything matched by a custom pattern.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ComparisonKey, StateComparator};
use crate::error::{Error, Result};
use crate::state::Snapshot;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref BETWEEN_TAGS: Regex = Regex::new(r">\s+<").unwrap();
    static ref COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref SCRIPT: Regex = Regex::new(r"(?is)<script\b([^>]*)>.*?</script\s*>").unwrap();
    static ref STYLE: Regex = Regex::new(r"(?is)<style\b([^>]*)>.*?</style\s*>").unwrap();
    static ref DATES: Vec<Regex> = vec![
        // 2026-10-19T12:30:00Z, 2026-10-19 12:30
        Regex::new(r"\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?").unwrap(),
        // 19/10/2026, 10-19-26, 19.10.2026
        Regex::new(r"\b\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4}\b").unwrap(),
        // Oct 19, 2026 / 19 October 2026
        Regex::new(r"(?i)\b(?:\d{1,2}\s+)?(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b").unwrap(),
        // 12:30, 12:30:59, 1:05 pm
        Regex::new(r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\.?)?\b").unwrap(),
    ];
}

/// One normalization stage
pub trait Stripper: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &str;

    /// Return the document with this stage's noise removed
    fn strip(&self, dom: &str) -> String;
}

/// Collapses whitespace runs and drops whitespace between tags
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceStripper;

impl Stripper for WhitespaceStripper {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn strip(&self, dom: &str) -> String {
        let collapsed = WHITESPACE.replace_all(dom.trim(), " ");
        BETWEEN_TAGS.replace_all(&collapsed, "><").into_owned()
    }
}

/// Removes `<!-- -->` comments
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentStripper;

impl Stripper for CommentStripper {
    fn name(&self) -> &str {
        "comments"
    }

    fn strip(&self, dom: &str) -> String {
        COMMENT.replace_all(dom, "").into_owned()
    }
}

/// Empties `<script>` bodies, keeping the tag and its attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptStripper;

impl Stripper for ScriptStripper {
    fn name(&self) -> &str {
        "scripts"
    }

    fn strip(&self, dom: &str) -> String {
        SCRIPT.replace_all(dom, "<script$1></script>").into_owned()
    }
}

/// Empties `<style>` bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleStripper;

impl Stripper for StyleStripper {
    fn name(&self) -> &str {
        "styles"
    }

    fn strip(&self, dom: &str) -> String {
        STYLE.replace_all(dom, "<style$1></style>").into_owned()
    }
}

/// Removes named attributes (session ids, nonces, generated ids)
#[derive(Debug, Clone)]
pub struct AttributeStripper {
    pattern: Regex,
}

impl AttributeStripper {
    pub fn new<I, S>(attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = attributes
            .into_iter()
            .map(|a| regex::escape(a.as_ref()))
            .collect();
        if names.is_empty() {
            return Err(Error::config("attribute stripper needs at least one attribute"));
        }

        let pattern = format!(
            r#"(?i)\s(?:{})\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#,
            names.join("|")
        );
        let pattern = Regex::new(&pattern).map_err(|e| Error::config(e.to_string()))?;
        Ok(Self { pattern })
    }
}

impl Stripper for AttributeStripper {
    fn name(&self) -> &str {
        "attributes"
    }

    fn strip(&self, dom: &str) -> String {
        self.pattern.replace_all(dom, "").into_owned()
    }
}

/// Removes dates and clock times in common formats
#[derive(Debug, Clone, Copy, Default)]
pub struct DateStripper;

impl Stripper for DateStripper {
    fn name(&self) -> &str {
        "dates"
    }

    fn strip(&self, dom: &str) -> String {
        let mut out = dom.to_string();
        for pattern in DATES.iter() {
            out = pattern.replace_all(&out, "").into_owned();
        }
        out
    }
}

/// Replaces every match of a custom pattern
#[derive(Debug, Clone)]
pub struct RegexStripper {
    pattern: Regex,
    replacement: String,
}

impl RegexStripper {
    /// Remove every match of `pattern`
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_replacement(pattern, "")
    }

    /// Replace every match of `pattern` with `replacement`
    pub fn with_replacement(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::config(e.to_string()))?;
        Ok(Self {
            pattern,
            replacement: replacement.into(),
        })
    }
}

impl Stripper for RegexStripper {
    fn name(&self) -> &str {
        "regex"
    }

    fn strip(&self, dom: &str) -> String {
        self.pattern
            .replace_all(dom, self.replacement.as_str())
            .into_owned()
    }
}

/// Comparator that runs an ordered chain of strippers over the document
pub struct StrippingComparator {
    strippers: Vec<Box<dyn Stripper>>,
}

impl Default for StrippingComparator {
    /// Comments, scripts, styles, dates, then whitespace
    fn default() -> Self {
        Self::empty()
            .with(CommentStripper)
            .with(ScriptStripper)
            .with(StyleStripper)
            .with(DateStripper)
            .with(WhitespaceStripper)
    }
}

impl StrippingComparator {
    /// Comparator with no stages (keys on the raw document)
    pub fn empty() -> Self {
        Self {
            strippers: Vec::new(),
        }
    }

    /// Append a stage
    pub fn with(mut self, stripper: impl Stripper + 'static) -> Self {
        self.strippers.push(Box::new(stripper));
        self
    }

    /// Stage names in execution order
    pub fn stages(&self) -> Vec<&str> {
        self.strippers.iter().map(|s| s.name()).collect()
    }

    /// Apply every stage to a document
    pub fn strip(&self, dom: &str) -> String {
        self.strippers
            .iter()
            .fold(dom.to_string(), |acc, stripper| stripper.strip(&acc))
    }
}

impl StateComparator for StrippingComparator {
    fn normalize(&self, snapshot: &Snapshot) -> ComparisonKey {
        ComparisonKey::new(self.strip(&snapshot.dom))
    }
}

impl std::fmt::Debug for StrippingComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrippingComparator")
            .field("stages", &self.stages())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(comparator: &StrippingComparator, dom: &str) -> ComparisonKey {
        comparator.normalize(&Snapshot::new("http://app.test/", dom))
    }

    #[test]
    fn test_whitespace() {
        let out = WhitespaceStripper.strip("  <div>\n   <p>a   b</p>\n</div> ");
        assert_eq!(out, "<div><p>a b</p></div>");
    }

    #[test]
    fn test_comments_and_scripts() {
        let dom = "<div><!-- build 1234 --><script type=\"x\">var t = 1;</script></div>";
        let out = ScriptStripper.strip(&CommentStripper.strip(dom));
        assert_eq!(out, "<div><script type=\"x\"></script></div>");
    }

    #[test]
    fn test_styles() {
        let out = StyleStripper.strip("<style media=\"all\">p { color: red }</style><p>x</p>");
        assert_eq!(out, "<style media=\"all\"></style><p>x</p>");
    }

    #[test]
    fn test_attribute_stripper() {
        let stripper = AttributeStripper::new(["data-nonce", "jsessionid"]).unwrap();
        let out = stripper.strip(r#"<a href="/x" data-nonce="abc123" JSESSIONID=77>go</a>"#);
        assert_eq!(out, r#"<a href="/x">go</a>"#);

        let empty: [&str; 0] = [];
        assert!(AttributeStripper::new(empty).is_err());
    }

    #[test]
    fn test_date_stripper() {
        let out = DateStripper.strip("<p>Updated 2026-10-19T12:30:00Z at 12:30 pm on Oct 19, 2026</p>");
        assert!(!out.contains("2026"));
        assert!(!out.contains("12:30"));
    }

    #[test]
    fn test_regex_stripper() {
        let stripper = RegexStripper::with_replacement(r"token=\w+", "token=?").unwrap();
        assert_eq!(stripper.strip("a?token=abc&b"), "a?token=?&b");
        assert!(RegexStripper::new("(").is_err());
    }

    #[test]
    fn test_default_ignores_noise() {
        let comparator = StrippingComparator::default();
        let a = key(&comparator, "<div>\n <p>Hello</p> <!-- r1 --><span>10:01:07</span></div>");
        let b = key(&comparator, "<div><p>Hello</p><span>23:59:59</span></div>");
        assert_eq!(a, b);

        let c = key(&comparator, "<div><p>Goodbye</p></div>");
        assert_ne!(a, c);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let comparator = StrippingComparator::default();
        let snapshot = Snapshot::new("http://app.test/", "<ul> <li>1</li>\n<li>2</li> </ul>");

        assert_eq!(comparator.normalize(&snapshot), comparator.normalize(&snapshot));
    }

    #[test]
    fn test_stages_order() {
        let comparator = StrippingComparator::default();
        assert_eq!(
            comparator.stages(),
            vec!["comments", "scripts", "styles", "dates", "whitespace"]
        );
    }
}
