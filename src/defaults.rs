//! Shared defaults and built-in rule sets.
//!
//! The default grammar is the fallback for any record no titled series
//! claims: a token vocabulary for the common enumeration markers (`V.`,
//! `NO.`, `PT.`, years, months, page spans) and an ordered pattern list
//! covering the label shapes that show up across most series. Titled series
//! extend copies of these defaults rather than mutating them.
//!
//! Built-in rule sets are constructed from an explicit factory list:
//! initialization is a plain function call, not discovery of whatever
//! happens to be loaded.

use crate::definition::SeriesDefinition;
use crate::error::ConfigError;
use crate::ruleset::{RuleSet, SeriesRuleSet, SeriesRuleSetBuilder};

/// Title of the identifier-less fallback rule set.
pub const DEFAULT_TITLE: &str = "Default";

/// Canonical rendering order of the default rule set.
pub const DEFAULT_FIELD_ORDER: &[&str] = &[
    "year",
    "month",
    "start_month",
    "end_month",
    "volume",
    "part",
    "number",
    "start_number",
    "end_number",
    "book",
    "sheet",
    "start_page",
    "end_page",
    "supplement",
];

/// Default token fragments. Patterns reference these as `%{name}`.
const DEFAULT_TOKENS: &[(&str, &str)] = &[
    ("v", r"V\.?\s?(?<volume>\d+)"),
    ("n", r"NO\.?\s?(?<number>\d+)"),
    ("ns", r"NOS?\.?\s?(?<start_number>\d+)[-/](?<end_number>\d+)"),
    ("pt", r"PT\.?\s?(?<part>\d+)"),
    ("y", r"(?:YR\.?\s)?(?<year>\d{4})"),
    ("yr", r"(?<start_year>\d{4})[-/](?<end_year>\d{2,4})"),
    ("m", r"(?<month>[A-Z]+\.?)"),
    ("sm", r"(?<start_month>[A-Z]+\.?)"),
    ("em", r"(?<end_month>[A-Z]+\.?)"),
    ("day", r"(?<day>\d{1,2})"),
    ("div", r"[\s:,/]\s?"),
    ("sup", r"(?<supplement>SUPP?\.?(?:LEMENT)?)"),
    ("pgs", r"P[PG]\.?\s?(?<start_page>\d+)-(?<end_page>\d+)"),
];

/// Default pattern templates, most specific first; evaluation stops at the
/// first whole-string match.
const DEFAULT_PATTERNS: &[&str] = &[
    // Year:1977, Month:November, Number:9 (our own canonical form)
    r"Year:(?<year>\d{4}), Month:(?<month>[A-Z]+)(?:, Number:(?<number>\d+))?",
    // V. 8:NO. 6 (1993:MAR. 19)
    r"%{v}%{div}%{n}\s?\(%{y}:%{m}\s?%{day}\)",
    // NO. 42 (2005:APR. 13)
    r"%{n}\s?\(%{y}:%{m}\s?%{day}\)",
    // V. 27, NO. 13 (SEPTEMBER 21 - SEPTEMBER 28, 2012)
    r"%{v}%{div}%{n}\s?\(%{sm}\s?(?<start_day>\d{1,2})\s?-\s?%{em}\s?(?<end_day>\d{1,2}),?\s%{y}\)",
    // V. 2, NO. 25-26 (JUL. -AUG. 1995)
    r"%{v}%{div}%{ns}\s?\(%{sm}\s?-\s?%{em}\s%{y}\)",
    // V. 2, NO. 25-26 (DEC. 1987)
    r"%{v}%{div}%{ns}\s?\(%{m}\s%{y}\)",
    // V. 16, NO. 12 (APR. 2001) | V. 12, NO. 29, (OCT. 1997)
    r"%{v}%{div}%{n},?\s?\(%{m}\s%{y}\)",
    // V. 12 NO. 37 1997 SUP.
    r"%{v}(?:%{div})?%{n}\s%{y}\s%{sup}",
    // V. 30NO. 6 2015 | V. 16,NO. 23 2001 SEP.
    r"%{v}(?:%{div})?%{n}\s%{y}(?:\s%{m})?",
    // V. 24:NO. 1(2009)
    r"%{v}(?:%{div})?%{n}\s?\(%{y}\)",
    // V. 8:NO. 19-22 1993 | V. 5 NO. 12-13
    r"%{v}%{div}%{ns}(?:\s%{y})?",
    // V. 9 PG. 1535-2248 1994
    r"%{v}%{div}%{pgs}(?:\s%{y})?",
    // V. 5 1990 PP. 4783-5463
    r"%{v}\s%{y}\s%{pgs}",
    // 1896 V. 2 PT. 1
    r"%{y}\s%{v}\s%{pt}",
    // 1896 PT. 1
    r"%{y}\s%{pt}",
    // V. 3:PT. 2 1972
    r"%{v}%{div}%{pt}(?:\s%{y})?",
    // NO. 165 PT. 2
    r"%{n}\s?%{pt}",
    // NO. 9 SEPT. 1975
    r"%{n}\s%{m}\s%{y}",
    // NO. 1531 (1976)
    r"%{n}\s?\(%{y}\)",
    // NOS. 561-566 (1932)
    r"%{ns}\s?\(?%{y}\)?",
    // 2012 FEB. 21-MAR. 16
    r"%{y}\s%{sm}\s?(?<start_day>\d{1,2})\s?-\s?%{em}\s?(?<end_day>\d{1,2})",
    // 2013 FEB. 1-26
    r"%{y}\s%{m}\s?(?<start_day>\d{1,2})\s?-\s?(?<end_day>\d{1,2})",
    // 1976 SEP-OCT
    r"%{y}\s%{sm}\s?-\s?%{em}",
    // 1988:MAY 17
    r"%{y}:%{m}\s%{day}",
    // NOV 1977 | 1977 NOV, either order; aliasing keeps the matching branch
    r"(?:%{m}\s%{y}|%{y}\s%{m})",
    // 1961-1963 | 1998-99
    r"%{yr}",
    // NO. 561-566
    r"%{ns}",
    // V. 2
    r"%{v}",
    // NO. 1531
    r"%{n}",
    // OCT.
    r"%{m}",
    // 1985
    r"%{y}",
];

/// The default token set (a fresh copy; callers may extend it freely).
pub fn default_tokens() -> crate::pattern::TokenSet {
    let mut tokens = crate::pattern::TokenSet::new();
    for (name, fragment) in DEFAULT_TOKENS {
        tokens.define(*name, *fragment);
    }
    tokens
}

/// A rule-set builder preloaded with the default tokens, patterns and field
/// order. Series builders layer their own entries on this copy.
pub fn series_builder(title: impl Into<String>) -> SeriesRuleSetBuilder {
    SeriesRuleSet::builder(title)
        .tokens(default_tokens())
        .patterns(DEFAULT_PATTERNS.iter().copied())
        .field_order(DEFAULT_FIELD_ORDER.iter().copied())
}

/// The declarative definition of the identifier-less default rule set.
pub fn default_definition() -> SeriesDefinition {
    SeriesDefinition { title: DEFAULT_TITLE.to_string(), ..SeriesDefinition::default() }
}

/// Build the default rule set.
pub fn default_rule_set() -> Result<SeriesRuleSet, ConfigError> {
    default_definition().build()
}

/// Agricultural Statistics: annual volumes labelled by year, with a pile of
/// shelving and media noise in front of and behind the date.
fn agricultural_statistics_definition() -> SeriesDefinition {
    SeriesDefinition {
        title: "Agricultural Statistics".to_string(),
        ocns: vec![1_773_189, 471_365_867, 33_822_997, 37_238_142],
        patterns: vec![
            // 2008
            r"(?<year>\d{3,4})".to_string(),
            // 1961-1963 | 995-96
            r"(?<start_year>\d{3,4})[-/](?<end_year>\d{2,4})".to_string(),
        ],
        replace_patterns: true,
        field_order: vec!["year".to_string()],
        strip: vec![
            r"^HD1751\s?\.\s?A43 ".to_string(),
            r"^V\. ".to_string(),
            r" ?C\. \d+ ?".to_string(),
            r"[()]".to_string(),
            r" P77-\d+$".to_string(),
            r"/CD$".to_string(),
            r" 1 CD .*$".to_string(),
            r" CD$".to_string(),
        ],
        ..SeriesDefinition::default()
    }
}

/// Constructor for one built-in rule set.
pub type RuleSetFactory = fn() -> Result<Box<dyn RuleSet>, ConfigError>;

/// The static factory list of built-in rule sets, default included.
///
/// New series, declarative or hand-written, are added here explicitly;
/// there is no runtime discovery.
pub fn builtin_rule_sets() -> &'static [RuleSetFactory] {
    fn default() -> Result<Box<dyn RuleSet>, ConfigError> {
        Ok(Box::new(default_rule_set()?))
    }
    fn agricultural_statistics() -> Result<Box<dyn RuleSet>, ConfigError> {
        Ok(Box::new(agricultural_statistics_definition().build()?))
    }
    &[default, agricultural_statistics]
}
