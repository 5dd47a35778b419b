//! Rule sets: parse, canonicalize, explode.
//!
//! A rule set binds a series title, its identifier sets (OCNs and sudoc
//! stems), a [`TokenSet`], an ordered [`PatternList`] and a canonical field
//! order. [`SeriesRuleSet`] is the declarative implementation that nearly
//! every series uses; series whose behavior exceeds declarative
//! expressiveness implement [`RuleSet`] by hand and the registry treats both
//! uniformly.
//!
//! ## Parse pipeline
//!
//! ```text
//! raw EC string
//!    │ preprocess + remove_dupe_years      (normalize.rs)
//!    │ per-set strip regexes               (noise: copy notes, media tags)
//!    v
//! PatternList::evaluate                    first match wins, by position
//!    │ capture merge                       (pattern.rs; inconsistent → absent)
//!    v
//! correction chain                         (corrections.rs; fixed order)
//!    v
//! ParsedFields | absent
//! ```

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use crate::corrections::{Correction, DEFAULT_CORRECTIONS, run_chain};
use crate::error::ConfigError;
use crate::fields::ParsedFields;
use crate::normalize::{preprocess, remove_dupe_years};
use crate::pattern::{PatternList, PatternMatch, TokenSet};

/// Expansion output: canonical string → the fields it denotes,
/// de-duplicated and deterministically ordered by key.
pub type Exploded = BTreeMap<String, ParsedFields>;

/// Start/end field families recognized by range expansion, tried in order.
const RANGE_FAMILIES: &[(&str, &str, &str)] = &[
    ("number", "start_number", "end_number"),
    ("part", "start_part", "end_part"),
    ("year", "start_year", "end_year"),
];

/// Largest start-to-end span [`RuleSet::explode`] will enumerate.
///
/// Real labels span a handful of issues or years; a label like
/// `NO. 1-99999999` is a transcription artifact, not a holdings claim, and is
/// treated as an unusable range rather than enumerated.
pub const MAX_RANGE_SPAN: u64 = 1_000;

/// A series-specific enumeration/chronology handler.
///
/// Implementations are immutable after construction and hold no per-call
/// state, so a registry full of them is safe for unbounded concurrent reads.
pub trait RuleSet: Send + Sync {
    /// Unique series title.
    fn title(&self) -> &str;

    /// Numeric catalog identifiers this set claims.
    fn ocns(&self) -> &[u64] {
        &[]
    }

    /// Classification-prefix strings this set claims.
    fn sudoc_stems(&self) -> &[String] {
        &[]
    }

    /// Parse a raw EC string into fields, or absent when nothing matches or
    /// the match is inconsistent.
    fn parse(&self, raw: &str) -> Option<ParsedFields>;

    /// Render fields in the set's canonical order; absent for an empty
    /// rendering, never `""`.
    fn canonicalize(&self, fields: &ParsedFields) -> Option<String>;

    /// Expand a parsed EC into the individual instances it denotes.
    ///
    /// The first recognized start/end family (number, part, numeric year) is
    /// enumerated inclusively; unusable bounds contribute nothing; no range
    /// present means the input passes through alone. Every emitted entry
    /// canonicalizes by construction, since the canonical string is its key.
    fn explode(&self, fields: &ParsedFields) -> Exploded {
        let mut out = Exploded::new();
        for candidate in expand_candidates(fields) {
            if let Some(canon) = self.canonicalize(&candidate) {
                out.entry(canon).or_insert(candidate);
            }
        }
        out
    }
}

/// Enumerate range-expansion candidates for `fields`.
///
/// Integer enumeration treats bounds as integers, not reconstructed strings;
/// zero-padding is preserved only when both bounds carry it at the same
/// width (e.g. `05`–`08`). Spans wider than [`MAX_RANGE_SPAN`] are unusable.
fn expand_candidates(fields: &ParsedFields) -> Vec<ParsedFields> {
    for (field, start_field, end_field) in RANGE_FAMILIES {
        let (Some(start), Some(end)) = (fields.get(start_field), fields.get(end_field)) else {
            continue;
        };
        let (Ok(start_num), Ok(end_num)) = (start.parse::<u64>(), end.parse::<u64>()) else {
            return Vec::new();
        };
        if end_num < start_num || end_num - start_num > MAX_RANGE_SPAN {
            return Vec::new();
        }
        let pad = if start.starts_with('0') && start.len() == end.len() { Some(start.len()) } else { None };
        return (start_num..=end_num)
            .map(|n| {
                let mut candidate = fields.clone();
                match pad {
                    Some(width) => candidate.set(*field, format!("{n:0width$}")),
                    None => candidate.set(*field, n.to_string()),
                }
                candidate
            })
            .collect();
    }
    vec![fields.clone()]
}

/// Declarative rule set: identifiers, tokens, ordered patterns, field order
/// and noise stripping, built once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct SeriesRuleSet {
    title: String,
    ocns: Vec<u64>,
    sudoc_stems: Vec<String>,
    tokens: TokenSet,
    patterns: PatternList,
    field_order: Vec<String>,
    strip: Vec<Regex>,
    corrections: Vec<Correction>,
}

impl SeriesRuleSet {
    /// Start building a rule set from an empty token set and pattern list.
    ///
    /// Most series want [`crate::defaults::series_builder`] instead, which
    /// preloads the shared default tokens, patterns and field order.
    pub fn builder(title: impl Into<String>) -> SeriesRuleSetBuilder {
        SeriesRuleSetBuilder {
            title: title.into(),
            ocns: Vec::new(),
            sudoc_stems: Vec::new(),
            tokens: TokenSet::new(),
            templates: Vec::new(),
            field_order: Vec::new(),
            strip: Vec::new(),
            corrections: DEFAULT_CORRECTIONS.to_vec(),
            case_insensitive: true,
        }
    }

    /// The token set this rule set compiles patterns against.
    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    /// The compiled pattern list, in evaluation order.
    pub fn patterns(&self) -> &PatternList {
        &self.patterns
    }

    /// The canonical field order.
    pub fn field_order(&self) -> &[String] {
        &self.field_order
    }

    fn preprocess(&self, raw: &str) -> String {
        let mut s = preprocess(raw);
        s = remove_dupe_years(&s);
        for strip in &self.strip {
            s = strip.replace_all(&s, "").into_owned();
        }
        s.trim().to_string()
    }
}

impl RuleSet for SeriesRuleSet {
    fn title(&self) -> &str {
        &self.title
    }

    fn ocns(&self) -> &[u64] {
        &self.ocns
    }

    fn sudoc_stems(&self) -> &[String] {
        &self.sudoc_stems
    }

    fn parse(&self, raw: &str) -> Option<ParsedFields> {
        let input = self.preprocess(raw);
        let (idx, outcome) = self.patterns.evaluate(&input)?;
        match outcome {
            PatternMatch::None => None,
            PatternMatch::Inconsistent => {
                debug!(title = %self.title, %input, pattern = idx, "inconsistent captures, parse discarded");
                None
            }
            PatternMatch::Fields(mut fields) => {
                if !run_chain(&self.corrections, &mut fields) {
                    debug!(title = %self.title, %input, pattern = idx, "correction pass discarded parse");
                    return None;
                }
                if fields.is_empty() {
                    return None;
                }
                trace!(title = %self.title, %input, pattern = idx, "parsed");
                Some(fields)
            }
        }
    }

    fn canonicalize(&self, fields: &ParsedFields) -> Option<String> {
        let rendered: Vec<String> = self
            .field_order
            .iter()
            .filter_map(|name| {
                let value = fields.get(name)?;
                if value.is_empty() {
                    return None;
                }
                Some(format!("{}:{value}", display_name(name)))
            })
            .collect();
        if rendered.is_empty() { None } else { Some(rendered.join(", ")) }
    }
}

/// Render a field name for canonical output: underscores become spaces, the
/// first letter is upcased (`start_number` → `Start number`).
fn display_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => spaced,
    }
}

/// Builder for [`SeriesRuleSet`]; all validation happens in [`build`].
///
/// [`build`]: SeriesRuleSetBuilder::build
#[derive(Debug, Clone)]
pub struct SeriesRuleSetBuilder {
    title: String,
    ocns: Vec<u64>,
    sudoc_stems: Vec<String>,
    tokens: TokenSet,
    templates: Vec<String>,
    field_order: Vec<String>,
    strip: Vec<String>,
    corrections: Vec<Correction>,
    case_insensitive: bool,
}

impl SeriesRuleSetBuilder {
    /// Claim numeric catalog identifiers.
    pub fn ocns(mut self, ocns: impl IntoIterator<Item = u64>) -> Self {
        self.ocns.extend(ocns);
        self
    }

    /// Claim classification-prefix strings.
    pub fn sudoc_stems(mut self, stems: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sudoc_stems.extend(stems.into_iter().map(Into::into));
        self
    }

    /// Replace the base token set.
    pub fn tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = tokens;
        self
    }

    /// Define or override a single token fragment.
    pub fn token(mut self, name: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.tokens.define(name, fragment);
        self
    }

    /// Append a pattern template (lowest priority so far).
    pub fn pattern(mut self, template: impl Into<String>) -> Self {
        self.templates.push(template.into());
        self
    }

    /// Append several pattern templates in order.
    pub fn patterns(mut self, templates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.templates.extend(templates.into_iter().map(Into::into));
        self
    }

    /// Discard any inherited pattern templates.
    pub fn clear_patterns(mut self) -> Self {
        self.templates.clear();
        self
    }

    /// Replace the canonical field order.
    pub fn field_order(mut self, order: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.field_order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Add a noise-strip regex applied (case-insensitively) before matching.
    pub fn strip(mut self, pattern: impl Into<String>) -> Self {
        self.strip.push(pattern.into());
        self
    }

    /// Replace the correction chain.
    pub fn corrections(mut self, chain: impl IntoIterator<Item = Correction>) -> Self {
        self.corrections = chain.into_iter().collect();
        self
    }

    /// Make pattern matching case-sensitive (default is insensitive).
    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    /// Validate and compile everything; malformed definitions fail here, at
    /// load time, never during later parse calls.
    pub fn build(self) -> Result<SeriesRuleSet, ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::MissingTitle);
        }
        let patterns = PatternList::compile(&self.templates, &self.tokens, self.case_insensitive)?;
        let strip = self
            .strip
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConfigError::InvalidPattern { template: p.clone(), source: Box::new(e) })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SeriesRuleSet {
            title: self.title,
            ocns: self.ocns,
            sudoc_stems: self.sudoc_stems,
            tokens: self.tokens,
            patterns,
            field_order: self.field_order,
            strip,
            corrections: self.corrections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulletin() -> SeriesRuleSet {
        SeriesRuleSet::builder("Test Bulletin")
            .ocns([1_714_756])
            .token("n", r"NO\.?\s?(?<number>\d+)")
            .token("ns", r"NOS?\.?\s?(?<start_number>\d+)-(?<end_number>\d+)")
            .token("y", r"(?<year>\d{4})")
            .pattern(r"%{ns}\s?\(%{y}\)")
            .pattern(r"%{n}\s?\(%{y}\)")
            .pattern(r"%{n}")
            .strip(r"\s?\[MICROFICHE\]$")
            .field_order(["number", "start_number", "end_number", "year"])
            .build()
            .unwrap()
    }

    #[test]
    fn parse_is_first_match_wins() {
        let rs = bulletin();
        let f = rs.parse("NOS. 561-566 (1932)").unwrap();
        assert_eq!(f.get("start_number"), Some("561"));
        assert_eq!(f.get("end_number"), Some("566"));
        assert_eq!(f.get("year"), Some("1932"));

        let f = rs.parse("NO. 1531 (1976)").unwrap();
        assert_eq!(f.get("number"), Some("1531"));
        assert!(rs.parse("PAMPHLET BOX 3").is_none());
    }

    #[test]
    fn parse_discards_inconsistent_captures() {
        let rs = SeriesRuleSet::builder("Reprint Register")
            .pattern(r"(?<year>\d{4}) REPR\. (?<year>\d{4})")
            .field_order(["year"])
            .build()
            .unwrap();
        // differing captures for one field discard the whole parse, and
        // evaluation does not fall through to a later pattern
        assert!(rs.parse("1993 REPR. 1994").is_none());
        let f = rs.parse("1993 REPR. 1993").unwrap();
        assert_eq!(f.get("year"), Some("1993"));
    }

    #[test]
    fn parse_strips_series_noise() {
        let rs = bulletin();
        let f = rs.parse("NO. 144 [MICROFICHE]").unwrap();
        assert_eq!(f.get("number"), Some("144"));
    }

    #[test]
    fn canonicalize_follows_field_order() {
        let rs = bulletin();
        let f: ParsedFields = [("year", "1932"), ("number", "561")].into_iter().collect();
        assert_eq!(rs.canonicalize(&f), Some("Number:561, Year:1932".to_string()));
    }

    #[test]
    fn canonicalize_of_empty_is_absent() {
        let rs = bulletin();
        assert_eq!(rs.canonicalize(&ParsedFields::new()), None);
        // fields outside the order render nothing, not ""
        let f: ParsedFields = [("shelf", "4B")].into_iter().collect();
        assert_eq!(rs.canonicalize(&f), None);
    }

    #[test]
    fn explode_enumerates_number_spans() {
        let rs = bulletin();
        let f = rs.parse("NOS. 561-566 (1932)").unwrap();
        let exploded = rs.explode(&f);
        assert_eq!(exploded.len(), 6);
        assert!(exploded.contains_key("Number:561, Start number:561, End number:566, Year:1932"));
        assert!(exploded.contains_key("Number:566, Start number:561, End number:566, Year:1932"));
        for fields in exploded.values() {
            assert!(rs.canonicalize(fields).is_some());
        }
    }

    #[test]
    fn explode_without_a_range_passes_through() {
        let rs = bulletin();
        let f = rs.parse("NO. 1531 (1976)").unwrap();
        let exploded = rs.explode(&f);
        assert_eq!(exploded.len(), 1);
        assert!(exploded.contains_key("Number:1531, Year:1976"));
    }

    #[test]
    fn explode_rejects_unusable_bounds() {
        let rs = bulletin();
        let inverted: ParsedFields = [("start_number", "566"), ("end_number", "561")].into_iter().collect();
        assert!(rs.explode(&inverted).is_empty());

        let garbled: ParsedFields = [("start_number", "561"), ("end_number", "56a")].into_iter().collect();
        assert!(rs.explode(&garbled).is_empty());

        let runaway: ParsedFields = [("start_number", "1"), ("end_number", "99999999")].into_iter().collect();
        assert!(rs.explode(&runaway).is_empty());

        let uncanonical: ParsedFields = [("string", "cant_canonicalize_this")].into_iter().collect();
        assert!(rs.explode(&uncanonical).is_empty());
    }

    #[test]
    fn explode_preserves_shared_zero_padding() {
        let rs = bulletin();
        let padded: ParsedFields = [("start_number", "05"), ("end_number", "08")].into_iter().collect();
        let exploded = rs.explode(&padded);
        assert_eq!(exploded.len(), 4);
        assert!(exploded.contains_key("Number:05, Start number:05, End number:08"));
    }

    #[test]
    fn missing_title_fails_at_build_time() {
        let err = SeriesRuleSet::builder("  ").build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingTitle));
    }

    #[test]
    fn bad_patterns_fail_at_build_time() {
        let err = SeriesRuleSet::builder("Broken").pattern(r"(?<number>\d+").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));

        let err = SeriesRuleSet::builder("Broken").pattern(r"%{missing}").build().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownToken { .. }));
    }

    #[test]
    fn display_names_capitalize_once() {
        assert_eq!(display_name("start_number"), "Start number");
        assert_eq!(display_name("year"), "Year");
    }
}
