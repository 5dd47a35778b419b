//! Token and pattern composition.
//!
//! Rule sets do not write monolithic regexes; they compose them from named
//! fragments. The pipeline for one pattern is:
//!
//! ```text
//! template            "%{v}%{div}%{n} \(%{y}\)"
//!    │  TokenSet::expand        substitute %{name} fragments
//!    v
//! expanded            "V\.?\s?(?<volume>\d+)[\s:,/]\s?NO\.? ..."
//!    │  disambiguate_captures   rewrite repeated capture names
//!    v
//! rewritten + bindings
//!    │  RegexBuilder            anchor ^(?:...)$, case-insensitive
//!    v
//! CompiledPattern
//! ```
//!
//! ## Duplicate capture names
//!
//! A template may legitimately reuse one capture name across alternation
//! branches (`(?:%{m}\s%{y}|%{y}\s%{m})`). The `regex` crate rejects duplicate
//! group names, so the compiler rewrites later occurrences to internal aliases
//! (`month`, `month__2`, ...) and records which aliases feed which semantic
//! field. After a match the aliases are merged by preferring the non-absent
//! capture (the branch that actually matched), never an arbitrary
//! "last branch wins". Two differing non-absent captures for one field make
//! the whole match inconsistent, and the parse is discarded.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::error::ConfigError;
use crate::fields::ParsedFields;

/// Maximum nesting depth for token references inside token fragments.
const MAX_TOKEN_DEPTH: usize = 8;

/// Named, reusable regex fragments that patterns are composed from.
///
/// Cloning is the extension mechanism: a rule set takes a copy of the shared
/// defaults and layers its own fragments on top via [`TokenSet::merged`], so
/// customization never leaks into other rule sets built from the same
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: BTreeMap<String, String>,
}

impl TokenSet {
    /// Create an empty token set.
    pub fn new() -> Self {
        TokenSet { tokens: BTreeMap::new() }
    }

    /// Define (or override) a named fragment.
    pub fn define(&mut self, name: impl Into<String>, fragment: impl Into<String>) {
        self.tokens.insert(name.into(), fragment.into());
    }

    /// Look up a fragment by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// Return a copy of this set with `overrides` layered on top.
    pub fn merged<N, F>(&self, overrides: impl IntoIterator<Item = (N, F)>) -> TokenSet
    where
        N: Into<String>,
        F: Into<String>,
    {
        let mut merged = self.clone();
        for (name, fragment) in overrides {
            merged.define(name, fragment);
        }
        merged
    }

    /// Iterate defined token names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }

    /// Substitute every `%{name}` placeholder in `template` with its
    /// fragment. Fragments may themselves contain placeholders, up to a fixed
    /// nesting depth.
    pub fn expand(&self, template: &str) -> Result<String, ConfigError> {
        let mut current = template.to_string();
        for _ in 0..MAX_TOKEN_DEPTH {
            if !current.contains("%{") {
                return Ok(current);
            }
            current = self.expand_once(&current, template)?;
        }
        if current.contains("%{") {
            return Err(ConfigError::TokenRecursion { limit: MAX_TOKEN_DEPTH, template: template.to_string() });
        }
        Ok(current)
    }

    fn expand_once(&self, input: &str, template: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(start) = rest.find("%{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                // unterminated placeholder; treat the tail as a literal
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            let name = &after[..end];
            match self.get(name) {
                Some(fragment) => out.push_str(fragment),
                None => {
                    return Err(ConfigError::UnknownToken {
                        name: name.to_string(),
                        template: template.to_string(),
                    });
                }
            }
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// One semantic capture name and the internal regex group aliases that feed it.
#[derive(Debug, Clone)]
struct CaptureBinding {
    field: String,
    aliases: Vec<String>,
}

/// Outcome of matching one compiled pattern against an input string.
#[derive(Debug)]
pub enum PatternMatch {
    /// The pattern did not match.
    None,
    /// The pattern matched but two branches captured differing values for the
    /// same field; the parse must be discarded.
    Inconsistent,
    /// The pattern matched and produced a consistent field map.
    Fields(ParsedFields),
}

/// A single anchored, compiled pattern with its capture bindings.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    template: String,
    regex: Regex,
    bindings: Vec<CaptureBinding>,
}

impl CompiledPattern {
    /// Expand `template` against `tokens` and compile it, anchored to the
    /// whole string.
    pub fn compile(template: &str, tokens: &TokenSet, case_insensitive: bool) -> Result<Self, ConfigError> {
        let expanded = tokens.expand(template)?;
        let (rewritten, bindings) = disambiguate_captures(&expanded);
        let anchored = format!("^(?:{rewritten})$");
        let regex = RegexBuilder::new(&anchored)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| ConfigError::InvalidPattern {
                template: template.to_string(),
                source: Box::new(e),
            })?;
        Ok(CompiledPattern { template: template.to_string(), regex, bindings })
    }

    /// The original template text, before expansion.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match against the whole input and convert captures into fields.
    ///
    /// Aliases for one field are merged by taking the first non-empty
    /// capture; a second non-empty capture with a different value marks the
    /// match inconsistent.
    pub fn try_match(&self, input: &str) -> PatternMatch {
        let Some(caps) = self.regex.captures(input) else {
            return PatternMatch::None;
        };

        let mut fields = ParsedFields::new();
        for binding in &self.bindings {
            let mut value: Option<&str> = None;
            for alias in &binding.aliases {
                let Some(m) = caps.name(alias) else { continue };
                let captured = m.as_str();
                if captured.is_empty() {
                    continue;
                }
                match value {
                    None => value = Some(captured),
                    Some(existing) if existing == captured => {}
                    Some(_) => return PatternMatch::Inconsistent,
                }
            }
            if let Some(v) = value {
                fields.set(&binding.field, v);
            }
        }
        PatternMatch::Fields(fields)
    }
}

/// An ordered sequence of compiled patterns; first match wins by position.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<CompiledPattern>,
}

impl PatternList {
    /// Create an empty list.
    pub fn new() -> Self {
        PatternList { patterns: Vec::new() }
    }

    /// Compile `templates` in order against `tokens`.
    pub fn compile(
        templates: &[impl AsRef<str>],
        tokens: &TokenSet,
        case_insensitive: bool,
    ) -> Result<Self, ConfigError> {
        let mut list = PatternList::new();
        for template in templates {
            list.push(CompiledPattern::compile(template.as_ref(), tokens, case_insensitive)?);
        }
        Ok(list)
    }

    /// Append a pattern at the end (lowest priority).
    pub fn push(&mut self, pattern: CompiledPattern) {
        self.patterns.push(pattern);
    }

    /// Number of patterns in the list.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True if no patterns are present.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterate patterns in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter()
    }

    /// Evaluate patterns in list order and stop at the first that matches.
    ///
    /// Returns the matching pattern's position alongside its outcome; `None`
    /// means no pattern matched at all.
    pub fn evaluate(&self, input: &str) -> Option<(usize, PatternMatch)> {
        for (idx, pattern) in self.patterns.iter().enumerate() {
            match pattern.try_match(input) {
                PatternMatch::None => continue,
                outcome => return Some((idx, outcome)),
            }
        }
        None
    }
}

/// Rewrite repeated named capture groups to unique internal aliases.
///
/// Returns the rewritten pattern text plus the field bindings in
/// first-appearance order (which later becomes `ParsedFields` insertion
/// order). Handles both `(?<name>` and `(?P<name>` spellings; skips escapes
/// and character classes.
fn disambiguate_captures(pattern: &str) -> (String, Vec<CaptureBinding>) {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut bindings: Vec<CaptureBinding> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if in_class {
            if c == ']' {
                in_class = false;
            }
            out.push(c);
            i += 1;
            continue;
        }
        if c == '[' {
            in_class = true;
            out.push(c);
            i += 1;
            continue;
        }
        if c == '(' {
            if let Some((name, name_end)) = named_group_at(&chars, i) {
                let alias = match bindings.iter_mut().find(|b| b.field == name) {
                    Some(binding) => {
                        let alias = format!("{name}__{}", binding.aliases.len() + 1);
                        binding.aliases.push(alias.clone());
                        alias
                    }
                    None => {
                        bindings.push(CaptureBinding { field: name.clone(), aliases: vec![name.clone()] });
                        name
                    }
                };
                out.push_str("(?<");
                out.push_str(&alias);
                out.push('>');
                i = name_end + 1; // past '>'
                continue;
            }
        }
        out.push(c);
        i += 1;
    }

    (out, bindings)
}

/// If `chars[open]` starts a named group, return its name and the index of
/// the closing `>`.
fn named_group_at(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut idx = open + 1;
    if chars.get(idx) != Some(&'?') {
        return None;
    }
    idx += 1;
    if chars.get(idx) == Some(&'P') {
        idx += 1;
    }
    if chars.get(idx) != Some(&'<') {
        return None;
    }
    idx += 1;
    let name_start = idx;
    while idx < chars.len() && (chars[idx].is_ascii_alphanumeric() || chars[idx] == '_') {
        idx += 1;
    }
    if idx == name_start || chars.get(idx) != Some(&'>') {
        return None;
    }
    Some((chars[name_start..idx].iter().collect(), idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenSet {
        let mut t = TokenSet::new();
        t.define("y", r"(?<year>\d{4})");
        t.define("m", r"(?<month>[A-Z]+\.?)");
        t.define("ym", r"%{y}\s%{m}");
        t
    }

    #[test]
    fn expand_substitutes_fragments() {
        let t = tokens();
        assert_eq!(t.expand(r"^%{y}$").unwrap(), r"^(?<year>\d{4})$");
        // nested reference
        assert_eq!(t.expand(r"%{ym}").unwrap(), r"(?<year>\d{4})\s(?<month>[A-Z]+\.?)");
    }

    #[test]
    fn expand_rejects_unknown_tokens() {
        let err = tokens().expand(r"%{nope}").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownToken { ref name, .. } if name == "nope"));
    }

    #[test]
    fn expand_rejects_cycles() {
        let mut t = TokenSet::new();
        t.define("a", "%{b}");
        t.define("b", "%{a}");
        let err = t.expand("%{a}").unwrap_err();
        assert!(matches!(err, ConfigError::TokenRecursion { .. }));
    }

    #[test]
    fn merged_copies_instead_of_mutating() {
        let base = tokens();
        let extended = base.merged([("y", r"(?<year>\d{2})")]);
        assert_eq!(base.get("y"), Some(r"(?<year>\d{4})"));
        assert_eq!(extended.get("y"), Some(r"(?<year>\d{2})"));
    }

    #[test]
    fn duplicate_names_take_the_matching_branch() {
        let t = tokens();
        let p = CompiledPattern::compile(r"(?:%{m}\s%{y}|%{y}\s%{m})", &t, true).unwrap();

        let PatternMatch::Fields(f) = p.try_match("NOV 1977") else {
            panic!("expected a match");
        };
        assert_eq!(f.get("month"), Some("NOV"));
        assert_eq!(f.get("year"), Some("1977"));

        let PatternMatch::Fields(f) = p.try_match("1977 NOV") else {
            panic!("expected a match");
        };
        assert_eq!(f.get("month"), Some("NOV"));
        assert_eq!(f.get("year"), Some("1977"));
    }

    #[test]
    fn conflicting_duplicate_captures_are_inconsistent() {
        let t = TokenSet::new();
        let p = CompiledPattern::compile(r"(?<year>\d{4}) TO (?<year>\d{4})", &t, true).unwrap();

        // both aliases capture, with differing values
        assert!(matches!(p.try_match("1993 TO 1994"), PatternMatch::Inconsistent));

        // agreeing captures stay a match
        let PatternMatch::Fields(f) = p.try_match("1993 TO 1993") else {
            panic!("expected a match");
        };
        assert_eq!(f.get("year"), Some("1993"));
    }

    #[test]
    fn optional_fragments_need_an_explicit_group() {
        let mut t = TokenSet::new();
        t.define("div", r"[\s:,/]\s?");
        t.define("n", r"NO\.?\s?(?<number>\d+)");

        // expansion is textual: a trailing `?` binds to the fragment's last
        // element, not the fragment as a whole
        assert_eq!(t.expand(r"%{div}?").unwrap(), r"[\s:,/]\s??");

        let p = CompiledPattern::compile(r"(?:%{div})?%{n}", &t, true).unwrap();
        assert!(matches!(p.try_match("NO. 6"), PatternMatch::Fields(_)));
        assert!(matches!(p.try_match(":NO. 6"), PatternMatch::Fields(_)));
    }

    #[test]
    fn captures_keep_first_appearance_order() {
        let t = tokens();
        let p = CompiledPattern::compile(r"%{y}\s%{m}", &t, true).unwrap();
        let PatternMatch::Fields(f) = p.try_match("1977 NOV") else {
            panic!("expected a match");
        };
        let names: Vec<_> = f.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["year", "month"]);
    }

    #[test]
    fn patterns_are_anchored_and_case_insensitive() {
        let t = tokens();
        let p = CompiledPattern::compile(r"%{m}", &t, true).unwrap();
        assert!(matches!(p.try_match("nov."), PatternMatch::Fields(_)));
        assert!(matches!(p.try_match("NOV 1977"), PatternMatch::None));
    }

    #[test]
    fn character_classes_are_not_scanned_for_groups() {
        let t = TokenSet::new();
        let p = CompiledPattern::compile(r"[(?<]+(?<tail>\d+)", &t, true).unwrap();
        let PatternMatch::Fields(f) = p.try_match("(?<42") else {
            panic!("expected a match");
        };
        assert_eq!(f.get("tail"), Some("42"));
    }

    #[test]
    fn evaluation_is_first_match_wins() {
        let t = tokens();
        let list = PatternList::compile(&[r"%{y}\s%{m}", r"%{y}.*"], &t, true).unwrap();
        let (idx, outcome) = list.evaluate("1977 NOV").unwrap();
        assert_eq!(idx, 0);
        assert!(matches!(outcome, PatternMatch::Fields(_)));

        let (idx, _) = list.evaluate("1977 #4").unwrap();
        assert_eq!(idx, 1);
        assert!(list.evaluate("no year here").is_none());
    }
}
