//! Rule-based normalization of library enumeration/chronology (EC) strings.
//!
//! Holdings records describe which volume/issue/date range a physical item
//! covers with free-text labels like `"NO. 1312 PT. 12 V. 1 1985"`. This
//! crate turns those labels into a canonical structured representation and
//! expands compact range notations (issue 561–566) into the individual
//! instances they denote, so collection-management pipelines can reconcile
//! physical holdings against expected issue lists.
//!
//! ## How the parts work together
//!
//! ```text
//! raw EC string + record identifiers (OCNs, sudocs)
//!         │
//!         v
//! Registry::resolve ──────────── identifier index     (registry.rs)
//!         │                      exactly one default
//!         v
//! RuleSet::parse                                      (ruleset.rs)
//!   - preprocess / noise strip                        (normalize.rs)
//!   - PatternList, first match wins                   (pattern.rs)
//!   - ordered correction chain                        (corrections.rs)
//!         │
//!         v
//! ParsedFields | absent                               (fields.rs)
//!         │
//!         ├─ RuleSet::canonicalize  "Year:1985, Number:1312, ..."
//!         └─ RuleSet::explode       one entry per enumerated instance
//! ```
//!
//! Patterns are composed from named [`TokenSet`] fragments, anchored to the
//! whole input and evaluated strictly in list order. Rule sets are built once
//! (declaratively via [`SeriesDefinition`] or by hand against the [`RuleSet`]
//! trait), registered explicitly, and immutable afterwards, so a [`Registry`]
//! can be shared across threads without locking.
//!
//! Parse misses are not errors: real corpora miss 3–20% of labels per series,
//! and callers tally those. Only configuration problems (bad patterns,
//! duplicate titles, a missing default) fail hard, at load time, as
//! [`ConfigError`].
//!
//! ## Example
//!
//! ```
//! use enumchron::Registry;
//!
//! let registry = Registry::with_defaults().unwrap();
//! let ruleset = registry.resolve(&[], &[]);
//!
//! let fields = ruleset.parse("NO. 561-566 (1932)").unwrap();
//! assert_eq!(fields.get("start_number"), Some("561"));
//!
//! let exploded = ruleset.explode(&fields);
//! assert_eq!(exploded.len(), 6);
//! assert!(exploded.contains_key("Year:1932, Number:561, Start number:561, End number:566"));
//! ```

#[macro_use]
mod macros;

pub mod corrections;
pub mod defaults;
pub mod definition;
mod error;
pub mod fields;
pub mod normalize;
pub mod pattern;
pub mod registry;
pub mod ruleset;

pub use corrections::{Correction, DEFAULT_CORRECTIONS};
pub use definition::SeriesDefinition;
pub use error::ConfigError;
pub use fields::ParsedFields;
pub use pattern::{CompiledPattern, PatternList, PatternMatch, TokenSet};
pub use registry::{Registry, RegistryBuilder};
pub use ruleset::{Exploded, MAX_RANGE_SPAN, RuleSet, SeriesRuleSet, SeriesRuleSetBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_then_canonicalize_is_deterministic() {
        let registry = Registry::with_defaults().unwrap();
        let ruleset = registry.resolve(&[], &[]);

        for input in ["V. 8:NO. 6 (1993:MAR. 19)", "NOS. 561-566 (1932)", "1998-99", "NOT AN EC STRING !!"] {
            let first = ruleset.parse(input).map(|f| ruleset.canonicalize(&f));
            let second = ruleset.parse(input).map(|f| ruleset.canonicalize(&f));
            assert_eq!(first, second, "{input:?}");
        }
    }

    #[test]
    fn every_exploded_entry_canonicalizes() {
        let registry = Registry::with_defaults().unwrap();
        let ruleset = registry.resolve(&[], &[]);

        for input in ["NO. 561-566", "V. 8:NO. 19-22 1993", "V. 2", "1961-1963"] {
            let Some(fields) = ruleset.parse(input) else { continue };
            for (canon, entry) in ruleset.explode(&fields) {
                let rendered = ruleset.canonicalize(&entry);
                assert_eq!(rendered.as_deref(), Some(canon.as_str()), "{input:?}");
            }
        }
    }
}
