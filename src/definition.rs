//! Declarative rule-set definition records.
//!
//! A [`SeriesDefinition`] is the external, data-only description of a series
//! rule set: title, identifiers, token overrides, pattern templates and field
//! order. Definitions are plain serde records so a configuration layer can
//! ship them as JSON; this crate only validates and instantiates them, and
//! reading them from disk belongs to the caller.
//!
//! Everything is checked eagerly when a definition becomes a
//! [`SeriesRuleSet`]: unknown tokens, uncompilable patterns and missing
//! titles surface as [`ConfigError`] at load time, never during later parse
//! calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;
use crate::ruleset::SeriesRuleSet;

/// Data-only description of a declarative rule set.
///
/// `tokens` are merged over the shared defaults; `patterns` are appended
/// after the default list unless `replace_patterns` is set; an empty
/// `field_order` inherits the default canonical order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeriesDefinition {
    /// Unique series title.
    pub title: String,
    /// Numeric catalog identifiers claimed by this series.
    #[serde(default)]
    pub ocns: Vec<u64>,
    /// Classification-prefix strings claimed by this series.
    #[serde(default)]
    pub sudoc_stems: Vec<String>,
    /// Token fragments merged over the defaults.
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,
    /// Pattern templates, appended to (or replacing) the default list.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Replace the default pattern list instead of appending to it.
    #[serde(default)]
    pub replace_patterns: bool,
    /// Canonical field order; empty inherits the default order.
    #[serde(default)]
    pub field_order: Vec<String>,
    /// Noise-strip regexes applied before matching.
    #[serde(default)]
    pub strip: Vec<String>,
}

impl SeriesDefinition {
    /// Deserialize a definition from JSON, failing on malformed input.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate this definition and build the rule set it describes.
    pub fn build(&self) -> Result<SeriesRuleSet, ConfigError> {
        let mut builder = defaults::series_builder(&self.title)
            .ocns(self.ocns.iter().copied())
            .sudoc_stems(self.sudoc_stems.iter().cloned());
        for (name, fragment) in &self.tokens {
            builder = builder.token(name, fragment);
        }
        if self.replace_patterns {
            builder = builder.clear_patterns();
        }
        builder = builder.patterns(self.patterns.iter().cloned());
        if !self.field_order.is_empty() {
            builder = builder.field_order(self.field_order.iter().cloned());
        }
        for strip in &self.strip {
            builder = builder.strip(strip);
        }
        builder.build()
    }
}
