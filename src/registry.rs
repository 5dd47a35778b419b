//! Rule-set registry: identifier indexing, resolution and dispatch.
//!
//! The registry is built once at startup from explicitly registered rule
//! sets, then read forever:
//!
//! ```text
//! RegistryBuilder::register ──> index by OCN / sudoc stem / title
//!                               (identifier-less set becomes the default)
//!         build()
//!            │  exactly one default required
//!            v
//! Registry::resolve(ocns, sudocs) ──> first matching title, else default
//!            │
//!            v
//! parse / explode / canonicalize     thin dispatch to the resolved set
//! ```
//!
//! Resolution order is deterministic: the record's OCNs in the order given,
//! then its sudocs prefix-matched against registered stems in lexicographic
//! stem order. After build the registry is immutable, so concurrent readers
//! need no locking.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::defaults;
use crate::error::ConfigError;
use crate::fields::ParsedFields;
use crate::ruleset::{Exploded, RuleSet};

/// Immutable collection of rule sets indexed by identifier.
pub struct Registry {
    sets: Vec<Box<dyn RuleSet>>,
    by_title: HashMap<String, usize>,
    by_ocn: HashMap<u64, Vec<usize>>,
    by_sudoc: BTreeMap<String, Vec<usize>>,
    default_idx: usize,
}

/// Accumulates rule sets before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    sets: Vec<Box<dyn RuleSet>>,
    by_title: HashMap<String, usize>,
    by_ocn: HashMap<u64, Vec<usize>>,
    by_sudoc: BTreeMap<String, Vec<usize>>,
    default_idx: Option<usize>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        RegistryBuilder::default()
    }

    /// Register a rule set, indexing it by every identifier it declares.
    ///
    /// A set declaring no OCNs and no sudoc stems becomes the DefaultRuleSet;
    /// registering a second one, or reusing a title, is a configuration
    /// error.
    pub fn register(&mut self, set: Box<dyn RuleSet>) -> Result<(), ConfigError> {
        let title = set.title().to_string();
        if self.by_title.contains_key(&title) {
            return Err(ConfigError::DuplicateTitle(title));
        }

        let idx = self.sets.len();
        if set.ocns().is_empty() && set.sudoc_stems().is_empty() {
            if let Some(existing) = self.default_idx {
                return Err(ConfigError::MultipleDefaults {
                    first: self.sets[existing].title().to_string(),
                    second: title,
                });
            }
            self.default_idx = Some(idx);
        }

        for ocn in set.ocns() {
            self.by_ocn.entry(*ocn).or_default().push(idx);
        }
        for stem in set.sudoc_stems() {
            self.by_sudoc.entry(stem.clone()).or_default().push(idx);
        }
        self.by_title.insert(title, idx);
        self.sets.push(set);
        Ok(())
    }

    /// Freeze the registry; fails without a default rule set.
    pub fn build(self) -> Result<Registry, ConfigError> {
        let default_idx = self.default_idx.ok_or(ConfigError::MissingDefault)?;
        Ok(Registry {
            sets: self.sets,
            by_title: self.by_title,
            by_ocn: self.by_ocn,
            by_sudoc: self.by_sudoc,
            default_idx,
        })
    }
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from the built-in factory list.
    ///
    /// This is the explicit initialization entry point; calling it again
    /// simply builds another independent registry.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        let mut builder = Registry::builder();
        for factory in defaults::builtin_rule_sets() {
            builder.register(factory()?)?;
        }
        builder.build()
    }

    /// The identifier-less fallback rule set.
    pub fn default_rule_set(&self) -> &dyn RuleSet {
        self.sets[self.default_idx].as_ref()
    }

    /// Look up a rule set by its title.
    pub fn by_title(&self, title: &str) -> Option<&dyn RuleSet> {
        self.by_title.get(title).map(|&idx| self.sets[idx].as_ref())
    }

    /// Iterate registered titles in registration order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|s| s.title())
    }

    /// Resolve the rule set for a record's identifiers.
    ///
    /// Exact match for OCNs, prefix match for sudocs against registered
    /// stems; the first matching title (after de-duplication) wins, and a
    /// record matching nothing gets the default rule set.
    pub fn resolve(&self, ocns: &[u64], sudocs: &[&str]) -> &dyn RuleSet {
        let mut matched: Vec<usize> = Vec::new();
        for ocn in ocns {
            if let Some(indexes) = self.by_ocn.get(ocn) {
                matched.extend(indexes);
            }
        }
        for sudoc in sudocs {
            for (stem, indexes) in &self.by_sudoc {
                if sudoc.starts_with(stem.as_str()) {
                    matched.extend(indexes);
                }
            }
        }
        let mut seen = Vec::new();
        matched.retain(|idx| {
            if seen.contains(idx) {
                false
            } else {
                seen.push(*idx);
                true
            }
        });

        match matched.first() {
            Some(&idx) => {
                let set = self.sets[idx].as_ref();
                debug!(title = %set.title(), "resolved rule set");
                set
            }
            None => self.default_rule_set(),
        }
    }

    /// Parse with the rule set resolved for these identifiers.
    pub fn parse(&self, ocns: &[u64], sudocs: &[&str], raw: &str) -> Option<ParsedFields> {
        self.resolve(ocns, sudocs).parse(raw)
    }

    /// Explode with the rule set resolved for these identifiers.
    pub fn explode(&self, ocns: &[u64], sudocs: &[&str], fields: &ParsedFields) -> Exploded {
        self.resolve(ocns, sudocs).explode(fields)
    }

    /// Canonicalize with the rule set resolved for these identifiers.
    pub fn canonicalize(&self, ocns: &[u64], sudocs: &[&str], fields: &ParsedFields) -> Option<String> {
        self.resolve(ocns, sudocs).canonicalize(fields)
    }
}
