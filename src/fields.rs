//! Ordered field map produced by a successful parse.
//!
//! `ParsedFields` is the unit of exchange between `parse`, `explode` and
//! `canonicalize`. Field names are semantic (`year`, `volume`, `start_number`,
//! ...) and insertion order is preserved: the first time a capture appears in
//! a pattern determines its position, which keeps downstream rendering and
//! test output stable.
//!
//! The map is intentionally tiny (a handful of entries per parse), so a flat
//! `Vec<(String, String)>` beats a hash map here and keeps iteration ordered
//! for free.

/// Insertion-ordered mapping from field name to string value.
///
/// A field name appears at most once; `set` on an existing name replaces the
/// value in place without changing its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    entries: Vec<(String, String)>,
}

impl ParsedFields {
    /// Create an empty field map.
    pub fn new() -> Self {
        ParsedFields { entries: Vec::new() }
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no fields are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a field value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// True if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a field, replacing an existing value in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(idx).1)
    }

    /// Iterate `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for ParsedFields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut fields = ParsedFields::new();
        for (n, v) in iter {
            fields.set(n, v);
        }
        fields
    }
}
