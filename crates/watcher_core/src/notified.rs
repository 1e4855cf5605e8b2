use std::collections::BTreeSet;

/// The set of listing identifiers already delivered for one search term.
///
/// Grows monotonically during normal operation; identifiers are only removed
/// when the retry-next-cycle notification policy withdraws a failed delivery
/// before it is persisted. Ordered so that serialized documents are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifiedSet {
    ids: BTreeSet<String>,
}

impl NotifiedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ids.contains(identifier)
    }

    /// Inserts an identifier, returning `true` if it was not present before.
    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        self.ids.insert(identifier.into())
    }

    pub fn remove(&mut self, identifier: &str) -> bool {
        self.ids.remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_superset(&self, other: &NotifiedSet) -> bool {
        self.ids.is_superset(&other.ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

impl FromIterator<String> for NotifiedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<String> for NotifiedSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}
