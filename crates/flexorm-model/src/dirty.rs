use std::collections::BTreeSet;

/// Names of attributes written since a record was constructed or last
/// persisted.
///
/// Marking the same name twice is harmless; the set collapses duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirtySet {
    names: BTreeSet<String>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as written. Returns `true` if it was not already marked.
    pub fn mark(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns `true` if `name` was marked.
    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(name)
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<'a> IntoIterator for &'a DirtySet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_collapse() {
        let mut dirty = DirtySet::new();
        assert!(dirty.mark("venue"));
        assert!(!dirty.mark("venue"));
        assert!(dirty.mark("category"));
        assert_eq!(dirty.len(), 2);
        assert_eq!(dirty.iter().collect::<Vec<_>>(), vec!["category", "venue"]);
    }

    #[test]
    fn clear_empties_the_set() {
        let mut dirty = DirtySet::new();
        dirty.mark("venue");
        dirty.mark("category");
        assert!(dirty.remove("category"));
        assert!(!dirty.remove("category"));
        assert!(dirty.contains("venue"));
        dirty.clear();
        assert!(dirty.is_empty());
        assert!(!dirty.contains("venue"));
    }
}
