use crate::normalize::fold;
use std::collections::HashMap;
use std::sync::Arc;

/// Label name to remote identifier, case-insensitive.
///
/// Built once while labels are resolved, then frozen into an `Arc` and
/// shared read-only for the rest of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    ids: HashMap<String, String>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a label. The first identifier seen for a name wins; returns
    /// `false` when the name was already present.
    pub fn insert(&mut self, name: &str, id: impl Into<String>) -> bool {
        let key = fold(name);
        if self.ids.contains_key(&key) {
            return false;
        }
        self.ids.insert(key, id.into());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(&fold(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(&fold(name))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn freeze(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl<N: AsRef<str>, I: Into<String>> FromIterator<(N, I)> for LabelTable {
    fn from_iter<T: IntoIterator<Item = (N, I)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (name, id) in iter {
            table.insert(name.as_ref(), id);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let table: LabelTable = [("INBOX", "INBOX"), ("Visa Emails", "Label_7")].into_iter().collect();
        assert_eq!(table.get("inbox"), Some("INBOX"));
        assert_eq!(table.get("visa emails"), Some("Label_7"));
        assert_eq!(table.get("VISA  EMAILS"), Some("Label_7"));
        assert!(!table.contains("Sent"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_first_insert_wins() {
        let mut table = LabelTable::new();
        assert!(table.insert("Archive", "Label_1"));
        assert!(!table.insert("archive", "Label_2"));
        assert_eq!(table.freeze().get("ARCHIVE"), Some("Label_1"));
    }
}
