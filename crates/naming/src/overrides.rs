use crate::SEPARATOR;
use crate::error::{ErrorKind, Result};
use crate::normalize::{fold, normalize};
use std::collections::HashMap;

/// Per-component folder renames, matched case-insensitively.
///
/// `Sent → SENT` renames every folder component called `sent` (in any case)
/// wherever it appears in the tree. Targets may contain `/` to nest a folder
/// under another label.
///
/// Construction rejects tables where a target component is itself a key
/// mapped to something else: `a → b, b → c` would send `a` to `b` on the
/// first pass and to `c` on the second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    map: HashMap<String, String>,
}

impl Overrides {
    pub fn new<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (key, target) in pairs {
            let folded = fold(key.as_ref());
            let target = normalize(target.as_ref());
            if folded.is_empty() || target.is_empty() {
                exn::bail!(ErrorKind::EmptyName(key.as_ref().to_string()));
            }
            if let Some(existing) = map.get(&folded)
                && existing != &target
            {
                exn::bail!(ErrorKind::ConflictingOverride { key: folded });
            }
            map.insert(folded, target);
        }

        for (key, target) in &map {
            for component in target.split(SEPARATOR) {
                if let Some(next) = map.get(&fold(component))
                    && next.as_str() != component
                {
                    exn::bail!(ErrorKind::ChainedOverride {
                        key: key.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
        Ok(Self { map })
    }

    /// The replacement for a folder component, if any.
    pub fn get(&self, component: &str) -> Option<&str> {
        self.map.get(&fold(component)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_lookup_ignores_case_and_spacing() {
        let overrides = Overrides::new([("Sent", "SENT"), (".", "INBOX")]).unwrap();
        assert_eq!(overrides.get("sent"), Some("SENT"));
        assert_eq!(overrides.get("SENT"), Some("SENT"));
        assert_eq!(overrides.get(" Sent "), Some("SENT"));
        assert_eq!(overrides.get("."), Some("INBOX"));
        assert_eq!(overrides.get("Visas"), None);
    }

    #[test]
    fn test_targets_are_normalized() {
        let overrides = Overrides::new([("visas", "  Visa    Emails ")]).unwrap();
        assert_eq!(overrides.get("Visas"), Some("Visa Emails"));
    }

    #[rstest]
    #[case(vec![("a", "b"), ("b", "c")])]
    #[case(vec![("old", "Archive/a"), ("a", "b")])]
    #[case(vec![("sent", "Inbox"), ("inbox", "INBOX")])]
    fn test_chained_overrides_are_rejected(#[case] pairs: Vec<(&str, &str)>) {
        let err = Overrides::new(pairs).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ChainedOverride { .. }));
    }

    #[test]
    fn test_self_mapping_target_is_allowed() {
        // `sent → SENT` targets a key that maps to exactly itself.
        assert!(Overrides::new([("Sent", "SENT"), ("Outbox", "SENT")]).is_ok());
    }

    #[test]
    fn test_conflicting_keys() {
        let err = Overrides::new([("Sent", "SENT"), ("sent", "Outbox")]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ConflictingOverride { key } if key == "sent"));
    }

    #[test]
    fn test_empty_target() {
        let err = Overrides::new([("Sent", "  ")]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::EmptyName(_)));
    }
}
