use serde::{Deserialize, Serialize};
use std::fmt;

/// A label as known to the remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Confirmation of a stored item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    /// Identifier the remote assigned, when it reports one.
    pub id: Option<String>,
}

/// Descriptive details sent alongside an item's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Where the item came from, relative to the spool root.
    pub source: String,
}

/// A bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("access_token", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_are_redacted() {
        let creds = Credentials::new("ya29.a0AfH6SM");
        assert!(!format!("{creds:?}").contains("ya29"));
    }

    #[test]
    fn test_label_from_remote_json() {
        let label: Label =
            serde_json::from_str(r#"{"id":"Label_12","name":"Visa Emails","type":"user","labelListVisibility":"labelShow"}"#)
                .unwrap();
        assert_eq!(label, Label::new("Label_12", "Visa Emails"));
    }
}
