use serde::{Deserialize, Serialize};

/// One chosen entry of a selector.
///
/// `value` is the identity key: a selector never holds two records with the
/// same value. `valid == false` marks an entry the host kept although no
/// picker vouches for it (typically restored from a persisted value string);
/// such records are never forwarded to a picker and are left out of the
/// serialized value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRecord {
    pub title: String,
    pub value: String,
    pub valid: bool,
}

impl SelectionRecord {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            valid: true,
        }
    }

    pub fn invalid(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            valid: false,
            ..Self::new(title, value)
        }
    }

    /// Record whose title is its value.
    pub fn titled_as_value(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(value.clone(), value)
    }

    pub fn with_validity(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }
}
