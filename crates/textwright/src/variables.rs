//! Variables captured during a run.
//!
//! `store` writes, `ensure` reads. Project-wide values from the config file
//! are seeded under `globalEnv.<name>` and referenced from steps as
//! `{{globalEnv.<name>}}`.

use crate::result::{TextwrightError, TextwrightResult};
use std::collections::BTreeMap;

/// Key prefix for config-provided values
pub const GLOBAL_PREFIX: &str = "globalEnv.";

/// Name → captured string, scoped to one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with global variables; `None` values are skipped
    #[must_use]
    pub fn with_globals<'a>(globals: impl IntoIterator<Item = (&'a String, &'a Option<String>)>) -> Self {
        let mut store = Self::new();
        for (key, value) in globals {
            store.set_global(key, value.as_deref());
        }
        store
    }

    /// Seed one global variable
    pub fn set_global(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.values
                .insert(format!("{GLOBAL_PREFIX}{key}"), value.to_string());
        }
    }

    /// Record a captured value, replacing any previous one
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a value
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Look up a value that must exist
    pub fn lookup(&self, name: &str) -> TextwrightResult<&str> {
        self.get(name).ok_or_else(|| TextwrightError::UnknownVariable {
            name: name.to_string(),
        })
    }

    /// Substitute a `{{globalEnv.NAME}}` literal; other text passes through
    pub fn substitute(&self, text: &str) -> TextwrightResult<String> {
        match global_key(text) {
            Some(key) => self.lookup(key).map(str::to_string),
            None => Ok(text.to_string()),
        }
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over stored values in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// `globalEnv.NAME` when `text` is exactly `{{globalEnv.NAME}}`
#[must_use]
pub fn global_key(text: &str) -> Option<&str> {
    let key = text.strip_prefix("{{")?.strip_suffix("}}")?;
    let name = key.strip_prefix(GLOBAL_PREFIX)?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    valid.then_some(key)
}
