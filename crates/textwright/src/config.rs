//! Project configuration (`textwright.yaml`).

use crate::result::TextwrightResult;
use crate::runner::RunOptions;
use crate::schema::SchemaError;
use crate::variables::VariableStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File names searched by [`ProjectConfig::discover`], in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["textwright.yaml", "textwright.yml"];

/// Settings shared by every test file in a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Values available to steps as `{{globalEnv.NAME}}`; nulls are skipped
    #[serde(default)]
    pub global_variables: BTreeMap<String, Option<String>>,
    /// Auto-wait timeout for targets and assertions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Timeout for `waitForURL` steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_timeout_ms: Option<u64>,
    /// Stop at the first failing case
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,
}

impl ProjectConfig {
    /// Parse a config file's contents
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        // An empty file is an empty config.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml).map_err(|e| SchemaError::ConfigError(e.to_string()))
    }

    /// Read a config file
    pub fn load(path: impl AsRef<Path>) -> TextwrightResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&yaml)?)
    }

    /// Path of the config file in `dir`, if there is one
    #[must_use]
    pub fn find(dir: impl AsRef<Path>) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.as_ref().join(name))
            .find(|path| path.is_file())
    }

    /// Load the config file in `dir`, or the default config when none exists
    pub fn discover(dir: impl AsRef<Path>) -> TextwrightResult<Self> {
        match Self::find(dir) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Overlay the configured values onto runner options
    #[must_use]
    pub fn apply(&self, mut options: RunOptions) -> RunOptions {
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.navigation_timeout_ms {
            options = options.with_navigation_timeout(Duration::from_millis(ms));
        }
        if let Some(fail_fast) = self.fail_fast {
            options = options.with_fail_fast(fail_fast);
        }
        options
    }

    /// A variable store seeded with the global variables
    #[must_use]
    pub fn variables(&self) -> VariableStore {
        VariableStore::with_globals(&self.global_variables)
    }
}
