//! Test file schema.
//!
//! ```yaml
//! selector: label            # label | data-qa-id | id
//! sliderSelector: native     # native | shadcn
//! tests:
//!   - name: "Create a team"
//!     steps:
//!       - Click "Teams" link.
//!       - command: Click "new-team" button.
//!         selector: data-qa-id
//!       - waitForURL: "**/teams/*"
//!         pageTitle: "/Team/"
//! ```

use crate::grammar::{self, Command, Tagger};
use crate::result::TextwrightResult;
use crate::selector::{SelectorMode, SliderKind};
use crate::wait::MatchPattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// A complete test file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestFile {
    /// File-wide selector mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorMode>,
    /// File-wide slider markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_selector: Option<SliderKind>,
    /// Cases, run in order
    pub tests: Vec<TestCase>,
}

/// One named case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TestCase {
    /// Case name, unique within the file
    pub name: String,
    /// Steps, run in order
    pub steps: Vec<Step>,
    /// Per-case selector mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorMode>,
    /// Per-case slider markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_selector: Option<SliderKind>,
}

/// One step: a sentence, a sentence with overrides, or a navigation wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Bare sentence
    Sentence(String),
    /// Sentence with selector overrides
    Command(CommandStep),
    /// Wait for the page URL (and optionally title)
    Navigation(NavigationStep),
}

/// A sentence with per-step overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandStep {
    /// The sentence
    pub command: String,
    /// Per-step selector mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<SelectorMode>,
    /// Per-step slider markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slider_selector: Option<SliderKind>,
}

/// A navigation wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavigationStep {
    /// URL pattern: literal, glob or `/regex/`
    #[serde(rename = "waitForURL")]
    pub wait_for_url: String,
    /// Title pattern checked once the URL matches
    #[serde(rename = "pageTitle", default, skip_serializing_if = "Option::is_none")]
    pub page_title: Option<String>,
}

impl Step {
    /// Sentence text, or `None` for navigation steps
    #[must_use]
    pub fn sentence(&self) -> Option<&str> {
        match self {
            Self::Sentence(text) => Some(text),
            Self::Command(step) => Some(&step.command),
            Self::Navigation(_) => None,
        }
    }

    /// Extract the commands of a sentence step; navigation steps have none
    pub fn commands(&self, tagger: &dyn Tagger) -> Result<Vec<Command>, grammar::ValidationError> {
        match self.sentence() {
            Some(text) => grammar::parse_with(text, tagger),
            None => Ok(Vec::new()),
        }
    }

    fn selector(&self) -> Option<SelectorMode> {
        match self {
            Self::Command(step) => step.selector,
            _ => None,
        }
    }

    fn slider_selector(&self) -> Option<SliderKind> {
        match self {
            Self::Command(step) => step.slider_selector,
            _ => None,
        }
    }

    /// Short human-readable form for reports
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Sentence(text) => text.clone(),
            Self::Command(step) => step.command.clone(),
            Self::Navigation(nav) => match &nav.page_title {
                Some(title) => format!("Wait for URL {} with title {}", nav.wait_for_url, title),
                None => format!("Wait for URL {}", nav.wait_for_url),
            },
        }
    }
}

impl TestFile {
    /// Parse and validate a test file from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let file: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| SchemaError::ParseError(e.to_string()))?;
        file.validate()?;
        Ok(file)
    }

    /// Read, parse and validate a test file from disk
    pub fn load(path: impl AsRef<Path>) -> TextwrightResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&yaml)?)
    }

    /// Check the structure the YAML grammar cannot express.
    ///
    /// Sentences are not extracted here; a step whose sentence does not
    /// parse fails when it runs (or under `check`).
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.tests.is_empty() {
            return Err(SchemaError::EmptyTests);
        }

        let mut names = HashSet::new();
        for (index, case) in self.tests.iter().enumerate() {
            if case.name.trim().is_empty() {
                return Err(SchemaError::EmptyName { index });
            }
            if !names.insert(case.name.as_str()) {
                return Err(SchemaError::DuplicateName(case.name.clone()));
            }
            if case.steps.is_empty() {
                return Err(SchemaError::EmptySteps {
                    case: case.name.clone(),
                });
            }
            for (step, item) in case.steps.iter().enumerate() {
                match item {
                    Step::Navigation(nav) => {
                        let patterns = std::iter::once(&nav.wait_for_url).chain(nav.page_title.as_ref());
                        for pattern in patterns {
                            MatchPattern::parse(pattern).map_err(|e| SchemaError::InvalidPattern {
                                case: case.name.clone(),
                                step,
                                message: e.to_string(),
                            })?;
                        }
                    }
                    other => {
                        if other.sentence().is_some_and(|s| s.trim().is_empty()) {
                            return Err(SchemaError::EmptyStep {
                                case: case.name.clone(),
                                step,
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Selector mode for a step: step, then case, then file, then `label`
    #[must_use]
    pub fn selector_for(&self, case: &TestCase, step: &Step) -> SelectorMode {
        step.selector()
            .or(case.selector)
            .or(self.selector)
            .unwrap_or_default()
    }

    /// Slider markup for a step: step, then case, then file, then `native`
    #[must_use]
    pub fn slider_for(&self, case: &TestCase, step: &Step) -> SliderKind {
        step.slider_selector()
            .or(case.slider_selector)
            .or(self.slider_selector)
            .unwrap_or_default()
    }
}

/// Test file errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Failed to parse YAML: {0}")]
    ParseError(String),

    #[error("Tests cannot be empty")]
    EmptyTests,

    #[error("Test #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("Duplicate test name '{0}'")]
    DuplicateName(String),

    #[error("Test '{case}' has no steps")]
    EmptySteps { case: String },

    #[error("Test '{case}' step {step} is empty")]
    EmptyStep { case: String, step: usize },

    #[error("Test '{case}' step {step}: {message}")]
    InvalidPattern {
        case: String,
        step: usize,
        message: String,
    },

    #[error("Failed to parse config: {0}")]
    ConfigError(String),
}
