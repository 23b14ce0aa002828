//! The structured command a sentence is extracted into.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a command does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Click the target
    Click,
    /// Move the pointer over the target
    Hover,
    /// Replace the target's value with text
    Fill,
    /// Assert something about the target
    Ensure,
    /// Capture the target's value into a variable
    Store,
    /// Drag a slider to a numeric value
    Slide,
}

impl Action {
    /// All actions, in the order they are documented
    pub const ALL: [Self; 6] = [
        Self::Click,
        Self::Hover,
        Self::Fill,
        Self::Ensure,
        Self::Store,
        Self::Slide,
    ];

    /// Parse a lower-cased action word
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == word)
    }

    /// The action word
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Hover => "hover",
            Self::Fill => "fill",
            Self::Ensure => "ensure",
            Self::Store => "store",
            Self::Slide => "slide",
        }
    }

    /// Whether the command carries `value` or `variableName`
    #[must_use]
    pub const fn needs_operand(self) -> bool {
        matches!(self, Self::Fill | Self::Store | Self::Slide)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an `ensure` compares actual and expected values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertBehavior {
    /// Whole-value equality
    Exact,
    /// Substring containment
    Contain,
    /// Regular expression match on visible text
    Match,
    /// Visibility only
    Exist,
}

impl AssertBehavior {
    /// Canonical name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Contain => "contain",
            Self::Match => "match",
            Self::Exist => "exist",
        }
    }
}

/// Which readable property of the target is compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueBehavior {
    /// Value or visible text
    #[default]
    Plain,
    /// Accessible description
    Accessible,
    /// Text of the element referenced as the target's error message
    Error,
}

/// A validated instruction extracted from one clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// What to do
    pub action: Action,
    /// Display name of the target
    pub object: String,
    /// Canonical ARIA role of the target
    pub element_type: String,
    /// Scope qualifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
    /// Specifier was written as a quoted section title
    #[serde(default)]
    pub is_section: bool,
    /// Negation marker before the assertion
    #[serde(default)]
    pub is_negative_assertion: bool,
    /// Comparison kind, `ensure` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert_behavior: Option<AssertBehavior>,
    /// Compared property, `ensure` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_behavior: Option<ValueBehavior>,
    /// Variable written by `store` or read by `ensure`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// Literal text, regex source or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Command {
    /// Create a command with only the positional fields set
    pub fn new(action: Action, object: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            action,
            object: object.into(),
            element_type: element_type.into(),
            specifier: None,
            is_section: false,
            is_negative_assertion: false,
            assert_behavior: None,
            value_behavior: None,
            variable_name: None,
            value: None,
        }
    }

    /// Scope the command to a container
    #[must_use]
    pub fn with_specifier(mut self, specifier: impl Into<String>) -> Self {
        self.specifier = Some(specifier.into());
        self
    }

    /// Scope the command to a titled section
    #[must_use]
    pub fn with_section(mut self, title: impl Into<String>) -> Self {
        self.specifier = Some(title.into());
        self.is_section = true;
        self
    }

    /// Set the literal value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the variable name
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }

    /// Set the assertion kind
    #[must_use]
    pub fn with_assertion(mut self, behavior: AssertBehavior) -> Self {
        self.assert_behavior = Some(behavior);
        self.value_behavior.get_or_insert(ValueBehavior::Plain);
        self
    }

    /// Set the compared property
    #[must_use]
    pub fn with_value_behavior(mut self, behavior: ValueBehavior) -> Self {
        self.value_behavior = Some(behavior);
        self
    }

    /// Negate the assertion
    #[must_use]
    pub fn negated(mut self) -> Self {
        self.is_negative_assertion = true;
        self
    }

    /// Check the cross-field invariants.
    ///
    /// `clause` is only used to label the error.
    pub fn validate(&self, clause: &str) -> Result<(), ValidationError> {
        let missing = |field: &'static str| ValidationError::MissingField {
            field,
            action: self.action,
            clause: clause.to_string(),
        };
        let conflicting = || ValidationError::ConflictingOperands {
            clause: clause.to_string(),
        };

        if self.object.trim().is_empty() {
            return Err(ValidationError::EmptyObject {
                clause: clause.to_string(),
            });
        }
        if self.is_negative_assertion && self.action != Action::Ensure {
            return Err(ValidationError::NegationOutsideEnsure {
                action: self.action,
                clause: clause.to_string(),
            });
        }

        match self.action {
            Action::Click | Action::Hover => {
                if self.value.is_some() || self.variable_name.is_some() {
                    return Err(conflicting());
                }
            }
            Action::Fill | Action::Slide => {
                if self.variable_name.is_some() {
                    return Err(conflicting());
                }
                if self.value.is_none() {
                    return Err(missing("value"));
                }
            }
            Action::Store => {
                if self.value.is_some() {
                    return Err(conflicting());
                }
                if self.variable_name.is_none() {
                    return Err(missing("variableName"));
                }
            }
            Action::Ensure => match self.assert_behavior {
                None => return Err(missing("assertBehavior")),
                Some(AssertBehavior::Exist) => {
                    if self.value.is_some() || self.variable_name.is_some() {
                        return Err(conflicting());
                    }
                }
                Some(_) => match (&self.value, &self.variable_name) {
                    (Some(_), Some(_)) => return Err(conflicting()),
                    (None, None) => return Err(missing("value")),
                    _ => {}
                },
            },
        }

        if self.action != Action::Ensure && self.assert_behavior.is_some() {
            return Err(ValidationError::UnexpectedConnector {
                keyword: "to".to_string(),
                action: self.action,
                clause: clause.to_string(),
            });
        }
        Ok(())
    }
}

/// Renders the canonical sentence for the command.
///
/// Extracting the rendered sentence yields an equal command.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut action = self.action.as_str().to_string();
        if let Some(first) = action.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        write!(f, "{action} \"{}\" {}", escape(&self.object), self.element_type)?;

        if let Some(specifier) = &self.specifier {
            if self.is_section {
                write!(f, " on the \"{}\" section", escape(specifier))?;
            } else {
                write!(f, " on the {specifier}")?;
            }
        }

        match self.action {
            Action::Click | Action::Hover => {}
            Action::Fill => {
                if let Some(value) = &self.value {
                    write!(f, " with value \"{}\"", escape(value))?;
                }
            }
            Action::Slide => {
                if let Some(value) = &self.value {
                    write!(f, " to value \"{}\"", escape(value))?;
                }
            }
            Action::Store => {
                if let Some(name) = &self.variable_name {
                    write!(f, " into variable {{{name}}}")?;
                }
            }
            Action::Ensure => {
                let behavior = self.assert_behavior.unwrap_or(AssertBehavior::Exist);
                f.write_str(" to")?;
                if self.is_negative_assertion {
                    f.write_str(" not")?;
                }
                let verb = match behavior {
                    AssertBehavior::Exact => "have",
                    AssertBehavior::Contain => "contain",
                    AssertBehavior::Match => "match",
                    AssertBehavior::Exist => "exist",
                };
                write!(f, " {verb}")?;
                if behavior == AssertBehavior::Exist {
                    return f.write_str(".");
                }

                let descriptor = match (self.value_behavior.unwrap_or_default(), behavior) {
                    (ValueBehavior::Accessible, _) => "accessible description",
                    (ValueBehavior::Error, _) => "error message",
                    (ValueBehavior::Plain, AssertBehavior::Match) => "pattern",
                    (ValueBehavior::Plain, AssertBehavior::Contain) => "text",
                    (ValueBehavior::Plain, _) => "value",
                };
                write!(f, " {descriptor}")?;

                if let Some(name) = &self.variable_name {
                    write!(f, " {{{name}}}")?;
                } else if let Some(value) = &self.value {
                    if behavior == AssertBehavior::Match {
                        write!(f, " \"/{}/\"", escape(value))?;
                    } else {
                        write!(f, " \"{}\"", escape(value))?;
                    }
                }
            }
        }
        f.write_str(".")
    }
}

fn escape(text: &str) -> String {
    text.replace('"', "\\\"")
}
