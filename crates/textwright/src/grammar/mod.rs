//! Sentence grammar: segmentation, tagging and command extraction.
//!
//! ```text
//! "Click \"A\" link, fill \"B\" input with \"x\""
//!      │ split_clauses
//!      ▼
//! ["Click \"A\" link.", "fill \"B\" input with \"x\"."]
//!      │ Tagger::tag + Tagger::split_clauses
//!      ▼
//! [[Term, ...], [Term, ...]]
//!      │ extract
//!      ▼
//! [Command, Command]
//! ```

pub mod alias;
pub mod command;
pub mod extract;
pub mod segment;
pub mod tagger;

pub use command::{Action, AssertBehavior, Command, ValueBehavior};
pub use extract::extract;
pub use segment::split_clauses;
pub use tagger::{RuleTagger, Tagger, Term, TermRole, TermTags};

use thiserror::Error;

/// Why a clause could not become a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown action \"{action}\" in \"{clause}\"")]
    UnknownAction { action: String, clause: String },

    #[error("Expected an action, a quoted name and an element type in \"{clause}\" (found {found} of 3)")]
    MissingSegments { found: usize, clause: String },

    #[error("Unexpected \"{segment}\" in \"{clause}\"")]
    ExtraSegment { segment: String, clause: String },

    #[error("Unknown element type \"{role}\" in \"{clause}\"")]
    UnknownRole { role: String, clause: String },

    #[error("Unknown assertion \"{word}\" in \"{clause}\"")]
    UnknownAssertion { word: String, clause: String },

    #[error("{action} needs a {field} in \"{clause}\"")]
    MissingField {
        field: &'static str,
        action: Action,
        clause: String,
    },

    #[error("Both a value and a variable (or an operand the action does not take) in \"{clause}\"")]
    ConflictingOperands { clause: String },

    #[error("\"{keyword}\" does not apply to {action} in \"{clause}\"")]
    UnexpectedConnector {
        keyword: String,
        action: Action,
        clause: String,
    },

    #[error("Negation only applies to ensure, not {action}, in \"{clause}\"")]
    NegationOutsideEnsure { action: Action, clause: String },

    #[error("Invalid regex \"{pattern}\" in \"{clause}\": {message}")]
    InvalidRegex {
        pattern: String,
        message: String,
        clause: String,
    },

    #[error("Unterminated quote in \"{clause}\"")]
    UnterminatedQuote { clause: String },

    #[error("Empty target name in \"{clause}\"")]
    EmptyObject { clause: String },
}

impl ValidationError {
    /// The clause the error was raised for
    #[must_use]
    pub fn clause(&self) -> &str {
        match self {
            Self::UnknownAction { clause, .. }
            | Self::MissingSegments { clause, .. }
            | Self::ExtraSegment { clause, .. }
            | Self::UnknownRole { clause, .. }
            | Self::UnknownAssertion { clause, .. }
            | Self::MissingField { clause, .. }
            | Self::ConflictingOperands { clause }
            | Self::UnexpectedConnector { clause, .. }
            | Self::NegationOutsideEnsure { clause, .. }
            | Self::InvalidRegex { clause, .. }
            | Self::UnterminatedQuote { clause }
            | Self::EmptyObject { clause } => clause,
        }
    }
}

/// Extract every command in a step sentence with a specific tagger.
///
/// Fails on the first clause that does not validate; no partial result is
/// returned.
pub fn parse_with(sentence: &str, tagger: &dyn Tagger) -> Result<Vec<Command>, ValidationError> {
    let mut commands = Vec::new();
    for clause in split_clauses(sentence) {
        for terms in tagger.split_clauses(tagger.tag(&clause)) {
            commands.push(extract(&terms)?);
        }
    }
    Ok(commands)
}

/// Extract every command in a step sentence with the built-in tagger.
pub fn parse(sentence: &str) -> Result<Vec<Command>, ValidationError> {
    parse_with(sentence, &RuleTagger::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_clauses() {
        let commands = parse("Click \"Teams\" link, hover \"Menu\" button").unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].action, Action::Click);
        assert_eq!(commands[1].action, Action::Hover);
    }

    #[test]
    fn test_parse_conjunction_fallback() {
        let commands = parse("Click \"A\" link then click \"B\" button.").unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].object, "B");
    }

    #[test]
    fn test_quoted_comma_not_split() {
        let commands =
            parse("Ensure \"Address\" element to have value \"1 Main St., Springfield\".").unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].value.as_deref(), Some("1 Main St., Springfield"));
    }

    #[test]
    fn test_error_reports_clause() {
        let err = parse("Click \"A\" link. Press \"B\" button.").unwrap_err();
        assert!(err.clause().contains("Press"));
    }

    #[test]
    fn test_rendered_command_reparses() {
        let original = parse("Store the value of \"Name\" input into variable {x}.").unwrap();
        let rendered = original[0].to_string();
        assert_eq!(parse(&rendered).unwrap(), original);
    }
}
