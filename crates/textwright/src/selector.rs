//! Selector resolution: from a command's `(role, object, specifier)` to a
//! concrete element.

use crate::backend::{TargetRef, UiBackend};
use crate::grammar::alias::REGIONS;
use crate::grammar::Command;
use crate::result::{TextwrightError, TextwrightResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a command's object name is matched against the page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorMode {
    /// Accessible role and name, or label for generic elements
    #[default]
    #[serde(rename = "label")]
    Label,
    /// `data-qa-id` attribute equality
    #[serde(rename = "data-qa-id")]
    DataQaId,
    /// `id` attribute equality
    #[serde(rename = "id")]
    Id,
}

impl SelectorMode {
    /// Attribute compared for attribute-based modes
    #[must_use]
    pub const fn attribute(self) -> Option<&'static str> {
        match self {
            Self::Label => None,
            Self::DataQaId => Some("data-qa-id"),
            Self::Id => Some("id"),
        }
    }
}

impl fmt::Display for SelectorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute().unwrap_or("label"))
    }
}

/// Which slider markup a `slide` command drives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliderKind {
    /// `<input type="range">` with `value`/`min`/`max`
    #[default]
    Native,
    /// shadcn/Radix slider with an ARIA thumb
    Shadcn,
}

impl SliderKind {
    /// Selector of the element that reports the value, relative to the control
    #[must_use]
    pub const fn thumb_css(self) -> Option<&'static str> {
        match self {
            Self::Native => None,
            Self::Shadcn => Some("span[data-slot=slider-thumb]"),
        }
    }

    /// Attribute holding the current value
    #[must_use]
    pub const fn value_attribute(self) -> &'static str {
        match self {
            Self::Native => "value",
            Self::Shadcn => "aria-valuenow",
        }
    }

    /// Attribute holding the lower bound
    #[must_use]
    pub const fn min_attribute(self) -> &'static str {
        match self {
            Self::Native => "min",
            Self::Shadcn => "aria-valuemin",
        }
    }

    /// Attribute holding the upper bound
    #[must_use]
    pub const fn max_attribute(self) -> &'static str {
        match self {
            Self::Native => "max",
            Self::Shadcn => "aria-valuemax",
        }
    }
}

/// Container a scoped lookup is nested in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// `<section>` titled by a heading
    Section {
        /// Heading text
        title: String,
    },
    /// Landmark element (`nav`, `main`, ...)
    Region {
        /// Element tag
        tag: String,
    },
    /// Element associated with a label
    Labelled {
        /// Label text
        label: String,
    },
}

/// A planned lookup, independent of any backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetQuery {
    /// Attribute equality; scope is ignored
    Attribute {
        /// Attribute name
        attribute: &'static str,
        /// Expected value
        value: String,
    },
    /// Role and accessible name
    Role {
        /// Canonical role
        role: String,
        /// Accessible name
        name: String,
        /// Optional container
        scope: Option<Scope>,
    },
    /// Associated label, used for generic elements
    Label {
        /// Label text
        name: String,
        /// Optional container
        scope: Option<Scope>,
    },
}

impl TargetQuery {
    /// Plan the lookup for a command under a selector mode
    #[must_use]
    pub fn plan(mode: SelectorMode, command: &Command) -> Self {
        if let Some(attribute) = mode.attribute() {
            return Self::Attribute {
                attribute,
                value: command.object.clone(),
            };
        }

        let scope = command
            .specifier
            .as_deref()
            .map(|specifier| scope_for(specifier, command.is_section));
        if command.element_type == "generic" {
            Self::Label {
                name: command.object.clone(),
                scope,
            }
        } else {
            Self::Role {
                role: command.element_type.clone(),
                name: command.object.clone(),
                scope,
            }
        }
    }

    fn not_found(&self) -> TextwrightError {
        let (role, name, scope) = match self {
            Self::Attribute { attribute, value } => (format!("[{attribute}]"), value.clone(), None),
            Self::Role { role, name, scope } => (role.clone(), name.clone(), scope.as_ref()),
            Self::Label { name, scope } => ("element labelled".to_string(), name.clone(), scope.as_ref()),
        };
        TextwrightError::TargetNotFound {
            role,
            name,
            specifier: scope.map(|s| match s {
                Scope::Section { title } => title.clone(),
                Scope::Region { tag } => tag.clone(),
                Scope::Labelled { label } => label.clone(),
            }),
        }
    }
}

fn scope_for(specifier: &str, is_section: bool) -> Scope {
    if is_section || specifier.to_lowercase().contains("section") {
        Scope::Section {
            title: specifier.to_string(),
        }
    } else if REGIONS.contains(&specifier) {
        Scope::Region {
            tag: specifier.to_string(),
        }
    } else {
        Scope::Labelled {
            label: specifier.to_string(),
        }
    }
}

/// Resolve a planned query to a visible element.
pub async fn resolve<B: UiBackend + ?Sized>(
    backend: &B,
    query: &TargetQuery,
) -> TextwrightResult<TargetRef> {
    let found = match query {
        TargetQuery::Attribute { attribute, value } => {
            backend.resolve_by_attribute(attribute, value).await?
        }
        TargetQuery::Role { role, name, scope } => match resolve_scope(backend, scope.as_ref()).await? {
            Some(container) => backend.resolve_by_role(role, name, container.as_ref()).await?,
            None => None,
        },
        TargetQuery::Label { name, scope } => match resolve_scope(backend, scope.as_ref()).await? {
            Some(container) => backend.resolve_by_label(name, container.as_ref()).await?,
            None => None,
        },
    };

    match found {
        Some(target) if backend.is_visible(&target).await? => Ok(target),
        _ => Err(query.not_found()),
    }
}

/// `Ok(None)` means the scope was requested but not found;
/// `Ok(Some(None))` means no scope.
async fn resolve_scope<B: UiBackend + ?Sized>(
    backend: &B,
    scope: Option<&Scope>,
) -> TextwrightResult<Option<Option<TargetRef>>> {
    let container = match scope {
        None => return Ok(Some(None)),
        Some(Scope::Section { title }) => backend.resolve_section(title).await?,
        Some(Scope::Region { tag }) => backend.resolve_by_css(tag, None).await?,
        Some(Scope::Labelled { label }) => backend.resolve_by_label(label, None).await?,
    };
    Ok(container.map(Some))
}
