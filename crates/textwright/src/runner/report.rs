//! Run results.

use serde::Serialize;
use std::fmt;

/// Step status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Every command ran and every assertion held
    Passed,
    /// At least one assertion did not hold
    Failed,
    /// The step aborted with an error
    Error,
    /// The step never ran (cancelled or fail-fast)
    Skipped,
}

impl StepStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// An `ensure` (or page title check) that did not hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionFailure {
    /// Case name
    pub case: String,
    /// Zero-based step index within the case
    pub step_index: usize,
    /// Canonical rendering of the failing command
    pub command: String,
    /// What was expected
    pub expected: String,
    /// What the page showed
    pub actual: String,
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (step {}): {}\n  expected: {}\n  actual:   {}",
            self.case,
            self.step_index + 1,
            self.command,
            self.expected,
            self.actual
        )
    }
}

/// Result of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Zero-based index within the case
    pub index: usize,
    /// Step sentence or navigation description
    pub text: String,
    /// Commands extracted from the sentence
    pub commands: usize,
    /// Assertions that held
    pub assertions_passed: usize,
    /// Assertions that did not hold
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<AssertionFailure>,
    /// Error that aborted the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the step never ran
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl StepReport {
    pub(crate) fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            commands: 0,
            assertions_passed: 0,
            failures: Vec::new(),
            error: None,
            skipped: false,
            duration_ms: 0,
        }
    }

    pub(crate) fn skipped(index: usize, text: impl Into<String>) -> Self {
        Self {
            skipped: true,
            ..Self::new(index, text)
        }
    }

    /// Overall status
    #[must_use]
    pub fn status(&self) -> StepStatus {
        if self.skipped {
            StepStatus::Skipped
        } else if self.error.is_some() {
            StepStatus::Error
        } else if self.failures.is_empty() {
            StepStatus::Passed
        } else {
            StepStatus::Failed
        }
    }

    /// Whether the step passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status().is_passed()
    }
}

/// Result of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// Case name
    pub name: String,
    /// Step results, in order
    pub steps: Vec<StepReport>,
    /// Error raised by the reset hook after the case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_error: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl CaseReport {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            reset_error: None,
            duration_ms: 0,
        }
    }

    /// Whether every step passed and the reset succeeded
    #[must_use]
    pub fn passed(&self) -> bool {
        self.reset_error.is_none() && self.steps.iter().all(StepReport::passed)
    }

    /// The first step that did not pass
    #[must_use]
    pub fn first_failure(&self) -> Option<&StepReport> {
        self.steps.iter().find(|s| !s.passed())
    }
}

/// Result of a whole test file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Case results, in order
    pub cases: Vec<CaseReport>,
    /// Whether the cancel flag stopped the run
    pub cancelled: bool,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Whether every case ran and passed
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.cancelled && self.cases.iter().all(CaseReport::passed)
    }

    /// Number of passing cases
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    /// Number of failing cases
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.cases.len() - self.passed_count()
    }

    /// Every assertion failure, in run order
    pub fn failures(&self) -> impl Iterator<Item = &AssertionFailure> {
        self.cases
            .iter()
            .flat_map(|c| &c.steps)
            .flat_map(|s| &s.failures)
    }

    /// Every step error as `(case, step)`
    pub fn errors(&self) -> impl Iterator<Item = (&CaseReport, &StepReport)> {
        self.cases.iter().flat_map(|c| {
            c.steps
                .iter()
                .filter(|s| s.error.is_some())
                .map(move |s| (c, s))
        })
    }

    /// Generate summary string
    #[must_use]
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}/{} cases passed in {}ms",
            self.passed_count(),
            self.cases.len(),
            self.duration_ms
        );
        if self.cancelled {
            summary.push_str(" (cancelled)");
        }
        summary
    }
}
