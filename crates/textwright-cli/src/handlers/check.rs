//! Check command handler: validation and extraction without a browser

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};
use crate::CheckArgs;
use serde::Serialize;
use textwright::{Command, RuleTagger, TestFile};

/// One step and what it extracted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedStep {
    /// Zero-based step index
    pub index: usize,
    /// Step text
    pub text: String,
    /// Extracted commands (empty for navigation steps)
    pub commands: Vec<Command>,
    /// Extraction error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One case of a checked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedCase {
    /// Case name
    pub name: String,
    /// Steps, in order
    pub steps: Vec<CheckedStep>,
}

/// A step whose sentence did not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckIssue {
    /// Case name
    pub case: String,
    /// Zero-based step index
    pub step_index: usize,
    /// Step text
    pub text: String,
    /// Extraction error
    pub message: String,
}

/// Outcome of checking a test file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Per-case extraction results
    pub cases: Vec<CheckedCase>,
    /// Number of steps
    pub steps: usize,
    /// Number of commands extracted
    pub commands: usize,
    /// Steps that did not parse
    pub issues: Vec<CheckIssue>,
}

impl CheckReport {
    /// Whether every step parsed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Extract every step of an already validated file
#[must_use]
pub fn check_file(file: &TestFile) -> CheckReport {
    let tagger = RuleTagger::new();
    let mut report = CheckReport::default();
    for case in &file.tests {
        let mut checked = CheckedCase {
            name: case.name.clone(),
            steps: Vec::with_capacity(case.steps.len()),
        };
        for (index, step) in case.steps.iter().enumerate() {
            let text = step.describe();
            let (commands, error) = match step.commands(&tagger) {
                Ok(commands) => (commands, None),
                Err(err) => {
                    report.issues.push(CheckIssue {
                        case: case.name.clone(),
                        step_index: index,
                        text: text.clone(),
                        message: err.to_string(),
                    });
                    (Vec::new(), Some(err.to_string()))
                }
            };
            report.steps += 1;
            report.commands += commands.len();
            checked.steps.push(CheckedStep {
                index,
                text,
                commands,
                error,
            });
        }
        report.cases.push(checked);
    }
    report
}

fn print_report(reporter: &ProgressReporter, report: &CheckReport) {
    for case in &report.cases {
        reporter.header(&case.name);
        for step in &case.steps {
            match &step.error {
                Some(message) => {
                    reporter.failure(&format!("{} (step {}): {}", case.name, step.index + 1, step.text));
                    reporter.detail(message);
                }
                None if step.commands.is_empty() => reporter.success(&step.text),
                None => {
                    for command in &step.commands {
                        reporter.success(&command.to_string());
                    }
                }
            }
        }
    }
}

/// Execute the check command
pub fn execute_check(config: &CliConfig, args: &CheckArgs) -> CliResult<()> {
    let file = TestFile::load(&args.file)?;
    let report = check_file(&file);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let reporter =
                ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
            print_report(&reporter, &report);
            if report.passed() {
                reporter.success(&format!(
                    "{}: {} cases, {} steps, {} commands",
                    args.file.display(),
                    report.cases.len(),
                    report.steps,
                    report.commands
                ));
            }
        }
    }

    if report.passed() {
        Ok(())
    } else {
        Err(CliError::check(format!(
            "{} step(s) did not parse",
            report.issues.len()
        )))
    }
}
