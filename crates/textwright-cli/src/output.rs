//! Output formatting and progress reporting

use clap::ValueEnum;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use textwright::{CaseReport, RunReport, StepStatus};

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Console reporter for check and run output
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Progress bar over `total` cases, or `None` in quiet mode
    #[must_use]
    pub fn start_progress(&self, total: u64, message: &str) -> Option<ProgressBar> {
        if self.quiet {
            return None;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        Some(pb)
    }

    fn line(&self, glyph: &str, plain: &str, paint: fn(&str) -> String, message: &str) {
        let prefix = if self.use_color {
            paint(glyph)
        } else {
            plain.to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line("✓", "PASS", |g| style(g).green().bold().to_string(), message);
        }
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        self.line("✗", "FAIL", |g| style(g).red().bold().to_string(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            self.line("⚠", "WARN", |g| style(g).yellow().bold().to_string(), message);
        }
    }

    /// Print an indented detail line
    pub fn detail(&self, message: &str) {
        if !self.quiet {
            for line in message.lines() {
                let _ = self.term.write_line(&format!("    {line}"));
            }
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one case with its non-passing steps
    pub fn case(&self, case: &CaseReport) {
        if case.passed() {
            self.success(&format!("{} ({}ms)", case.name, case.duration_ms));
            return;
        }
        self.failure(&case.name);
        for step in &case.steps {
            match step.status() {
                StepStatus::Passed => {}
                StepStatus::Skipped => self.detail(&format!("step {}: skipped", step.index + 1)),
                StepStatus::Error => self.detail(&format!(
                    "step {}: {}\n  error: {}",
                    step.index + 1,
                    step.text,
                    step.error.as_deref().unwrap_or_default()
                )),
                StepStatus::Failed => {
                    for failure in &step.failures {
                        self.detail(&failure.to_string());
                    }
                }
            }
        }
        if let Some(err) = &case.reset_error {
            self.detail(&format!("reset: {err}"));
        }
    }

    /// Print every case and the summary line
    pub fn report(&self, report: &RunReport) {
        for case in &report.cases {
            self.case(case);
        }
        if self.quiet && report.passed() {
            return;
        }

        let _ = self.term.write_line("");
        let summary = report.summary();
        let line = if !self.use_color {
            let status = if report.passed() { "PASSED" } else { "FAILED" };
            format!("{status} {summary}")
        } else if report.passed() {
            format!("{} {summary}", Style::new().green().bold().apply_to("PASSED"))
        } else {
            format!("{} {summary}", Style::new().red().bold().apply_to("FAILED"))
        };
        let _ = self.term.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }

        #[test]
        fn test_value_enum() {
            assert_eq!(OutputFormat::from_str("json", true).unwrap(), OutputFormat::Json);
            assert!(OutputFormat::from_str("tap", true).is_err());
        }
    }

    mod progress_reporter_tests {
        use super::*;
        use textwright::{MockBackend, Runner, TestFile};

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_quiet_has_no_progress_bar() {
            assert!(ProgressReporter::new(false, true).start_progress(3, "run").is_none());
            assert!(ProgressReporter::new(false, false).start_progress(3, "run").is_some());
        }

        #[test]
        fn test_messages() {
            let reporter = ProgressReporter::new(false, false);
            reporter.success("passed");
            reporter.failure("failed");
            reporter.warning("careful");
            reporter.header("Cases");
            reporter.detail("one\ntwo");
        }

        #[tokio::test]
        async fn test_report_with_failures() {
            let file = TestFile::from_yaml(
                r#"
tests:
  - name: missing
    steps:
      - Click "Nowhere" button.
"#,
            )
            .unwrap();
            let mut runner = Runner::new(MockBackend::new()).with_options(
                textwright::RunOptions::default().with_timeout(std::time::Duration::from_millis(20)),
            );
            let report = runner.run_tests(&file).await;
            assert!(!report.passed());

            ProgressReporter::new(false, false).report(&report);
            ProgressReporter::new(true, true).report(&report);
        }
    }
}
