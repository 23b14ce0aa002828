//! Test runner.
//!
//! Walks a [`TestFile`] case by case and step by step, turning each step
//! into commands and dispatching them against a [`UiBackend`]:
//!
//! ```text
//! Idle ─▶ RunningCase ─▶ RunningStep ─▶ Dispatching ─┐
//!  ▲           ▲              ▲                       │
//!  │           │              └───────────────────────┘
//!  │           └── next case ◀── CaseComplete (reset hook)
//!  └──────────────────────────── last case
//! ```
//!
//! Assertion failures are collected, never thrown. An error aborts the
//! step it happened in; later steps still run unless fail-fast is set.
//! Variables stored by one case remain visible to the cases after it.

mod report;

pub use report::{AssertionFailure, CaseReport, RunReport, StepReport, StepStatus};

use crate::backend::{TargetRef, UiBackend};
use crate::config::ProjectConfig;
use crate::grammar::alias::INPUT_ROLES;
use crate::grammar::{Action, AssertBehavior, Command, RuleTagger, Tagger, ValueBehavior};
use crate::result::{TextwrightError, TextwrightResult};
use crate::schema::{NavigationStep, Step, TestCase, TestFile};
use crate::selector::{self, SelectorMode, SliderKind, TargetQuery};
use crate::slider::{self, SliderControl, SliderOptions};
use crate::transcript::{NullSink, RunEvent, RunSink};
use crate::variables::VariableStore;
use crate::wait::{self, MatchPattern, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// =============================================================================
// OPTIONS
// =============================================================================

/// Default auto-wait timeout for targets and assertions
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Runner options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Stop the run at the first failing step
    pub fail_fast: bool,
    /// How long target resolution and assertions keep retrying
    pub timeout: Duration,
    /// Delay between retries
    pub poll_interval: Duration,
    /// How long `waitForURL` steps wait
    pub navigation_timeout: Duration,
    /// Slider convergence limits
    pub slider: SliderOptions,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            navigation_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            slider: SliderOptions::default(),
        }
    }
}

impl RunOptions {
    /// Create options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop at the first failing step
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the auto-wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Cap slider correction moves
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.slider.max_iterations = max_iterations;
        self
    }

    fn wait(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.poll_interval.as_millis() as u64)
    }
}

// =============================================================================
// HOOKS
// =============================================================================

/// Restores the UI surface between cases
#[async_trait]
pub trait ResetHook: Send + Sync {
    /// Called after every case, whether it passed or not
    async fn reset(&self, backend: &mut dyn UiBackend) -> TextwrightResult<()>;
}

/// Reloads the page between cases
#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadHook;

#[async_trait]
impl ResetHook for ReloadHook {
    async fn reset(&self, backend: &mut dyn UiBackend) -> TextwrightResult<()> {
        backend.reload().await
    }
}

/// Flag checked before every step; clones share the flag
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    /// Request cancellation; the step in flight finishes first
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// RUNNER
// =============================================================================

/// Runs test files against one backend
pub struct Runner<B: UiBackend> {
    backend: B,
    options: RunOptions,
    tagger: Box<dyn Tagger>,
    sink: Box<dyn RunSink>,
    reset: Option<Box<dyn ResetHook>>,
    cancel: CancelHandle,
    globals: VariableStore,
}

impl<B: UiBackend> fmt::Debug for Runner<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("options", &self.options)
            .field("globals", &self.globals)
            .field("has_reset_hook", &self.reset.is_some())
            .finish_non_exhaustive()
    }
}

/// Where in the run a step sits
struct StepContext<'a> {
    case: &'a str,
    index: usize,
    selector: SelectorMode,
    slider: SliderKind,
}

/// Outcome of one comparison attempt
struct Check {
    passed: bool,
    expected: String,
    actual: String,
}

impl<B: UiBackend> Runner<B> {
    /// Create a runner with default options and no transcript
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            options: RunOptions::default(),
            tagger: Box::new(RuleTagger::new()),
            sink: Box::new(NullSink),
            reset: None,
            cancel: CancelHandle::default(),
            globals: VariableStore::new(),
        }
    }

    /// Set runner options
    #[must_use]
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply a project config: option overrides and global variables
    #[must_use]
    pub fn with_config(mut self, config: &ProjectConfig) -> Self {
        self.options = config.apply(self.options);
        self.globals = config.variables();
        self
    }

    /// Send run events to a sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl RunSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Use a different part-of-speech tagger
    #[must_use]
    pub fn with_tagger(mut self, tagger: impl Tagger + 'static) -> Self {
        self.tagger = Box::new(tagger);
        self
    }

    /// Reset the UI after each case
    #[must_use]
    pub fn with_reset_hook(mut self, hook: impl ResetHook + 'static) -> Self {
        self.reset = Some(Box::new(hook));
        self
    }

    /// Handle that cancels the run between steps
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Borrow the backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Borrow the backend mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consume the runner, returning the backend
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Run every case of a test file in order.
    ///
    /// Variables start from the configured globals and persist across
    /// cases; they are discarded when the run ends.
    pub async fn run_tests(&mut self, file: &TestFile) -> RunReport {
        let started = Instant::now();
        let mut variables = self.globals.clone();
        let mut report = RunReport::default();
        info!(cases = file.tests.len(), "starting run");

        for case in &file.tests {
            let (case_report, stop) = self.run_case(file, case, &mut variables).await;
            let failed = !case_report.passed();
            report.cases.push(case_report);
            if stop {
                report.cancelled = self.cancel.is_cancelled();
                break;
            }
            if failed && self.options.fail_fast {
                warn!(case = %case.name, "fail-fast: stopping run");
                break;
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(summary = %report.summary(), "run finished");
        report
    }

    /// Returns the case report and whether the run must stop
    async fn run_case(
        &mut self,
        file: &TestFile,
        case: &TestCase,
        variables: &mut VariableStore,
    ) -> (CaseReport, bool) {
        let started = Instant::now();
        let mut report = CaseReport::new(&case.name);
        let mut stop = false;
        self.sink.record(&RunEvent::CaseStarted {
            case: case.name.clone(),
        });

        for (index, step) in case.steps.iter().enumerate() {
            if stop {
                report.steps.push(StepReport::skipped(index, step.describe()));
                continue;
            }
            if self.cancel.is_cancelled() {
                self.sink.record(&RunEvent::RunCancelled {
                    case: case.name.clone(),
                });
                report.steps.push(StepReport::skipped(index, step.describe()));
                stop = true;
                continue;
            }

            let context = StepContext {
                case: &case.name,
                index,
                selector: file.selector_for(case, step),
                slider: file.slider_for(case, step),
            };
            let step_report = self.run_step(&context, step, variables).await;
            if !step_report.passed() && self.options.fail_fast {
                stop = true;
            }
            report.steps.push(step_report);
        }

        if let Some(hook) = &self.reset {
            if let Err(e) = hook.reset(&mut self.backend).await {
                warn!(case = %case.name, error = %e, "reset hook failed");
                report.reset_error = Some(e.to_string());
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.sink.record(&RunEvent::CaseFinished {
            case: case.name.clone(),
            passed: report.passed(),
        });
        (report, stop && self.cancel.is_cancelled())
    }

    async fn run_step(
        &mut self,
        context: &StepContext<'_>,
        step: &Step,
        variables: &mut VariableStore,
    ) -> StepReport {
        let started = Instant::now();
        let mut report = StepReport::new(context.index, step.describe());
        self.sink.record(&RunEvent::StepStarted {
            case: context.case.to_string(),
            step_index: context.index,
            text: report.text.clone(),
        });

        let result = match step {
            Step::Navigation(nav) => self.navigate(context, nav, &mut report).await,
            _ => match step.commands(self.tagger.as_ref()) {
                Ok(commands) => {
                    report.commands = commands.len();
                    self.dispatch_all(context, &commands, variables, &mut report)
                        .await
                }
                Err(e) => Err(e.into()),
            },
        };

        if let Err(e) = result {
            debug!(case = context.case, step = context.index, error = %e, "step failed");
            self.sink.record(&RunEvent::StepError {
                case: context.case.to_string(),
                step_index: context.index,
                message: e.to_string(),
            });
            report.error = Some(e.to_string());
        }
        report.duration_ms = started.elapsed().as_millis() as u64;
        report
    }

    async fn dispatch_all(
        &mut self,
        context: &StepContext<'_>,
        commands: &[Command],
        variables: &mut VariableStore,
        report: &mut StepReport,
    ) -> TextwrightResult<()> {
        for command in commands {
            self.dispatch(context, command, variables, report).await?;
        }
        Ok(())
    }

    async fn dispatch(
        &mut self,
        context: &StepContext<'_>,
        command: &Command,
        variables: &mut VariableStore,
        report: &mut StepReport,
    ) -> TextwrightResult<()> {
        debug!(%command, "dispatching");
        match command.action {
            Action::Click => {
                let target = self.locate(context.selector, command).await?;
                self.backend.click(&target).await?;
                self.performed(command, &target);
            }
            Action::Hover => {
                let target = self.locate(context.selector, command).await?;
                self.backend.hover(&target).await?;
                self.performed(command, &target);
            }
            Action::Fill => {
                let text = variables.substitute(command.value.as_deref().unwrap_or_default())?;
                let target = self.locate(context.selector, command).await?;
                self.backend.fill(&target, &text).await?;
                self.performed(command, &target);
            }
            Action::Slide => {
                let raw = variables.substitute(command.value.as_deref().unwrap_or_default())?;
                let value = coerce_integer(&raw)?;
                let target = self.locate(context.selector, command).await?;
                let control =
                    SliderControl::locate(&self.backend, &command.object, target.clone(), context.slider)
                        .await?;
                let outcome = slider::converge(&mut self.backend, &control, value, self.options.slider).await?;
                debug!(slider = %command.object, iterations = outcome.iterations, "slider converged");
                self.performed(command, &target);
            }
            Action::Store => {
                let target = self.locate(context.selector, command).await?;
                let value = self.read_plain(command, &target).await?;
                let name = command.variable_name.clone().unwrap_or_default();
                self.sink.record(&RunEvent::VariableStored {
                    name: name.clone(),
                    value: value.clone(),
                });
                variables.insert(name, value);
            }
            Action::Ensure => {
                let check = self.ensure(context.selector, command, variables).await?;
                if check.passed {
                    report.assertions_passed += 1;
                    self.sink.record(&RunEvent::AssertionPassed {
                        case: context.case.to_string(),
                        step_index: context.index,
                        command: command.to_string(),
                    });
                } else {
                    let failure = AssertionFailure {
                        case: context.case.to_string(),
                        step_index: context.index,
                        command: command.to_string(),
                        expected: check.expected,
                        actual: check.actual,
                    };
                    self.assertion_failed(&failure);
                    report.failures.push(failure);
                }
            }
        }
        Ok(())
    }

    fn performed(&self, command: &Command, target: &TargetRef) {
        self.sink.record(&RunEvent::ActionPerformed {
            action: command.action,
            command: command.to_string(),
            target: target.to_string(),
        });
    }

    fn assertion_failed(&self, failure: &AssertionFailure) {
        self.sink.record(&RunEvent::AssertionFailed {
            case: failure.case.clone(),
            step_index: failure.step_index,
            command: failure.command.clone(),
            expected: failure.expected.clone(),
            actual: failure.actual.clone(),
        });
    }

    async fn navigate(
        &mut self,
        context: &StepContext<'_>,
        nav: &NavigationStep,
        report: &mut StepReport,
    ) -> TextwrightResult<()> {
        let url = MatchPattern::parse(&nav.wait_for_url)?;
        wait::wait_for_url(&self.backend, &url, &self.options.wait(self.options.navigation_timeout)).await?;

        let Some(title) = &nav.page_title else {
            return Ok(());
        };
        let pattern = MatchPattern::parse(title)?;
        match wait::wait_for_title(&self.backend, &pattern, &self.options.wait(self.options.timeout)).await? {
            Ok(_) => report.assertions_passed += 1,
            Err(actual) => {
                let failure = AssertionFailure {
                    case: context.case.to_string(),
                    step_index: context.index,
                    command: format!("Page title matches {pattern}"),
                    expected: pattern.to_string(),
                    actual: format!("\"{actual}\""),
                };
                self.assertion_failed(&failure);
                report.failures.push(failure);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Resolution and reads
    // =========================================================================

    /// Resolve a command's target, retrying until the auto-wait timeout
    async fn locate(&self, mode: SelectorMode, command: &Command) -> TextwrightResult<TargetRef> {
        let query = TargetQuery::plan(mode, command);
        let deadline = Instant::now() + self.options.timeout;
        loop {
            match selector::resolve(&self.backend, &query).await {
                Err(e) if e.is_retryable() && Instant::now() < deadline => {
                    tokio::time::sleep(self.options.poll_interval).await;
                }
                other => return other,
            }
        }
    }

    /// Form value for input-like roles, rendered text otherwise
    async fn read_plain(&self, command: &Command, target: &TargetRef) -> TextwrightResult<String> {
        if INPUT_ROLES.contains(&command.element_type.as_str()) {
            self.backend.value(target).await
        } else {
            self.backend.text(target).await
        }
    }

    /// Text of the elements named by `aria-describedby`, else
    /// `aria-description`, else `title`
    async fn accessible_description(&self, target: &TargetRef) -> TextwrightResult<String> {
        if let Some(ids) = self.backend.attribute(target, "aria-describedby").await? {
            let mut parts = Vec::new();
            for id in ids.split_whitespace() {
                if let Some(described) = self.backend.resolve_by_attribute("id", id).await? {
                    parts.push(self.backend.text(&described).await?);
                }
            }
            return Ok(parts.join(" "));
        }
        if let Some(description) = self.backend.attribute(target, "aria-description").await? {
            return Ok(description);
        }
        Ok(self
            .backend
            .attribute(target, "title")
            .await?
            .unwrap_or_default())
    }

    /// Text of the element named by `aria-errormessage`
    async fn error_message(&self, command: &Command, target: &TargetRef) -> TextwrightResult<String> {
        let missing = || TextwrightError::MissingAttribute {
            name: command.object.clone(),
            attribute: "aria-errormessage".to_string(),
        };
        let id = self
            .backend
            .attribute(target, "aria-errormessage")
            .await?
            .ok_or_else(missing)?;
        let message = self
            .backend
            .resolve_by_attribute("id", &id)
            .await?
            .ok_or_else(missing)?;
        self.backend.text(&message).await
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Evaluate an `ensure`, retrying until it holds or the timeout passes
    async fn ensure(
        &self,
        mode: SelectorMode,
        command: &Command,
        variables: &VariableStore,
    ) -> TextwrightResult<Check> {
        let behavior = command.assert_behavior.unwrap_or(AssertBehavior::Exist);
        let expected = match (&command.variable_name, &command.value) {
            (Some(name), _) => Some(variables.lookup(name)?.to_string()),
            (None, Some(value)) => Some(variables.substitute(value)?),
            (None, None) => None,
        };
        let pattern = match (behavior, &expected) {
            (AssertBehavior::Match, Some(source)) => Some(compile(command, source)?),
            _ => None,
        };

        let query = TargetQuery::plan(mode, command);
        let deadline = Instant::now() + self.options.timeout;
        loop {
            let check = match self.check_once(&query, command, behavior, expected.as_deref(), pattern.as_ref()).await {
                Ok(check) => check,
                Err(e) if e.is_retryable() && Instant::now() < deadline => {
                    tokio::time::sleep(self.options.poll_interval).await;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if check.passed || Instant::now() >= deadline {
                return Ok(check);
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    async fn check_once(
        &self,
        query: &TargetQuery,
        command: &Command,
        behavior: AssertBehavior,
        expected: Option<&str>,
        pattern: Option<&Regex>,
    ) -> TextwrightResult<Check> {
        let negated = command.is_negative_assertion;
        let not = if negated { "not " } else { "" };

        if behavior == AssertBehavior::Exist {
            let visible = match selector::resolve(&self.backend, query).await {
                Ok(_) => true,
                Err(TextwrightError::TargetNotFound { .. }) => false,
                Err(e) => return Err(e),
            };
            return Ok(Check {
                passed: visible != negated,
                expected: format!("{not}visible"),
                actual: if visible { "visible" } else { "not visible" }.to_string(),
            });
        }

        let target = selector::resolve(&self.backend, query).await?;
        let actual = match command.value_behavior.unwrap_or_default() {
            ValueBehavior::Plain => self.read_plain(command, &target).await?,
            ValueBehavior::Accessible => self.accessible_description(&target).await?,
            ValueBehavior::Error => self.error_message(command, &target).await?,
        };
        let expected = expected.unwrap_or_default();

        let (holds, shown) = match behavior {
            AssertBehavior::Exact => (
                normalize(&actual) == normalize(expected),
                format!("{not}\"{expected}\""),
            ),
            AssertBehavior::Contain => (
                normalize(&actual).contains(&normalize(expected)),
                format!("{not}containing \"{expected}\""),
            ),
            AssertBehavior::Match => (
                pattern.is_some_and(|re| re.is_match(&actual)),
                format!("{not}matching /{expected}/"),
            ),
            AssertBehavior::Exist => (true, String::new()),
        };
        Ok(Check {
            passed: holds != negated,
            expected: shown,
            actual: format!("\"{actual}\""),
        })
    }
}

/// Collapse whitespace runs and trim, as rendered text is compared
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regex for a `match` assertion; a variable's value is matched literally
fn compile(command: &Command, source: &str) -> TextwrightResult<Regex> {
    let source = if command.variable_name.is_some() {
        regex::escape(source)
    } else {
        source.to_string()
    };
    Regex::new(&source).map_err(|e| TextwrightError::InvalidPattern {
        pattern: source.clone(),
        message: e.to_string(),
    })
}

/// Integer target of a `slide`; fractional input truncates toward zero
fn coerce_integer(raw: &str) -> TextwrightResult<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value.trunc() as i64),
        _ => Err(TextwrightError::Coercion {
            value: raw.to_string(),
            expected: "an integer slider value".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, MockEffect, MockElement};
    use crate::transcript::Transcript;

    fn fast() -> RunOptions {
        RunOptions::new()
            .with_timeout(Duration::from_millis(30))
            .with_poll_interval(Duration::from_millis(5))
            .with_navigation_timeout(Duration::from_millis(30))
    }

    fn file(yaml: &str) -> TestFile {
        TestFile::from_yaml(yaml).unwrap()
    }

    mod option_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let options = RunOptions::default();
            assert!(!options.fail_fast);
            assert_eq!(options.timeout, Duration::from_millis(5000));
            assert_eq!(options.poll_interval, Duration::from_millis(50));
            assert_eq!(options.navigation_timeout, Duration::from_millis(30_000));
            assert_eq!(options.slider.max_iterations, 2000);
        }

        #[test]
        fn test_builders() {
            let options = RunOptions::new().with_fail_fast(true).with_max_iterations(10);
            assert!(options.fail_fast);
            assert_eq!(options.slider.max_iterations, 10);
        }

        #[test]
        fn test_coerce_integer() {
            assert_eq!(coerce_integer(" 42 ").unwrap(), 42);
            assert_eq!(coerce_integer("-3").unwrap(), -3);
            assert_eq!(coerce_integer("12.9").unwrap(), 12);
            assert!(matches!(coerce_integer("loud"), Err(TextwrightError::Coercion { .. })));
            assert!(coerce_integer("NaN").is_err());
        }

        #[test]
        fn test_normalize() {
            assert_eq!(normalize("  a \n b  "), "a b");
        }

        #[test]
        fn test_cancel_handle_shared() {
            let handle = CancelHandle::default();
            let clone = handle.clone();
            clone.cancel();
            assert!(handle.is_cancelled());
        }
    }

    mod dispatch_tests {
        use super::*;

        fn form() -> MockBackend {
            let mut page = MockBackend::new().with_url("http://localhost/");
            let name = page.add(MockElement::new("input").role("textbox").name("Name"));
            let greeting = page.add(MockElement::new("p").label("Greeting").text("Hello"));
            page.add(
                MockElement::new("button")
                    .role("button")
                    .name("Greet")
                    .on_click(MockEffect::CopyValue {
                        from: name,
                        to: greeting,
                    }),
            );
            page
        }

        #[tokio::test]
        async fn test_fill_click_ensure() {
            let transcript = Transcript::new();
            let mut runner = Runner::new(form()).with_options(fast()).with_sink(transcript.clone());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: greet
    steps:
      - Fill "Name" input with value "Ada".
      - Click "Greet" button.
      - Ensure "Greeting" element to have text "Ada".
      - Ensure "Greeting" element to contain text "Ad".
      - Ensure "Greeting" element to match pattern "/^a/i".
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
            assert_eq!(report.cases[0].steps[2].assertions_passed, 1);
            assert!(runner.backend().was_called("fill:e0=Ada"));
            assert!(transcript
                .events()
                .iter()
                .any(|e| matches!(e, RunEvent::ActionPerformed { action: Action::Click, .. })));
        }

        #[tokio::test]
        async fn test_store_then_compare() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: store
    steps:
      - Fill "Name" input with value "Grace".
      - Store the value of "Name" input into variable {x}.
      - Click "Greet" button.
      - Ensure "Greeting" element to have text {x}.
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
        }

        #[tokio::test]
        async fn test_failed_assertion_does_not_abort() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: mismatch
    steps:
      - Ensure "Greeting" element to have text "Bye".
      - Click "Greet" button.
"#,
                ))
                .await;
            assert!(!report.passed());
            let case = &report.cases[0];
            assert_eq!(case.steps[0].status(), StepStatus::Failed);
            assert_eq!(case.steps[1].status(), StepStatus::Passed);
            let failure = report.failures().next().unwrap();
            assert_eq!(failure.expected, "\"Bye\"");
            assert_eq!(failure.actual, "\"Hello\"");
            assert_eq!(failure.step_index, 0);
        }

        #[tokio::test]
        async fn test_negated_assertions() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: negation
    steps:
      - Ensure "Greeting" element to not have text "Bye".
      - Ensure "Missing" element to not exist.
      - Ensure "Greeting" element to exist.
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
        }

        #[tokio::test]
        async fn test_missing_target_is_step_error() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    "tests:\n  - name: a\n    steps:\n      - Click \"Nope\" button.\n      - Click \"Greet\" button.\n",
                ))
                .await;
            let case = &report.cases[0];
            assert_eq!(case.steps[0].status(), StepStatus::Error);
            assert!(case.steps[0].error.as_deref().unwrap().contains("Nope"));
            assert!(case.steps[1].passed());
        }

        #[tokio::test]
        async fn test_parse_error_is_step_error() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file("tests:\n  - name: a\n    steps:\n      - Press \"Greet\" button.\n"))
                .await;
            assert_eq!(report.cases[0].steps[0].status(), StepStatus::Error);
            assert!(runner.backend().history().is_empty());
        }

        #[tokio::test]
        async fn test_fail_fast_skips_rest() {
            let mut runner = Runner::new(form()).with_options(fast().with_fail_fast(true));
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: first
    steps:
      - Click "Nope" button.
      - Click "Greet" button.
  - name: second
    steps:
      - Click "Greet" button.
"#,
                ))
                .await;
            assert_eq!(report.cases.len(), 1);
            assert_eq!(report.cases[0].steps[1].status(), StepStatus::Skipped);
            assert!(!runner.backend().was_called("click"));
        }

        #[tokio::test]
        async fn test_unknown_variable_is_error() {
            let mut runner = Runner::new(form()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    "tests:\n  - name: a\n    steps:\n      - Ensure \"Greeting\" element to have text {nope}.\n",
                ))
                .await;
            let error = report.cases[0].steps[0].error.as_deref().unwrap();
            assert!(error.contains("nope"));
        }
    }

    mod description_tests {
        use super::*;

        #[tokio::test]
        async fn test_accessible_description_and_error_message() {
            let mut page = MockBackend::new();
            page.add(
                MockElement::new("input")
                    .role("textbox")
                    .name("Email")
                    .attr("aria-describedby", "hint")
                    .attr("aria-errormessage", "email-error"),
            );
            page.add(MockElement::new("p").attr("id", "hint").text("We never share it"));
            page.add(MockElement::new("p").attr("id", "email-error").text("Email is required"));

            let mut runner = Runner::new(page).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: a11y
    steps:
      - Ensure "Email" input to have accessible description "We never share it".
      - Ensure "Email" input to contain error message "required".
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
        }
    }

    mod lifecycle_tests {
        use super::*;

        fn navigating() -> MockBackend {
            let mut page = MockBackend::new()
                .with_url("http://localhost/")
                .with_title("Home");
            page.add(
                MockElement::new("a")
                    .role("link")
                    .name("Teams")
                    .on_click(MockEffect::Navigate {
                        url: "http://localhost/teams".into(),
                        title: Some("Teams".into()),
                    }),
            );
            page
        }

        #[tokio::test]
        async fn test_navigation_step() {
            let mut runner = Runner::new(navigating()).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: nav
    steps:
      - Click "Teams" link.
      - waitForURL: "**/teams"
        pageTitle: "Teams"
      - waitForURL: "/teams$/"
        pageTitle: "Home"
"#,
                ))
                .await;
            let steps = &report.cases[0].steps;
            assert!(steps[1].passed(), "{steps:?}");
            assert_eq!(steps[2].status(), StepStatus::Failed);
            assert_eq!(steps[2].failures[0].actual, "\"Teams\"");
        }

        #[tokio::test]
        async fn test_navigation_timeout_is_error() {
            let mut runner = Runner::new(navigating()).with_options(fast());
            let report = runner
                .run_tests(&file("tests:\n  - name: a\n    steps:\n      - waitForURL: \"**/users\"\n"))
                .await;
            assert_eq!(report.cases[0].steps[0].status(), StepStatus::Error);
        }

        #[tokio::test]
        async fn test_reload_hook_between_cases() {
            let mut runner = Runner::new(navigating())
                .with_options(fast())
                .with_reset_hook(ReloadHook);
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: first
    steps:
      - Click "Teams" link.
  - name: second
    steps:
      - waitForURL: "http://localhost/"
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
            assert_eq!(runner.backend().call_count("reload"), 2);
        }

        #[tokio::test]
        async fn test_variables_persist_across_cases() {
            let mut page = MockBackend::new();
            page.add(MockElement::new("input").role("textbox").name("Name").value("Linus"));
            let mut runner = Runner::new(page).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: capture
    steps:
      - Store the value of "Name" input into variable {who}.
  - name: reuse
    steps:
      - Ensure "Name" input to have value {who}.
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
        }

        #[tokio::test]
        async fn test_cancel_before_run() {
            let mut runner = Runner::new(navigating()).with_options(fast());
            runner.cancel_handle().cancel();
            let report = runner
                .run_tests(&file("tests:\n  - name: a\n    steps: [Click \"Teams\" link.]\n  - name: b\n    steps: [Click \"Teams\" link.]\n"))
                .await;
            assert!(report.cancelled);
            assert_eq!(report.cases.len(), 1);
            assert_eq!(report.cases[0].steps[0].status(), StepStatus::Skipped);
            assert!(!runner.backend().was_called("click"));
        }

        #[tokio::test]
        async fn test_global_variables() {
            let mut page = MockBackend::new();
            page.add(MockElement::new("input").role("textbox").name("User"));
            let config = ProjectConfig::from_yaml("globalVariables:\n  ADMIN: alice\n").unwrap();
            let mut runner = Runner::new(page).with_options(fast()).with_config(&config);
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: globals
    steps:
      - Fill "User" input with value "{{globalEnv.ADMIN}}".
      - Ensure "User" input to have value "{{globalEnv.ADMIN}}".
      - Fill "User" input with value {{globalEnv.ADMIN}}. Ensure "User" input to have value {{globalEnv.ADMIN}}.
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
            assert!(runner.backend().was_called("fill:e0=alice"));
            assert_eq!(report.cases[0].steps[2].commands, 2);
        }

        #[tokio::test]
        async fn test_input_roles_compare_value() {
            let mut page = MockBackend::new();
            page.add(
                MockElement::new("input")
                    .role("textbox")
                    .name("City")
                    .text("placeholder")
                    .value("Oslo"),
            );
            let mut runner = Runner::new(page).with_options(fast());
            let report = runner
                .run_tests(&file(
                    r#"
tests:
  - name: value
    steps:
      - Ensure "City" input to have text "Oslo".
      - Ensure "City" input to contain text "Os".
      - Ensure "City" input to match pattern "/^osl/i".
      - Ensure "City" input to not contain text "placeholder".
"#,
                ))
                .await;
            assert!(report.passed(), "{report:?}");
        }
    }
}
