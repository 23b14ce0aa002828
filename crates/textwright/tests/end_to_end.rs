//! End-to-end runs of YAML test files against the in-memory backend.

use std::time::Duration;
use textwright::{
    Action, AssertBehavior, MockBackend, MockEffect, MockElement, ProjectConfig, ReloadHook, RunEvent,
    RunOptions, Runner, SliderKind, StepStatus, TestFile, Transcript, TracingSink,
};

fn fast() -> RunOptions {
    RunOptions::new()
        .with_timeout(Duration::from_millis(40))
        .with_poll_interval(Duration::from_millis(5))
        .with_navigation_timeout(Duration::from_millis(40))
}

/// Home page with a "Teams" link that reveals the users section
fn app() -> MockBackend {
    let mut page = MockBackend::new()
        .with_url("http://localhost:3000/")
        .with_title("Home");
    page.add(MockElement::new("output").label("Real output").text("999"));
    let users = page.add(MockElement::new("section").hidden());
    page.add(
        MockElement::new("h2")
            .role("heading")
            .name("Real Users Section")
            .inside(&users),
    );
    page.add(
        MockElement::new("output")
            .label("Real output")
            .text("123")
            .inside(&users),
    );
    page.add(
        MockElement::new("a")
            .role("link")
            .name("Teams")
            .on_click(MockEffect::SetVisible {
                target: users.clone(),
                visible: true,
            })
            .on_click(MockEffect::Navigate {
                url: "http://localhost:3000/teams".into(),
                title: Some("Teams".into()),
            }),
    );
    page
}

#[tokio::test]
async fn test_click_then_scoped_assertion() {
    let file = TestFile::from_yaml(
        r#"
tests:
  - name: "Teams page shows real output"
    steps:
      - Click "Teams" link.
      - Ensure "Real output" element on the Real Users Section to have value "123".
"#,
    )
    .unwrap();

    let transcript = Transcript::new();
    let mut runner = Runner::new(app()).with_options(fast()).with_sink(transcript.clone());
    let report = runner.run_tests(&file).await;
    assert!(report.passed(), "{report:#?}");

    let events = transcript.events();
    let clicks = events
        .iter()
        .filter(|e| matches!(e, RunEvent::ActionPerformed { action: Action::Click, .. }))
        .count();
    let assertions = events
        .iter()
        .filter(|e| matches!(e, RunEvent::AssertionPassed { .. }))
        .collect::<Vec<_>>();
    assert_eq!(clicks, 1);
    assert_eq!(assertions.len(), 1);
    let RunEvent::AssertionPassed { command, .. } = assertions[0] else {
        unreachable!();
    };
    assert!(command.contains("Real Users Section"));

    let parsed = textwright::parse(
        "Ensure \"Real output\" element on the Real Users Section to have value \"123\".",
    )
    .unwrap();
    assert_eq!(parsed[0].assert_behavior, Some(AssertBehavior::Exact));
    assert_eq!(parsed[0].specifier.as_deref(), Some("Real Users Section"));
}

#[tokio::test]
async fn test_unscoped_assertion_sees_first_match() {
    let file = TestFile::from_yaml(
        r#"
tests:
  - name: "Before navigation"
    steps:
      - Ensure "Real output" element to have value "999".
      - Ensure "Real output" element on the Real Users Section to exist.
"#,
    )
    .unwrap();
    let mut runner = Runner::new(app()).with_options(fast());
    let report = runner.run_tests(&file).await;
    let steps = &report.cases[0].steps;
    assert_eq!(steps[0].status(), StepStatus::Passed);
    assert_eq!(steps[1].status(), StepStatus::Failed);
}

#[tokio::test]
async fn test_navigation_and_reset_between_cases() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let file = TestFile::from_yaml(
        r#"
tests:
  - name: "Navigate"
    steps:
      - Click "Teams" link.
      - waitForURL: "**/teams"
        pageTitle: "/^teams$/i"
  - name: "Starts fresh"
    steps:
      - waitForURL: "http://localhost:3000/"
        pageTitle: Home
"#,
    )
    .unwrap();
    let mut runner = Runner::new(app())
        .with_options(fast())
        .with_reset_hook(ReloadHook)
        .with_sink(TracingSink);
    let report = runner.run_tests(&file).await;
    assert!(report.passed(), "{report:#?}");
    assert_eq!(report.passed_count(), 2);
}

#[tokio::test]
async fn test_sliders_by_kind() {
    let mut page = MockBackend::new();
    page.add(
        MockElement::new("input")
            .role("slider")
            .name("Volume")
            .attr("type", "range")
            .bbox(10.0, 50.0, 240.0, 16.0)
            .slider(SliderKind::Native, 0.0, 100.0, 1.0, 20.0)
            .skew(6.0),
    );
    page.add(
        MockElement::new("span")
            .role("slider")
            .name("Brightness")
            .bbox(10.0, 120.0, 180.0, 12.0)
            .slider(SliderKind::Shadcn, 0.0, 50.0, 5.0, 0.0)
            .skew(-3.0),
    );

    let file = TestFile::from_yaml(
        r#"
tests:
  - name: "Sliders"
    steps:
      - Slide "Volume" slider to value "73".
      - Ensure "Volume" slider to have value "73".
      - command: Slide "Brightness" slider to value "35".
        sliderSelector: shadcn
"#,
    )
    .unwrap();
    let mut runner = Runner::new(page).with_options(fast());
    let report = runner.run_tests(&file).await;
    assert!(report.passed(), "{report:#?}");

    let backend = runner.into_backend();
    let brightness = backend.element(&backend.element_ref(1)).unwrap();
    assert_eq!(brightness.slider.as_ref().unwrap().value, 35.0);
}

#[tokio::test]
async fn test_non_numeric_slide_value_is_step_error() {
    let mut page = MockBackend::new();
    page.add(
        MockElement::new("input")
            .role("slider")
            .name("Volume")
            .bbox(0.0, 0.0, 100.0, 10.0)
            .slider(SliderKind::Native, 0.0, 10.0, 1.0, 0.0),
    );
    let file = TestFile::from_yaml(
        "tests:\n  - name: a\n    steps:\n      - Slide \"Volume\" slider to value \"loud\".\n",
    )
    .unwrap();
    let mut runner = Runner::new(page).with_options(fast());
    let report = runner.run_tests(&file).await;
    let step = &report.cases[0].steps[0];
    assert_eq!(step.status(), StepStatus::Error);
    assert!(step.error.as_deref().unwrap().contains("loud"));
    assert!(!runner.backend().was_called("pointer_down"));
}

#[tokio::test]
async fn test_selector_modes() {
    let mut page = MockBackend::new();
    page.add(
        MockElement::new("button")
            .role("button")
            .name("Save")
            .attr("data-qa-id", "save-btn")
            .attr("id", "save"),
    );
    let file = TestFile::from_yaml(
        r#"
selector: data-qa-id
tests:
  - name: "By attribute"
    steps:
      - Click "save-btn" button.
      - command: Click "save" button.
        selector: id
  - name: "By label"
    selector: label
    steps:
      - Click "Save" button.
"#,
    )
    .unwrap();
    let mut runner = Runner::new(page).with_options(fast());
    let report = runner.run_tests(&file).await;
    assert!(report.passed(), "{report:#?}");
    assert_eq!(runner.backend().call_count("click:e0"), 3);
}

#[tokio::test]
async fn test_config_globals_and_store_across_cases() {
    let mut page = MockBackend::new();
    page.add(MockElement::new("input").role("textbox").name("User"));
    page.add(MockElement::new("input").role("textbox").name("Copy"));
    let config = ProjectConfig::from_yaml(
        "globalVariables:\n  ADMIN_NAME: alice\n  UNSET: ~\ntimeoutMs: 40\n",
    )
    .unwrap();

    let file = TestFile::from_yaml(
        r#"
tests:
  - name: "Capture"
    steps:
      - Fill "User" text box with value "{{globalEnv.ADMIN_NAME}}".
      - Store the value of "User" input into variable "who".
  - name: "Reuse"
    steps:
      - Ensure "User" input to have value {who}.
      - Ensure "User" input to contain value "{{globalEnv.ADMIN_NAME}}".
      - Fill "Copy" input with value "{{globalEnv.UNSET}}".
"#,
    )
    .unwrap();
    let mut runner = Runner::new(page)
        .with_options(fast())
        .with_config(&config);
    let report = runner.run_tests(&file).await;
    let reuse = &report.cases[1];
    assert!(report.cases[0].passed(), "{report:#?}");
    assert!(reuse.steps[0].passed());
    assert!(reuse.steps[1].passed());
    assert_eq!(reuse.steps[2].status(), StepStatus::Error);
}

#[tokio::test]
async fn test_json_report_shape() {
    let file = TestFile::from_yaml(
        "tests:\n  - name: a\n    steps:\n      - Ensure \"Real output\" element to have value \"0\".\n",
    )
    .unwrap();
    let mut runner = Runner::new(app()).with_options(fast());
    let report = runner.run_tests(&file).await;
    let json = serde_json::to_value(&report).unwrap();
    let failure = &json["cases"][0]["steps"][0]["failures"][0];
    assert_eq!(failure["case"], "a");
    assert_eq!(failure["expected"], "\"0\"");
    assert_eq!(failure["actual"], "\"999\"");
}
