//! Run command handler: executes a test file in Chromium

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};
use crate::RunArgs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use textwright::{
    CallbackSink, CdpBackend, CdpConfig, ProjectConfig, ReloadHook, RunEvent, RunOptions,
    RunReport, RunSink, Runner, StepStatus, TestFile, TracingSink,
};

/// Project config from `--config`, else the first one found next to the
/// test file or in the working directory
pub fn load_project_config(args: &RunArgs) -> CliResult<ProjectConfig> {
    if let Some(path) = &args.config {
        return Ok(ProjectConfig::load(path)?);
    }
    let beside_file = args
        .file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .and_then(ProjectConfig::find);
    let config = match beside_file.or_else(|| ProjectConfig::find(Path::new("."))) {
        Some(path) => ProjectConfig::load(path)?,
        None => ProjectConfig::default(),
    };
    Ok(config)
}

/// Runner options: defaults, then the project config, then flags
#[must_use]
pub fn run_options(project: &ProjectConfig, args: &RunArgs) -> RunOptions {
    let mut options = project.apply(RunOptions::default());
    if args.fail_fast {
        options = options.with_fail_fast(true);
    }
    if let Some(ms) = args.timeout {
        options = options.with_timeout(Duration::from_millis(ms));
    }
    options
}

/// Browser launch settings from flags
#[must_use]
pub fn cdp_config(args: &RunArgs) -> CdpConfig {
    let config = CdpConfig::default().with_headless(!args.headed);
    if args.no_sandbox {
        config.with_no_sandbox()
    } else {
        config
    }
}

/// Warning for steps that never ran, if any
#[must_use]
pub fn skipped_warning(report: &RunReport) -> Option<String> {
    let skipped = report
        .cases
        .iter()
        .flat_map(|c| &c.steps)
        .filter(|s| s.status() == StepStatus::Skipped)
        .count();
    (skipped > 0).then(|| format!("{skipped} step(s) skipped"))
}

/// Whether run events are echoed as transcript lines
#[must_use]
pub const fn echo_transcript(config: &CliConfig, format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Text) && config.verbosity.is_verbose()
}

/// Execute the run command
pub fn execute_run(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(run_file(config, args))?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let reporter =
                ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
            reporter.report(&report);
            if let Some(warning) = skipped_warning(&report) {
                reporter.warning(&warning);
            }
        }
    }

    if report.passed() {
        Ok(())
    } else if report.cancelled {
        Err(CliError::test_failures("run cancelled"))
    } else {
        Err(CliError::test_failures(format!(
            "{} of {} case(s) failed",
            report.failed_count(),
            report.cases.len()
        )))
    }
}

async fn run_file(config: &CliConfig, args: &RunArgs) -> CliResult<RunReport> {
    let file = TestFile::load(&args.file)?;
    let project = load_project_config(args)?;
    let options = run_options(&project, args);
    debug!(?options, globals = project.global_variables.len(), "resolved run options");

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let bar = match args.format {
        OutputFormat::Text => reporter.start_progress(file.tests.len() as u64, "starting"),
        OutputFormat::Json => None,
    };
    let progress = bar.clone();
    let echo = echo_transcript(config, args.format);
    let sink = CallbackSink::new(move |event: &RunEvent| {
        TracingSink.record(event);
        if echo {
            match &progress {
                Some(bar) => bar.println(event.to_string()),
                None => eprintln!("{event}"),
            }
        }
        if let Some(bar) = &progress {
            match event {
                RunEvent::CaseStarted { case } => bar.set_message(case.clone()),
                RunEvent::CaseFinished { .. } => bar.inc(1),
                _ => {}
            }
        }
    });

    let backend = CdpBackend::launch(cdp_config(args), &args.url).await?;
    let mut runner = Runner::new(backend)
        .with_config(&project)
        .with_options(options)
        .with_reset_hook(ReloadHook)
        .with_sink(sink);

    let cancel = runner.cancel_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = runner.run_tests(&file).await;
    ctrl_c.abort();
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    runner.into_backend().close().await?;
    Ok(report)
}
