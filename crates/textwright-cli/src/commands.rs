//! CLI command definitions using clap

use crate::config::ColorChoice;
use crate::output::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Textwright: run UI tests written as plain-English sentences
#[derive(Parser, Debug)]
#[command(name = "textwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test file against a page in Chromium
    Run(RunArgs),

    /// Validate a test file and parse every step without a browser
    Check(CheckArgs),

    /// Print the commands extracted from one sentence as JSON
    Parse(ParseArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Test file (YAML)
    pub file: PathBuf,

    /// Page to open before the first case
    #[arg(long)]
    pub url: String,

    /// Project config file (default: textwright.yaml next to the test file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop at the first failing case
    #[arg(long)]
    pub fail_fast: bool,

    /// Auto-wait timeout in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Disable the Chromium sandbox (containers/CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Test file (YAML)
    pub file: PathBuf,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the parse command
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Sentence to parse, e.g. `Click "Save" button.`
    pub sentence: String,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Detect terminal support
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
