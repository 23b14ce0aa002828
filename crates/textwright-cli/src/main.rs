//! Textwright CLI: plain-English UI tests
//!
//! ## Usage
//!
//! ```bash
//! textwright check tests/login.yaml                    # Validate and parse every step
//! textwright run tests/login.yaml --url http://localhost:3000
//! textwright parse 'Click "Teams" link.'              # Show the extracted commands
//! ```

use clap::Parser;
use std::process::ExitCode;
use textwright_cli::{handlers, init_logging, Cli, CliConfig, CliResult, Commands, Verbosity};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into());
    init_logging(&config);

    match cli.command {
        #[cfg(feature = "browser")]
        Commands::Run(args) => handlers::execute_run(&config, &args),
        #[cfg(not(feature = "browser"))]
        Commands::Run(_) => Err(textwright_cli::CliError::config(
            "browser support not enabled. Rebuild with --features browser",
        )),
        Commands::Check(args) => handlers::execute_check(&config, &args),
        Commands::Parse(args) => handlers::execute_parse(&args),
    }
}
