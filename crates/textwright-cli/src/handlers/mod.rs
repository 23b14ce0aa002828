//! Command handlers

pub mod check;
pub mod parse;
#[cfg(feature = "browser")]
pub mod run;

pub use check::{check_file, execute_check, CheckIssue, CheckReport, CheckedCase, CheckedStep};
pub use parse::execute_parse;
#[cfg(feature = "browser")]
pub use run::execute_run;
