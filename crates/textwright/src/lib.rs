//! Textwright: plain-English UI tests.
//!
//! Test steps are short constrained sentences such as
//! `Click "Submit" button on the User section.` Textwright turns each
//! sentence into a typed [`Command`] and runs it against a UI backend,
//! tracking captured variables and collecting assertion results.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   TEXTWRIGHT Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Test File  │    │ Grammar    │    │ Runner     │            │
//! │   │ (YAML)     │───►│ Extractor  │───►│ + Selector │            │
//! │   │            │    │            │    │ + Slider   │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                    │
//! │                          ┌──────────────────────────────┐       │
//! │                          │ UiBackend (Chromium | Mock)  │       │
//! │                          └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use textwright::{parse, Action};
//!
//! let commands = parse("Fill \"Name\" input with value \"Ada\".").unwrap();
//! assert_eq!(commands[0].action, Action::Fill);
//! assert_eq!(commands[0].value.as_deref(), Some("Ada"));
//! ```

pub mod backend;
pub mod config;
pub mod grammar;
mod result;
pub mod runner;
pub mod schema;
pub mod selector;
pub mod slider;
pub mod transcript;
pub mod variables;
pub mod wait;

pub use backend::{BoundingBox, MockBackend, MockEffect, MockElement, Point, TargetRef, UiBackend};
#[cfg(feature = "browser")]
pub use backend::{CdpBackend, CdpConfig};
pub use config::ProjectConfig;
pub use grammar::{
    parse, parse_with, Action, AssertBehavior, Command, RuleTagger, Tagger, ValidationError, ValueBehavior,
};
pub use result::{TextwrightError, TextwrightResult};
pub use runner::{
    AssertionFailure, CancelHandle, CaseReport, ReloadHook, ResetHook, RunOptions, RunReport, Runner,
    StepReport, StepStatus,
};
pub use schema::{SchemaError, Step, TestCase, TestFile};
pub use selector::{SelectorMode, SliderKind};
pub use transcript::{CallbackSink, ChannelSink, NullSink, RunEvent, RunSink, Transcript, TracingSink};
pub use variables::VariableStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
