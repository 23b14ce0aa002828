//! Run transcript.
//!
//! The runner reports what it does as [`RunEvent`]s to a [`RunSink`] the
//! caller passes in. Sinks take `&self` so a handle can be cloned and kept
//! by the caller while the runner owns another.

use crate::grammar::Action;
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Something the runner did or observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A case began
    CaseStarted { case: String },
    /// A case ended
    CaseFinished { case: String, passed: bool },
    /// A step began
    StepStarted {
        case: String,
        step_index: usize,
        text: String,
    },
    /// A command acted on the page
    ActionPerformed {
        action: Action,
        command: String,
        target: String,
    },
    /// `store` captured a value
    VariableStored { name: String, value: String },
    /// An `ensure` held
    AssertionPassed {
        case: String,
        step_index: usize,
        command: String,
    },
    /// An `ensure` did not hold
    AssertionFailed {
        case: String,
        step_index: usize,
        command: String,
        expected: String,
        actual: String,
    },
    /// A step aborted with an error
    StepError {
        case: String,
        step_index: usize,
        message: String,
    },
    /// The cancel flag was observed before a step
    RunCancelled { case: String },
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CaseStarted { case } => write!(f, "▶ {case}"),
            Self::CaseFinished { case, passed } => {
                write!(f, "{} {case}", if *passed { "✓" } else { "✗" })
            }
            Self::StepStarted {
                step_index, text, ..
            } => write!(f, "  [{}] {text}", step_index + 1),
            Self::ActionPerformed { command, target, .. } => write!(f, "    {command} ({target})"),
            Self::VariableStored { name, value } => write!(f, "    {{{name}}} = \"{value}\""),
            Self::AssertionPassed { command, .. } => write!(f, "    ✓ {command}"),
            Self::AssertionFailed {
                command,
                expected,
                actual,
                ..
            } => write!(f, "    ✗ {command}: expected {expected}, got {actual}"),
            Self::StepError { message, .. } => write!(f, "    ✗ {message}"),
            Self::RunCancelled { case } => write!(f, "■ cancelled during {case}"),
        }
    }
}

/// Receiver of run events
pub trait RunSink: Send + Sync {
    /// Record one event
    fn record(&self, event: &RunEvent);
}

impl<S: RunSink + ?Sized> RunSink for Arc<S> {
    fn record(&self, event: &RunEvent) {
        (**self).record(event);
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RunSink for NullSink {
    fn record(&self, _event: &RunEvent) {}
}

/// Collects events in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events
    #[must_use]
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events rendered one per line
    #[must_use]
    pub fn render(&self) -> String {
        self.events()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RunSink for Transcript {
    fn record(&self, event: &RunEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Calls a closure for each event
pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    /// Wrap a closure
    pub const fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> fmt::Debug for CallbackSink<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

impl<F> RunSink for CallbackSink<F>
where
    F: Fn(&RunEvent) + Send + Sync,
{
    fn record(&self, event: &RunEvent) {
        (self.callback)(event);
    }
}

/// Forwards events over an unbounded tokio channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver for its events
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RunSink for ChannelSink {
    fn record(&self, event: &RunEvent) {
        let _ = self.sender.send(event.clone());
    }
}

/// Logs events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl RunSink for TracingSink {
    fn record(&self, event: &RunEvent) {
        match event {
            RunEvent::AssertionFailed {
                case,
                step_index,
                expected,
                actual,
                ..
            } => warn!(%case, step_index, %expected, %actual, "{event}"),
            RunEvent::StepError {
                case,
                step_index,
                message,
            } => warn!(%case, step_index, %message, "step failed"),
            RunEvent::RunCancelled { case } => warn!(%case, "run cancelled"),
            _ => info!("{event}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> RunEvent {
        RunEvent::CaseStarted {
            case: "Teams".into(),
        }
    }

    #[test]
    fn test_transcript_clones_share_buffer() {
        let transcript = Transcript::new();
        let handle = transcript.clone();
        transcript.record(&started());
        assert_eq!(handle.len(), 1);
        assert_eq!(handle.events()[0], started());
    }

    #[test]
    fn test_callback_sink() {
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let sink = CallbackSink::new(move |_: &RunEvent| *counter.lock().unwrap() += 1);
        sink.record(&started());
        sink.record(&started());
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut receiver) = ChannelSink::new();
        sink.record(&started());
        assert_eq!(receiver.recv().await, Some(started()));
        drop(receiver);
        sink.record(&started());
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_value(RunEvent::VariableStored {
            name: "x".into(),
            value: "42".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "variable_stored");
        assert_eq!(json["value"], "42");
    }

    #[test]
    fn test_render() {
        let transcript = Transcript::new();
        transcript.record(&started());
        transcript.record(&RunEvent::AssertionFailed {
            case: "Teams".into(),
            step_index: 1,
            command: "Ensure \"Total\" generic to have \"3\".".into(),
            expected: "\"3\"".into(),
            actual: "\"2\"".into(),
        });
        let text = transcript.render();
        assert!(text.starts_with("▶ Teams"));
        assert!(text.contains("expected \"3\", got \"2\""));
    }
}
