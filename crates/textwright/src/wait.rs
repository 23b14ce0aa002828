//! Navigation waits.
//!
//! A `waitForURL` step polls the page URL until it matches, then (when a
//! `pageTitle` is given) polls the title the same way. Patterns are
//! literal, glob (`*` wildcards) or `/regex/` with optional flags.

use crate::backend::UiBackend;
use crate::result::{TextwrightError, TextwrightResult};
use regex::Regex;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for navigation waits (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// PATTERNS
// =============================================================================

/// Pattern for matching URLs and page titles
#[derive(Debug, Clone)]
pub enum MatchPattern {
    /// Exact match
    Exact(String),
    /// Glob pattern (e.g., "**/teams/*")
    Glob(String),
    /// Regex match
    Regex(Regex),
}

impl MatchPattern {
    /// Parse a pattern written in a test file.
    ///
    /// `/source/flags` is a regex, text containing `*` is a glob, anything
    /// else is matched exactly.
    pub fn parse(text: &str) -> TextwrightResult<Self> {
        if let Some(body) = text.strip_prefix('/') {
            if let Some(end) = body.rfind('/') {
                let (source, flags) = (&body[..end], &body[end + 1..]);
                let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
                let source = if inline.is_empty() {
                    source.to_string()
                } else {
                    format!("(?{inline}){source}")
                };
                return Regex::new(&source)
                    .map(Self::Regex)
                    .map_err(|e| TextwrightError::InvalidPattern {
                        pattern: text.to_string(),
                        message: e.to_string(),
                    });
            }
        }
        if text.contains('*') {
            Ok(Self::Glob(text.to_string()))
        } else {
            Ok(Self::Exact(text.to_string()))
        }
    }

    /// Check if text matches this pattern
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(pattern) => text == pattern,
            Self::Glob(pattern) => Self::glob_matches(pattern, text),
            Self::Regex(re) => re.is_match(text),
        }
    }

    /// Simple glob matching: `*` (and `**`) match any run of characters
    fn glob_matches(pattern: &str, text: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        let last = parts.len() - 1;

        let mut pos = 0;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                if !text.starts_with(part) {
                    return false;
                }
                pos = part.len();
            } else if i == last {
                return text.len() >= pos + part.len() && text.ends_with(part);
            } else if let Some(found) = text[pos..].find(part) {
                pos += found + part.len();
            } else {
                return false;
            }
        }

        pattern.ends_with('*') || pos == text.len()
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) | Self::Glob(p) => f.write_str(p),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// =============================================================================
// WAITS
// =============================================================================

/// Wait until the page URL matches `pattern`; returns the matching URL.
pub async fn wait_for_url<B: UiBackend + ?Sized>(
    backend: &B,
    pattern: &MatchPattern,
    options: &WaitOptions,
) -> TextwrightResult<String> {
    let deadline = Instant::now() + options.timeout();
    loop {
        let url = backend.current_url().await?;
        if pattern.matches(&url) {
            debug!(%url, %pattern, "navigation matched");
            return Ok(url);
        }
        if Instant::now() >= deadline {
            return Err(TextwrightError::Timeout {
                what: format!("URL matching {pattern} (last {url})"),
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

/// Wait until the page title matches `pattern`.
///
/// Returns `Ok(Err(last_title))` when the title never matched; a title
/// mismatch is an assertion outcome, not a failure of the wait itself.
pub async fn wait_for_title<B: UiBackend + ?Sized>(
    backend: &B,
    pattern: &MatchPattern,
    options: &WaitOptions,
) -> TextwrightResult<Result<String, String>> {
    let deadline = Instant::now() + options.timeout();
    loop {
        let title = backend.title().await?;
        if pattern.matches(&title) {
            return Ok(Ok(title));
        }
        if Instant::now() >= deadline {
            return Ok(Err(title));
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;

    mod pattern_tests {
        use super::*;

        #[test]
        fn test_parse_kinds() {
            assert!(matches!(MatchPattern::parse("http://a/b").unwrap(), MatchPattern::Exact(_)));
            assert!(matches!(MatchPattern::parse("**/teams/*").unwrap(), MatchPattern::Glob(_)));
            assert!(matches!(MatchPattern::parse("/teams$/").unwrap(), MatchPattern::Regex(_)));
            assert!(MatchPattern::parse("/(/").is_err());
        }

        #[test]
        fn test_glob_matching() {
            let p = MatchPattern::parse("**/teams/*").unwrap();
            assert!(p.matches("http://localhost:3000/teams/42"));
            assert!(!p.matches("http://localhost:3000/users/42"));

            let p = MatchPattern::parse("http://*/home").unwrap();
            assert!(p.matches("http://localhost/home"));
            assert!(!p.matches("http://localhost/home/x"));
            assert!(!p.matches("https://localhost/home"));
        }

        #[test]
        fn test_regex_flags() {
            let p = MatchPattern::parse("/TEAMS/i").unwrap();
            assert!(p.matches("http://x/teams"));
            assert_eq!(p.to_string(), "/(?i)TEAMS/");
        }

        #[test]
        fn test_exact() {
            let p = MatchPattern::parse("Teams").unwrap();
            assert!(p.matches("Teams"));
            assert!(!p.matches("Teams page"));
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test]
        async fn test_url_already_matching() {
            let page = MockBackend::new().with_url("http://localhost/teams");
            let pattern = MatchPattern::parse("**/teams").unwrap();
            let url = wait_for_url(&page, &pattern, &WaitOptions::default()).await.unwrap();
            assert_eq!(url, "http://localhost/teams");
        }

        #[tokio::test]
        async fn test_url_times_out() {
            let page = MockBackend::new().with_url("http://localhost/");
            let pattern = MatchPattern::parse("**/teams").unwrap();
            let options = WaitOptions::new().with_timeout(20).with_poll_interval(5);
            let err = wait_for_url(&page, &pattern, &options).await.unwrap_err();
            assert!(matches!(err, TextwrightError::Timeout { ms: 20, .. }));
        }

        #[tokio::test]
        async fn test_title_mismatch_is_not_an_error() {
            let page = MockBackend::new().with_title("Home");
            let pattern = MatchPattern::parse("Teams").unwrap();
            let options = WaitOptions::new().with_timeout(10).with_poll_interval(5);
            let outcome = wait_for_title(&page, &pattern, &options).await.unwrap();
            assert_eq!(outcome, Err("Home".to_string()));
        }
    }
}
