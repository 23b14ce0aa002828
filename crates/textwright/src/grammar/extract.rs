//! Field extraction from tagged terms.
//!
//! A clause is scanned once into segments: runs of verbs, runs of nouns
//! (a quoted span always lands in a noun run), and connector segments that
//! open at `with`, `on`, `to` or `into` and absorb everything up to the
//! next connector. The first three positional segments become `action`,
//! `object` and `elementType`; connector segments fill the optional fields.

use super::alias;
use super::command::{Action, AssertBehavior, Command, ValueBehavior};
use super::segment::unescaped_quotes;
use super::tagger::{Term, TermRole};
use super::ValidationError;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connector {
    With,
    On,
    To,
    Into,
}

impl Connector {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "with" => Some(Self::With),
            "on" => Some(Self::On),
            "to" => Some(Self::To),
            "into" => Some(Self::Into),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::With => "with",
            Self::On => "on",
            Self::To => "to",
            Self::Into => "into",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Verb(Vec<String>),
    Noun(Vec<String>),
    Connector(Connector, Vec<String>),
}

impl Segment {
    fn words_mut(&mut self) -> &mut Vec<String> {
        match self {
            Self::Verb(words) | Self::Noun(words) | Self::Connector(_, words) => words,
        }
    }

    /// Append a word; the second half of a hyphenated word is glued on.
    fn push(&mut self, word: &str, hyphenated: bool) {
        let words = self.words_mut();
        match words.last_mut() {
            Some(last) if hyphenated && last.ends_with('-') => last.push_str(word),
            _ => words.push(word.to_string()),
        }
    }

    const fn is_positional(&self) -> bool {
        !matches!(self, Self::Connector(..))
    }
}

/// Where the scanner is inside the clause
#[derive(Debug)]
enum ScanState {
    /// No segment open
    Between,
    /// A segment is accepting words
    Open(Segment),
    /// Inside a quoted span belonging to the segment
    Quoted(Segment),
}

#[derive(Debug)]
struct Accumulator {
    state: ScanState,
    closed: Vec<Segment>,
    negated: bool,
}

impl Accumulator {
    const fn new() -> Self {
        Self {
            state: ScanState::Between,
            closed: Vec::new(),
            negated: false,
        }
    }

    fn close(&mut self, state: ScanState) {
        if let ScanState::Open(segment) | ScanState::Quoted(segment) = state {
            self.closed.push(segment);
        }
    }

    /// A quoted span just ended: positional segments end with it.
    fn quote_closed(&mut self, segment: Segment) -> ScanState {
        if segment.is_positional() {
            self.closed.push(segment);
            ScanState::Between
        } else {
            ScanState::Open(segment)
        }
    }

    fn feed(&mut self, terms: &[Term], idx: usize) -> usize {
        let term = &terms[idx];
        let next = terms.get(idx + 1);
        let raw = term.raw();
        let odd_quotes = unescaped_quotes(&raw) % 2 == 1;
        let mut consumed = 1;

        let state = std::mem::replace(&mut self.state, ScanState::Between);
        self.state = match state {
            ScanState::Quoted(mut segment) => {
                segment.push(&raw, term.tags.hyphenated);
                if odd_quotes {
                    self.quote_closed(segment)
                } else {
                    ScanState::Quoted(segment)
                }
            }
            state if term.has_quote() => {
                let mut segment = match state {
                    ScanState::Open(segment @ (Segment::Noun(_) | Segment::Connector(..))) => {
                        segment
                    }
                    other => {
                        self.close(other);
                        Segment::Noun(Vec::new())
                    }
                };
                segment.push(&raw, term.tags.hyphenated);
                if odd_quotes {
                    ScanState::Quoted(segment)
                } else {
                    self.quote_closed(segment)
                }
            }
            state if opens_connector(term, next) => {
                self.close(state);
                let lower = term.lower();
                match Connector::from_word(&lower) {
                    Some(connector) => ScanState::Open(Segment::Connector(connector, vec![lower])),
                    None => ScanState::Between,
                }
            }
            state if term.role == TermRole::Negation || term.tags.negative => {
                self.negated = true;
                state
            }
            state => {
                let (word, role) = match next.and_then(|n| substitute(term, n)) {
                    Some(replacement) => {
                        consumed = 2;
                        (replacement.to_string(), TermRole::Noun)
                    }
                    None => (raw, term.role),
                };
                let hyphenated = consumed == 1 && term.tags.hyphenated;

                match (state, role) {
                    (ScanState::Open(mut segment @ Segment::Connector(..)), _)
                    | (ScanState::Open(mut segment @ Segment::Verb(_)), TermRole::Verb)
                    | (ScanState::Open(mut segment @ Segment::Noun(_)), TermRole::Noun) => {
                        segment.push(&word, hyphenated);
                        ScanState::Open(segment)
                    }
                    (state, TermRole::Verb) => {
                        self.close(state);
                        ScanState::Open(Segment::Verb(vec![word]))
                    }
                    (state, TermRole::Noun) => {
                        self.close(state);
                        ScanState::Open(Segment::Noun(vec![word]))
                    }
                    (state, _) => state,
                }
            }
        };

        consumed
    }
}

fn opens_connector(term: &Term, next: Option<&Term>) -> bool {
    Connector::from_word(&term.lower()).is_some()
        && (term.role == TermRole::Connector || next.is_some_and(|n| n.lower() == "the"))
}

fn substitute(term: &Term, next: &Term) -> Option<&'static str> {
    if term.has_quote() || next.has_quote() || !term.post.is_empty() {
        return None;
    }
    alias::phrase(&term.text, &next.text)
}

/// Extract a validated command from one tagged clause.
pub fn extract(terms: &[Term]) -> Result<Command, ValidationError> {
    let clause = terms.iter().map(Term::raw).collect::<Vec<_>>().join(" ");

    let mut acc = Accumulator::new();
    let mut idx = 0;
    while idx < terms.len() {
        idx += acc.feed(terms, idx);
    }
    let state = std::mem::replace(&mut acc.state, ScanState::Between);
    if matches!(state, ScanState::Quoted(_)) {
        return Err(ValidationError::UnterminatedQuote { clause });
    }
    acc.close(state);

    let mut positional = Vec::new();
    let mut connectors = Vec::new();
    for segment in acc.closed {
        match segment {
            Segment::Verb(words) | Segment::Noun(words) => positional.push(words),
            Segment::Connector(connector, words) => connectors.push((connector, words)),
        }
    }

    if positional.len() < 3 {
        return Err(ValidationError::MissingSegments {
            found: positional.len(),
            clause,
        });
    }
    if let Some(extra) = positional.get(3) {
        return Err(ValidationError::ExtraSegment {
            segment: extra.join(" "),
            clause,
        });
    }

    let action_word = strip_punct(&positional[0].join(" ")).to_lowercase();
    let action = Action::from_word(&action_word).ok_or_else(|| ValidationError::UnknownAction {
        action: action_word.clone(),
        clause: clause.clone(),
    })?;

    let object_text = positional[1].join(" ");
    let object = quoted_content(&object_text).unwrap_or_else(|| strip_punct(&object_text).to_string());

    let role_word = strip_punct(&positional[2].join(" ")).to_string();
    let element_type = match alias::canonical_role(&role_word.replace('-', "")) {
        Some(role) => role.to_string(),
        None if action == Action::Ensure => "generic".to_string(),
        None => {
            return Err(ValidationError::UnknownRole {
                role: role_word,
                clause,
            })
        }
    };

    let mut command = Command::new(action, object, element_type);
    command.is_negative_assertion = acc.negated;

    for (connector, words) in connectors {
        let rest = &words[1..];
        match connector {
            Connector::On => apply_scope(&mut command, rest, &clause)?,
            Connector::With => apply_value(&mut command, rest, &clause)?,
            Connector::To | Connector::Into => match command.action {
                Action::Slide => apply_slide_target(&mut command, rest, &clause)?,
                Action::Store => apply_store_target(&mut command, rest, &clause)?,
                Action::Ensure => apply_assertion(&mut command, rest, &clause)?,
                other => {
                    return Err(ValidationError::UnexpectedConnector {
                        keyword: connector.as_str().to_string(),
                        action: other,
                        clause,
                    })
                }
            },
        }
    }

    if command.action == Action::Ensure && command.assert_behavior.is_none() {
        return Err(ValidationError::MissingField {
            field: "assertBehavior",
            action: command.action,
            clause,
        });
    }
    command.validate(&clause)?;
    Ok(command)
}

const DETERMINERS: &[&str] = &["the", "a", "an"];
const DESCRIPTORS: &[&str] = &["value", "text", "number", "content", "variable"];

fn skip_determiners(words: &[String]) -> &[String] {
    let start = words
        .iter()
        .position(|w| !DETERMINERS.contains(&w.to_lowercase().as_str()))
        .unwrap_or(words.len());
    &words[start..]
}

fn missing(field: &'static str, command: &Command, clause: &str) -> ValidationError {
    ValidationError::MissingField {
        field,
        action: command.action,
        clause: clause.to_string(),
    }
}

/// `on [the] <specifier>`
fn apply_scope(command: &mut Command, rest: &[String], clause: &str) -> Result<(), ValidationError> {
    let text = skip_determiners(rest).join(" ");
    let text = text.trim();

    if text.starts_with('"') {
        let title = quoted_content(text).ok_or_else(|| missing("specifier", command, clause))?;
        command.specifier = Some(title);
        command.is_section = true;
        return Ok(());
    }

    let specifier = strip_punct(text);
    if specifier.is_empty() {
        return Err(missing("specifier", command, clause));
    }
    let starts_lowercase = specifier.chars().next().is_some_and(char::is_lowercase);
    let specifier = if starts_lowercase {
        alias::canonical_region(specifier).unwrap_or(specifier)
    } else {
        specifier
    };
    command.specifier = Some(specifier.to_string());
    Ok(())
}

/// `with [descriptor] "<value>"`
fn apply_value(command: &mut Command, rest: &[String], clause: &str) -> Result<(), ValidationError> {
    let text = rest.join(" ");
    if let Some(value) = quoted_content(&text) {
        command.value = Some(value);
        return Ok(());
    }

    let words = skip_determiners(rest);
    let words = match words.split_first() {
        Some((first, tail)) if !tail.is_empty() && DESCRIPTORS.contains(&first.to_lowercase().as_str()) => tail,
        _ => words,
    };
    let value = strip_punct(&words.join(" ")).to_string();
    if value.is_empty() {
        return Err(missing("value", command, clause));
    }
    command.value = Some(value);
    Ok(())
}

/// `to [value] "<number>"`
fn apply_slide_target(command: &mut Command, rest: &[String], clause: &str) -> Result<(), ValidationError> {
    let text = rest.join(" ");
    let value = quoted_content(&text)
        .or_else(|| rest.last().map(|w| strip_punct(w).to_string()))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing("value", command, clause))?;
    command.value = Some(value);
    Ok(())
}

/// `into variable {name}` or `into variable "name"`
fn apply_store_target(command: &mut Command, rest: &[String], clause: &str) -> Result<(), ValidationError> {
    let text = rest.join(" ");
    let name = quoted_content(&text)
        .or_else(|| {
            rest.last()
                .map(|w| strip_punct(w).trim_matches(|c| c == '{' || c == '}').to_string())
        })
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| missing("variableName", command, clause))?;
    command.variable_name = Some(name);
    Ok(())
}

/// `to [not] <behavior> [descriptor] <operand>`
fn apply_assertion(command: &mut Command, rest: &[String], clause: &str) -> Result<(), ValidationError> {
    let lower: Vec<String> = rest.iter().map(|w| strip_punct(w).to_lowercase()).collect();
    let first = lower
        .first()
        .ok_or_else(|| missing("assertBehavior", command, clause))?;

    let (behavior, mut idx) = if first == "be" && lower.get(1).is_some_and(|w| w == "visible") {
        (AssertBehavior::Exist, 2)
    } else {
        let behavior = alias::assert_behavior(first).ok_or_else(|| ValidationError::UnknownAssertion {
            word: first.clone(),
            clause: clause.to_string(),
        })?;
        (behavior, 1)
    };
    command.assert_behavior = Some(behavior);
    command.value_behavior = Some(ValueBehavior::Plain);
    if behavior == AssertBehavior::Exist {
        return Ok(());
    }

    let pair = (
        lower.get(idx).map(String::as_str),
        lower.get(idx + 1).map(String::as_str),
    );
    match pair {
        (Some("accessible"), Some("description")) => {
            command.value_behavior = Some(ValueBehavior::Accessible);
            idx += 2;
        }
        (Some("error"), Some("message")) => {
            command.value_behavior = Some(ValueBehavior::Error);
            idx += 2;
        }
        (Some(_), Some(_)) if !is_operand(&rest[idx]) => idx += 1,
        _ => {}
    }

    let tail = rest.get(idx..).unwrap_or_default().join(" ");
    let tail = tail.trim();
    if tail.is_empty() {
        return Err(missing("value", command, clause));
    }

    let quoted = quoted_content(tail);
    let unquoted = strip_clause_end(tail);

    if behavior == AssertBehavior::Match {
        let source = quoted.clone().unwrap_or_else(|| unquoted.to_string());
        if let Some(pattern) = regex_literal(&source, clause)? {
            command.value = Some(pattern);
            return Ok(());
        }
    }
    if quoted.is_none() && is_variable_reference(unquoted) {
        command.variable_name = Some(unquoted[1..unquoted.len() - 1].trim().to_string());
        return Ok(());
    }

    let value = quoted.unwrap_or_else(|| strip_punct(unquoted).to_string());
    if behavior == AssertBehavior::Match {
        compile_check(&value, clause)?;
    }
    command.value = Some(value);
    Ok(())
}

fn is_operand(word: &str) -> bool {
    word.starts_with(['"', '{', '/'])
}

fn is_variable_reference(text: &str) -> bool {
    text.len() > 2
        && text.starts_with('{')
        && text.ends_with('}')
        && !text[1..text.len() - 1].contains(['{', '}'])
}

/// Turn `/source/flags` into a regex source string, `None` when `text`
/// is not slash-delimited.
fn regex_literal(text: &str, clause: &str) -> Result<Option<String>, ValidationError> {
    let Some(body) = text.strip_prefix('/') else {
        return Ok(None);
    };
    let Some(end) = body.rfind('/') else {
        return Ok(None);
    };
    let (source, flags) = (&body[..end], &body[end + 1..]);

    let mut inline = String::new();
    for flag in flags.chars() {
        match flag {
            'i' | 'm' | 's' => inline.push(flag),
            'g' | 'u' | 'y' => {}
            _ => {
                return Err(ValidationError::InvalidRegex {
                    pattern: text.to_string(),
                    message: format!("unsupported flag '{flag}'"),
                    clause: clause.to_string(),
                })
            }
        }
    }
    let pattern = if inline.is_empty() {
        source.to_string()
    } else {
        format!("(?{inline}){source}")
    };
    compile_check(&pattern, clause)?;
    Ok(Some(pattern))
}

fn compile_check(pattern: &str, clause: &str) -> Result<(), ValidationError> {
    Regex::new(pattern)
        .map(drop)
        .map_err(|e| ValidationError::InvalidRegex {
            pattern: pattern.to_string(),
            message: e.to_string(),
            clause: clause.to_string(),
        })
}

/// Text between the first and last unescaped quote, with `\"` unescaped.
pub(crate) fn quoted_content(text: &str) -> Option<String> {
    let mut positions = Vec::new();
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => positions.push(idx),
            _ => {}
        }
    }
    match (positions.first(), positions.last()) {
        (Some(&start), Some(&end)) if start < end => Some(text[start + 1..end].replace("\\\"", "\"")),
        _ => None,
    }
}

fn strip_punct(text: &str) -> &str {
    text.trim().trim_matches(|c| c == '.' || c == ',' || c == '"').trim()
}

fn strip_clause_end(text: &str) -> &str {
    text.strip_suffix('.').unwrap_or(text).trim()
}
