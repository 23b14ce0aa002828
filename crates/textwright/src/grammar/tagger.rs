//! Part-of-speech tagging.
//!
//! The extractor only needs a coarse role per word, so tagging is a narrow
//! trait. [`RuleTagger`] is a table-driven implementation that knows the
//! step vocabulary; anything that produces consistent verb, noun, connector
//! and negation tags can be swapped in.

use super::segment::unescaped_quotes;
use serde::{Deserialize, Serialize};

/// Coarse grammatical role of a term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermRole {
    /// Action or assertion verb
    Verb,
    /// Anything that names a thing, including quoted text
    Noun,
    /// One of `with`, `on`, `to`, `into`
    Connector,
    /// Articles and demonstratives
    Determiner,
    /// `not`, `never`, contractions ending in `n't`
    Negation,
    /// `and`, `then`
    Conjunction,
    /// Everything else (prepositions, auxiliaries)
    Other,
}

/// Flags attached to a term
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermTags {
    /// Second half of a hyphenated word (`up` in `Sign-up`)
    pub hyphenated: bool,
    /// Negates the assertion it belongs to
    pub negative: bool,
}

/// A tagged word with its surrounding trivia
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Leading punctuation (opening quotes)
    pub pre: String,
    /// The word itself
    pub text: String,
    /// Trailing punctuation (closing quotes, periods, commas, hyphens)
    pub post: String,
    /// Grammatical role
    pub role: TermRole,
    /// Extra flags
    pub tags: TermTags,
}

impl Term {
    /// Create a term without trivia
    pub fn new(text: impl Into<String>, role: TermRole) -> Self {
        Self {
            pre: String::new(),
            text: text.into(),
            post: String::new(),
            role,
            tags: TermTags::default(),
        }
    }

    /// The word as written, trivia included
    #[must_use]
    pub fn raw(&self) -> String {
        format!("{}{}{}", self.pre, self.text, self.post)
    }

    /// Lower-cased word without trivia
    #[must_use]
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    /// Whether the raw word contains an unescaped double quote
    #[must_use]
    pub fn has_quote(&self) -> bool {
        unescaped_quotes(&self.raw()) > 0
    }
}

/// Tags clauses into terms.
pub trait Tagger: Send + Sync {
    /// Tag one clause.
    fn tag(&self, clause: &str) -> Vec<Term>;

    /// Split a tagged clause where a conjunction joins two instructions.
    ///
    /// The split happens at `then`/`and` outside quotes when the next term
    /// is a verb. Conjunctions left dangling at the end of a part are
    /// dropped.
    fn split_clauses(&self, terms: Vec<Term>) -> Vec<Vec<Term>> {
        let mut parts = Vec::new();
        let mut current: Vec<Term> = Vec::new();
        let mut in_quote = false;

        for (idx, term) in terms.iter().enumerate() {
            let starts_new = !in_quote
                && term.role == TermRole::Conjunction
                && terms.get(idx + 1).is_some_and(|next| next.role == TermRole::Verb);

            if unescaped_quotes(&term.raw()) % 2 == 1 {
                in_quote = !in_quote;
            }

            if starts_new {
                trim_conjunctions(&mut current);
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push(term.clone());
        }

        trim_conjunctions(&mut current);
        if !current.is_empty() {
            parts.push(current);
        }
        parts
    }
}

fn trim_conjunctions(terms: &mut Vec<Term>) {
    while terms.last().is_some_and(|t| t.role == TermRole::Conjunction) {
        terms.pop();
    }
}

const VERBS: &[&str] = &[
    "click", "hover", "fill", "ensure", "store", "slide", "have", "has", "be", "is", "equal",
    "equals", "contain", "contains", "include", "includes", "match", "matches", "exist", "exists",
];
const CONNECTORS: &[&str] = &["with", "on", "to", "into"];
const DETERMINERS: &[&str] = &["the", "a", "an", "this", "that"];
const NEGATIONS: &[&str] = &["not", "never"];
const CONJUNCTIONS: &[&str] = &["and", "then"];
const OTHER: &[&str] = &[
    "of", "in", "at", "for", "from", "by", "does", "do", "should", "must", "will", "also",
];

/// Trailing characters split off into `post`
const TRAILING: &[char] = &['"', '.', ',', '!', '?', ';', ':'];

/// Lexicon-driven tagger for step sentences
#[derive(Debug, Clone, Default)]
pub struct RuleTagger;

impl RuleTagger {
    /// Create a tagger
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn role_for(word: &str, first: bool, quoted: bool) -> (TermRole, bool) {
        if quoted {
            return (TermRole::Noun, false);
        }
        let lower = word.to_lowercase();
        let lower = lower.as_str();
        if NEGATIONS.contains(&lower) || lower.ends_with("n't") {
            return (TermRole::Negation, true);
        }
        let role = if VERBS.contains(&lower) {
            TermRole::Verb
        } else if CONNECTORS.contains(&lower) {
            TermRole::Connector
        } else if DETERMINERS.contains(&lower) {
            TermRole::Determiner
        } else if CONJUNCTIONS.contains(&lower) {
            TermRole::Conjunction
        } else if OTHER.contains(&lower) {
            TermRole::Other
        } else if first {
            // Imperative sentences open with their verb.
            TermRole::Verb
        } else {
            TermRole::Noun
        };
        (role, false)
    }
}

impl Tagger for RuleTagger {
    fn tag(&self, clause: &str) -> Vec<Term> {
        let mut terms = Vec::new();
        let mut in_quote = false;

        for word in clause.split_whitespace() {
            let quotes = unescaped_quotes(word);
            let quoted = in_quote || quotes > 0;
            if quotes % 2 == 1 {
                in_quote = !in_quote;
            }

            let pre_len = word.len() - word.trim_start_matches('"').len();
            let (pre, rest) = word.split_at(pre_len);
            let text_len = rest.trim_end_matches(TRAILING).len();
            let (text, post) = rest.split_at(text_len);

            let first = terms.is_empty();
            let pieces = split_hyphenated(text);
            let last_piece = pieces.len() - 1;
            for (idx, piece) in pieces.into_iter().enumerate() {
                let (role, negative) = Self::role_for(piece, first && idx == 0, quoted);
                terms.push(Term {
                    pre: if idx == 0 { pre.to_string() } else { String::new() },
                    text: piece.to_string(),
                    post: if idx == last_piece {
                        post.to_string()
                    } else {
                        "-".to_string()
                    },
                    role,
                    tags: TermTags {
                        hyphenated: idx > 0,
                        negative,
                    },
                });
            }
        }

        terms
    }
}

/// Split `Sign-up` into `Sign` and `up`; other words come back whole.
fn split_hyphenated(text: &str) -> Vec<&str> {
    let parts: Vec<&str> = text.split('-').collect();
    let is_word = |p: &&str| !p.is_empty() && p.chars().all(char::is_alphanumeric);
    if parts.len() > 1 && parts.iter().all(is_word) {
        parts
    } else {
        vec![text]
    }
}
