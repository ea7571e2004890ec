//! Event-name grammar
//!
//! ```text
//! spec      := step (' '+ step)*
//! step      := token ('-' token)*        simultaneous chord
//!            | token ('->' token)+       precise (press-ordered) chord
//! token     := segment (':' segment)*    namespaced name
//! segment   := bare | '"' any '"'
//! ```
//!
//! Separators inside double quotes are literal, so `speech:"turn left"` is one
//! token. Empty tokens produced by doubled separators (`ctrl--`) are the
//! literal `-` key. Parsing never fails; [`EventSpec::problems`] reports
//! anything suspicious for callers that want to validate user input.

use std::fmt;

use crate::names::{compare_names, ModifierClass};

pub const CHORD_JOIN: &str = "-";
pub const PRECISE_JOIN: &str = "->";
pub const SEQUENCE_JOIN: &str = " ";
pub const NAMESPACE_SEP: &str = ":";

/// One step of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chord {
    /// Members are pressed together; order is irrelevant once canonicalized
    Simultaneous(Vec<String>),
    /// Members were pressed in exactly this order
    Precise(Vec<String>),
}

impl Chord {
    pub fn tokens(&self) -> &[String] {
        match self {
            Chord::Simultaneous(tokens) | Chord::Precise(tokens) => tokens,
        }
    }

    pub fn is_precise(&self) -> bool {
        matches!(self, Chord::Precise(_))
    }

    fn canonicalize(self) -> Self {
        match self {
            Chord::Simultaneous(tokens) if tokens.len() > 1 => {
                let mut tokens: Vec<String> = tokens
                    .into_iter()
                    .map(|token| match ModifierClass::normalize_alias(&token) {
                        Some(class) => class.to_string(),
                        None => token,
                    })
                    .collect();
                tokens.sort_by(|a, b| compare_names(a, b));
                Chord::Simultaneous(tokens)
            }
            other => other,
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chord::Simultaneous(tokens) => f.write_str(&tokens.join(CHORD_JOIN)),
            Chord::Precise(tokens) => f.write_str(&tokens.join(PRECISE_JOIN)),
        }
    }
}

/// Something [`EventSpec::parse`] accepted but a user probably did not mean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarProblem {
    Empty,
    UnclosedQuote,
    EmptyNamespaceSegment { token: String },
}

impl fmt::Display for GrammarProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarProblem::Empty => write!(f, "event name is empty"),
            GrammarProblem::UnclosedQuote => write!(f, "unclosed quote"),
            GrammarProblem::EmptyNamespaceSegment { token } => {
                write!(f, "empty ':' segment in '{}'", token)
            }
        }
    }
}

/// A parsed event name: a sequence of one or more chords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    steps: Vec<Chord>,
    unclosed_quote: bool,
}

impl EventSpec {
    pub fn parse(input: &str) -> Self {
        let steps = split_sequence(input)
            .into_iter()
            .map(parse_step)
            .collect();
        Self {
            steps,
            unclosed_quote: input.matches('"').count() % 2 == 1,
        }
    }

    pub fn steps(&self) -> &[Chord] {
        &self.steps
    }

    pub fn is_sequence(&self) -> bool {
        self.steps.len() > 1
    }

    /// Replace platform modifier spellings and sort every simultaneous chord,
    /// so differently written names for the same chord render identically.
    pub fn canonicalize(self) -> Self {
        Self {
            steps: self.steps.into_iter().map(Chord::canonicalize).collect(),
            unclosed_quote: self.unclosed_quote,
        }
    }

    pub fn problems(&self) -> Vec<GrammarProblem> {
        let mut problems = Vec::new();
        if self.steps.is_empty() {
            problems.push(GrammarProblem::Empty);
        }
        if self.unclosed_quote {
            problems.push(GrammarProblem::UnclosedQuote);
        }
        for token in self.steps.iter().flat_map(|step| step.tokens()) {
            if token.contains(NAMESPACE_SEP) && namespace_segments(token).iter().any(|s| s.is_empty()) {
                problems.push(GrammarProblem::EmptyNamespaceSegment {
                    token: token.clone(),
                });
            }
        }
        problems
    }
}

impl fmt::Display for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(SEQUENCE_JOIN)?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Lowercase, parse, canonicalize and render `name`.
pub fn canonical_name(name: &str) -> String {
    EventSpec::parse(&name.to_lowercase()).canonicalize().to_string()
}

/// Split a sequence into its steps. Runs of spaces count as one separator and
/// quoted spaces are kept.
pub fn split_sequence(input: &str) -> Vec<&str> {
    split_outside_quotes(input, SEQUENCE_JOIN)
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Split a token on `:` outside quotes.
pub fn namespace_segments(token: &str) -> Vec<&str> {
    split_outside_quotes(token, NAMESPACE_SEP)
}

fn parse_step(step: &str) -> Chord {
    let precise = split_outside_quotes(step, PRECISE_JOIN);
    if precise.len() > 1 {
        return Chord::Precise(collapse_empty(precise));
    }
    Chord::Simultaneous(collapse_empty(split_outside_quotes(step, CHORD_JOIN)))
}

/// Every run of empty pieces becomes one literal `-` token.
fn collapse_empty(pieces: Vec<&str>) -> Vec<String> {
    let mut tokens = Vec::with_capacity(pieces.len());
    let mut in_gap = false;
    for piece in pieces {
        if piece.is_empty() {
            if !in_gap {
                tokens.push(CHORD_JOIN.to_string());
                in_gap = true;
            }
        } else {
            tokens.push(piece.to_string());
            in_gap = false;
        }
    }
    tokens
}

fn split_outside_quotes<'a>(input: &'a str, sep: &str) -> Vec<&'a str> {
    let bytes = input.as_bytes();
    let sep = sep.as_bytes();
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            in_quotes = !in_quotes;
            i += 1;
        } else if !in_quotes && bytes[i..].starts_with(sep) {
            pieces.push(&input[start..i]);
            i += sep.len();
            start = i;
        } else {
            i += 1;
        }
    }
    pieces.push(&input[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(chord: &Chord) -> Vec<&str> {
        chord.tokens().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_simultaneous_chord() {
        let spec = EventSpec::parse("ctrl-shift-a");
        assert_eq!(spec.steps().len(), 1);
        assert!(!spec.steps()[0].is_precise());
        assert_eq!(tokens(&spec.steps()[0]), vec!["ctrl", "shift", "a"]);
    }

    #[test]
    fn test_parse_precise_chord() {
        let spec = EventSpec::parse("a->ctrl->shift");
        assert!(spec.steps()[0].is_precise());
        assert_eq!(tokens(&spec.steps()[0]), vec!["a", "ctrl", "shift"]);
    }

    #[test]
    fn test_parse_sequence_collapses_spaces() {
        let spec = EventSpec::parse("ctrl-a   b  c");
        assert!(spec.is_sequence());
        assert_eq!(spec.steps().len(), 3);
        assert_eq!(spec.to_string(), "ctrl-a b c");
    }

    #[test]
    fn test_quoted_separators_are_literal() {
        let spec = EventSpec::parse("speech:\"turn - left\" a");
        assert_eq!(spec.steps().len(), 2);
        assert_eq!(tokens(&spec.steps()[0]), vec!["speech:\"turn - left\""]);
    }

    #[test]
    fn test_literal_dash_token() {
        let spec = EventSpec::parse("ctrl--");
        assert_eq!(tokens(&spec.steps()[0]), vec!["ctrl", "-"]);
        assert_eq!(spec.to_string(), "ctrl--");
        assert_eq!(tokens(&EventSpec::parse("-").steps()[0]), vec!["-"]);
    }

    #[test]
    fn test_canonicalize_orders_and_renames() {
        assert_eq!(canonical_name("shift-ctrl-a"), "ctrl-shift-a");
        assert_eq!(canonical_name("A-⌘-Control"), "ctrl-os-a");
        assert_eq!(canonical_name("b-option-a"), "alt-a-b");
        assert_eq!(canonical_name("a-⇧"), "shift-a");
        assert_eq!(canonical_name("⇧-⌥-x"), canonical_name("shift-alt-x"));
        assert_eq!(canonical_name("b a-shift"), "b shift-a");
    }

    #[test]
    fn test_canonicalize_leaves_precise_and_single_alone() {
        assert_eq!(canonical_name("shift->ctrl->a"), "shift->ctrl->a");
        assert_eq!(canonical_name("control"), "control");
    }

    #[test]
    fn test_namespace_segments() {
        assert_eq!(namespace_segments("pointer:left:down"), vec!["pointer", "left", "down"]);
        assert_eq!(namespace_segments("speech:\"a:b\""), vec!["speech", "\"a:b\""]);
    }

    #[test]
    fn test_problems() {
        assert!(EventSpec::parse("ctrl-a b").problems().is_empty());
        assert_eq!(EventSpec::parse("   ").problems(), vec![GrammarProblem::Empty]);
        assert_eq!(
            EventSpec::parse("speech:\"hello").problems(),
            vec![GrammarProblem::UnclosedQuote]
        );
        assert_eq!(
            EventSpec::parse("pointer::down").problems(),
            vec![GrammarProblem::EmptyNamespaceSegment {
                token: "pointer::down".to_string()
            }]
        );
    }
}
