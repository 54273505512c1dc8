//! Action id patterns for incompatibility and dependency relations.
//!
//! Patterns are deliberately small: prefix plus glob, no regular expressions.
//! Which combinations are valid depends directly on what a pattern matches,
//! so the rules are fixed here and tested on their own:
//!
//! | Token | Meaning |
//! |-------|---------|
//! | `*`   | any run of characters, including none |
//! | `.*`  | same as `*` (legacy spelling found in older catalogs) |
//! | `?`   | exactly one character |
//! | other | itself; a lone `.` is a literal dot |
//!
//! An id matches when it starts with the pattern's literal prefix (everything
//! before the first wildcard) and the remainder of the id glob-matches the
//! remainder of the pattern. A pattern with no wildcard matches only the
//! identical id: `Q1` does not match `Q10`.
//!
//! # Example
//! ```
//! use loadcomb_core::actions::Pattern;
//!
//! let wind = Pattern::new("W.*");
//! assert_eq!(wind.literal_prefix(), "W");
//! assert!(wind.matches("W+X"));
//! assert!(!wind.matches("Q1"));
//!
//! assert!(Pattern::new("Q?").matches("Q1"));
//! assert!(!Pattern::new("Q?").matches("Q10"));
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    Char(char),
    AnyOne,
    AnyRun,
}

/// A compiled action id pattern.
///
/// Serializes as its source string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
}

impl Pattern {
    /// Compile a pattern. Every string is a valid pattern.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut tokens = Vec::with_capacity(source.len());
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            let token = match c {
                '.' if chars.peek() == Some(&'*') => {
                    chars.next();
                    Token::AnyRun
                }
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                other => Token::Char(other),
            };
            // Adjacent runs are equivalent to one
            if token == Token::AnyRun && tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            tokens.push(token);
        }

        Pattern { source, tokens }
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The literal characters before the first wildcard.
    pub fn literal_prefix(&self) -> String {
        self.tokens
            .iter()
            .map_while(|t| match t {
                Token::Char(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    /// Whether the pattern contains no wildcard at all
    pub fn is_exact(&self) -> bool {
        self.tokens.iter().all(|t| matches!(t, Token::Char(_)))
    }

    /// Test an action id against the pattern.
    pub fn matches(&self, id: &str) -> bool {
        let prefix_len = self
            .tokens
            .iter()
            .take_while(|t| matches!(t, Token::Char(_)))
            .count();

        let mut rest = id.chars();
        for token in &self.tokens[..prefix_len] {
            match (token, rest.next()) {
                (Token::Char(expected), Some(actual)) if *expected == actual => {}
                _ => return false,
            }
        }

        let remainder: Vec<char> = rest.collect();
        glob_match(&self.tokens[prefix_len..], &remainder)
    }
}

/// Iterative glob match with single-star backtracking.
fn glob_match(tokens: &[Token], text: &[char]) -> bool {
    let (mut t, mut s) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while s < text.len() {
        match tokens.get(t) {
            Some(Token::AnyRun) => {
                backtrack = Some((t, s));
                t += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                s += 1;
            }
            Some(Token::Char(c)) if *c == text[s] => {
                t += 1;
                s += 1;
            }
            _ => match backtrack {
                Some((star_t, star_s)) => {
                    t = star_t + 1;
                    s = star_s + 1;
                    backtrack = Some((star_t, star_s + 1));
                }
                None => return false,
            },
        }
    }

    tokens[t..].iter().all(|token| *token == Token::AnyRun)
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::new(source)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
