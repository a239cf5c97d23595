//! Multi-rule longest-match tokenizer and its builder.

use crate::dfa::Dfa;
use crate::minimize::minimize;
use crate::nfa::{Nfa, PatternError};
use crate::regex;
use crate::types::Set;
use std::fmt;

/// A token produced by [`Tokenizer::tokenize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'input> {
    /// Name of the rule that matched.
    pub kind: String,
    /// The matched lexeme, borrowed from the input.
    pub text: &'input str,
    /// 0-based byte offset of the lexeme in the input.
    pub position: usize,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} @{}", self.kind, self.text, self.position)
    }
}

/// A compiled scanning rule: a minimized DFA tagged with its token name.
///
/// Higher `priority` wins when two rules match lexemes of equal length.
#[derive(Debug)]
pub struct TokenRule {
    dfa: Dfa,
    name: String,
    priority: u16,
}

impl TokenRule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn priority(&self) -> u16 {
        self.priority
    }

    /// Length in bytes of the longest prefix of `input[start..]` this rule
    /// accepts. Zero means no match.
    fn longest_accept(&self, input: &str, start: usize) -> usize {
        let mut state = self.dfa.start();
        let mut matched = 0;
        for (offset, c) in input[start..].char_indices() {
            match self.dfa.state(state).transition(c) {
                Some(next) => {
                    state = next;
                    if self.dfa.state(state).is_accepting() {
                        matched = offset + c.len_utf8();
                    }
                }
                None => break,
            }
        }
        matched
    }
}

/// No rule matched at `position`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no valid token at position {position} for character '{character}'")]
pub struct LexError {
    pub position: usize,
    pub character: char,
}

/// A token rule failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("error processing token rule {name} with regex {pattern}")]
pub struct BuildError {
    pub name: String,
    pub pattern: String,
    #[source]
    pub source: PatternError,
}

/// A longest-match scanner over a set of compiled [`TokenRule`]s.
///
/// Immutable once built; `tokenize` keeps all cursor state on the stack, so
/// one tokenizer can serve concurrent scans.
#[derive(Debug, Default)]
pub struct Tokenizer {
    rules: Vec<TokenRule>,
}

impl Tokenizer {
    pub fn rules(&self) -> &[TokenRule] {
        &self.rules
    }

    /// Split `input` into tokens, left to right.
    ///
    /// At every position the longest nonzero match wins; equal lengths fall
    /// back to the highest rule priority. A position where no rule matches
    /// aborts the scan with a [`LexError`]. Empty input yields no tokens.
    pub fn tokenize<'input>(&self, input: &'input str) -> Result<Vec<Token<'input>>, LexError> {
        let mut tokens = Vec::new();
        let mut position = 0;

        while position < input.len() {
            match self.longest_match(input, position) {
                Some((rule, length)) => {
                    tokens.push(Token {
                        kind: rule.name.clone(),
                        text: &input[position..position + length],
                        position,
                    });
                    position += length;
                }
                None => {
                    let character = match input[position..].chars().next() {
                        Some(c) => c,
                        None => break,
                    };
                    return Err(LexError {
                        position,
                        character,
                    });
                }
            }
        }

        Ok(tokens)
    }

    fn longest_match(&self, input: &str, start: usize) -> Option<(&TokenRule, usize)> {
        let mut best: Option<(&TokenRule, usize)> = None;
        for rule in &self.rules {
            let length = rule.longest_accept(input, start);
            if length == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_rule, best_length)) => {
                    length > best_length
                        || (length == best_length && rule.priority > best_rule.priority)
                }
            };
            if better {
                best = Some((rule, length));
            }
        }
        best
    }
}

const INITIAL_PRIORITY: u16 = 1000;

/// Assembles a [`Tokenizer`] from named regex rules over an explicit
/// alphabet.
///
/// Rules declared earlier receive a higher priority, so with equal match
/// lengths the first declaration wins.
#[derive(Debug)]
pub struct LexerBuilder {
    alphabet: Set<char>,
    rules: Vec<(String, String)>,
}

impl LexerBuilder {
    pub fn new(alphabet: impl IntoIterator<Item = char>) -> Self {
        Self {
            alphabet: alphabet.into_iter().collect(),
            rules: Vec::new(),
        }
    }

    /// Append a rule. Insertion order decides tie-break priority.
    pub fn rule(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.rules.push((name.into(), pattern.into()));
        self
    }

    /// Run every rule through the full pipeline and register it.
    #[tracing::instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn build(self) -> Result<Tokenizer, BuildError> {
        let mut tokenizer = Tokenizer::default();
        let mut priority = INITIAL_PRIORITY;

        for (name, pattern) in self.rules {
            let dfa = compile(&pattern, &self.alphabet).map_err(|source| BuildError {
                name: name.clone(),
                pattern: pattern.clone(),
                source,
            })?;
            tracing::debug!(rule = %name, states = dfa.len(), "compiled token rule");
            tokenizer.rules.push(TokenRule {
                dfa,
                name,
                priority,
            });
            priority = priority.saturating_sub(1);
        }

        Ok(tokenizer)
    }
}

/// One pattern through the whole chain: explicit concatenation, postfix,
/// Thompson construction, subset construction, minimization.
fn compile(pattern: &str, alphabet: &Set<char>) -> Result<Dfa, PatternError> {
    let postfix = regex::to_postfix(pattern);
    tracing::trace!(%pattern, %postfix, "preprocessed pattern");
    let nfa = Nfa::from_postfix(&postfix)?;
    let dfa = Dfa::subset(&nfa, alphabet);
    Ok(minimize(&dfa, alphabet))
}
