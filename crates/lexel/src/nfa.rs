//! Thompson construction of nondeterministic finite automata.

use crate::regex::{is_operand, CONCAT};
use std::fmt;

/// Handle of a state in the [`Nfa`] arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q#{:03}", self.0)
    }
}

/// An edge out of a state. `symbol == None` is an ε-edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transition {
    pub symbol: Option<char>,
    pub target: StateId,
}

#[derive(Debug)]
pub struct State {
    transitions: Vec<Transition>,
    accepting: bool,
}

impl State {
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// States reachable from here without consuming input.
    pub fn epsilon_targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .iter()
            .filter(|t| t.symbol.is_none())
            .map(|t| t.target)
    }

    /// States reachable from here by consuming `symbol`.
    pub fn targets(&self, symbol: char) -> impl Iterator<Item = StateId> + '_ {
        self.transitions
            .iter()
            .filter(move |t| t.symbol == Some(symbol))
            .map(|t| t.target)
    }
}

/// A nondeterministic finite automaton with a single start and accept state.
///
/// States live in an arena owned by the automaton; transitions refer to them
/// by [`StateId`], so the cyclic graphs produced by `*` and `+` need no
/// shared ownership.
#[derive(Debug)]
pub struct Nfa {
    states: Vec<State>,
    start: StateId,
    accept: StateId,
}

impl Nfa {
    /// Build an NFA from a postfix pattern by Thompson's construction.
    pub fn from_postfix(postfix: &str) -> Result<Self, PatternError> {
        Builder::default().build(postfix)
    }

    pub fn start(&self) -> StateId {
        self.start
    }

    pub fn accept(&self) -> StateId {
        self.accept
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Failure to assemble a postfix pattern into a single automaton.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("operator '{op}' is missing an operand")]
    MissingOperand { op: char },
    #[error("pattern is empty")]
    Empty,
    #[error("pattern leaves {count} unconnected fragments")]
    Unconnected { count: usize },
}

/// A partial automaton on the construction stack.
#[derive(Debug, Copy, Clone)]
struct Fragment {
    start: StateId,
    accept: StateId,
}

#[derive(Debug, Default)]
struct Builder {
    states: Vec<State>,
    stack: Vec<Fragment>,
}

impl Builder {
    fn build(mut self, postfix: &str) -> Result<Nfa, PatternError> {
        for c in postfix.chars() {
            match c {
                CONCAT => self.concat()?,
                '|' => self.union()?,
                '*' => self.star()?,
                '+' => self.plus()?,
                '?' => self.optional()?,
                c if is_operand(c) => self.literal(c),
                // stray parentheses are dropped by the postfix pass
                _ => {}
            }
        }

        let fragment = self.stack.pop().ok_or(PatternError::Empty)?;
        if !self.stack.is_empty() {
            return Err(PatternError::Unconnected {
                count: self.stack.len() + 1,
            });
        }
        Ok(Nfa {
            states: self.states,
            start: fragment.start,
            accept: fragment.accept,
        })
    }

    fn fresh_state(&mut self) -> StateId {
        let id = StateId::new(self.states.len() as u32);
        self.states.push(State {
            transitions: Vec::new(),
            accepting: false,
        });
        id
    }

    fn connect(&mut self, from: StateId, symbol: Option<char>, target: StateId) {
        self.states[from.index()]
            .transitions
            .push(Transition { symbol, target });
    }

    fn set_accepting(&mut self, id: StateId, accepting: bool) {
        self.states[id.index()].accepting = accepting;
    }

    fn pop(&mut self, op: char) -> Result<Fragment, PatternError> {
        self.stack.pop().ok_or(PatternError::MissingOperand { op })
    }

    fn push_fragment(&mut self, start: StateId, accept: StateId) {
        self.set_accepting(accept, true);
        self.stack.push(Fragment { start, accept });
    }

    fn literal(&mut self, c: char) {
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.connect(start, Some(c), accept);
        self.push_fragment(start, accept);
    }

    fn concat(&mut self) -> Result<(), PatternError> {
        let b = self.pop(CONCAT)?;
        let a = self.pop(CONCAT)?;
        self.set_accepting(a.accept, false);
        self.connect(a.accept, None, b.start);
        self.push_fragment(a.start, b.accept);
        Ok(())
    }

    fn union(&mut self) -> Result<(), PatternError> {
        let b = self.pop('|')?;
        let a = self.pop('|')?;
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.set_accepting(a.accept, false);
        self.set_accepting(b.accept, false);
        self.connect(start, None, a.start);
        self.connect(start, None, b.start);
        self.connect(a.accept, None, accept);
        self.connect(b.accept, None, accept);
        self.push_fragment(start, accept);
        Ok(())
    }

    fn star(&mut self) -> Result<(), PatternError> {
        let inner = self.pop('*')?;
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.set_accepting(inner.accept, false);
        self.connect(start, None, inner.start);
        self.connect(start, None, accept);
        self.connect(inner.accept, None, inner.start);
        self.connect(inner.accept, None, accept);
        self.push_fragment(start, accept);
        Ok(())
    }

    /// Same as [`Builder::star`] without the start-to-accept skip edge.
    fn plus(&mut self) -> Result<(), PatternError> {
        let inner = self.pop('+')?;
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.set_accepting(inner.accept, false);
        self.connect(start, None, inner.start);
        self.connect(inner.accept, None, inner.start);
        self.connect(inner.accept, None, accept);
        self.push_fragment(start, accept);
        Ok(())
    }

    fn optional(&mut self) -> Result<(), PatternError> {
        let inner = self.pop('?')?;
        let start = self.fresh_state();
        let accept = self.fresh_state();
        self.set_accepting(inner.accept, false);
        self.connect(start, None, inner.start);
        self.connect(start, None, accept);
        self.connect(inner.accept, None, accept);
        self.push_fragment(start, accept);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::to_postfix;

    #[test]
    fn literal_fragment_shape() {
        let nfa = Nfa::from_postfix("a").unwrap();
        assert_eq!(nfa.len(), 2);
        assert!(!nfa.state(nfa.start()).is_accepting());
        assert!(nfa.state(nfa.accept()).is_accepting());
        let targets: Vec<_> = nfa.state(nfa.start()).targets('a').collect();
        assert_eq!(targets, vec![nfa.accept()]);
    }

    #[test]
    fn concat_clears_interior_accept() {
        let nfa = Nfa::from_postfix(&to_postfix("ab")).unwrap();
        let accepting: Vec<_> = (0..nfa.len() as u32)
            .map(StateId::new)
            .filter(|&id| nfa.state(id).is_accepting())
            .collect();
        assert_eq!(accepting, vec![nfa.accept()]);
    }

    #[test]
    fn star_loops_back() {
        let nfa = Nfa::from_postfix("a*").unwrap();
        // start reaches accept without consuming input
        let skips: Vec<_> = nfa.state(nfa.start()).epsilon_targets().collect();
        assert!(skips.contains(&nfa.accept()));
    }

    #[test]
    fn plus_has_no_skip_edge() {
        let nfa = Nfa::from_postfix("a+").unwrap();
        let skips: Vec<_> = nfa.state(nfa.start()).epsilon_targets().collect();
        assert!(!skips.contains(&nfa.accept()));
    }

    #[test]
    fn operator_without_operand_is_rejected() {
        assert!(matches!(
            Nfa::from_postfix("*"),
            Err(PatternError::MissingOperand { op: '*' })
        ));
        assert!(matches!(
            Nfa::from_postfix("a|"),
            Err(PatternError::MissingOperand { op: '|' })
        ));
    }

    #[test]
    fn leftover_fragments_are_rejected() {
        assert!(matches!(
            Nfa::from_postfix("ab"),
            Err(PatternError::Unconnected { count: 2 })
        ));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(matches!(Nfa::from_postfix(""), Err(PatternError::Empty)));
    }
}
