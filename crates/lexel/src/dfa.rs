//! Subset construction of deterministic finite automata.

use crate::nfa::{Nfa, StateId};
use crate::types::{Map, Set};
use std::{collections::VecDeque, fmt};

/// Handle of a state in the [`Dfa`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct DfaId(u32);

impl DfaId {
    #[inline]
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for DfaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d#{:03}", self.0)
    }
}

/// A deterministic state: the set of NFA states it stands for, plus its
/// outgoing edges.
#[derive(Debug)]
pub struct DfaState {
    // sorted ascending; doubles as the canonical identity of the state
    pub(crate) nfa_states: Vec<StateId>,
    pub(crate) transitions: Map<char, DfaId>,
    pub(crate) accepting: bool,
}

impl DfaState {
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn transition(&self, symbol: char) -> Option<DfaId> {
        self.transitions.get(&symbol).copied()
    }

    pub fn transitions(&self) -> impl Iterator<Item = (char, DfaId)> + '_ {
        self.transitions.iter().map(|(c, id)| (*c, *id))
    }

    /// The underlying NFA states, sorted ascending.
    pub fn nfa_states(&self) -> &[StateId] {
        &self.nfa_states
    }
}

/// A deterministic finite automaton produced by subset construction or
/// minimization.
#[derive(Debug)]
pub struct Dfa {
    states: Map<DfaId, DfaState>,
    start: DfaId,
}

impl Dfa {
    /// Determinize `nfa` over `alphabet` by the subset construction.
    ///
    /// Only symbols in `alphabet` get transitions; a symbol whose move set is
    /// empty gets none at all (there is no explicit trap state).
    #[tracing::instrument(skip_all, fields(nfa_states = nfa.len()))]
    pub fn subset(nfa: &Nfa, alphabet: &Set<char>) -> Self {
        let mut states: Map<DfaId, DfaState> = Map::default();
        let mut dfa_id = {
            let mut next = 0;
            move || {
                let id = DfaId::from_raw(next);
                next += 1;
                id
            }
        };

        // identity of a DFA state is its NFA subset, not its creation order
        let mut subsets: Map<Vec<StateId>, DfaId> = Map::default();
        let mut pending = VecDeque::new();

        let initial = epsilon_closure(nfa, [nfa.start()]);
        let start = dfa_id();
        subsets.insert(initial.clone(), start);
        pending.push_back((start, initial));

        while let Some((id, subset)) = pending.pop_front() {
            let mut transitions = Map::default();
            for &symbol in alphabet {
                let target = epsilon_closure(nfa, move_set(nfa, &subset, symbol));
                if target.is_empty() {
                    continue;
                }
                let target_id = match subsets.get(&target) {
                    Some(&existing) => existing,
                    None => {
                        let new_id = dfa_id();
                        subsets.insert(target.clone(), new_id);
                        pending.push_back((new_id, target));
                        new_id
                    }
                };
                transitions.insert(symbol, target_id);
            }

            let accepting = subset.iter().any(|&s| nfa.state(s).is_accepting());
            states.insert(
                id,
                DfaState {
                    nfa_states: subset,
                    transitions,
                    accepting,
                },
            );
        }

        tracing::trace!(dfa_states = states.len(), "subset construction finished");
        Dfa { states, start }
    }

    pub(crate) fn from_parts(states: Map<DfaId, DfaState>, start: DfaId) -> Self {
        debug_assert!(states.contains_key(&start));
        Dfa { states, start }
    }

    pub fn start(&self) -> DfaId {
        self.start
    }

    pub fn state(&self, id: DfaId) -> &DfaState {
        &self.states[&id]
    }

    pub fn states(&self) -> impl Iterator<Item = (DfaId, &DfaState)> + '_ {
        self.states.iter().map(|(id, state)| (*id, state))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, state) in &self.states {
            write!(f, "- {:?}", id)?;
            if *id == self.start {
                f.write_str(" (start)")?;
            }
            if state.accepting {
                f.write_str(" (accepting)")?;
            }
            writeln!(f)?;
            writeln!(f, "  subset: {:?}", state.nfa_states)?;
            for (symbol, target) in &state.transitions {
                writeln!(f, "  - {:?} -> {:?}", symbol, target)?;
            }
        }
        Ok(())
    }
}

/// Smallest superset of `seed` closed under ε-transitions.
pub(crate) fn epsilon_closure(
    nfa: &Nfa,
    seed: impl IntoIterator<Item = StateId>,
) -> Vec<StateId> {
    let mut closure: Set<StateId> = Set::default();
    let mut worklist: Vec<StateId> = Vec::new();
    for state in seed {
        if closure.insert(state) {
            worklist.push(state);
        }
    }
    while let Some(current) = worklist.pop() {
        for target in nfa.state(current).epsilon_targets() {
            if closure.insert(target) {
                worklist.push(target);
            }
        }
    }
    let mut closure: Vec<_> = closure.into_iter().collect();
    closure.sort_unstable();
    closure
}

/// States reachable from `subset` by consuming `symbol`.
pub(crate) fn move_set(nfa: &Nfa, subset: &[StateId], symbol: char) -> Vec<StateId> {
    let mut result: Set<StateId> = Set::default();
    for &state in subset {
        result.extend(nfa.state(state).targets(symbol));
    }
    result.into_iter().collect()
}
