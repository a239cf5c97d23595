//! DFA minimization via the table-filling algorithm.

use crate::dfa::{Dfa, DfaId, DfaState};
use crate::nfa::StateId;
use crate::types::{Map, Set};

/// Produce an equivalent DFA with the minimum number of states for the
/// language restricted to `alphabet`.
///
/// Distinguishable state pairs are marked to a fixed point, the unmarked
/// pairs are merged with a union-find, and each equivalence class becomes one
/// state of the result. Class representatives are the smallest member id, so
/// the output is reproducible.
#[tracing::instrument(skip_all, fields(states = dfa.len()))]
pub fn minimize(dfa: &Dfa, alphabet: &Set<char>) -> Dfa {
    let mut ids: Vec<DfaId> = dfa.states().map(|(id, _)| id).collect();
    ids.sort_unstable();
    let n = ids.len();
    let index_of: Map<DfaId, usize> = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    // 1. every unordered pair starts marked iff the accepting flags differ
    let mut marked: Map<(DfaId, DfaId), bool> = Map::default();
    for i in 0..n {
        for j in i + 1..n {
            let distinguished =
                dfa.state(ids[i]).is_accepting() != dfa.state(ids[j]).is_accepting();
            marked.insert(pair(ids[i], ids[j]), distinguished);
        }
    }

    // 2. propagate distinguishability until nothing changes
    let mut changed = true;
    while changed {
        changed = false;
        for i in 0..n {
            for j in i + 1..n {
                let key = pair(ids[i], ids[j]);
                if marked[&key] {
                    continue;
                }
                let (p, q) = (dfa.state(ids[i]), dfa.state(ids[j]));
                for &symbol in alphabet {
                    let distinguishes = match (p.transition(symbol), q.transition(symbol)) {
                        (Some(pt), Some(qt)) => pt != qt && marked[&pair(pt, qt)],
                        (None, None) => false,
                        _ => true,
                    };
                    if distinguishes {
                        marked.insert(key, true);
                        changed = true;
                        break;
                    }
                }
            }
        }
    }

    // 3. merge the unmarked pairs into equivalence classes
    let mut partition = UnionFind::new(n);
    for i in 0..n {
        for j in i + 1..n {
            if !marked[&pair(ids[i], ids[j])] {
                partition.union(i, j);
            }
        }
    }

    // roots appear in ascending order because each class root is its
    // smallest member
    let mut classes: Map<usize, Vec<usize>> = Map::default();
    for i in 0..n {
        classes.entry(partition.find(i)).or_default().push(i);
    }

    let mut class_of = vec![DfaId::from_raw(0); n];
    for (new_raw, (_, members)) in classes.iter().enumerate() {
        for &member in members {
            class_of[member] = DfaId::from_raw(new_raw as u32);
        }
    }

    // 4. one state per class; transitions routed through the representative
    let mut states: Map<DfaId, DfaState> = Map::default();
    for (new_raw, (&root, members)) in classes.iter().enumerate() {
        let id = DfaId::from_raw(new_raw as u32);
        let mut subset: Set<StateId> = Set::default();
        for &member in members {
            subset.extend(dfa.state(ids[member]).nfa_states().iter().copied());
        }
        let mut subset: Vec<_> = subset.into_iter().collect();
        subset.sort_unstable();

        let representative = dfa.state(ids[root]);
        let mut transitions: Map<char, DfaId> = Map::default();
        for &symbol in alphabet {
            if let Some(target) = representative.transition(symbol) {
                transitions.insert(symbol, class_of[index_of[&target]]);
            }
        }

        states.insert(
            id,
            DfaState {
                nfa_states: subset,
                transitions,
                accepting: representative.is_accepting(),
            },
        );
    }

    let start = class_of[index_of[&dfa.start()]];
    tracing::trace!(classes = states.len(), "minimization finished");
    Dfa::from_parts(states, start)
}

/// Canonical unordered pair, lower id first.
fn pair(a: DfaId, b: DfaId) -> (DfaId, DfaId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Union-find over dense indices with path compression. Roots are the
/// smallest index of their class.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let lo = root_a.min(root_b);
            let hi = root_a.max(root_b);
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::Nfa;
    use crate::regex::to_postfix;

    fn alphabet(chars: &str) -> Set<char> {
        chars.chars().collect()
    }

    fn accepts(dfa: &Dfa, input: &str) -> bool {
        let mut state = dfa.start();
        for c in input.chars() {
            match dfa.state(state).transition(c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        dfa.state(state).is_accepting()
    }

    fn compile(pattern: &str, alphabet: &Set<char>) -> Dfa {
        let nfa = Nfa::from_postfix(&to_postfix(pattern)).unwrap();
        let dfa = Dfa::subset(&nfa, alphabet);
        minimize(&dfa, alphabet)
    }

    #[test]
    fn equivalent_states_are_merged() {
        // a|b has two symmetric accepting states before minimization
        let sigma = alphabet("ab");
        let nfa = Nfa::from_postfix(&to_postfix("a|b")).unwrap();
        let dfa = Dfa::subset(&nfa, &sigma);
        let minimized = minimize(&dfa, &sigma);
        assert!(minimized.len() < dfa.len());
        assert_eq!(minimized.len(), 2);
        assert!(accepts(&minimized, "a"));
        assert!(accepts(&minimized, "b"));
        assert!(!accepts(&minimized, "ab"));
    }

    #[test]
    fn language_is_preserved() {
        let sigma = alphabet("ab");
        let minimized = compile("(a|b)*a", &sigma);
        for input in ["a", "ba", "aba", "bba", "aaaa"] {
            assert!(accepts(&minimized, input), "should accept {:?}", input);
        }
        for input in ["", "b", "ab", "bab"] {
            assert!(!accepts(&minimized, input), "should reject {:?}", input);
        }
    }

    #[test]
    fn minimization_is_idempotent() {
        let sigma = alphabet("ab");
        let once = compile("(a|b)*ab", &sigma);
        let twice = minimize(&once, &sigma);
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn single_state_dfa_survives() {
        let sigma = alphabet("a");
        let minimized = compile("a*", &sigma);
        assert_eq!(minimized.len(), 1);
        assert!(accepts(&minimized, ""));
        assert!(accepts(&minimized, "aaa"));
    }
}
