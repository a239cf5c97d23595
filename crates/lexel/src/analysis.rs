//! FIRST and FOLLOW set computation.

use crate::grammar::{Grammar, NontermId, SymbolId, TermId, TermSet};
use crate::types::Map;

/// FIRST of a single symbol: the terminals that can begin a derivation,
/// plus whether the symbol derives the empty string.
///
/// `nullable` stands in for ε-membership; ε itself is never a terminal here.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    pub terminals: TermSet,
    pub nullable: bool,
}

/// Fixed-point computation of FIRST and FOLLOW sets over a [`Grammar`].
///
/// Both loops terminate because the sets only grow and the universe of
/// terminals is finite. A nonterminal without productions is not an error;
/// its sets simply stay empty.
#[derive(Debug)]
pub struct StaticAnalyzer<'g> {
    grammar: &'g Grammar,
}

impl<'g> StaticAnalyzer<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        for (id, name) in grammar.nonterminals() {
            if grammar.productions().all(|(_, p)| p.left != id) {
                tracing::warn!(
                    nonterminal = name,
                    "nonterminal has no production; its FIRST/FOLLOW sets stay empty"
                );
            }
        }
        Self { grammar }
    }

    /// FIRST sets for every grammar symbol.
    #[tracing::instrument(skip_all)]
    pub fn first(&self) -> Map<SymbolId, FirstSet> {
        let mut first: Map<SymbolId, FirstSet> = Map::default();
        for (id, _) in self.grammar.terminals() {
            first.insert(
                SymbolId::T(id),
                FirstSet {
                    terminals: Some(id).into_iter().collect(),
                    nullable: false,
                },
            );
        }
        for (id, _) in self.grammar.nonterminals() {
            first.insert(SymbolId::N(id), FirstSet::default());
        }

        let mut changed = true;
        while changed {
            changed = false;
            for (_, production) in self.grammar.productions() {
                // FIRST of the right-hand side: scan until the first
                // non-nullable symbol. An empty right side is nullable.
                let mut gathered = TermSet::default();
                let mut all_nullable = true;
                for symbol in &production.right {
                    let of_symbol = &first[symbol];
                    gathered.union_with(&of_symbol.terminals);
                    if !of_symbol.nullable {
                        all_nullable = false;
                        break;
                    }
                }

                let entry = first
                    .get_mut(&SymbolId::N(production.left))
                    .expect("undeclared nonterminal on a left-hand side");
                let before = (entry.terminals.len(), entry.nullable);
                entry.terminals.union_with(&gathered);
                entry.nullable |= all_nullable;
                changed |= (entry.terminals.len(), entry.nullable) != before;
            }
        }

        first
    }

    /// FOLLOW sets for every nonterminal. `$` is [`TermId::EOI`].
    #[tracing::instrument(skip_all)]
    pub fn follow(&self) -> Map<NontermId, TermSet> {
        let first = self.first();

        let mut follow: Map<NontermId, TermSet> = Map::default();
        for (id, _) in self.grammar.nonterminals() {
            follow.insert(id, TermSet::default());
        }
        follow
            .get_mut(&self.grammar.start_symbol())
            .expect("start symbol is always declared")
            .insert(TermId::EOI);

        let mut changed = true;
        while changed {
            changed = false;
            for (_, production) in self.grammar.productions() {
                for (i, symbol) in production.right.iter().enumerate() {
                    let SymbolId::N(current) = *symbol else {
                        continue;
                    };

                    // everything the remainder of the production can start
                    // with follows `current`
                    let mut gathered = TermSet::default();
                    let mut tail_nullable = true;
                    for rest in &production.right[i + 1..] {
                        let of_rest = &first[rest];
                        gathered.union_with(&of_rest.terminals);
                        if !of_rest.nullable {
                            tail_nullable = false;
                            break;
                        }
                    }
                    // a nullable tail lets FOLLOW of the left side through
                    if tail_nullable {
                        gathered.union_with(&follow[&production.left]);
                    }

                    let entry = follow
                        .get_mut(&current)
                        .expect("undeclared nonterminal on a right-hand side");
                    let before = entry.len();
                    entry.union_with(&gathered);
                    changed |= entry.len() != before;
                }
            }
        }

        follow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::examples;

    fn names(grammar: &Grammar, set: &TermSet) -> Vec<String> {
        let mut names: Vec<String> = set
            .iter()
            .map(|id| grammar.terminal_name(id).to_owned())
            .collect();
        names.sort();
        names
    }

    fn nonterminal(grammar: &Grammar, name: &str) -> NontermId {
        grammar
            .nonterminals()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| id)
            .unwrap()
    }

    #[test]
    fn first_of_terminal_is_itself() {
        let grammar = Grammar::define(examples::expression);
        let analyzer = StaticAnalyzer::new(&grammar);
        let first = analyzer.first();
        let (plus, _) = grammar.terminals().find(|(_, n)| *n == "+").unwrap();
        let of_plus = &first[&SymbolId::T(plus)];
        assert_eq!(names(&grammar, &of_plus.terminals), ["+"]);
        assert!(!of_plus.nullable);
    }

    #[test]
    fn nullable_propagates_through_sequences() {
        let grammar = Grammar::define(examples::with_nullable);
        let analyzer = StaticAnalyzer::new(&grammar);
        let first = analyzer.first();

        let a = nonterminal(&grammar, "A");
        let b = nonterminal(&grammar, "B");
        let s = nonterminal(&grammar, "S");

        assert!(first[&SymbolId::N(a)].nullable);
        assert!(first[&SymbolId::N(b)].nullable);
        // S -> A B c cannot vanish: c is always required
        assert!(!first[&SymbolId::N(s)].nullable);
        assert_eq!(names(&grammar, &first[&SymbolId::N(s)].terminals), ["a", "b", "c"]);
    }

    #[test]
    fn follow_skips_nullable_symbols() {
        let grammar = Grammar::define(examples::with_nullable);
        let analyzer = StaticAnalyzer::new(&grammar);
        let follow = analyzer.follow();

        // B -> ε makes c visible past B from A's position
        let a = nonterminal(&grammar, "A");
        assert_eq!(names(&grammar, &follow[&a]), ["b", "c"]);
    }

    #[test]
    fn unproductive_nonterminal_keeps_empty_sets() {
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a");
            let s = g.nonterminal("S");
            g.nonterminal("Dead");
            g.start_symbol(s);
            g.production(s, [SymbolId::T(a)]);
        });
        let analyzer = StaticAnalyzer::new(&grammar);
        let first = analyzer.first();
        let follow = analyzer.follow();
        let dead = nonterminal(&grammar, "Dead");
        assert!(first[&SymbolId::N(dead)].terminals.is_empty());
        assert!(!first[&SymbolId::N(dead)].nullable);
        assert!(follow[&dead].is_empty());
    }
}
