use lexel::analysis::StaticAnalyzer;
use lexel::grammar::{examples, Grammar, NontermId, SymbolId, TermSet};

fn nonterminal(grammar: &Grammar, name: &str) -> NontermId {
    grammar
        .nonterminals()
        .find(|(_, n)| *n == name)
        .map(|(id, _)| id)
        .unwrap()
}

fn names(grammar: &Grammar, set: &TermSet) -> Vec<String> {
    let mut names: Vec<String> = set
        .iter()
        .map(|id| grammar.terminal_name(id).to_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn expression_grammar_first_sets() {
    let grammar = Grammar::define(examples::expression);
    let analyzer = StaticAnalyzer::new(&grammar);
    let first = analyzer.first();

    for nt in ["E", "T", "F"] {
        let of_nt = &first[&SymbolId::N(nonterminal(&grammar, nt))];
        assert_eq!(names(&grammar, &of_nt.terminals), ["(", "id"], "FIRST({})", nt);
        assert!(!of_nt.nullable, "{} must not derive ε", nt);
    }

    let of_expr_rest = &first[&SymbolId::N(nonterminal(&grammar, "E'"))];
    assert_eq!(names(&grammar, &of_expr_rest.terminals), ["+"]);
    assert!(of_expr_rest.nullable);

    let of_term_rest = &first[&SymbolId::N(nonterminal(&grammar, "T'"))];
    assert_eq!(names(&grammar, &of_term_rest.terminals), ["*"]);
    assert!(of_term_rest.nullable);
}

#[test]
fn expression_grammar_follow_sets() {
    let grammar = Grammar::define(examples::expression);
    let analyzer = StaticAnalyzer::new(&grammar);
    let follow = analyzer.follow();

    for nt in ["E", "E'"] {
        assert_eq!(
            names(&grammar, &follow[&nonterminal(&grammar, nt)]),
            ["$", ")"],
            "FOLLOW({})",
            nt
        );
    }
    for nt in ["T", "T'"] {
        assert_eq!(
            names(&grammar, &follow[&nonterminal(&grammar, nt)]),
            ["$", ")", "+"],
            "FOLLOW({})",
            nt
        );
    }
    assert_eq!(
        names(&grammar, &follow[&nonterminal(&grammar, "F")]),
        ["$", ")", "*", "+"]
    );
}

#[test]
fn follow_of_start_contains_the_end_marker() {
    let grammar = Grammar::define(examples::with_nullable);
    let analyzer = StaticAnalyzer::new(&grammar);
    let follow = analyzer.follow();
    let start = grammar.start_symbol();
    assert!(names(&grammar, &follow[&start]).contains(&"$".to_owned()));
}

#[test]
fn epsilon_in_first_iff_nonterminal_derives_empty() {
    let grammar = Grammar::define(examples::with_nullable);
    let analyzer = StaticAnalyzer::new(&grammar);
    let first = analyzer.first();

    assert!(first[&SymbolId::N(nonterminal(&grammar, "A"))].nullable);
    assert!(first[&SymbolId::N(nonterminal(&grammar, "B"))].nullable);
    assert!(!first[&SymbolId::N(nonterminal(&grammar, "S"))].nullable);
}

#[test]
fn grammar_display_lists_everything() {
    let grammar = Grammar::define(examples::expression);
    let rendered = grammar.to_string();
    assert!(rendered.contains("start: E"));
    assert!(rendered.contains("E -> T E'"));
    assert!(rendered.contains("E' -> ε"));
}
