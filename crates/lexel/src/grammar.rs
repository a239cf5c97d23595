//! Context-free grammars.

use crate::types::Map;
use std::fmt;

// closure-to-Display adapter for the name-resolved dumps below
struct FmtWith<F>(F);

impl<F> fmt::Display for FmtWith<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(f)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TermId(u16);

impl TermId {
    /// Reserved terminal for the end-of-input marker `$`.
    pub const EOI: Self = Self(0);
    const OFFSET: u16 = 1;

    #[inline]
    pub(crate) const fn into_raw(self) -> u16 {
        self.0
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            &Self::EOI => write!(f, "T#End"),
            _ => write!(f, "T#{:03}", self.0),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NontermId(u16);

impl NontermId {
    #[inline]
    const fn new(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for NontermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N#{:03}", self.0)
    }
}

/// Either side of the terminal/nonterminal split.
///
/// ε is deliberately not a symbol: an ε-production is a [`Production`] with
/// an empty right-hand side, and ε-membership in FIRST is the `nullable`
/// flag of [`crate::analysis::FirstSet`]. A literal `ε` character in regex
/// input therefore cannot collide with the empty string.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolId {
    T(TermId),
    N(NontermId),
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::T(t) => write!(f, "{:?}", t),
            Self::N(n) => write!(f, "{:?}", n),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProdId(u16);

impl fmt::Debug for ProdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P#{:03}", self.0)
    }
}

/// A production rule. An empty `right` encodes an ε-production.
#[derive(Debug)]
pub struct Production {
    pub left: NontermId,
    pub right: Vec<SymbolId>,
}

impl Production {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        FmtWith(move |f: &mut fmt::Formatter<'_>| {
            write!(f, "{} -> ", g.nonterminal_name(self.left))?;
            if self.right.is_empty() {
                f.write_str("ε")?;
            } else {
                for (i, symbol) in self.right.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(g.symbol_name(*symbol))?;
                }
            }
            Ok(())
        })
    }
}

/// The grammar consumed by [`crate::analysis::StaticAnalyzer`].
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TermId, String>,
    nonterminals: Map<NontermId, String>,
    productions: Map<ProdId, Production>,
    start: NontermId,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Self
    where
        F: FnOnce(&mut GrammarDef),
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start: None,
            next_terminal: TermId::OFFSET,
            next_nonterminal: 0,
            next_production: 0,
        };
        def.terminals.insert(TermId::EOI, "$".into());

        f(&mut def);

        // default to the first declared nonterminal
        let start = def
            .start
            .or_else(|| def.nonterminals.keys().next().copied())
            .expect("grammar declares no nonterminal");

        Grammar {
            terminals: def.terminals,
            nonterminals: def.nonterminals,
            productions: def.productions,
            start,
        }
    }

    /// All terminals, the reserved `$` marker included.
    pub fn terminals(&self) -> impl Iterator<Item = (TermId, &str)> + '_ {
        self.terminals.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = (NontermId, &str)> + '_ {
        self.nonterminals
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
    }

    /// Productions in declaration order.
    pub fn productions(&self) -> impl Iterator<Item = (ProdId, &Production)> + '_ {
        self.productions.iter().map(|(id, p)| (*id, p))
    }

    pub fn production(&self, id: ProdId) -> &Production {
        &self.productions[&id]
    }

    pub fn start_symbol(&self) -> NontermId {
        self.start
    }

    pub fn terminal_name(&self, id: TermId) -> &str {
        &self.terminals[&id]
    }

    pub fn nonterminal_name(&self, id: NontermId) -> &str {
        &self.nonterminals[&id]
    }

    pub fn symbol_name(&self, id: SymbolId) -> &str {
        match id {
            SymbolId::T(t) => self.terminal_name(t),
            SymbolId::N(n) => self.nonterminal_name(n),
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "terminals: ")?;
        for (i, (_, name)) in self.terminals().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        write!(f, "\nnonterminals: ")?;
        for (i, (_, name)) in self.nonterminals().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        writeln!(f, "\nstart: {}", self.nonterminal_name(self.start))?;
        writeln!(f, "productions:")?;
        for (id, p) in self.productions() {
            writeln!(f, "  [{:?}] {}", id, p.display(self))?;
        }
        Ok(())
    }
}

/// The contextual values for building a [`Grammar`].
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TermId, String>,
    nonterminals: Map<NontermId, String>,
    productions: Map<ProdId, Production>,
    start: Option<NontermId>,
    next_terminal: u16,
    next_nonterminal: u16,
    next_production: u16,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> TermId {
        let id = TermId::from_raw(self.next_terminal);
        self.next_terminal += 1;
        self.terminals.insert(id, name.into());
        id
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> NontermId {
        let id = NontermId::new(self.next_nonterminal);
        self.next_nonterminal += 1;
        self.nonterminals.insert(id, name.into());
        id
    }

    /// Add a production rule. An empty `right` is an ε-production.
    pub fn production<I>(&mut self, left: NontermId, right: I)
    where
        I: IntoIterator<Item = SymbolId>,
    {
        let right: Vec<_> = right.into_iter().collect();
        for p in self.productions.values() {
            assert!(
                p.left != left || p.right != right,
                "duplicate production rule"
            );
        }
        let id = ProdId(self.next_production);
        self.next_production += 1;
        self.productions.insert(id, Production { left, right });
    }

    /// Specify the start symbol. Defaults to the first declared nonterminal.
    pub fn start_symbol(&mut self, start: NontermId) {
        self.start.replace(start);
    }
}

/// Set of terminals backed by a bit set keyed on raw [`TermId`]s.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TermSet {
    inner: bit_set::BitSet,
}

impl TermSet {
    pub fn contains(&self, id: TermId) -> bool {
        self.inner.contains(id.into_raw().into())
    }

    pub fn insert(&mut self, id: TermId) -> bool {
        self.inner.insert(id.into_raw().into())
    }

    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TermId> + '_ {
        self.inner
            .iter()
            .map(|raw| raw.try_into().map(TermId::from_raw).unwrap())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        FmtWith(move |f: &mut fmt::Formatter<'_>| {
            f.write_str("{")?;
            for (i, id) in self.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(g.terminal_name(id))?;
            }
            f.write_str("}")
        })
    }
}

impl FromIterator<TermId> for TermSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TermId>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

pub mod examples {
    use super::*;
    use SymbolId::{N, T};

    /// The classic LL(1) expression grammar:
    ///
    /// ```text
    /// E  -> T E'
    /// E' -> + T E' | ε
    /// T  -> F T'
    /// T' -> * F T' | ε
    /// F  -> ( E ) | id
    /// ```
    pub fn expression(g: &mut GrammarDef) {
        let plus = g.terminal("+");
        let star = g.terminal("*");
        let lparen = g.terminal("(");
        let rparen = g.terminal(")");
        let id = g.terminal("id");

        let expr = g.nonterminal("E");
        let expr_rest = g.nonterminal("E'");
        let term = g.nonterminal("T");
        let term_rest = g.nonterminal("T'");
        let factor = g.nonterminal("F");

        g.start_symbol(expr);

        g.production(expr, [N(term), N(expr_rest)]);
        g.production(expr_rest, [T(plus), N(term), N(expr_rest)]);
        g.production(expr_rest, []);
        g.production(term, [N(factor), N(term_rest)]);
        g.production(term_rest, [T(star), N(factor), N(term_rest)]);
        g.production(term_rest, []);
        g.production(factor, [T(lparen), N(expr), T(rparen)]);
        g.production(factor, [T(id)]);
    }

    /// A grammar where every nonterminal but the start derives ε.
    ///
    /// ```text
    /// S -> A B c
    /// A -> a | ε
    /// B -> b | ε
    /// ```
    pub fn with_nullable(g: &mut GrammarDef) {
        let a = g.terminal("a");
        let b = g.terminal("b");
        let c = g.terminal("c");

        let s = g.nonterminal("S");
        let nt_a = g.nonterminal("A");
        let nt_b = g.nonterminal("B");

        g.start_symbol(s);

        g.production(s, [N(nt_a), N(nt_b), T(c)]);
        g.production(nt_a, [T(a)]);
        g.production(nt_a, []);
        g.production(nt_b, [T(b)]);
        g.production(nt_b, []);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_collects_symbols_and_productions() {
        let grammar = Grammar::define(examples::expression);
        assert_eq!(grammar.terminals().count(), 6); // five declared plus $
        assert_eq!(grammar.nonterminals().count(), 5);
        assert_eq!(grammar.productions().count(), 8);
        assert_eq!(grammar.nonterminal_name(grammar.start_symbol()), "E");
    }

    #[test]
    fn start_defaults_to_first_nonterminal() {
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a");
            let s = g.nonterminal("S");
            g.production(s, [SymbolId::T(a)]);
        });
        assert_eq!(grammar.nonterminal_name(grammar.start_symbol()), "S");
    }

    #[test]
    fn epsilon_production_displays_as_epsilon() {
        let grammar = Grammar::define(examples::with_nullable);
        let (_, production) = grammar
            .productions()
            .find(|(_, p)| p.right.is_empty())
            .unwrap();
        assert_eq!(production.display(&grammar).to_string(), "A -> ε");
    }

    #[test]
    fn term_set_round_trip() {
        let mut set = TermSet::default();
        assert!(set.insert(TermId::EOI));
        assert!(set.insert(TermId::from_raw(3)));
        assert!(!set.insert(TermId::EOI));
        assert!(set.contains(TermId::from_raw(3)));
        assert!(!set.contains(TermId::from_raw(2)));
        let collected: Vec<_> = set.iter().collect();
        assert_eq!(collected, vec![TermId::EOI, TermId::from_raw(3)]);
    }
}
