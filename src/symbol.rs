//! Interned symbols and the terminal/variable/epsilon label alphabet.
//!
//! Mirrors the "opaque state identities as small integer indices with a side
//! table" design note: a [`Symbol`] is a cheap `Copy` handle into a
//! [`SymbolTable`], the same way `kbnf::grammar::Grammar` interns terminal
//! and nonterminal text instead of carrying owned strings through the hot
//! path of every automaton operation.

use std::fmt;

use string_interner::{backend::StringBackend, StringInterner, Symbol as _};

type Backend = StringBackend<string_interner::symbol::SymbolU32>;

/// A handle to an interned string. Cheap to copy, compare and hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(string_interner::symbol::SymbolU32);

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.0.to_usize())
    }
}

/// Interns the text of symbols occurring in a grammar or graph.
///
/// One table is shared by everything derived from a single ingestion call
/// (a parsed `Cfg`, `Ecfg`, or `Graph`); tables are never merged, matching
/// the "values are immutable after construction" lifecycle rule.
#[derive(Default)]
pub struct SymbolTable {
    interner: StringInterner<Backend>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn intern(&mut self, text: &str) -> Symbol {
        Symbol(self.interner.get_or_intern(text))
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner
            .resolve(symbol.0)
            .expect("symbol was interned by this table")
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable").finish_non_exhaustive()
    }
}

/// The tagged label alphabet from the data model: every edge, automaton
/// transition guard, and CFG production symbol is one of these three kinds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Label {
    /// A terminal symbol, occurring on graph edges and as CFG terminals.
    Terminal(Symbol),
    /// A nonterminal (CFG variable / ECFG head / RSM box name).
    Variable(Symbol),
    /// The distinguished empty-string transition guard.
    Epsilon,
}

impl Label {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }

    pub fn as_terminal(&self) -> Option<Symbol> {
        match self {
            Label::Terminal(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<Symbol> {
        match self {
            Label::Variable(s) => Some(*s),
            _ => None,
        }
    }

    pub fn to_display_form(&self, table: &SymbolTable) -> String {
        match self {
            Label::Terminal(s) => table.resolve(*s).to_string(),
            Label::Variable(s) => table.resolve(*s).to_string(),
            Label::Epsilon => "\u{03b5}".to_string(),
        }
    }
}
