//! Error types for every fallible boundary of the crate.
//!
//! One `thiserror`-derived enum per boundary, the way
//! `kbnf::grammar::CreateGrammarError` aggregates parse, semantic, and
//! conversion failures behind a single type a caller can match on. Nothing
//! in this crate panics on malformed input; ingestion and query functions
//! return `Result`.

use thiserror::Error;

/// Grammar text (CFG or ECFG) failed to parse or violates a grammar
/// invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("could not parse grammar text: {0}")]
    Parse(String),

    #[error("start symbol {symbol:?} is not the head of any production")]
    UndefinedStart { symbol: String },

    #[error("production head {symbol:?} is not a variable")]
    NonVariableHead { symbol: String },

    #[error("variable {head:?} has more than one production body in an ECFG")]
    DuplicateHead { head: String },
}

/// Graph text failed to parse or references an unavailable resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("could not parse edge-list line {line:?}")]
    MalformedEdgeLine { line: String },

    /// Reserved for a DOT-ingestion collaborator: an edge without a `label`
    /// attribute. Not constructed by anything in this crate yet, since DOT
    /// reading stays with the (out-of-scope) CLI/file-I/O collaborator;
    /// kept so that collaborator has a stable error to return.
    #[error("edge {context:?} is missing a label attribute")]
    MissingLabelAttribute { context: String },

    /// Reserved for the (out-of-scope) named-dataset registry collaborator.
    #[error("dataset name {name:?} did not resolve to a graph")]
    UnresolvedDataset { name: String },
}

/// Errors surfaced by the query-level API in [`crate::query`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("expected a value of kind {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown CFPQ algorithm selector {algo:?}")]
    UnknownAlgorithm { algo: String },
}
