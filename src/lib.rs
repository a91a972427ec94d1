pub mod automaton;
pub mod baa;
pub mod bitmatrix;
pub mod cfg;
pub mod dot;
pub mod ecfg;
pub mod error;
pub mod graph;
pub mod hellings;
pub mod matrix_cfpq;
pub mod query;
pub mod regex;
pub mod rpq;
pub mod rsm;
pub mod symbol;
