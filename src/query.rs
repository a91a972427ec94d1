//! Public library surface.
//!
//! Every function here takes already-parsed values (a [`Regex`], [`Cfg`],
//! [`Graph`]) and returns `Result<_, QueryError>`; text ingestion itself
//! lives in [`crate::graph`], [`crate::cfg`] and [`crate::ecfg`], since
//! parsing and querying are separate fallible boundaries.

use std::hash::Hash;

use ahash::AHashSet;

use crate::cfg::Cfg;
use crate::error::QueryError;
use crate::graph::Graph;
use crate::regex::Regex;
use crate::rpq::{self, Accessible};
use crate::symbol::{Symbol, SymbolTable};

/// All `(u, v)` pairs connected by a `regex`-matching word, with the
/// path endpoints restricted to `starts`/`finals` when given.
pub fn regular_query<N: Hash + Eq + Clone>(
    regex: &Regex,
    graph: &Graph<N>,
    starts: Option<&[N]>,
    finals: Option<&[N]>,
) -> AHashSet<(N, N)> {
    rpq::regular_query(regex, graph, starts, finals)
}

/// Vertices reachable from `starts` via a `regex`-matching word.
/// `for_each = true` keeps one reachable set per start vertex instead of
/// unioning them.
pub fn find_accessible<N: Hash + Eq + Clone>(
    regex: &Regex,
    graph: &Graph<N>,
    starts: Option<&[N]>,
    finals: Option<&[N]>,
    for_each: bool,
) -> Accessible<N> {
    rpq::find_accessible(regex, graph, starts, finals, for_each)
}

/// The Hellings CFPQ engine, run against `cfg`'s weak-CNF form.
pub fn hellings<N: Hash + Eq + Clone>(cfg: &Cfg, graph: &Graph<N>, table: &mut SymbolTable) -> AHashSet<(usize, Symbol, usize)> {
    let wcnf = cfg.to_weak_cnf(table);
    crate::hellings::hellings(&wcnf, graph)
}

/// The matrix-fixpoint CFPQ engine, run against `cfg`'s weak-CNF form.
pub fn matrix_cfpq<N: Hash + Eq + Clone>(cfg: &Cfg, graph: &Graph<N>, table: &mut SymbolTable) -> AHashSet<(usize, Symbol, usize)> {
    let wcnf = cfg.to_weak_cnf(table);
    crate::matrix_cfpq::matrix_cfpq(&wcnf, graph)
}

/// Which CFPQ engine [`reachability_with_nonterminal`] should run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CfpqAlgorithm {
    Hellings,
    Matrix,
}

impl CfpqAlgorithm {
    fn parse(name: &str) -> Result<CfpqAlgorithm, QueryError> {
        match name {
            "hellings" => Ok(CfpqAlgorithm::Hellings),
            "matrix" => Ok(CfpqAlgorithm::Matrix),
            other => Err(QueryError::UnknownAlgorithm { algo: other.to_string() }),
        }
    }
}

/// Runs `algo` over `cfg`/`graph`, then filters the raw `(node, nonterminal,
/// node)` triples down to `(u, v)` pairs for `target_nonterminal`, restricted
/// to `starts`/`finals` when given. Filtering by a caller-given nonterminal
/// is what hides CNF-synthetic wrapper variables from the result.
pub fn reachability_with_nonterminal<N: Hash + Eq + Clone>(
    cfg: &Cfg,
    graph: &Graph<N>,
    starts: Option<&[N]>,
    finals: Option<&[N]>,
    target_nonterminal: Symbol,
    algo: &str,
    table: &mut SymbolTable,
) -> Result<AHashSet<(N, N)>, QueryError> {
    let algo = CfpqAlgorithm::parse(algo)?;
    let wcnf = cfg.to_weak_cnf(table);
    let triples = match algo {
        CfpqAlgorithm::Hellings => crate::hellings::hellings(&wcnf, graph),
        CfpqAlgorithm::Matrix => crate::matrix_cfpq::matrix_cfpq(&wcnf, graph),
    };

    let start_filter: Option<AHashSet<usize>> = starts.map(|s| s.iter().filter_map(|n| graph.index_of(n)).collect());
    let final_filter: Option<AHashSet<usize>> = finals.map(|s| s.iter().filter_map(|n| graph.index_of(n)).collect());

    let mut result = AHashSet::default();
    for (u, var, v) in triples {
        if var != target_nonterminal {
            continue;
        }
        if let Some(starts) = &start_filter {
            if !starts.contains(&u) {
                continue;
            }
        }
        if let Some(finals) = &final_filter {
            if !finals.contains(&v) {
                continue;
            }
        }
        result.insert((graph.node_at(u).clone(), graph.node_at(v).clone()));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_selector_is_an_error() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse("S -> a", "S", &mut table).unwrap();
        let graph: Graph<u64> = Graph::new();
        let s = cfg.start();
        let err = reachability_with_nonterminal(&cfg, &graph, None, None, s, "bogus", &mut table).unwrap_err();
        assert!(matches!(err, QueryError::UnknownAlgorithm { .. }));
    }

    #[test]
    fn reachability_with_nonterminal_matches_e3_grammar() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse("S -> a S b | epsilon", "S", &mut table).unwrap();

        let mut graph: Graph<u64> = Graph::new();
        graph.add_edge(&mut table, 0, "a", 1);
        graph.add_edge(&mut table, 1, "b", 2);

        let s = cfg.start();
        let via_hellings = reachability_with_nonterminal(&cfg, &graph, None, None, s, "hellings", &mut table).unwrap();
        let via_matrix = reachability_with_nonterminal(&cfg, &graph, None, None, s, "matrix", &mut table).unwrap();
        assert_eq!(via_hellings, via_matrix);
        assert!(via_hellings.contains(&(0, 2)));
    }

    #[test]
    fn reachability_with_nonterminal_honors_start_final_restriction() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse("S -> a S b | epsilon", "S", &mut table).unwrap();

        let mut graph: Graph<u64> = Graph::new();
        graph.add_edge(&mut table, 0, "a", 1);
        graph.add_edge(&mut table, 1, "b", 2);

        let s = cfg.start();
        let restricted =
            reachability_with_nonterminal(&cfg, &graph, Some(&[0]), Some(&[2]), s, "hellings", &mut table).unwrap();
        assert_eq!(restricted, AHashSet::from_iter([(0, 2)]));
    }
}
