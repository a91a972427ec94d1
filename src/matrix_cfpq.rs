//! Matrix CFPQ engine: an iterative Boolean-matrix fixpoint over one matrix
//! per nonterminal.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::bitmatrix::BoolMatrix;
use crate::cfg::WeakCnf;
use crate::graph::Graph;
use crate::symbol::Symbol;

/// Runs the matrix CFPQ fixpoint and returns `{(u, A, v) : T[A][idx(u),
/// idx(v)]}`. `T[A]` is seeded from `A -> a` by matching the graph edge's
/// terminal *string* against `a`, never a variable-name coincidence.
pub fn matrix_cfpq<N: Hash + Eq + Clone>(wcnf: &WeakCnf, graph: &Graph<N>) -> AHashSet<(usize, Symbol, usize)> {
    let n = graph.num_nodes();
    let mut t: AHashMap<Symbol, BoolMatrix> = AHashMap::default();
    for var in wcnf.variables() {
        t.insert(var, BoolMatrix::zero(n, n));
    }

    for var in wcnf.eps_variables() {
        t.insert(var, BoolMatrix::identity(n));
    }

    for (u, label, v) in graph.edges() {
        let Some(terminal) = label.as_terminal() else {
            continue;
        };
        let ui = graph.index_of(u).expect("edge endpoint is a graph node");
        let vi = graph.index_of(v).expect("edge endpoint is a graph node");
        for var in wcnf.variables() {
            if wcnf.terminals_of(var).any(|a| a == terminal) {
                t.get_mut(&var).unwrap().set(ui, vi);
            }
        }
    }

    let binary: Vec<(Symbol, Symbol, Symbol)> = wcnf.binary_productions().collect();
    let mut sweeps = 0usize;
    loop {
        sweeps += 1;
        let mut changed = false;
        for &(head, b, c) in &binary {
            let product = t[&b].mul(&t[&c]);
            if t.get_mut(&head).unwrap().or_assign(&product) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    log::debug!("matrix CFPQ fixpoint reached after {sweeps} sweeps over {} nonterminals.", t.len());

    let mut result = AHashSet::default();
    for (var, matrix) in &t {
        for (u, v) in matrix.iter_nonzero() {
            result.insert((u, *var, v));
        }
    }
    result
}
