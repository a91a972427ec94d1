//! Hellings CFPQ engine: a worklist fixpoint over `(node, nonterminal,
//! node)` triples.

use std::hash::Hash;

use ahash::AHashSet;

use crate::cfg::WeakCnf;
use crate::graph::Graph;
use crate::symbol::Symbol;

/// Runs Hellings' algorithm: seeds the fact set from `epsilon`/terminal
/// productions, then saturates with a worklist over binary productions
/// until no new triple is derivable. Terminates because the fact set is
/// monotonically growing within the finite bound `|Nodes|^2 * |V|`.
///
/// The raw result exposes CNF-synthetic wrapper variables introduced by
/// [`Cfg::to_weak_cnf`](crate::cfg::Cfg::to_weak_cnf) alongside user
/// variables; callers filtering by a specific nonterminal never see them.
pub fn hellings<N: Hash + Eq + Clone>(wcnf: &WeakCnf, graph: &Graph<N>) -> AHashSet<(usize, Symbol, usize)> {
    let mut result: AHashSet<(usize, Symbol, usize)> = AHashSet::default();
    let mut worklist: Vec<(usize, Symbol, usize)> = Vec::new();

    for node in 0..graph.num_nodes() {
        for var in wcnf.eps_variables() {
            if result.insert((node, var, node)) {
                worklist.push((node, var, node));
            }
        }
    }

    for (u, label, v) in graph.edges() {
        let Some(terminal) = label.as_terminal() else {
            continue;
        };
        for (head, unit_terminal) in wcnf.unit_productions() {
            if unit_terminal == terminal {
                let ui = graph.index_of(u).expect("edge endpoint is a graph node");
                let vi = graph.index_of(v).expect("edge endpoint is a graph node");
                if result.insert((ui, head, vi)) {
                    worklist.push((ui, head, vi));
                }
            }
        }
    }

    // (head, B, C) grouped both by "B is the left operand" and "C is the
    // right operand" so a newly discovered triple can extend in either
    // direction without rescanning every production.
    let binary: Vec<(Symbol, Symbol, Symbol)> = wcnf.binary_productions().collect();

    while let Some((i, matched_var, j)) = worklist.pop() {
        // matched_var completes as the left operand B of (i, B, j): look for
        // (j, C, k) already in the fact set.
        let right_extensions: Vec<(usize, Symbol, usize)> = result
            .iter()
            .filter(|&&(from, _, _)| from == j)
            .copied()
            .collect();
        for &(head, b, c) in &binary {
            if b != matched_var {
                continue;
            }
            for &(from, var_c, k) in &right_extensions {
                if from == j && var_c == c {
                    let triple = (i, head, k);
                    if result.insert(triple) {
                        worklist.push(triple);
                    }
                }
            }
        }

        // matched_var completes as the right operand C of (k, C, i): look
        // for (k, B, i) already in the fact set ending where this starts.
        let left_extensions: Vec<(usize, Symbol, usize)> = result
            .iter()
            .filter(|&&(_, _, to)| to == i)
            .copied()
            .collect();
        for &(head, b, c) in &binary {
            if c != matched_var {
                continue;
            }
            for &(k, var_b, to) in &left_extensions {
                if to == i && var_b == b {
                    let triple = (k, head, j);
                    if result.insert(triple) {
                        worklist.push(triple);
                    }
                }
            }
        }
    }

    log::debug!(
        "Hellings saturation settled with {} (node, nonterminal, node) triples.",
        result.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::Cfg;
    use crate::symbol::SymbolTable;

    #[test]
    fn e3_a_n_b_n_grammar_over_two_edges() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse("S -> a S b | epsilon", "S", &mut table).unwrap();
        let wcnf = cfg.to_weak_cnf(&mut table);

        let mut graph: Graph<u64> = Graph::new();
        graph.add_edge(&mut table, 0, "a", 1);
        graph.add_edge(&mut table, 1, "b", 2);

        let result = hellings(&wcnf, &graph);
        let s = cfg.start();
        let s_triples: AHashSet<(usize, usize)> = result
            .iter()
            .filter(|&&(_, var, _)| var == s)
            .map(|&(u, _, v)| (u, v))
            .collect();

        // epsilon makes every (n, S, n) derivable.
        assert!(s_triples.contains(&(0, 0)));
        assert!(s_triples.contains(&(1, 1)));
        assert!(s_triples.contains(&(2, 2)));
        // S => a S b with the inner S at (1,1) (itself epsilon) derives (0,2).
        assert!(s_triples.contains(&(0, 2)));
    }

    #[test]
    fn e4_two_cfg_alternation_over_balanced_paths() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse(
            "S -> A B | B A\nA -> a A b | a b\nB -> b B a | b a",
            "S",
            &mut table,
        )
        .unwrap();
        let wcnf = cfg.to_weak_cnf(&mut table);

        let mut graph: Graph<u64> = Graph::new();
        graph.add_edge(&mut table, 0, "a", 1);
        graph.add_edge(&mut table, 1, "b", 2);
        graph.add_edge(&mut table, 2, "b", 3);
        graph.add_edge(&mut table, 3, "a", 4);
        graph.add_edge(&mut table, 0, "b", 5);
        graph.add_edge(&mut table, 5, "a", 6);
        graph.add_edge(&mut table, 6, "a", 7);
        graph.add_edge(&mut table, 7, "b", 8);

        let result = hellings(&wcnf, &graph);
        let s = cfg.start();
        let pairs: AHashSet<(usize, usize)> = result
            .iter()
            .filter(|&&(_, var, _)| var == s)
            .map(|&(u, _, v)| (u, v))
            .collect();
        assert!(pairs.contains(&(0, 8)));
        assert!(pairs.contains(&(0, 4)));
    }
}
