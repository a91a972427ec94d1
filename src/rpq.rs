//! Regex RPQ engine: intersection+transitive-closure reachability and the
//! multi-source BFS accessibility variant.

use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::automaton::Fa;
use crate::baa::Baa;
use crate::bitmatrix::BoolMatrix;
use crate::graph::Graph;
use crate::regex::Regex;

/// Builds the minimal DFA for `regex`, the graph NFA restricted to
/// `starts`/`finals`, intersects their BAAs, takes the transitive closure,
/// and reads off `(u, v)` pairs connected by an accepted word between a
/// start-of-intersection and a final-of-intersection index. `T[i_u, i_v]`
/// with `i_u`/`i_v` divided by the regex DFA's state count recovers the
/// graph-node index on each side.
pub fn regular_query<N: Hash + Eq + Clone>(
    regex: &Regex,
    graph: &Graph<N>,
    starts: Option<&[N]>,
    finals: Option<&[N]>,
) -> AHashSet<(N, N)> {
    let dfa = regex.to_fa().determinize().minimize();
    let graph_fa = graph.to_fa(starts, finals);
    reachable_pairs(&dfa, &graph_fa, graph)
}

/// Core of [`regular_query`]: intersect `graph_fa` against `dfa`, take the
/// transitive closure, and read off graph-node pairs connected through a
/// start-of-intersection/final-of-intersection index pair.
fn reachable_pairs<N: Hash + Eq + Clone>(dfa: &Fa, graph_fa: &Fa, graph: &Graph<N>) -> AHashSet<(N, N)> {
    let bg = Baa::build(graph_fa);
    let br = Baa::build(dfa);
    let combined = bg.intersection(&br);
    let tc = combined.transitive_closure();

    let br_n = br.num_states();
    let combined_starts: AHashSet<usize> = combined.start().row_nonzero_cols().into_iter().collect();
    let combined_finals: AHashSet<usize> = combined.finals().row_nonzero_cols().into_iter().collect();

    let mut result = AHashSet::default();
    for (i, j) in tc.iter_nonzero() {
        if combined_starts.contains(&i) && combined_finals.contains(&j) {
            let u = graph.node_at(i / br_n).clone();
            let v = graph.node_at(j / br_n).clone();
            result.insert((u, v));
        }
    }
    // A zero-length path (start == final, regex accepts epsilon) is not
    // captured by the transitive closure, which only counts paths of
    // length >= 1; add those pairs directly from the combined start/final
    // vectors, matching L(intersection) including the empty word.
    for i in &combined_starts {
        if combined_finals.contains(i) {
            let u = graph.node_at(i / br_n).clone();
            result.insert((u.clone(), u));
        }
    }
    result
}

/// The result of [`find_accessible`]: either the combined reachable set, or
/// one reachable set per start vertex.
pub enum Accessible<N> {
    Combined(AHashSet<N>),
    PerStart(AHashMap<N, AHashSet<N>>),
}

/// Multi-source accessibility by lockstep frontier scan. `for_each = false`
/// unions all start vertices into one frontier and returns the single set of
/// vertices reachable by *some* start vertex via a word in `L(regex)`.
/// `for_each = true` keeps each start vertex's reachable set separate.
///
/// This is a second, independent engine from [`regular_query`]'s
/// intersection+transitive-closure core: rather than building the Kronecker
/// product automaton and closing it, it walks a front matrix of shape
/// `(regex_states * num_start_blocks) x (regex_states + graph_states)`
/// forward one [`BoolMatrix::block_diag`] transition step at a time, per
/// label, until the accumulated front stops growing. The left `regex_states`
/// columns track which regex-DFA state a block has reached; the right
/// `graph_states` columns accumulate every graph vertex visited along the
/// way. A block's row is "final" once its left half lands on a DFA final
/// state, at which point its right half is read off as the reachable set.
pub fn find_accessible<N: Hash + Eq + Clone>(
    regex: &Regex,
    graph: &Graph<N>,
    starts: Option<&[N]>,
    finals: Option<&[N]>,
    for_each: bool,
) -> Accessible<N> {
    let dfa = regex.to_fa().determinize().minimize();
    let graph_fa = graph.to_fa(starts, finals);

    let bq = Baa::build(&dfa);
    let bg = Baa::build(&graph_fa);

    let q = bq.num_states();
    let g = bg.num_states();

    let bg_starts = bg.start().row_nonzero_cols();
    let bg_finals: AHashSet<usize> = bg.finals().row_nonzero_cols().into_iter().collect();
    let bq_starts = bq.start().row_nonzero_cols();
    let bq_finals = bq.finals().row_nonzero_cols();

    let num_blocks = if for_each { bg_starts.len() } else { 1 };
    let mut front = BoolMatrix::zero(q * num_blocks, q + g);

    if for_each {
        for (i, &start_state) in bg_starts.iter().enumerate() {
            for &j in &bq_starts {
                let index = q * i + j;
                front.set(index, j);
                front.set(index, q + start_state);
            }
        }
    } else {
        for &j in &bq_starts {
            front.set(j, j);
            for &start_state in &bg_starts {
                front.set(j, q + start_state);
            }
        }
    }

    // Per-label block-diagonal transition: only labels present in both the
    // regex DFA and the graph NFA can ever advance a front.
    let transitions: Vec<BoolMatrix> = bq
        .labels()
        .filter_map(|label| {
            let q_mat = bq.matrix_for(label)?;
            let g_mat = bg.matrix_for(label)?;
            Some(BoolMatrix::block_diag(&[q_mat.clone(), g_mat.clone()]))
        })
        .collect();

    let mut sum_fronts = BoolMatrix::zero(front.rows(), front.cols());
    let mut prev_nnz = sum_fronts.count_nonzero();
    loop {
        let mut new_front = BoolMatrix::zero(front.rows(), front.cols());
        for transition in &transitions {
            let stepped = front.mul(transition);
            let mut q_hits: AHashMap<usize, Vec<usize>> = AHashMap::default();
            let mut g_hits: AHashMap<usize, Vec<usize>> = AHashMap::default();
            for (row, col) in stepped.iter_nonzero() {
                if col < q {
                    q_hits.entry(row).or_default().push(col);
                } else {
                    g_hits.entry(row).or_default().push(col);
                }
            }
            for (row, targets) in &q_hits {
                let block = row / q;
                let visited = g_hits.get(row);
                for &t in targets {
                    let n = q * block + t;
                    new_front.set(n, t);
                    if let Some(cols) = visited {
                        for &c in cols {
                            new_front.set(n, c);
                        }
                    }
                }
            }
        }
        front = new_front;
        sum_fronts.or_assign(&front);
        let nnz = sum_fronts.count_nonzero();
        if nnz == prev_nnz {
            break;
        }
        prev_nnz = nnz;
    }

    if for_each {
        let mut result = AHashMap::default();
        for (i, &start_state) in bg_starts.iter().enumerate() {
            let mut reached = AHashSet::default();
            for &j in &bq_finals {
                let index = q * i + j;
                if sum_fronts.get(index, j) {
                    for col in q..q + g {
                        if sum_fronts.get(index, col) && bg_finals.contains(&(col - q)) {
                            reached.insert(graph.node_at(col - q).clone());
                        }
                    }
                }
            }
            result.insert(graph.node_at(start_state).clone(), reached);
        }
        Accessible::PerStart(result)
    } else {
        let mut reached = AHashSet::default();
        for &j in &bq_finals {
            if sum_fronts.get(j, j) {
                for col in q..q + g {
                    if sum_fronts.get(j, col) && bg_finals.contains(&(col - q)) {
                        reached.insert(graph.node_at(col - q).clone());
                    }
                }
            }
        }
        Accessible::Combined(reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    fn e1_graph(table: &mut SymbolTable) -> Graph<u64> {
        let mut g: Graph<u64> = Graph::new();
        g.add_edge(table, 0, "a", 1);
        g.add_edge(table, 0, "b", 2);
        g.add_edge(table, 1, "c", 3);
        g.add_edge(table, 2, "d", 3);
        g.add_edge(table, 3, "e", 4);
        g
    }

    #[test]
    fn e1_regular_query_with_explicit_start_final() {
        let mut table = SymbolTable::new();
        let g = e1_graph(&mut table);
        let regex = Regex::parse("a*(b|c)*e", &mut table).unwrap();
        let result = regular_query(&regex, &g, Some(&[0]), Some(&[4]));
        assert_eq!(result, AHashSet::from_iter([(0, 4)]));
    }

    #[test]
    fn e1_regular_query_defaults_to_all_nodes() {
        let mut table = SymbolTable::new();
        let g = e1_graph(&mut table);
        let regex = Regex::parse("a*(b|c)*e", &mut table).unwrap();
        let result = regular_query(&regex, &g, None, None);
        assert_eq!(result, AHashSet::from_iter([(0, 4), (3, 4), (1, 4)]));
    }

    #[test]
    fn e1_regular_query_empty_when_unmatched() {
        let mut table = SymbolTable::new();
        let g = e1_graph(&mut table);
        let regex = Regex::parse("a(b|c)+e", &mut table).unwrap();
        let result = regular_query(&regex, &g, Some(&[0]), Some(&[4]));
        assert!(result.is_empty());
    }

    fn e2_graph(table: &mut SymbolTable) -> Graph<char> {
        let mut g: Graph<char> = Graph::new();
        g.add_edge(table, 'A', "x", 'B');
        g.add_edge(table, 'A', "y", 'C');
        g.add_edge(table, 'B', "z", 'C');
        g.add_edge(table, 'B', "x", 'D');
        g.add_edge(table, 'C', "y", 'E');
        g.add_edge(table, 'D', "z", 'C');
        g.add_edge(table, 'D', "y", 'E');
        g.add_edge(table, 'E', "x", 'A');
        g
    }

    #[test]
    fn e2_bfs_separated_simple() {
        let mut table = SymbolTable::new();
        let g = e2_graph(&mut table);
        let regex = Regex::parse("(x|y)", &mut table).unwrap();
        match find_accessible(&regex, &g, Some(&['A', 'C']), None, true) {
            Accessible::PerStart(map) => {
                assert_eq!(map.get(&'A').cloned(), Some(AHashSet::from_iter(['B', 'C'])));
                assert_eq!(map.get(&'C').cloned(), Some(AHashSet::from_iter(['E'])));
            }
            _ => panic!("expected per-start result"),
        }
    }

    #[test]
    fn e2_bfs_separated_star_reaches_all() {
        let mut table = SymbolTable::new();
        let g = e2_graph(&mut table);
        let regex = Regex::parse("(x|y)*", &mut table).unwrap();
        match find_accessible(&regex, &g, Some(&['A', 'B', 'C', 'D']), None, true) {
            Accessible::PerStart(map) => {
                let expected: AHashSet<char> = AHashSet::from_iter(['A', 'B', 'C', 'D', 'E']);
                for start in ['A', 'B', 'C', 'D'] {
                    assert_eq!(map.get(&start).cloned(), Some(expected.clone()));
                }
            }
            _ => panic!("expected per-start result"),
        }
    }

    #[test]
    fn combined_mode_unions_per_start_results() {
        let mut table = SymbolTable::new();
        let g = e2_graph(&mut table);
        let regex = Regex::parse("(x|y)", &mut table).unwrap();
        let combined = match find_accessible(&regex, &g, Some(&['A', 'C']), None, false) {
            Accessible::Combined(set) => set,
            _ => panic!("expected combined result"),
        };
        assert_eq!(combined, AHashSet::from_iter(['B', 'C', 'E']));
    }

    #[test]
    fn rpq_equivalence_intersect_tc_vs_bfs_combined() {
        let mut table = SymbolTable::new();
        let g = e1_graph(&mut table);
        let regex = Regex::parse("a*(b|c)*e", &mut table).unwrap();
        let from_tc: AHashSet<u64> = regular_query(&regex, &g, Some(&[0]), None)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        let from_bfs = match find_accessible(&regex, &g, Some(&[0]), None, false) {
            Accessible::Combined(set) => set,
            _ => panic!("expected combined result"),
        };
        assert_eq!(from_tc, from_bfs);
    }
}
