//! Labeled directed multigraph: the data value every query engine consumes.
//!
//! Nodes are drawn from an opaque, hashable, `Clone` domain `N` (callers use
//! `u64` for edge-list text). Edges are `(u, label, v)` triples;
//! duplicate triples collapse, matching the data model's "multiple edges ...
//! collapse to one in the Boolean representation". Edge labels are interned
//! into a caller-supplied [`SymbolTable`] so a graph and the regex/grammar it
//! is queried against share one symbol space — two parses of the text `"a"`
//! must land on the same [`Symbol`] for automaton intersection to ever see a
//! common label.

use std::fmt::Debug;
use std::hash::Hash;

use ahash::{AHashMap, AHashSet};

use crate::automaton::{Fa, State};
use crate::dot::{Edge as DotEdge, Family, GraphWriter};
use crate::error::GraphError;
use crate::symbol::{Label, SymbolTable};

/// A labeled directed multigraph over node domain `N`.
#[derive(Clone, Debug)]
pub struct Graph<N> {
    nodes: Vec<N>,
    index: AHashMap<N, usize>,
    edges: Vec<AHashSet<(Label, usize)>>,
}

impl<N: Hash + Eq + Clone + Debug> Graph<N> {
    pub fn new() -> Self {
        Graph {
            nodes: Vec::new(),
            index: AHashMap::default(),
            edges: Vec::new(),
        }
    }

    /// Returns the dense index of `node`, allocating one if this is the
    /// first time it is seen.
    pub fn node_index(&mut self, node: N) -> usize {
        if let Some(&i) = self.index.get(&node) {
            return i;
        }
        let i = self.nodes.len();
        self.index.insert(node.clone(), i);
        self.nodes.push(node);
        self.edges.push(AHashSet::default());
        i
    }

    /// Adds an edge `(u, label, v)`, interning `label` into `table`.
    /// Repeating an existing triple is a no-op (multi-edges collapse).
    pub fn add_edge(&mut self, table: &mut SymbolTable, u: N, label: &str, v: N) {
        let ui = self.node_index(u);
        let vi = self.node_index(v);
        let sym = table.intern(label);
        self.edges[ui].insert((Label::Terminal(sym), vi));
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    pub fn node_at(&self, index: usize) -> &N {
        &self.nodes[index]
    }

    pub fn index_of(&self, node: &N) -> Option<usize> {
        self.index.get(node).copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&N, Label, &N)> + '_ {
        self.edges.iter().enumerate().flat_map(move |(u, out)| {
            out.iter()
                .map(move |&(label, v)| (&self.nodes[u], label, &self.nodes[v]))
        })
    }

    /// Converts this graph into an NFA whose states are the graph's node
    /// indices, with `starts`/`finals` marking the given node sets
    /// (defaulting to every node when `None`).
    pub fn to_fa(&self, starts: Option<&[N]>, finals: Option<&[N]>) -> Fa {
        let mut fa = Fa::new(self.nodes.len());
        for (u, out) in self.edges.iter().enumerate() {
            for &(label, v) in out {
                fa.add_edge(State(u), label, State(v));
            }
        }
        match starts {
            Some(set) => {
                for n in set {
                    if let Some(&i) = self.index.get(n) {
                        fa.add_start(State(i));
                    }
                }
            }
            None => {
                for i in 0..self.nodes.len() {
                    fa.add_start(State(i));
                }
            }
        }
        match finals {
            Some(set) => {
                for n in set {
                    if let Some(&i) = self.index.get(n) {
                        fa.add_final(State(i));
                    }
                }
            }
            None => {
                for i in 0..self.nodes.len() {
                    fa.add_final(State(i));
                }
            }
        }
        fa
    }

    /// Writes this graph to DOT.
    pub fn to_dot(&self, table: &SymbolTable) -> String
    where
        N: ToString,
    {
        let mut out = Vec::new();
        {
            let mut writer = GraphWriter::new(&mut out, Family::Directed, None)
                .expect("writing to a Vec<u8> never fails");
            for (u, label, v) in self.edges() {
                let edge = DotEdge {
                    label: Some(label.to_display_form(table).into()),
                    ..DotEdge::none()
                };
                writer
                    .segment([u.to_string(), v.to_string()], Some(edge))
                    .expect("writing to a Vec<u8> never fails");
            }
            writer.end_into_inner().1.expect("writing to a Vec<u8> never fails");
        }
        String::from_utf8(out).expect("DOT output is ASCII/UTF-8 by construction")
    }
}

impl<N: Hash + Eq + Clone + Debug> Default for Graph<N> {
    fn default() -> Self {
        Graph::new()
    }
}

/// Parses whitespace-separated `src dst label` edge-list text into a graph
/// over `u64` nodes. Blank lines are skipped;
/// anything else is a [`GraphError::MalformedEdgeLine`].
pub fn parse_edge_list(text: &str, table: &mut SymbolTable) -> Result<Graph<u64>, GraphError> {
    let mut graph = Graph::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let (src, dst, label) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(d), Some(l), None) => (s, d, l),
            _ => {
                return Err(GraphError::MalformedEdgeLine {
                    line: line.to_string(),
                })
            }
        };
        let src: u64 = src.parse().map_err(|_| GraphError::MalformedEdgeLine {
            line: line.to_string(),
        })?;
        let dst: u64 = dst.parse().map_err(|_| GraphError::MalformedEdgeLine {
            line: line.to_string(),
        })?;
        graph.add_edge(table, src, label, dst);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_edges_collapse() {
        let mut table = SymbolTable::new();
        let mut g: Graph<u64> = Graph::new();
        g.add_edge(&mut table, 0, "a", 1);
        g.add_edge(&mut table, 0, "a", 1);
        assert_eq!(g.edges().count(), 1);
    }

    #[test]
    fn to_fa_defaults_to_all_nodes_start_and_final() {
        let mut table = SymbolTable::new();
        let mut g: Graph<u64> = Graph::new();
        g.add_edge(&mut table, 0, "a", 1);
        let fa = g.to_fa(None, None);
        assert_eq!(fa.starts().len(), 2);
        assert_eq!(fa.finals().len(), 2);
    }

    #[test]
    fn to_fa_honors_explicit_start_final_sets() {
        let mut table = SymbolTable::new();
        let mut g: Graph<u64> = Graph::new();
        g.add_edge(&mut table, 0, "a", 1);
        g.add_edge(&mut table, 1, "b", 2);
        let fa = g.to_fa(Some(&[0]), Some(&[2]));
        assert_eq!(fa.starts().len(), 1);
        assert_eq!(fa.finals().len(), 1);
    }

    #[test]
    fn parse_edge_list_skips_blank_lines() {
        let mut table = SymbolTable::new();
        let graph = parse_edge_list("0 1 a\n\n1 2 b\n", &mut table).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.edges().count(), 2);
    }

    #[test]
    fn parse_edge_list_rejects_malformed_lines() {
        let mut table = SymbolTable::new();
        assert!(parse_edge_list("0 1\n", &mut table).is_err());
        assert!(parse_edge_list("not a number x\n", &mut table).is_err());
    }
}
