//! Boolean adjacency automaton (BAA): an [`Fa`] canonicalized as one sparse
//! Boolean matrix per label plus start/final row vectors.
//!
//! This is the shared substrate the RPQ engine and the matrix CFPQ engine
//! both sit on: automaton intersection becomes a per-label Kronecker
//! product, and reachability becomes a Boolean transitive closure. The
//! index map from [`State`] to matrix row/column is internal and never
//! escapes except through [`Baa::to_fa`], matching the "opaque state
//! identities" design note.

use ahash::AHashMap;

use crate::automaton::{Fa, State};
use crate::bitmatrix::BoolMatrix;
use crate::symbol::Label;

/// An automaton canonicalized into per-label Boolean matrices.
#[derive(Clone, Debug)]
pub struct Baa {
    num_states: usize,
    adj: AHashMap<Label, BoolMatrix>,
    start: BoolMatrix,
    finals: BoolMatrix,
}

impl Baa {
    /// Builds a BAA from an [`Fa`], enumerating its states to indices `0..n`
    /// in iteration order (any fixed order satisfies the data model; this
    /// crate uses the state's own integer value, since [`Fa`] already uses
    /// small dense indices as state identities).
    pub fn build(fa: &Fa) -> Baa {
        let n = fa.num_states();
        let mut adj: AHashMap<Label, BoolMatrix> = AHashMap::default();
        for (from, label, to) in fa.all_edges() {
            adj.entry(label)
                .or_insert_with(|| BoolMatrix::zero(n, n))
                .set(from.0, to.0);
        }
        let start = BoolMatrix::row_vector(n, fa.starts().iter().map(|s| s.0));
        let finals = BoolMatrix::row_vector(n, fa.finals().iter().map(|s| s.0));
        Baa {
            num_states: n,
            adj,
            start,
            finals,
        }
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.adj.keys()
    }

    pub fn matrix_for(&self, label: &Label) -> Option<&BoolMatrix> {
        self.adj.get(label)
    }

    pub fn start(&self) -> &BoolMatrix {
        &self.start
    }

    pub fn finals(&self) -> &BoolMatrix {
        &self.finals
    }

    /// Re-materializes an [`Fa`] from this BAA, using the matrix indices as
    /// state identities.
    pub fn to_fa(&self) -> Fa {
        let mut fa = Fa::new(self.num_states);
        for (&label, matrix) in &self.adj {
            for (from, to) in matrix.iter_nonzero() {
                fa.add_edge(State(from), label, State(to));
            }
        }
        for s in self.start.row_nonzero_cols() {
            fa.add_start(State(s));
        }
        for s in self.finals.row_nonzero_cols() {
            fa.add_final(State(s));
        }
        fa
    }

    /// Intersection via Kronecker product: only labels present in
    /// *both* operands survive; the result recognizes `L(self) ∩ L(other)`
    /// modulo renaming, with `num_states = self.num_states * other.num_states`.
    pub fn intersection(&self, other: &Baa) -> Baa {
        let mut adj = AHashMap::default();
        for (label, a) in &self.adj {
            if let Some(b) = other.adj.get(label) {
                adj.insert(*label, a.kron(b));
            }
        }
        Baa {
            num_states: self.num_states * other.num_states,
            adj,
            start: self.start.kron(&other.start),
            finals: self.finals.kron(&other.finals),
        }
    }

    /// Label-agnostic reachability of length >= 1: `R := OR_l adj[l]`, then
    /// `R := R OR (R . R)` until stable.
    pub fn transitive_closure(&self) -> BoolMatrix {
        let n = self.num_states;
        let mut r = BoolMatrix::zero(n, n);
        for m in self.adj.values() {
            r = r.or(m);
        }
        let mut prev_nnz = r.count_nonzero();
        loop {
            let squared = r.mul(&r);
            r = r.or(&squared);
            let nnz = r.count_nonzero();
            if nnz == prev_nnz {
                break;
            }
            prev_nnz = nnz;
        }
        log::trace!("transitive closure stabilized with {prev_nnz} nonzero entries.");
        r
    }

    /// Flattens an [`Rsm`](crate::rsm::Rsm) into one BAA whose state set is
    /// the disjoint union of per-box DFA states. Box-local
    /// DFA edges labeled by a nonterminal become [`Label::Variable`] edges
    /// in the flattened automaton, matching the RSM's "variable-labeled
    /// calls between boxes" semantics. `start`/`finals` mark, for every box,
    /// that box's own start/final states (not only the RSM's overall start
    /// symbol), since a box-call transition needs to know a callee box's
    /// entry/exit states regardless of which box is the RSM's root.
    pub fn from_rsm(rsm: &crate::rsm::Rsm) -> Baa {
        let mut offsets = AHashMap::default();
        let mut total = 0usize;
        for (&head, fa) in rsm.boxes() {
            offsets.insert(head, total);
            total += fa.num_states();
        }

        let mut adj: AHashMap<Label, BoolMatrix> = AHashMap::default();
        let mut start = BoolMatrix::zero(1, total);
        let mut finals = BoolMatrix::zero(1, total);

        for (&head, fa) in rsm.boxes() {
            let offset = offsets[&head];
            for (from, label, to) in fa.all_edges() {
                adj.entry(label)
                    .or_insert_with(|| BoolMatrix::zero(total, total))
                    .set(from.0 + offset, to.0 + offset);
            }
            for s in fa.starts() {
                start.set(0, s.0 + offset);
            }
            for s in fa.finals() {
                finals.set(0, s.0 + offset);
            }
        }

        Baa {
            num_states: total,
            adj,
            start,
            finals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    fn terminal(table: &mut SymbolTable, text: &str) -> Label {
        Label::Terminal(table.intern(text))
    }

    fn two_state_fa(table: &mut SymbolTable, label: &str) -> Fa {
        let mut fa = Fa::new(2);
        let a = terminal(table, label);
        fa.add_edge(State(0), a, State(1));
        fa.add_start(State(0));
        fa.add_final(State(1));
        fa
    }

    #[test]
    fn round_trip_preserves_language_shape() {
        let mut table = SymbolTable::new();
        let fa = two_state_fa(&mut table, "a");
        let baa = Baa::build(&fa);
        let back = baa.to_fa();
        assert_eq!(back.num_states(), fa.num_states());
        assert_eq!(back.starts().len(), fa.starts().len());
        assert_eq!(back.finals().len(), fa.finals().len());
    }

    #[test]
    fn intersection_shape_is_kronecker_product() {
        let mut table = SymbolTable::new();
        let fa1 = two_state_fa(&mut table, "a");
        let mut fa2 = Fa::new(3);
        let a = terminal(&mut table, "a");
        fa2.add_edge(State(0), a, State(1));
        fa2.add_edge(State(1), a, State(2));
        fa2.add_start(State(0));
        fa2.add_final(State(2));

        let b1 = Baa::build(&fa1);
        let b2 = Baa::build(&fa2);
        let inter = b1.intersection(&b2);
        assert_eq!(inter.num_states(), b1.num_states() * b2.num_states());
    }

    #[test]
    fn transitive_closure_reaches_multi_hop() {
        let mut table = SymbolTable::new();
        let mut fa = Fa::new(3);
        let a = terminal(&mut table, "a");
        fa.add_edge(State(0), a, State(1));
        fa.add_edge(State(1), a, State(2));
        let baa = Baa::build(&fa);
        let tc = baa.transitive_closure();
        assert!(tc.get(0, 1));
        assert!(tc.get(1, 2));
        assert!(tc.get(0, 2));
    }
}
