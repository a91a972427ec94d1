//! Finite automaton value: a labeled epsilon-NFA / NFA / DFA.
//!
//! States are opaque integer indices the way the design notes ask for
//! ("small integer indices with a side table"); the identity of a state
//! never escapes across automata, only through `to_FA`-style reconstruction
//! at the BAA boundary (`crate::baa`). Epsilon transitions are just edges
//! carrying [`Label::Epsilon`] rather than a separate list, the way
//! [`crate::baa::Baa::build`] wants to treat epsilon as "a distinguished
//! label" rather than a special case.

use ahash::{AHashMap, AHashSet};
use fixedbitset::FixedBitSet;

use crate::symbol::Label;

/// An automaton state. Cheap, `Copy`, meaningless outside its owning [`Fa`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct State(pub usize);

/// A finite automaton: epsilon-NFA, NFA, or DFA depending on what its edges
/// and start-set happen to satisfy. No separate `Variant` tag is kept —
/// [`Fa::is_deterministic`] and [`Fa::has_epsilon`] inspect the shape
/// directly, matching the data model's "Variants: ... depending on whether
/// δ is functional" framing rather than carrying a redundant enum.
#[derive(Clone, Debug)]
pub struct Fa {
    edges: Vec<Vec<(Label, State)>>,
    start: AHashSet<State>,
    finals: AHashSet<State>,
}

impl Fa {
    /// An automaton with `num_states` states and no transitions or start/final
    /// marks yet; callers add edges and mark start/final states.
    pub fn new(num_states: usize) -> Self {
        Fa {
            edges: vec![Vec::new(); num_states],
            start: AHashSet::default(),
            finals: AHashSet::default(),
        }
    }

    pub fn num_states(&self) -> usize {
        self.edges.len()
    }

    pub fn states(&self) -> impl Iterator<Item = State> {
        (0..self.edges.len()).map(State)
    }

    pub fn add_edge(&mut self, from: State, label: Label, to: State) {
        self.edges[from.0].push((label, to));
    }

    pub fn add_start(&mut self, s: State) {
        self.start.insert(s);
    }

    pub fn add_final(&mut self, s: State) {
        self.finals.insert(s);
    }

    pub fn starts(&self) -> &AHashSet<State> {
        &self.start
    }

    pub fn finals(&self) -> &AHashSet<State> {
        &self.finals
    }

    pub fn is_final(&self, s: State) -> bool {
        self.finals.contains(&s)
    }

    pub fn edges_from(&self, s: State) -> &[(Label, State)] {
        &self.edges[s.0]
    }

    pub fn all_edges(&self) -> impl Iterator<Item = (State, Label, State)> + '_ {
        self.edges.iter().enumerate().flat_map(|(from, out)| {
            out.iter().map(move |&(label, to)| (State(from), label, to))
        })
    }

    pub fn has_epsilon(&self) -> bool {
        self.edges
            .iter()
            .any(|out| out.iter().any(|(l, _)| l.is_epsilon()))
    }

    pub fn is_deterministic(&self) -> bool {
        if self.start.len() != 1 || self.has_epsilon() {
            return false;
        }
        self.edges.iter().all(|out| {
            let mut seen = AHashSet::default();
            out.iter().all(|(l, _)| seen.insert(*l))
        })
    }

    /// The set of states reachable from `states` by zero or more
    /// epsilon-transitions, including `states` themselves.
    pub fn epsilon_closure(&self, states: impl IntoIterator<Item = State>) -> AHashSet<State> {
        let mut closure: AHashSet<State> = states.into_iter().collect();
        let mut frontier: Vec<State> = closure.iter().copied().collect();
        while let Some(s) = frontier.pop() {
            for &(label, to) in &self.edges[s.0] {
                if label.is_epsilon() && closure.insert(to) {
                    frontier.push(to);
                }
            }
        }
        closure
    }

    /// Subset construction: builds a DFA over the non-epsilon labels of
    /// `self`. Unreachable from the closure of the start set, states are
    /// dropped (no dead/trap state is materialized).
    pub fn determinize(&self) -> Fa {
        let start_closure = self.epsilon_closure(self.start.iter().copied());
        let mut subset_index: AHashMap<Vec<State>, usize> = AHashMap::default();
        let mut subsets: Vec<AHashSet<State>> = Vec::new();

        let key_of = |set: &AHashSet<State>| -> Vec<State> {
            let mut v: Vec<State> = set.iter().copied().collect();
            v.sort_unstable();
            v
        };

        let start_key = key_of(&start_closure);
        subset_index.insert(start_key, 0);
        subsets.push(start_closure);

        let mut out_edges: Vec<Vec<(Label, usize)>> = vec![Vec::new()];
        let mut worklist = vec![0usize];

        while let Some(idx) = worklist.pop() {
            let mut by_label: AHashMap<Label, AHashSet<State>> = AHashMap::default();
            for &s in &subsets[idx] {
                for &(label, to) in &self.edges[s.0] {
                    if !label.is_epsilon() {
                        by_label.entry(label).or_default().insert(to);
                    }
                }
            }
            for (label, targets) in by_label {
                let closure = self.epsilon_closure(targets);
                let key = key_of(&closure);
                let target_idx = match subset_index.get(&key) {
                    Some(&i) => i,
                    None => {
                        let i = subsets.len();
                        subset_index.insert(key, i);
                        subsets.push(closure);
                        out_edges.push(Vec::new());
                        worklist.push(i);
                        i
                    }
                };
                out_edges[idx].push((label, target_idx));
            }
        }

        log::debug!(
            "subset construction produced {} DFA states from {} NFA states.",
            subsets.len(),
            self.num_states()
        );
        let mut fa = Fa::new(subsets.len());
        fa.add_start(State(0));
        for (idx, subset) in subsets.iter().enumerate() {
            if subset.iter().any(|s| self.finals.contains(s)) {
                fa.add_final(State(idx));
            }
            for &(label, to) in &out_edges[idx] {
                fa.add_edge(State(idx), label, State(to));
            }
        }
        fa
    }

    /// Minimizes a DFA (no epsilon, single start state) by Moore partition
    /// refinement. Unreachable states are dropped first, matching the data
    /// model's "after minimization, no unreachable states, no
    /// equivalent-state pairs" invariant.
    pub fn minimize(&self) -> Fa {
        debug_assert!(
            self.has_epsilon() == false && self.start.len() == 1,
            "minimize expects a DFA: single start state, no epsilon edges"
        );

        let reachable = self.reachable_from(self.start.iter().copied());
        let mut order: Vec<State> = reachable.ones().map(State).collect();
        order.sort_unstable();
        let pos: AHashMap<State, usize> = order.iter().enumerate().map(|(i, &s)| (s, i)).collect();
        let n = order.len();

        let mut labels: Vec<Label> = Vec::new();
        let mut label_set: AHashSet<Label> = AHashSet::default();
        for &s in &order {
            for &(l, _) in &self.edges[s.0] {
                label_set.insert(l);
            }
        }
        labels.extend(label_set.into_iter());

        let mut partition: Vec<usize> = order
            .iter()
            .map(|&s| if self.finals.contains(&s) { 1 } else { 0 })
            .collect();

        loop {
            let mut signature_to_block: AHashMap<Vec<Option<usize>>, usize> = AHashMap::default();
            let mut new_partition = vec![0usize; n];
            for i in 0..n {
                let s = order[i];
                let mut sig: Vec<Option<usize>> = Vec::with_capacity(labels.len() + 1);
                sig.push(Some(partition[i]));
                for &label in &labels {
                    let target = self.edges[s.0]
                        .iter()
                        .find(|(l, _)| *l == label)
                        .map(|(_, to)| partition[pos[to]]);
                    sig.push(target);
                }
                let next_id = signature_to_block.len();
                let block = *signature_to_block.entry(sig).or_insert(next_id);
                new_partition[i] = block;
            }
            if new_partition == partition {
                break;
            }
            partition = new_partition;
        }

        let num_blocks = partition.iter().copied().max().map_or(0, |m| m + 1);
        log::debug!("minimization collapsed {n} reachable states into {num_blocks} blocks.");
        let mut fa = Fa::new(num_blocks);
        let mut edge_seen: AHashSet<(usize, Label, usize)> = AHashSet::default();
        for i in 0..n {
            let s = order[i];
            let block = partition[i];
            if self.start.contains(&s) {
                fa.add_start(State(block));
            }
            if self.finals.contains(&s) {
                fa.add_final(State(block));
            }
            for &(label, to) in &self.edges[s.0] {
                let target_block = partition[pos[&to]];
                if edge_seen.insert((block, label, target_block)) {
                    fa.add_edge(State(block), label, State(target_block));
                }
            }
        }
        fa
    }

    /// Dense reachability over the automaton's own state-index space; a
    /// [`FixedBitSet`] fits this better than a hash set since every index is
    /// already known to lie in `0..num_states`.
    fn reachable_from(&self, states: impl IntoIterator<Item = State>) -> FixedBitSet {
        let mut seen = FixedBitSet::with_capacity(self.edges.len());
        let mut frontier: Vec<State> = Vec::new();
        for s in states {
            if !seen.put(s.0) {
                frontier.push(s);
            }
        }
        while let Some(s) = frontier.pop() {
            for &(_, to) in &self.edges[s.0] {
                if !seen.put(to.0) {
                    frontier.push(to);
                }
            }
        }
        seen
    }
}
