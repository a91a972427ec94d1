//! Recursive state machine (RSM): one minimized DFA "box" per nonterminal.

use ahash::AHashMap;

use crate::automaton::Fa;
use crate::symbol::Symbol;

/// A pair `(start, boxes)` where `boxes` maps each variable to a minimized
/// DFA over `T ∪ V` accepting that variable's language.
#[derive(Clone, Debug)]
pub struct Rsm {
    start: Symbol,
    boxes: AHashMap<Symbol, Fa>,
}

impl Rsm {
    pub fn new(start: Symbol, boxes: AHashMap<Symbol, Fa>) -> Self {
        Rsm { start, boxes }
    }

    pub fn start(&self) -> Symbol {
        self.start
    }

    pub fn boxes(&self) -> impl Iterator<Item = (&Symbol, &Fa)> {
        self.boxes.iter()
    }

    pub fn box_for(&self, head: Symbol) -> Option<&Fa> {
        self.boxes.get(&head)
    }

    /// Minimizes each box's DFA independently. Idempotent on an already
    /// minimized RSM (DFA minimization is itself idempotent).
    pub fn minimize(&self) -> Rsm {
        let boxes = self
            .boxes
            .iter()
            .map(|(&head, fa)| (head, fa.minimize()))
            .collect();
        Rsm {
            start: self.start,
            boxes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecfg::Ecfg;
    use crate::symbol::SymbolTable;

    #[test]
    fn to_rsm_builds_one_box_per_head() {
        let mut table = SymbolTable::new();
        let ecfg = Ecfg::parse("S -> a<S>b | $", "S", &mut table).unwrap();
        let rsm = ecfg.to_rsm();
        assert_eq!(rsm.boxes().count(), 1);
        assert!(rsm.box_for(rsm.start()).is_some());
    }

    #[test]
    fn minimize_is_idempotent_on_state_count() {
        let mut table = SymbolTable::new();
        let ecfg = Ecfg::parse("S -> a*", "S", &mut table).unwrap();
        let rsm = ecfg.to_rsm();
        let again = rsm.minimize();
        let before = rsm.box_for(rsm.start()).unwrap().num_states();
        let after = again.box_for(again.start()).unwrap().num_states();
        assert_eq!(before, after);
    }
}
