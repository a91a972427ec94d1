//! Extended CFG (ECFG): one regex-bodied production per variable.

use ahash::{AHashMap, AHashSet};

use crate::cfg::Cfg;
use crate::error::GrammarError;
use crate::regex::Regex;
use crate::rsm::Rsm;
use crate::symbol::{Label, Symbol, SymbolTable};

/// An extended CFG: each variable has exactly one regex production body
/// over `V ∪ T`. Re-defining a head is rejected as a duplicate-symbol
/// grammar.
#[derive(Clone, Debug)]
pub struct Ecfg {
    start: Symbol,
    bodies: AHashMap<Symbol, Regex>,
}

impl Ecfg {
    pub fn start(&self) -> Symbol {
        self.start
    }

    pub fn bodies(&self) -> impl Iterator<Item = (Symbol, &Regex)> {
        self.bodies.iter().map(|(&h, r)| (h, r))
    }

    /// One line per variable, `Head -> RegexBody`; `$` denotes epsilon in
    /// converted bodies. A variable's body may reference any other
    /// declared head as a recursive call, so heads are collected in a first
    /// pass before regex bodies are resolved against that set.
    pub fn parse(text: &str, start_name: &str, table: &mut SymbolTable) -> Result<Ecfg, GrammarError> {
        let start = table.intern(start_name);

        let mut raw: Vec<(Symbol, &str)> = Vec::new();
        let mut heads: AHashSet<Symbol> = AHashSet::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (head_text, body_text) = line.split_once("->").ok_or_else(|| {
                GrammarError::Parse(format!("missing '->' in ECFG line {line:?}"))
            })?;
            let head = table.intern(head_text.trim());
            if !heads.insert(head) {
                return Err(GrammarError::DuplicateHead {
                    head: head_text.trim().to_string(),
                });
            }
            raw.push((head, body_text.trim()));
        }

        if !heads.contains(&start) {
            return Err(GrammarError::UndefinedStart {
                symbol: start_name.to_string(),
            });
        }

        let mut bodies = AHashMap::default();
        for (head, body_text) in raw {
            let regex = Regex::parse_with_variables(body_text, table, &heads)?;
            bodies.insert(head, regex);
        }
        Ok(Ecfg { start, bodies })
    }

    /// Groups a CFG's productions by head and joins their bodies as
    /// `(b1) | (b2) | ...`; an empty body becomes the `$` convention for
    /// epsilon.
    pub fn from_cfg(cfg: &Cfg, table: &mut SymbolTable) -> Ecfg {
        let variables: AHashSet<Symbol> = cfg.variables().collect();
        let mut bodies = AHashMap::default();
        for head in cfg.variables() {
            let alternatives: Vec<String> = cfg
                .productions_of(head)
                .iter()
                .map(|body| body_to_text(body, table))
                .collect();
            let joined = if alternatives.is_empty() {
                "$".to_string()
            } else {
                alternatives
                    .iter()
                    .map(|b| format!("({b})"))
                    .collect::<Vec<_>>()
                    .join(" | ")
            };
            let regex = Regex::parse_with_variables(&joined, table, &variables)
                .expect("a body built from already-valid CFG symbols always reparses");
            bodies.insert(head, regex);
        }
        Ecfg {
            start: cfg.start(),
            bodies,
        }
    }

    /// Converts every production body's regex into a minimized DFA box,
    /// yielding a recursive state machine.
    pub fn to_rsm(&self) -> Rsm {
        let boxes = self
            .bodies
            .iter()
            .map(|(&head, regex)| {
                let dfa = regex.to_fa().determinize().minimize();
                (head, dfa)
            })
            .collect();
        Rsm::new(self.start, boxes)
    }
}

fn body_to_text(body: &[Label], table: &SymbolTable) -> String {
    if body.is_empty() {
        return "$".to_string();
    }
    body.iter()
        .map(|label| match label {
            Label::Terminal(s) | Label::Variable(s) => {
                let name = table.resolve(*s);
                if name.chars().count() == 1 && !"()|*+$<>".contains(name) {
                    name.to_string()
                } else {
                    format!("<{name}>")
                }
            }
            Label::Epsilon => "$".to_string(),
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_head() {
        let mut table = SymbolTable::new();
        let err = Ecfg::parse("S -> a\nS -> b", "S", &mut table).unwrap_err();
        assert!(matches!(err, GrammarError::DuplicateHead { .. }));
    }

    #[test]
    fn parses_recursive_call_between_heads() {
        let mut table = SymbolTable::new();
        let ecfg = Ecfg::parse("S -> a<S>b | $", "S", &mut table).unwrap();
        assert_eq!(ecfg.bodies().count(), 1);
    }

    #[test]
    fn from_cfg_round_trips_alternatives() {
        let mut table = SymbolTable::new();
        let cfg = Cfg::parse("S -> a S b | epsilon", "S", &mut table).unwrap();
        let ecfg = Ecfg::from_cfg(&cfg, &mut table);
        assert_eq!(ecfg.bodies().count(), 1);
    }
}
