//! End-to-end scenarios spanning multiple modules (parsing, automata,
//! query engines), matching the worked examples from the specification.

use ahash::AHashSet;

use langreach::cfg::Cfg;
use langreach::graph::Graph;
use langreach::query::{find_accessible, reachability_with_nonterminal, regular_query};
use langreach::rpq::Accessible;
use langreach::symbol::SymbolTable;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

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
fn e1_rpq_intersection_tc_explicit_start_final() {
    init();
    let mut table = SymbolTable::new();
    let g = e1_graph(&mut table);
    let regex = langreach::regex::Regex::parse("a*(b|c)*e", &mut table).unwrap();
    let result = regular_query(&regex, &g, Some(&[0]), Some(&[4]));
    assert_eq!(result, AHashSet::from_iter([(0, 4)]));
}

#[test]
fn e1_rpq_intersection_tc_default_start_final() {
    init();
    let mut table = SymbolTable::new();
    let g = e1_graph(&mut table);
    let regex = langreach::regex::Regex::parse("a*(b|c)*e", &mut table).unwrap();
    let result = regular_query(&regex, &g, None, None);
    assert_eq!(result, AHashSet::from_iter([(0, 4), (3, 4), (1, 4)]));
}

#[test]
fn e1_rpq_intersection_tc_unmatched_regex_is_empty() {
    init();
    let mut table = SymbolTable::new();
    let g = e1_graph(&mut table);
    let regex = langreach::regex::Regex::parse("a(b|c)+e", &mut table).unwrap();
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
fn e2_rpq_bfs_separated_short_regex() {
    init();
    let mut table = SymbolTable::new();
    let g = e2_graph(&mut table);
    let regex = langreach::regex::Regex::parse("(x|y)", &mut table).unwrap();
    let map = match find_accessible(&regex, &g, Some(&['A', 'C']), None, true) {
        Accessible::PerStart(map) => map,
        _ => panic!("expected per-start result"),
    };
    assert_eq!(map.get(&'A').cloned(), Some(AHashSet::from_iter(['B', 'C'])));
    assert_eq!(map.get(&'C').cloned(), Some(AHashSet::from_iter(['E'])));
}

#[test]
fn e2_rpq_bfs_separated_starred_regex_reaches_everything() {
    init();
    let mut table = SymbolTable::new();
    let g = e2_graph(&mut table);
    let regex = langreach::regex::Regex::parse("(x|y)*", &mut table).unwrap();
    let map = match find_accessible(&regex, &g, Some(&['A', 'B', 'C', 'D']), None, true) {
        Accessible::PerStart(map) => map,
        _ => panic!("expected per-start result"),
    };
    let expected: AHashSet<char> = AHashSet::from_iter(['A', 'B', 'C', 'D', 'E']);
    for start in ['A', 'B', 'C', 'D'] {
        assert_eq!(map.get(&start).cloned(), Some(expected.clone()));
    }
}

#[test]
fn e4_cfpq_nonterminal_filter_over_two_paths() {
    init();
    let mut table = SymbolTable::new();
    let cfg = Cfg::parse(
        "S -> A B | B A\nA -> a A b | a b\nB -> b B a | b a",
        "S",
        &mut table,
    )
    .unwrap();

    let mut graph: Graph<u64> = Graph::new();
    graph.add_edge(&mut table, 0, "a", 1);
    graph.add_edge(&mut table, 1, "b", 2);
    graph.add_edge(&mut table, 2, "b", 3);
    graph.add_edge(&mut table, 3, "a", 4);
    graph.add_edge(&mut table, 0, "b", 5);
    graph.add_edge(&mut table, 5, "a", 6);
    graph.add_edge(&mut table, 6, "a", 7);
    graph.add_edge(&mut table, 7, "b", 8);

    let s = cfg.start();
    let hellings = reachability_with_nonterminal(&cfg, &graph, None, None, s, "hellings", &mut table).unwrap();
    let matrix = reachability_with_nonterminal(&cfg, &graph, None, None, s, "matrix", &mut table).unwrap();
    assert_eq!(hellings, matrix);
    assert_eq!(hellings, AHashSet::from_iter([(0, 8), (0, 4)]));
}

#[test]
fn e6_weak_cnf_shape_and_language_preservation() {
    init();
    let mut table = SymbolTable::new();
    let cfg = Cfg::parse(
        "S -> A A B\nA -> 0 A | A 0 | 1 A | A 1 | 1\nB -> 0 B | 1 B | epsilon",
        "S",
        &mut table,
    )
    .unwrap();
    let wcnf = cfg.to_weak_cnf(&mut table);
    assert!(wcnf.all_bodies_at_most_binary());

    // "11" matches A A B with A="1", A="1", B=epsilon (B is nullable).
    let mut graph: Graph<u64> = Graph::new();
    graph.add_edge(&mut table, 0, "1", 1);
    graph.add_edge(&mut table, 1, "1", 2);

    let s = cfg.start();
    let result = reachability_with_nonterminal(&cfg, &graph, None, None, s, "hellings", &mut table).unwrap();
    assert!(result.contains(&(0, 2)));
}
