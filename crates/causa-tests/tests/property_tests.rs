//! Property tests for path queries, knowledge rules and aggregation

use causa_core::graph::{Graph, Node, NodeType};
use causa_core::knowledge::Knowledge;
use causa_core::resampling::{aggregate_graphs, EdgeEnsemble};
use proptest::prelude::*;

fn names(n: usize) -> Vec<Node> {
    (0..n).map(|i| Node::new(format!("V{}", i))).collect()
}

/// Directed graph over `n` nodes, cycles allowed.
fn directed_graph(n: usize, edges: &[(usize, usize)]) -> Graph {
    let nodes = names(n);
    let mut g = Graph::with_nodes(nodes.iter().cloned());
    for &(i, j) in edges {
        let (i, j) = (i % n, j % n);
        if i != j {
            let _ = g.add_directed_edge(&nodes[i], &nodes[j]);
        }
    }
    g
}

/// Transitive closure of the directed edges, by Floyd-Warshall.
fn closure(g: &Graph) -> Vec<Vec<bool>> {
    let nodes = g.nodes();
    let n = nodes.len();
    let mut reach = vec![vec![false; n]; n];
    for (i, x) in nodes.iter().enumerate() {
        for (j, y) in nodes.iter().enumerate() {
            reach[i][j] = g.is_parent_of(x, y);
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if reach[i][k] && reach[k][j] {
                    reach[i][j] = true;
                }
            }
        }
    }
    reach
}

fn edge_list() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..8, 0usize..8), 0..20)
}

proptest! {
    #[test]
    fn ancestry_matches_transitive_closure(n in 2usize..8, edges in edge_list()) {
        let g = directed_graph(n, &edges);
        let reach = closure(&g);
        let paths = g.paths();
        let nodes = g.nodes();
        for (i, x) in nodes.iter().enumerate() {
            for (j, y) in nodes.iter().enumerate() {
                prop_assert_eq!(paths.is_ancestor_of(x, y), reach[i][j], "{} -> {}", x, y);
            }
        }
    }

    #[test]
    fn ancestry_is_transitive(n in 3usize..8, edges in edge_list()) {
        let g = directed_graph(n, &edges);
        let paths = g.paths();
        let nodes = g.nodes();
        for x in nodes {
            for y in nodes {
                for z in nodes {
                    if paths.is_ancestor_of(x, y) && paths.is_ancestor_of(y, z) {
                        prop_assert!(paths.is_ancestor_of(x, z));
                    }
                }
            }
        }
    }

    #[test]
    fn directed_paths_are_semi_directed(n in 2usize..8, edges in edge_list()) {
        let g = directed_graph(n, &edges);
        let paths = g.paths();
        for x in g.nodes() {
            for y in g.nodes() {
                if paths.exists_directed_path(x, y) {
                    prop_assert!(paths.exists_semi_directed_path_to(x, y));
                }
            }
        }
    }

    #[test]
    fn cycle_detection_agrees_with_ordering(n in 2usize..8, edges in edge_list()) {
        let g = directed_graph(n, &edges);
        let paths = g.paths();
        prop_assert_eq!(paths.exists_directed_cycle(), paths.valid_order().is_err());
        let self_ancestor = g.nodes().iter().any(|x| paths.is_ancestor_of(x, x));
        prop_assert_eq!(paths.exists_directed_cycle(), self_ancestor);
    }

    #[test]
    fn forbidding_is_idempotent(repeats in 1usize..5, from in 0usize..4, to in 0usize..4) {
        prop_assume!(from != to);
        let vars: Vec<String> = (0..4).map(|i| format!("V{}", i)).collect();
        let mut k = Knowledge::with_variables(&vars).unwrap();
        for _ in 0..repeats {
            k.set_forbidden(&vars[from], &vars[to]).unwrap();
        }
        prop_assert_eq!(k.forbidden_edges().len(), 1);
        prop_assert!(k.is_forbidden(&vars[from], &vars[to]));
    }

    #[test]
    fn required_always_beats_tiers(from_tier in 0usize..3, to_tier in 0usize..3, within in any::<bool>()) {
        let mut k = Knowledge::with_variables(["A", "B"]).unwrap();
        k.add_to_tier(from_tier, "A").unwrap();
        k.add_to_tier(to_tier, "B").unwrap();
        k.set_tier_forbidden_within(from_tier, within).unwrap();
        k.set_required("A", "B").unwrap();
        prop_assert!(!k.is_forbidden("A", "B"));
    }

    #[test]
    fn aggregation_ignores_input_order(
        specs in prop::collection::vec(prop::collection::vec((0usize..5, 0usize..5), 0..6), 1..6),
        kinds in prop::collection::vec(0usize..4, 30),
        ensemble in prop_oneof![
            Just(EdgeEnsemble::Preserved),
            Just(EdgeEnsemble::Highest),
            Just(EdgeEnsemble::Majority),
            Just(EdgeEnsemble::Threshold(0.4)),
        ],
    ) {
        let types = [NodeType::Measured, NodeType::Latent, NodeType::Error, NodeType::Selection];
        // Edges point from lower to higher index, so every input is a DAG.
        // Inputs may disagree on node types.
        let mut graphs: Vec<Graph> = specs
            .iter()
            .enumerate()
            .map(|(k, edges)| {
                let forward: Vec<(usize, usize)> =
                    edges.iter().map(|&(i, j)| (i.min(j), i.max(j))).collect();
                let dag = directed_graph(5, &forward);
                let mut typed = Graph::with_nodes(
                    names(5)
                        .into_iter()
                        .enumerate()
                        .map(|(i, n)| n.with_type(types[kinds[k * 5 + i]])),
                );
                typed.transfer_nodes_and_edges(&dag).unwrap();
                typed
            })
            .collect();
        let forward = aggregate_graphs(&graphs, ensemble);
        graphs.reverse();
        let backward = aggregate_graphs(&graphs, ensemble);
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(forward.to_string(), backward.to_string());
        let forward_types: Vec<NodeType> = forward.nodes().iter().map(Node::node_type).collect();
        let backward_types: Vec<NodeType> = backward.nodes().iter().map(Node::node_type).collect();
        prop_assert_eq!(forward_types, backward_types);
    }
}
