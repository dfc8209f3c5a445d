use causa_core::graph::{AttributeValue, Edge, Endpoint, Graph, Node};
use causa_core::CausalError;

fn abc() -> (Node, Node, Node) {
    (Node::new("A"), Node::new("B"), Node::new("C"))
}

#[test]
fn mutations_report_success() {
    let (a, b, c) = abc();
    let mut g = Graph::new();
    assert!(g.add_node(a.clone()));
    assert!(!g.add_node(Node::new("A")));
    assert!(g.add_node(b.clone()));

    assert!(g.add_directed_edge(&a, &b).unwrap());
    assert!(!g.add_edge(Edge::directed(a.clone(), b.clone())).unwrap());
    assert!(matches!(
        g.add_directed_edge(&a, &c),
        Err(CausalError::InvalidArgument(_))
    ));
    assert!(g.add_directed_edge(&a, &a).is_err());

    assert!(g.remove_edge(&Edge::directed(a.clone(), b.clone())));
    assert!(!g.remove_edge(&Edge::directed(a.clone(), b.clone())));
    assert!(!g.remove_node(&c));
}

#[test]
fn removing_a_node_removes_its_edges() {
    let (a, b, c) = abc();
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_directed_edge(&a, &b).unwrap();
    g.add_undirected_edge(&b, &c).unwrap();
    assert!(g.remove_node(&b));
    assert_eq!(g.num_edges(), 0);
    assert!(g.edges_of(&a).is_empty());
}

#[test]
fn orientation_defines_parents_and_children() {
    let (a, b, c) = abc();
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_edge(Edge::new(a.clone(), b.clone(), Endpoint::Tail, Endpoint::Arrow))
        .unwrap();
    g.add_edge(Edge::new(c.clone(), b.clone(), Endpoint::Arrow, Endpoint::Tail))
        .unwrap();

    assert_eq!(g.parents(&b), vec![a.clone()]);
    assert_eq!(g.children(&b), vec![c.clone()]);
    assert!(g.is_parent_of(&a, &b));
    assert!(g.is_child_of(&c, &b));
    assert_eq!(g.endpoint(&a, &b), Some(Endpoint::Arrow));
    assert_eq!(g.endpoint(&b, &a), Some(Endpoint::Tail));
    assert_eq!(g.indegree(&b), 1);
    assert_eq!(g.outdegree(&b), 1);
}

#[test]
fn edge_equality_is_symmetric_and_orientation_aware() {
    let (a, b, _) = abc();
    let forward = Edge::new(a.clone(), b.clone(), Endpoint::Tail, Endpoint::Arrow);
    let mirrored = Edge::new(b.clone(), a.clone(), Endpoint::Arrow, Endpoint::Tail);
    let reversed = Edge::directed(b, a);
    assert_eq!(forward, mirrored);
    assert_ne!(forward, reversed);
}

#[test]
fn subgraph_keeps_only_induced_edges() {
    let (a, b, c) = abc();
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_directed_edge(&a, &b).unwrap();
    g.add_directed_edge(&b, &c).unwrap();
    g.add_directed_edge(&a, &c).unwrap();

    let sub = g.subgraph(&[a.clone(), c.clone()]);
    assert_eq!(sub.num_nodes(), 2);
    assert_eq!(sub.num_edges(), 1);
    assert!(sub.is_parent_of(&a, &c));
}

#[test]
fn transfer_copies_structure_but_not_attributes() {
    let (a, b, _) = abc();
    let mut source = Graph::with_nodes([a.clone(), b.clone()]);
    source.add_bidirected_edge(&a, &b).unwrap();
    source
        .set_node_attribute(&a, "weight", AttributeValue::Number(2.5))
        .unwrap();
    source.set_node_center(&a, 10, 20).unwrap();

    let mut target = Graph::new();
    target.transfer_nodes_and_edges(&source).unwrap();
    assert_eq!(target, source);
    assert!(target.node_attribute(&a, "weight").is_none());
    assert_eq!(target.node_center(&a), Some((10, 20)));
}

#[test]
fn structural_equality_ignores_insertion_order() {
    let (a, b, c) = abc();
    let mut first = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    first.add_directed_edge(&a, &b).unwrap();
    first.add_undirected_edge(&b, &c).unwrap();

    let mut second = Graph::with_nodes([c.clone(), b.clone(), a.clone()]);
    second.add_undirected_edge(&c, &b).unwrap();
    second.add_directed_edge(&a, &b).unwrap();
    assert_eq!(first, second);

    second.remove_edges_between(&a, &b);
    second.add_directed_edge(&b, &a).unwrap();
    assert_ne!(first, second);
}

#[test]
fn triples_follow_adjacencies() {
    let (a, b, c) = abc();
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    g.add_undirected_edge(&a, &b).unwrap();
    assert!(!g.add_underline_triple(&a, &b, &c));

    g.add_undirected_edge(&b, &c).unwrap();
    assert!(g.add_underline_triple(&a, &b, &c));
    assert!(g.is_underline_triple(&a, &b, &c));

    g.remove_edge(&Edge::undirected(a.clone(), b.clone()));
    assert!(!g.is_underline_triple(&a, &b, &c));
}

#[test]
fn display_uses_the_conventional_layout() {
    let (a, b, _) = abc();
    let mut g = Graph::with_nodes([a.clone(), b.clone()]);
    g.add_directed_edge(&a, &b).unwrap();
    let text = g.to_string();
    assert!(text.starts_with("Graph Nodes:\nA;B\n\nGraph Edges:\n1. "));
}
