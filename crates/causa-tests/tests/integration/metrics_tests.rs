use causa_core::graph::{Graph, Node};
use causa_core::knowledge::Knowledge;
use causa_core::layout::{arrange_by_knowledge, LayoutEditable, LayoutSession};
use causa_core::metrics::{Statistic, StatisticRegistry};
use causa_core::search::meek::cpdag_from_dag;
use causa_core::search::{MSepTest, Pc, TestChoice};

fn collider_dag() -> Graph {
    let [a, b, c, d] = ["A", "B", "C", "D"].map(Node::new);
    let mut g = Graph::with_nodes([a.clone(), b.clone(), c.clone(), d.clone()]);
    g.add_directed_edge(&a, &c).unwrap();
    g.add_directed_edge(&b, &c).unwrap();
    g.add_directed_edge(&c, &d).unwrap();
    g
}

fn lookup(stats: &[(String, f64)], name: &str) -> f64 {
    stats
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| *v)
        .unwrap_or_else(|| panic!("missing statistic {}", name))
}

#[test]
fn oracle_estimate_scores_perfectly() {
    let truth = collider_dag();
    let estimated = Pc::new(TestChoice::MSep { graph: truth.clone() })
        .search_with_test(&MSepTest::new(truth.clone()), &Knowledge::new())
        .unwrap();
    let stats = StatisticRegistry::with_builtins().compare(&truth, &estimated);
    for name in ["AP", "AR", "AHP", "AHR", "AncP", "AncR"] {
        assert_eq!(lookup(&stats, name), 1.0, "{}", name);
    }
    assert_eq!(lookup(&stats, "EdgesEst"), lookup(&stats, "EdgesTrue"));
}

#[test]
fn no_semidirected_uses_the_raw_true_graph() {
    // The CPDAG of a chain is fully undirected, so it has semi-directed paths
    // in both directions while the true DAG only has them forwards.
    let [a, b, c] = ["A", "B", "C"].map(Node::new);
    let mut truth = Graph::with_nodes([a.clone(), b.clone(), c.clone()]);
    truth.add_directed_edge(&a, &b).unwrap();
    truth.add_directed_edge(&b, &c).unwrap();
    let estimated = cpdag_from_dag(&truth).unwrap();

    let registry = StatisticRegistry::with_builtins();
    let precision = registry.get("NoSemidirectedP").unwrap();
    let recall = registry.get("NoSemidirectedR").unwrap();
    assert!(precision.compute(&truth, &estimated).is_nan());
    assert_eq!(recall.compute(&truth, &estimated), 0.0);
    assert_eq!(recall.compute(&truth, &truth), 1.0);
}

#[test]
fn statistics_are_ordered_by_name() {
    let truth = collider_dag();
    let stats = StatisticRegistry::with_builtins().compare(&truth, &truth);
    let names: Vec<&str> = stats.iter().map(|(n, _)| n.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[test]
fn tier_layout_through_the_editable_seam() {
    let mut knowledge = Knowledge::with_variables(["A", "B", "C", "D"]).unwrap();
    knowledge.add_to_tier(0, "A").unwrap();
    knowledge.add_to_tier(0, "B").unwrap();
    knowledge.add_to_tier(1, "C").unwrap();
    knowledge.add_to_tier(2, "D").unwrap();

    let mut session = LayoutSession::new(collider_dag(), knowledge);
    arrange_by_knowledge(&mut session).unwrap();
    let layout = session.layout();
    let y = |name: &str| layout.iter().find(|(n, _, _)| n.name() == name).map(|(_, _, y)| *y);
    assert_eq!(y("A"), y("B"));
    assert!(y("B") < y("C"));
    assert!(y("C") < y("D"));
}
