use causa_core::graph::{Graph, Node};
use causa_core::knowledge::{GroupKind, Knowledge, KnowledgeEdgeKind, KnowledgeGraph, KnowledgeGroup};
use causa_core::CausalError;

fn knowledge(names: &[&str]) -> Knowledge {
    Knowledge::with_variables(names.iter().copied()).unwrap()
}

#[test]
fn future_cannot_cause_past() {
    let mut k = knowledge(&["A", "B", "C"]);
    k.add_to_tier(0, "A").unwrap();
    k.add_to_tier(0, "B").unwrap();
    k.add_to_tier(1, "C").unwrap();
    assert!(k.is_forbidden("C", "A"));
    assert!(!k.is_forbidden("A", "C"));
    assert!(!k.is_forbidden("A", "B"));
}

#[test]
fn required_overrides_tiers() {
    let mut k = knowledge(&["A", "C"]);
    k.add_to_tier(0, "A").unwrap();
    k.add_to_tier(1, "C").unwrap();
    k.set_required("C", "A").unwrap();
    assert!(k.is_forbidden_by_tiers("C", "A"));
    assert!(!k.is_forbidden("C", "A"));
    assert!(k.is_required("C", "A"));
}

#[test]
fn wildcards_expand_at_call_time() {
    let mut k = knowledge(&["X1", "X2", "Y1"]);
    k.add_to_tier(0, "X*").unwrap();
    assert_eq!(k.tier(0), vec!["X1", "X2"]);

    k.add_variable("X3").unwrap();
    assert_eq!(k.tier_of("X3"), None);
    k.add_to_tier(0, "X*").unwrap();
    assert_eq!(k.tier(0), vec!["X1", "X2", "X3"]);
}

#[test]
fn forbidding_is_idempotent() {
    let mut k = knowledge(&["A", "B"]);
    k.set_forbidden("A", "B").unwrap();
    k.set_forbidden("A", "B").unwrap();
    assert_eq!(k.forbidden_edges(), vec![("A".to_string(), "B".to_string())]);
    assert!(k.is_forbidden("A", "B"));
    assert!(!k.is_forbidden("B", "A"));
}

#[test]
fn tier_flags() {
    let mut k = knowledge(&["A", "B", "C", "D"]);
    for (tier, name) in [(0, "A"), (0, "B"), (1, "C"), (2, "D")] {
        k.add_to_tier(tier, name).unwrap();
    }
    assert!(!k.is_forbidden("A", "B"));
    k.set_tier_forbidden_within(0, true).unwrap();
    assert!(k.is_forbidden("A", "B"));

    assert!(!k.is_forbidden("A", "D"));
    k.set_only_can_cause_next_tier(0, true).unwrap();
    assert!(k.is_forbidden("A", "D"));
    assert!(!k.is_forbidden("A", "C"));
}

#[test]
fn malformed_rules_are_rejected() {
    let mut k = knowledge(&["A", "B"]);
    assert!(matches!(k.set_forbidden("A", "A"), Err(CausalError::InvalidArgument(_))));
    assert!(k.add_variable("bad name").is_err());
    k.set_required("A", "B").unwrap();
    assert!(k.set_required("B", "A").is_err());
    assert!(KnowledgeGroup::new(GroupKind::Forbidden, ["A"], ["A", "B"]).is_err());
}

#[test]
fn groups_forbid_and_require() {
    let mut k = knowledge(&["A", "B", "C"]);
    k.add_knowledge_group(KnowledgeGroup::new(GroupKind::Forbidden, ["A", "B"], ["C"]).unwrap())
        .unwrap();
    assert!(k.is_forbidden_by_groups("A", "C"));
    assert!(k.is_forbidden("B", "C"));
    assert!(!k.is_forbidden("C", "A"));

    k.add_knowledge_group(KnowledgeGroup::new(GroupKind::Required, ["A"], ["C"]).unwrap())
        .unwrap();
    assert!(k.is_required_by_groups("A", "C"));
    assert!(!k.is_forbidden("A", "C"));
    assert!(k.remove_knowledge_group(0).is_some());
    assert_eq!(k.knowledge_groups().len(), 1);
}

#[test]
fn violations_follow_directed_edges_only() {
    let (a, b) = (Node::new("A"), Node::new("B"));
    let mut k = knowledge(&["A", "B"]);
    k.set_forbidden("A", "B").unwrap();

    let mut g = Graph::with_nodes([a.clone(), b.clone()]);
    g.add_undirected_edge(&a, &b).unwrap();
    assert!(!k.is_violated_by(&g));
    g.remove_edges_between(&a, &b);
    g.add_directed_edge(&a, &b).unwrap();
    assert!(k.is_violated_by(&g));
}

#[test]
fn clones_are_independent() {
    let mut original = knowledge(&["A", "B"]);
    original.add_to_tier(0, "A").unwrap();
    let mut copy = original.clone();
    copy.set_forbidden("A", "B").unwrap();
    copy.remove_from_tiers("A");
    assert!(!original.is_forbidden("A", "B"));
    assert_eq!(original.tier_of("A"), Some(0));
    assert_ne!(original, copy);
}

#[test]
fn constrained_view_round_trips() {
    let mut k = knowledge(&["A", "B", "C"]);
    k.set_forbidden("A", "B").unwrap();
    k.set_required("B", "C").unwrap();
    k.add_to_tier(0, "A").unwrap();
    k.add_to_tier(1, "C").unwrap();

    let mut view = KnowledgeGraph::from_knowledge(&k).unwrap();
    let (a, c) = (Node::new("A"), Node::new("C"));
    assert_eq!(view.kind(&c, &a), Some(KnowledgeEdgeKind::ForbiddenByTiers));
    assert!(matches!(
        view.add_directed_edge(&a, &c),
        Err(CausalError::Unsupported(_))
    ));
    assert!(matches!(
        view.add_knowledge_edge(&a, &c, KnowledgeEdgeKind::ForbiddenByTiers),
        Err(CausalError::Unsupported(_))
    ));

    let back = view.to_knowledge().unwrap();
    assert_eq!(back.forbidden_edges(), k.forbidden_edges());
    assert_eq!(back.required_edges(), k.required_edges());
}

#[test]
fn display_renders_a_knowledge_block() {
    let mut k = knowledge(&["A", "B"]);
    k.add_to_tier(0, "A").unwrap();
    k.set_forbidden("B", "A").unwrap();
    let text = k.to_string();
    assert!(text.starts_with("/knowledge"));
    assert!(text.contains("forbiddirect"));
}
