//! A graph view of [`Knowledge`] that only admits knowledge edges.
//!
//! Each variable is a node; each constrained ordered pair is a directed edge
//! tagged with a [`KnowledgeEdgeKind`]. Ordinary edge insertion is rejected, so
//! the view cannot drift into a causal graph by accident.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::errors::CausalError;
use crate::graph::{Edge, Graph, Node};

use super::Knowledge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnowledgeEdgeKind {
    Forbidden,
    Required,
    ForbiddenByTiers,
    ForbiddenByGroups,
    RequiredByGroups,
}

impl KnowledgeEdgeKind {
    /// True for kinds that follow from tiers or groups rather than an
    /// explicit rule. Derived edges cannot be edited through the view.
    pub fn is_derived(self) -> bool {
        !matches!(self, Self::Forbidden | Self::Required)
    }
}

impl fmt::Display for KnowledgeEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Forbidden => "forbidden",
            Self::Required => "required",
            Self::ForbiddenByTiers => "forbidden by tiers",
            Self::ForbiddenByGroups => "forbidden by groups",
            Self::RequiredByGroups => "required by groups",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: Graph,
    kinds: FxHashMap<(Node, Node), KnowledgeEdgeKind>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the view of every constrained ordered pair of `knowledge`.
    ///
    /// Each pair gets the strongest applicable kind: explicit requirements,
    /// then group requirements, then explicit forbids, group forbids and
    /// finally tier forbids.
    pub fn from_knowledge(knowledge: &Knowledge) -> Result<Self, CausalError> {
        let mut view = Self::new();
        for name in knowledge.variables() {
            view.add_variable(name)?;
        }
        let nodes = view.graph.nodes().to_vec();
        for from in &nodes {
            for to in &nodes {
                if from == to {
                    continue;
                }
                if let Some(kind) = classify(knowledge, from.name(), to.name()) {
                    view.insert(from, to, kind)?;
                }
            }
        }
        Ok(view)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn add_variable(&mut self, name: &str) -> Result<bool, CausalError> {
        super::wildcard::validate_name(name)?;
        Ok(self.graph.add_node(Node::new(name)))
    }

    pub fn kind(&self, from: &Node, to: &Node) -> Option<KnowledgeEdgeKind> {
        self.kinds.get(&(from.clone(), to.clone())).copied()
    }

    /// All knowledge edges as `(from, to, kind)`, sorted by names.
    pub fn knowledge_edges(&self) -> Vec<(Node, Node, KnowledgeEdgeKind)> {
        let mut edges: Vec<_> = self
            .kinds
            .iter()
            .map(|((a, b), kind)| (a.clone(), b.clone(), *kind))
            .collect();
        edges.sort();
        edges
    }

    /// Adds an explicit forbidden or required edge.
    ///
    /// Returns `Ok(false)` if the same edge is already present.
    ///
    /// # Errors
    ///
    /// `Unsupported` for derived kinds; `InvalidArgument` for unknown nodes or
    /// if the pair already carries a different kind.
    pub fn add_knowledge_edge(
        &mut self,
        from: &Node,
        to: &Node,
        kind: KnowledgeEdgeKind,
    ) -> Result<bool, CausalError> {
        if kind.is_derived() {
            return Err(CausalError::Unsupported(format!(
                "{} edges follow from tiers or groups and cannot be added directly",
                kind
            )));
        }
        match self.kind(from, to) {
            Some(existing) if existing == kind => Ok(false),
            Some(existing) => Err(CausalError::invalid(format!(
                "{} --> {} is already {}",
                from, to, existing
            ))),
            None => self.insert(from, to, kind).map(|_| true),
        }
    }

    /// Removes an explicit knowledge edge. Returns `Ok(false)` if absent.
    pub fn remove_knowledge_edge(&mut self, from: &Node, to: &Node) -> Result<bool, CausalError> {
        let key = (from.clone(), to.clone());
        let Some(kind) = self.kinds.get(&key).copied() else {
            return Ok(false);
        };
        if kind.is_derived() {
            return Err(CausalError::Unsupported(format!(
                "{} --> {} is {}; change the knowledge instead",
                from, to, kind
            )));
        }
        self.kinds.remove(&key);
        Ok(self.graph.remove_edge(&Edge::directed(from.clone(), to.clone())))
    }

    /// Always fails: only knowledge edges may be added to this view.
    pub fn add_edge(&mut self, edge: Edge) -> Result<bool, CausalError> {
        Err(CausalError::Unsupported(format!(
            "cannot add {} to a knowledge graph; use add_knowledge_edge",
            edge
        )))
    }

    /// Always fails: only knowledge edges may be added to this view.
    pub fn add_directed_edge(&mut self, tail: &Node, head: &Node) -> Result<bool, CausalError> {
        self.add_edge(Edge::directed(tail.clone(), head.clone()))
    }

    /// Knowledge holding every variable and the explicit edges of the view.
    /// Derived edges are not written back; they belong to tiers and groups.
    pub fn to_knowledge(&self) -> Result<Knowledge, CausalError> {
        let mut knowledge = Knowledge::with_variables(self.graph.node_names())?;
        for (from, to, kind) in self.knowledge_edges() {
            match kind {
                KnowledgeEdgeKind::Forbidden => knowledge.set_forbidden(from.name(), to.name())?,
                KnowledgeEdgeKind::Required => knowledge.set_required(from.name(), to.name())?,
                _ => {}
            }
        }
        Ok(knowledge)
    }

    fn insert(&mut self, from: &Node, to: &Node, kind: KnowledgeEdgeKind) -> Result<(), CausalError> {
        self.graph.add_directed_edge(from, to)?;
        self.kinds.insert((from.clone(), to.clone()), kind);
        Ok(())
    }
}

fn classify(knowledge: &Knowledge, from: &str, to: &str) -> Option<KnowledgeEdgeKind> {
    if knowledge.required.iter().any(|r| r.covers(from, to)) {
        Some(KnowledgeEdgeKind::Required)
    } else if knowledge.is_required_by_groups(from, to) {
        Some(KnowledgeEdgeKind::RequiredByGroups)
    } else if knowledge.is_explicitly_forbidden(from, to) {
        Some(KnowledgeEdgeKind::Forbidden)
    } else if knowledge.is_forbidden_by_groups(from, to) {
        Some(KnowledgeEdgeKind::ForbiddenByGroups)
    } else if knowledge.is_forbidden_by_tiers(from, to) {
        Some(KnowledgeEdgeKind::ForbiddenByTiers)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_edges_are_rejected() {
        let mut view = KnowledgeGraph::new();
        view.add_variable("A").unwrap();
        view.add_variable("B").unwrap();
        let (a, b) = (Node::new("A"), Node::new("B"));

        assert!(matches!(
            view.add_directed_edge(&a, &b),
            Err(CausalError::Unsupported(_))
        ));
        assert!(matches!(
            view.add_knowledge_edge(&a, &b, KnowledgeEdgeKind::ForbiddenByTiers),
            Err(CausalError::Unsupported(_))
        ));
        assert!(view
            .add_knowledge_edge(&a, &b, KnowledgeEdgeKind::Forbidden)
            .unwrap());
        assert_eq!(view.graph().num_edges(), 1);
    }

    #[test]
    fn tiers_show_up_as_derived_edges() {
        let mut k = Knowledge::new();
        k.add_to_tier(0, "A").unwrap();
        k.add_to_tier(1, "B").unwrap();
        k.set_required("A", "B").unwrap();

        let view = KnowledgeGraph::from_knowledge(&k).unwrap();
        let (a, b) = (Node::new("A"), Node::new("B"));
        assert_eq!(view.kind(&b, &a), Some(KnowledgeEdgeKind::ForbiddenByTiers));
        assert_eq!(view.kind(&a, &b), Some(KnowledgeEdgeKind::Required));

        let mut view = view;
        assert!(view.remove_knowledge_edge(&b, &a).is_err());
        assert!(view.remove_knowledge_edge(&a, &b).unwrap());
        assert_eq!(view.kind(&a, &b), None);
    }

    #[test]
    fn explicit_rules_round_trip() {
        let mut k = Knowledge::with_variables(["A", "B", "C"]).unwrap();
        k.set_forbidden("A", "B").unwrap();
        k.set_required("C", "A").unwrap();

        let back = KnowledgeGraph::from_knowledge(&k)
            .unwrap()
            .to_knowledge()
            .unwrap();
        assert_eq!(back.forbidden_edges(), k.forbidden_edges());
        assert_eq!(back.required_edges(), k.required_edges());
        assert_eq!(back.variables(), k.variables());
    }
}
