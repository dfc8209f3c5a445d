//! Combining resampled graphs into one graph with edge probabilities.
//!
//! For every unordered node pair `{a, b}` (named so that `a < b`), each input
//! graph contributes one [`EdgeType`] as seen from `a`, or `Nil` when the
//! pair is not adjacent. The frequencies of those types decide the output
//! edge and are written onto it. Counting ignores graph order, nodes are
//! ordered by name and ties fall to the earlier entry of [`EdgeType::ALL`],
//! so the result does not depend on the order of the inputs.
//!
//! A node whose type differs between inputs takes its most frequent type;
//! ties go to the earlier entry of [`NODE_TYPES`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::{Edge, EdgeType, EdgeTypeProbability, Graph, Node, NodeType};

/// Node types in tie-breaking order.
pub const NODE_TYPES: [NodeType; 4] = [
    NodeType::Measured,
    NodeType::Latent,
    NodeType::Error,
    NodeType::Selection,
];

/// Rule for turning edge-type frequencies into an output edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeEnsemble {
    /// Keep the most frequent edge type whenever any input has an edge.
    Preserved,
    /// Keep the most frequent type, absence included; absence wins ties.
    Highest,
    /// Keep the most frequent edge type when more than half the inputs have
    /// an edge.
    Majority,
    /// Keep the most frequent edge type when at least this fraction of the
    /// inputs have an edge.
    Threshold(f64),
}

impl EdgeEnsemble {
    fn keeps(self, presence: f64, nil: f64, best: f64) -> bool {
        match self {
            EdgeEnsemble::Preserved => presence > 0.0,
            EdgeEnsemble::Highest => best > nil,
            EdgeEnsemble::Majority => presence > 0.5,
            EdgeEnsemble::Threshold(t) => presence > 0.0 && presence >= t,
        }
    }
}

/// Frequencies of every edge type between `a` and `b` across `graphs`, in
/// [`EdgeType::ALL`] order. Types that never occur are omitted.
pub fn edge_type_probabilities(graphs: &[Graph], a: &Node, b: &Node) -> Vec<EdgeTypeProbability> {
    if graphs.is_empty() {
        return Vec::new();
    }
    let mut counts = [0usize; EdgeType::ALL.len()];
    for graph in graphs {
        let seen = graph
            .edge(a, b)
            .and_then(|e| e.edge_type_from(a))
            .unwrap_or(EdgeType::Nil);
        if let Some(slot) = EdgeType::ALL.iter().position(|t| *t == seen) {
            counts[slot] += 1;
        }
    }
    let total = graphs.len() as f64;
    EdgeType::ALL
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(edge_type, count)| EdgeTypeProbability {
            edge_type: *edge_type,
            probability: count as f64 / total,
        })
        .collect()
}

/// The name-ordered union of the nodes of `graphs`, each with its most
/// frequent type.
fn union_nodes(graphs: &[Graph]) -> Vec<Node> {
    let mut counts: BTreeMap<&str, [usize; NODE_TYPES.len()]> = BTreeMap::new();
    for node in graphs.iter().flat_map(|g| g.nodes()) {
        let slots = counts.entry(node.name()).or_default();
        if let Some(slot) = NODE_TYPES.iter().position(|t| *t == node.node_type()) {
            slots[slot] += 1;
        }
    }
    counts
        .into_iter()
        .map(|(name, slots)| {
            let mut best = 0;
            for (slot, count) in slots.iter().enumerate() {
                if *count > slots[best] {
                    best = slot;
                }
            }
            if slots.iter().filter(|c| **c > 0).count() > 1 {
                debug!(node = name, chosen = ?NODE_TYPES[best], "inputs disagree on node type");
            }
            Node::new(name).with_type(NODE_TYPES[best])
        })
        .collect()
}

/// Aggregates `graphs` under `ensemble`. No inputs give an empty graph.
pub fn aggregate_graphs(graphs: &[Graph], ensemble: EdgeEnsemble) -> Graph {
    let nodes = union_nodes(graphs);
    let mut out = Graph::with_nodes(nodes.iter().cloned());

    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let probabilities = edge_type_probabilities(graphs, a, b);
            let nil = probabilities
                .iter()
                .find(|p| p.edge_type == EdgeType::Nil)
                .map_or(0.0, |p| p.probability);
            let presence = 1.0 - nil;

            // Strict comparison keeps the earliest type on ties.
            let mut best: Option<&EdgeTypeProbability> = None;
            for p in probabilities.iter().filter(|p| p.edge_type != EdgeType::Nil) {
                if best.map_or(true, |b| p.probability > b.probability) {
                    best = Some(p);
                }
            }
            let Some(best) = best else {
                continue;
            };
            if !ensemble.keeps(presence, nil, best.probability) {
                continue;
            }
            let Some((at_a, at_b)) = best.edge_type.endpoints() else {
                continue;
            };
            let mut edge = Edge::new(a.clone(), b.clone(), at_a, at_b);
            edge.set_probability(best.probability);
            edge.set_edge_type_probabilities(probabilities);
            // Both nodes are members and the pair is visited once.
            let added = out.add_edge(edge);
            debug_assert!(added.is_ok(), "aggregate edge rejected: {:?}", added);
        }
    }
    out
}
