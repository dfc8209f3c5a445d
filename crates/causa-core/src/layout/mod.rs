//! Row layouts driven by knowledge tiers or by causal order.
//!
//! The layout functions are pure: they read a [`Graph`] (and [`Knowledge`])
//! and return coordinates. [`LayoutEditable`] is the seam an editor
//! implements so that [`arrange_by_knowledge`] and
//! [`arrange_by_causal_order`] can read its graph and write positions back.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::CausalError;
use crate::graph::{Graph, Node};
use crate::knowledge::Knowledge;

/// Node positions as `(node, x, y)`.
pub type NodeLayout = Vec<(Node, i32, i32)>;

/// Something holding a graph, its knowledge and node positions.
pub trait LayoutEditable {
    fn graph(&self) -> &Graph;

    fn set_graph(&mut self, graph: Graph);

    fn knowledge(&self) -> &Knowledge;

    fn set_knowledge(&mut self, knowledge: Knowledge);

    /// Current positions, in graph node order.
    fn layout(&self) -> NodeLayout {
        let graph = self.graph();
        graph
            .nodes()
            .iter()
            .filter_map(|n| graph.node_center(n).map(|(x, y)| (n.clone(), x, y)))
            .collect()
    }

    /// # Errors
    ///
    /// `InvalidArgument` if a positioned node is not in the graph.
    fn set_layout(&mut self, layout: &[(Node, i32, i32)]) -> Result<(), CausalError>;
}

/// A graph and its knowledge, editable as a unit. Positions are stored as
/// the graph's node centers.
#[derive(Debug, Clone, Default)]
pub struct LayoutSession {
    graph: Graph,
    knowledge: Knowledge,
}

impl LayoutSession {
    pub fn new(graph: Graph, knowledge: Knowledge) -> Self {
        Self { graph, knowledge }
    }

    pub fn into_parts(self) -> (Graph, Knowledge) {
        (self.graph, self.knowledge)
    }
}

impl LayoutEditable for LayoutSession {
    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn set_graph(&mut self, graph: Graph) {
        self.graph = graph;
    }

    fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    fn set_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    fn set_layout(&mut self, layout: &[(Node, i32, i32)]) -> Result<(), CausalError> {
        for (node, x, y) in layout {
            self.graph.set_node_center(node, *x, *y)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutSpacing {
    pub left: i32,
    pub top: i32,
    pub column_gap: i32,
    pub row_gap: i32,
}

impl Default for LayoutSpacing {
    fn default() -> Self {
        Self {
            left: 50,
            top: 40,
            column_gap: 90,
            row_gap: 80,
        }
    }
}

impl LayoutSpacing {
    fn place(&self, rows: Vec<Vec<Node>>) -> NodeLayout {
        let mut out = Vec::new();
        for (r, row) in rows.into_iter().enumerate() {
            let y = self.top + self.row_gap * r as i32;
            for (c, node) in row.into_iter().enumerate() {
                out.push((node, self.left + self.column_gap * c as i32, y));
            }
        }
        out
    }
}

/// One row per non-empty tier, in tier order, members by name. Nodes in no
/// tier share a final row in graph order. Tier members missing from the
/// graph are skipped.
pub fn layout_by_knowledge(graph: &Graph, knowledge: &Knowledge, spacing: LayoutSpacing) -> NodeLayout {
    let mut rows: Vec<Vec<Node>> = (0..knowledge.num_tiers())
        .map(|t| {
            knowledge
                .tier(t)
                .into_iter()
                .filter_map(|name| graph.node(name).cloned())
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    let rest: Vec<Node> = graph
        .nodes()
        .iter()
        .filter(|n| knowledge.tier_of(n.name()).is_none())
        .cloned()
        .collect();
    if !rest.is_empty() {
        rows.push(rest);
    }
    spacing.place(rows)
}

/// Row `k` holds the nodes whose longest directed path from a root has `k`
/// edges. Non-directed edges impose no order.
///
/// # Errors
///
/// `InvalidArgument` if the graph has a directed cycle.
pub fn layout_by_causal_order(graph: &Graph, spacing: LayoutSpacing) -> Result<NodeLayout, CausalError> {
    let order = graph.paths().valid_order()?;
    let mut level: FxHashMap<&Node, usize> = FxHashMap::default();
    let mut rows: Vec<Vec<Node>> = Vec::new();
    for node in &order {
        let depth = graph
            .parents(node)
            .iter()
            .filter_map(|p| level.get(p).map(|d| d + 1))
            .max()
            .unwrap_or(0);
        level.insert(node, depth);
        if rows.len() <= depth {
            rows.resize_with(depth + 1, Vec::new);
        }
        rows[depth].push(node.clone());
    }
    Ok(spacing.place(rows))
}

pub fn arrange_by_knowledge(editable: &mut dyn LayoutEditable) -> Result<(), CausalError> {
    let layout = layout_by_knowledge(editable.graph(), editable.knowledge(), LayoutSpacing::default());
    debug!(nodes = layout.len(), "knowledge layout");
    editable.set_layout(&layout)
}

pub fn arrange_by_causal_order(editable: &mut dyn LayoutEditable) -> Result<(), CausalError> {
    let layout = layout_by_causal_order(editable.graph(), LayoutSpacing::default())?;
    debug!(nodes = layout.len(), "causal order layout");
    editable.set_layout(&layout)
}
