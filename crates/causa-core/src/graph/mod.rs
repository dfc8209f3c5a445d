//! # Graph model
//!
//! A mutable multigraph over named [`Node`]s whose [`Edge`]s carry an
//! [`Endpoint`] at each end. Directed, undirected, bidirected, nondirected
//! and partially oriented edges are all expressed through endpoint pairs; the
//! semantic kind is derived, never stored.
//!
//! ## Invariants
//!
//! - Every edge's endpoints are members of the node set.
//! - No self-loops; no two equal edges (same nodes, same endpoints).
//! - Removing a node removes its incident edges.
//! - Underline, dotted-underline and ambiguous triples lie along existing
//!   adjacencies; triples invalidated by a removal are dropped.
//!
//! Node order is insertion order and edge order is insertion order, so every
//! listing produced by the graph is deterministic.
//!
//! ## Example
//!
//! ```rust
//! use causa_core::graph::{Graph, Node};
//!
//! let (a, b) = (Node::new("A"), Node::new("B"));
//! let mut g = Graph::with_nodes([a.clone(), b.clone()]);
//! g.add_directed_edge(&a, &b).unwrap();
//! assert!(g.is_parent_of(&a, &b));
//! ```

pub mod edge;
pub mod endpoint;
pub mod node;
pub mod paths;

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::errors::CausalError;

pub use edge::{Edge, EdgeProperty, EdgeType, EdgeTypeProbability};
pub use endpoint::{EdgeKind, Endpoint};
pub use node::{AttributeValue, Node, NodeData, NodeType};
pub use paths::Paths;

/// Per-node incident edge list. Most nodes in causal graphs have few
/// neighbours, so short lists stay inline.
type EdgeList = SmallVec<[Edge; 4]>;

/// An ordered triple `x - y - z` used for PAG annotations.
///
/// Triples are unordered in their outer nodes: `(x, y, z) == (z, y, x)`.
#[derive(Debug, Clone)]
pub struct Triple {
    pub x: Node,
    pub y: Node,
    pub z: Node,
}

impl Triple {
    pub fn new(x: Node, y: Node, z: Node) -> Self {
        Self { x, y, z }
    }

    fn canonical(&self) -> (&Node, &Node, &Node) {
        if self.x <= self.z {
            (&self.x, &self.y, &self.z)
        } else {
            (&self.z, &self.y, &self.x)
        }
    }
}

impl PartialEq for Triple {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Triple {}

impl Hash for Triple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}

/// Which triple annotation set an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleMark {
    Underline,
    DottedUnderline,
    Ambiguous,
}

/// The edge-list graph.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    node_data: FxHashMap<Node, NodeData>,
    edges: Vec<Edge>,
    edge_lists: FxHashMap<Node, EdgeList>,
    underlines: FxHashSet<Triple>,
    dotted_underlines: FxHashSet<Triple>,
    ambiguous: FxHashSet<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an edgeless graph over `nodes`. Repeated names are ignored.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        graph
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Adds a node. Returns false if a node with the same name exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.node_data.contains_key(&node) {
            return false;
        }
        self.nodes.push(node.clone());
        self.edge_lists.insert(node.clone(), EdgeList::new());
        self.node_data.insert(node, NodeData::default());
        true
    }

    /// Removes a node and every edge incident to it.
    pub fn remove_node(&mut self, node: &Node) -> bool {
        if !self.node_data.contains_key(node) {
            return false;
        }
        let incident: Vec<Edge> = self.edges_of(node).to_vec();
        for edge in &incident {
            self.detach_edge(edge);
        }
        self.nodes.retain(|n| n != node);
        self.node_data.remove(node);
        self.edge_lists.remove(node);
        self.remove_triples_not_in_graph();
        true
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(Node::name).collect()
    }

    /// Looks a node up by name, returning the graph's own handle.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.node_data.get_key_value(name).map(|(node, _)| node)
    }

    pub fn contains_node(&self, node: &Node) -> bool {
        self.node_data.contains_key(node)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_data(&self, node: &Node) -> Option<&NodeData> {
        self.node_data.get(node)
    }

    pub fn node_center(&self, node: &Node) -> Option<(i32, i32)> {
        self.node_data
            .get(node)
            .map(|data| (data.center_x, data.center_y))
    }

    pub fn set_node_center(&mut self, node: &Node, x: i32, y: i32) -> Result<(), CausalError> {
        let data = self.node_data_mut(node)?;
        data.center_x = x;
        data.center_y = y;
        Ok(())
    }

    pub fn node_attribute(&self, node: &Node, key: &str) -> Option<&AttributeValue> {
        self.node_data.get(node)?.attributes.get(key)
    }

    pub fn set_node_attribute(
        &mut self,
        node: &Node,
        key: impl Into<String>,
        value: AttributeValue,
    ) -> Result<(), CausalError> {
        self.node_data_mut(node)?
            .attributes
            .insert(key.into(), value);
        Ok(())
    }

    pub fn remove_node_attribute(&mut self, node: &Node, key: &str) -> Option<AttributeValue> {
        self.node_data.get_mut(node)?.attributes.remove(key)
    }

    fn node_data_mut(&mut self, node: &Node) -> Result<&mut NodeData, CausalError> {
        self.node_data
            .get_mut(node)
            .ok_or_else(|| CausalError::invalid(format!("node {} is not in the graph", node)))
    }

    /// Swaps node handles for the same-named nodes in `reference`, so that
    /// types recorded on the reference list win. Names absent from this graph
    /// are ignored.
    pub fn replace_nodes(&mut self, reference: &[Node]) {
        let lookup: FxHashMap<&str, &Node> = reference.iter().map(|n| (n.name(), n)).collect();
        let swap = |node: &Node| -> Node {
            lookup
                .get(node.name())
                .map_or_else(|| node.clone(), |n| (*n).clone())
        };

        for node in &mut self.nodes {
            *node = swap(node);
        }
        self.node_data = std::mem::take(&mut self.node_data)
            .into_iter()
            .map(|(node, data)| (swap(&node), data))
            .collect();
        for edge in &mut self.edges {
            let (n1, n2) = (swap(edge.node1()), swap(edge.node2()));
            edge.rebind(n1, n2);
        }
        self.edge_lists = std::mem::take(&mut self.edge_lists)
            .into_iter()
            .map(|(node, mut list)| {
                for edge in &mut list {
                    let (n1, n2) = (swap(edge.node1()), swap(edge.node2()));
                    edge.rebind(n1, n2);
                }
                (swap(&node), list)
            })
            .collect();
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Adds an edge.
    ///
    /// Returns `Ok(false)` if an equal edge is already present.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a self-loop or an endpoint node not in the graph.
    pub fn add_edge(&mut self, mut edge: Edge) -> Result<bool, CausalError> {
        if edge.node1() == edge.node2() {
            return Err(CausalError::invalid(format!(
                "self-loop on {} is not allowed",
                edge.node1()
            )));
        }
        let n1 = self.stored_node(edge.node1())?;
        let n2 = self.stored_node(edge.node2())?;
        if self.edges_of(&n1).contains(&edge) {
            return Ok(false);
        }
        edge.rebind(n1.clone(), n2.clone());

        self.edge_lists.entry(n1).or_default().push(edge.clone());
        self.edge_lists.entry(n2).or_default().push(edge.clone());
        self.edges.push(edge);
        Ok(true)
    }

    fn stored_node(&self, node: &Node) -> Result<Node, CausalError> {
        self.node(node.name()).cloned().ok_or_else(|| {
            CausalError::invalid(format!("node {} is not in the graph", node))
        })
    }

    pub fn add_directed_edge(&mut self, tail: &Node, head: &Node) -> Result<bool, CausalError> {
        self.add_edge(Edge::directed(tail.clone(), head.clone()))
    }

    pub fn add_undirected_edge(&mut self, a: &Node, b: &Node) -> Result<bool, CausalError> {
        self.add_edge(Edge::undirected(a.clone(), b.clone()))
    }

    pub fn add_bidirected_edge(&mut self, a: &Node, b: &Node) -> Result<bool, CausalError> {
        self.add_edge(Edge::bidirected(a.clone(), b.clone()))
    }

    pub fn add_nondirected_edge(&mut self, a: &Node, b: &Node) -> Result<bool, CausalError> {
        self.add_edge(Edge::nondirected(a.clone(), b.clone()))
    }

    pub fn add_partially_oriented_edge(
        &mut self,
        a: &Node,
        b: &Node,
    ) -> Result<bool, CausalError> {
        self.add_edge(Edge::partially_oriented(a.clone(), b.clone()))
    }

    /// Removes an edge equal to `edge`. Returns false if none was present.
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        if !self.detach_edge(edge) {
            return false;
        }
        self.remove_triples_not_in_graph();
        true
    }

    /// Removes every edge between `a` and `b`, returning how many were removed.
    pub fn remove_edges_between(&mut self, a: &Node, b: &Node) -> usize {
        let between: Vec<Edge> = self.edges_between(a, b).into_iter().cloned().collect();
        for edge in &between {
            self.detach_edge(edge);
        }
        if !between.is_empty() {
            self.remove_triples_not_in_graph();
        }
        between.len()
    }

    fn detach_edge(&mut self, edge: &Edge) -> bool {
        let Some(pos) = self.edges.iter().position(|e| e == edge) else {
            return false;
        };
        self.edges.remove(pos);
        for node in [edge.node1(), edge.node2()] {
            if let Some(list) = self.edge_lists.get_mut(node) {
                list.retain(|e| e != edge);
            }
        }
        true
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges_of(edge.node1()).contains(edge)
    }

    /// Edges incident to `node`; empty if the node is absent.
    pub fn edges_of(&self, node: &Node) -> &[Edge] {
        self.edge_lists
            .get(node)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// The first edge between `a` and `b`, in insertion order.
    pub fn edge(&self, a: &Node, b: &Node) -> Option<&Edge> {
        self.edges_of(a)
            .iter()
            .find(|e| e.distal_node(a) == Some(b))
    }

    pub fn edges_between(&self, a: &Node, b: &Node) -> Vec<&Edge> {
        self.edges_of(a)
            .iter()
            .filter(|e| e.distal_node(a) == Some(b))
            .collect()
    }

    /// The edge `tail --> head`, if present.
    pub fn directed_edge(&self, tail: &Node, head: &Node) -> Option<&Edge> {
        self.edges_of(tail)
            .iter()
            .find(|e| e.tail_and_head() == Some((tail, head)))
    }

    /// Endpoint at `b` on the edge between `a` and `b`.
    pub fn endpoint(&self, a: &Node, b: &Node) -> Option<Endpoint> {
        self.edge(a, b).and_then(|e| e.proximal_endpoint(b))
    }

    /// Sets the endpoint at `b` on the edge between `a` and `b`, keeping the
    /// endpoint at `a`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `a` and `b` are not adjacent.
    pub fn set_endpoint(&mut self, a: &Node, b: &Node, endpoint: Endpoint) -> Result<(), CausalError> {
        let current = self
            .edge(a, b)
            .cloned()
            .ok_or_else(|| CausalError::invalid(format!("{} and {} are not adjacent", a, b)))?;
        if current.proximal_endpoint(b) == Some(endpoint) {
            return Ok(());
        }
        let updated = current
            .with_endpoint_at(b, endpoint)
            .ok_or_else(|| CausalError::Internal("edge lost its endpoint".into()))?;
        self.detach_edge(&current);
        if !self.contains_edge(&updated) {
            self.add_edge(updated)?;
        }
        Ok(())
    }

    /// Replaces both endpoints of every edge with `endpoint`.
    pub fn reorient_all_with(&mut self, endpoint: Endpoint) {
        let edges = std::mem::take(&mut self.edges);
        for list in self.edge_lists.values_mut() {
            list.clear();
        }
        for edge in edges {
            let reoriented = Edge::new(edge.node1().clone(), edge.node2().clone(), endpoint, endpoint);
            if !self.edges.contains(&reoriented) {
                self.edge_lists
                    .entry(edge.node1().clone())
                    .or_default()
                    .push(reoriented.clone());
                self.edge_lists
                    .entry(edge.node2().clone())
                    .or_default()
                    .push(reoriented.clone());
                self.edges.push(reoriented);
            }
        }
    }

    /// Removes every edge, keeping the nodes.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
        for list in self.edge_lists.values_mut() {
            list.clear();
        }
        self.underlines.clear();
        self.dotted_underlines.clear();
        self.ambiguous.clear();
    }

    // ------------------------------------------------------------------
    // Adjacency
    // ------------------------------------------------------------------

    pub fn is_adjacent_to(&self, a: &Node, b: &Node) -> bool {
        self.edge(a, b).is_some()
    }

    /// Distinct neighbours of `node`, in edge insertion order.
    pub fn adjacent_nodes(&self, node: &Node) -> Vec<Node> {
        let mut seen = FxHashSet::default();
        self.edges_of(node)
            .iter()
            .filter_map(|e| e.distal_node(node))
            .filter(|n| seen.insert((*n).clone()))
            .cloned()
            .collect()
    }

    /// Nodes `p` with `p --> node`.
    pub fn parents(&self, node: &Node) -> Vec<Node> {
        self.edges_of(node)
            .iter()
            .filter_map(|e| match e.tail_and_head() {
                Some((tail, head)) if head == node => Some(tail.clone()),
                _ => None,
            })
            .collect()
    }

    /// Nodes `c` with `node --> c`.
    pub fn children(&self, node: &Node) -> Vec<Node> {
        self.edges_of(node)
            .iter()
            .filter_map(|e| match e.tail_and_head() {
                Some((tail, head)) if tail == node => Some(head.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn is_parent_of(&self, parent: &Node, child: &Node) -> bool {
        self.directed_edge(parent, child).is_some()
    }

    pub fn is_child_of(&self, child: &Node, parent: &Node) -> bool {
        self.is_parent_of(parent, child)
    }

    pub fn indegree(&self, node: &Node) -> usize {
        self.parents(node).len()
    }

    pub fn outdegree(&self, node: &Node) -> usize {
        self.children(node).len()
    }

    pub fn degree(&self, node: &Node) -> usize {
        self.edges_of(node).len()
    }

    /// Read-only path and ancestry queries over this graph.
    pub fn paths(&self) -> Paths<'_> {
        Paths::new(self)
    }

    // ------------------------------------------------------------------
    // Derived graphs
    // ------------------------------------------------------------------

    /// The subgraph induced by `nodes`. Names not in this graph are skipped;
    /// node data and valid triples are carried over.
    pub fn subgraph(&self, nodes: &[Node]) -> Graph {
        let keep: FxHashSet<&Node> = nodes.iter().filter(|n| self.contains_node(n)).collect();
        let mut sub = Graph::new();
        for node in self.nodes.iter().filter(|n| keep.contains(n)) {
            sub.add_node(node.clone());
            if let Some(data) = self.node_data.get(node) {
                sub.node_data.insert(node.clone(), data.clone());
            }
        }
        for edge in &self.edges {
            if keep.contains(edge.node1()) && keep.contains(edge.node2()) {
                sub.insert_edge_unchecked(edge.clone());
            }
        }
        for mark in [TripleMark::Underline, TripleMark::DottedUnderline, TripleMark::Ambiguous] {
            for triple in self.triple_set(mark) {
                if keep.contains(&triple.x) && keep.contains(&triple.y) && keep.contains(&triple.z) {
                    sub.add_triple(mark, triple.clone());
                }
            }
        }
        sub
    }

    /// Copies the nodes and edges of `other` into this graph.
    ///
    /// Node attribute maps are *not* copied: every node copied from `other`
    /// arrives with an empty attribute map (layout positions are kept).
    /// Nodes already present keep their own data.
    pub fn transfer_nodes_and_edges(&mut self, other: &Graph) -> Result<(), CausalError> {
        for node in other.nodes() {
            if self.add_node(node.clone()) {
                if let Some((x, y)) = other.node_center(node) {
                    self.set_node_center(node, x, y)?;
                }
            }
        }
        for edge in other.edges() {
            self.add_edge(edge.clone())?;
        }
        Ok(())
    }

    fn insert_edge_unchecked(&mut self, edge: Edge) {
        self.edge_lists
            .entry(edge.node1().clone())
            .or_default()
            .push(edge.clone());
        self.edge_lists
            .entry(edge.node2().clone())
            .or_default()
            .push(edge.clone());
        self.edges.push(edge);
    }

    // ------------------------------------------------------------------
    // Triples
    // ------------------------------------------------------------------

    /// Records a triple annotation. Returns false (and records nothing) if
    /// `x - y - z` is not a path of adjacencies in this graph.
    pub fn add_triple(&mut self, mark: TripleMark, triple: Triple) -> bool {
        if !self.triple_in_graph(&triple) {
            return false;
        }
        self.triple_set_mut(mark).insert(triple)
    }

    pub fn remove_triple(&mut self, mark: TripleMark, triple: &Triple) -> bool {
        self.triple_set_mut(mark).remove(triple)
    }

    pub fn has_triple(&self, mark: TripleMark, triple: &Triple) -> bool {
        self.triple_set(mark).contains(triple)
    }

    pub fn add_underline_triple(&mut self, x: &Node, y: &Node, z: &Node) -> bool {
        self.add_triple(
            TripleMark::Underline,
            Triple::new(x.clone(), y.clone(), z.clone()),
        )
    }

    pub fn is_underline_triple(&self, x: &Node, y: &Node, z: &Node) -> bool {
        self.has_triple(
            TripleMark::Underline,
            &Triple::new(x.clone(), y.clone(), z.clone()),
        )
    }

    pub fn add_dotted_underline_triple(&mut self, x: &Node, y: &Node, z: &Node) -> bool {
        self.add_triple(
            TripleMark::DottedUnderline,
            Triple::new(x.clone(), y.clone(), z.clone()),
        )
    }

    pub fn add_ambiguous_triple(&mut self, x: &Node, y: &Node, z: &Node) -> bool {
        self.add_triple(
            TripleMark::Ambiguous,
            Triple::new(x.clone(), y.clone(), z.clone()),
        )
    }

    pub fn is_ambiguous_triple(&self, x: &Node, y: &Node, z: &Node) -> bool {
        self.has_triple(
            TripleMark::Ambiguous,
            &Triple::new(x.clone(), y.clone(), z.clone()),
        )
    }

    /// Triples with the given mark, sorted for stable output.
    pub fn triples(&self, mark: TripleMark) -> Vec<&Triple> {
        let mut out: Vec<&Triple> = self.triple_set(mark).iter().collect();
        out.sort_by(|a, b| a.canonical().cmp(&b.canonical()));
        out
    }

    fn triple_set(&self, mark: TripleMark) -> &FxHashSet<Triple> {
        match mark {
            TripleMark::Underline => &self.underlines,
            TripleMark::DottedUnderline => &self.dotted_underlines,
            TripleMark::Ambiguous => &self.ambiguous,
        }
    }

    fn triple_set_mut(&mut self, mark: TripleMark) -> &mut FxHashSet<Triple> {
        match mark {
            TripleMark::Underline => &mut self.underlines,
            TripleMark::DottedUnderline => &mut self.dotted_underlines,
            TripleMark::Ambiguous => &mut self.ambiguous,
        }
    }

    fn triple_in_graph(&self, triple: &Triple) -> bool {
        triple.x != triple.z
            && self.is_adjacent_to(&triple.x, &triple.y)
            && self.is_adjacent_to(&triple.y, &triple.z)
    }

    fn remove_triples_not_in_graph(&mut self) {
        for mark in [TripleMark::Underline, TripleMark::DottedUnderline, TripleMark::Ambiguous] {
            let stale: Vec<Triple> = self
                .triple_set(mark)
                .iter()
                .filter(|t| !self.triple_in_graph(t))
                .cloned()
                .collect();
            let set = self.triple_set_mut(mark);
            for triple in &stale {
                set.remove(triple);
            }
        }
    }
}

impl PartialEq for Graph {
    /// Structural equality: same node names and same edges, ignoring order,
    /// node data and edge annotations.
    fn eq(&self, other: &Self) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }
        if !self.nodes.iter().all(|n| other.contains_node(n)) {
            return false;
        }
        let mine: FxHashSet<&Edge> = self.edges.iter().collect();
        let theirs: FxHashSet<&Edge> = other.edges.iter().collect();
        mine == theirs
    }
}

impl Eq for Graph {}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph Nodes:")?;
        writeln!(f, "{}", self.node_names().join(";"))?;
        writeln!(f)?;
        writeln!(f, "Graph Edges:")?;
        for (i, edge) in self.edges.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, edge)?;
        }
        for (title, mark) in [
            ("Underline triples", TripleMark::Underline),
            ("Dotted underline triples", TripleMark::DottedUnderline),
            ("Ambiguous triples", TripleMark::Ambiguous),
        ] {
            let triples = self.triples(mark);
            if !triples.is_empty() {
                writeln!(f)?;
                let rendered: Vec<String> = triples.iter().map(|t| t.to_string()).collect();
                writeln!(f, "{}: {}", title, rendered.join(";"))?;
            }
        }
        Ok(())
    }
}
