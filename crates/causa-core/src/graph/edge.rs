//! Edges with typed endpoints.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;

use super::endpoint::{EdgeKind, Endpoint};
use super::node::Node;

/// PAG edge annotations: definitely direct, no latent confounder, possibly
/// direct, possible latent confounder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeProperty {
    Dd,
    Nl,
    Pd,
    Pl,
}

impl fmt::Display for EdgeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgeProperty::Dd => "dd",
            EdgeProperty::Nl => "nl",
            EdgeProperty::Pd => "pd",
            EdgeProperty::Pl => "pl",
        })
    }
}

/// Shape of the edge (or its absence) between an ordered node pair `(a, b)`,
/// named by the endpoint at `a` then the endpoint at `b`.
///
/// `Ta` is `a --> b`, `At` is `a <-- b`, `Ca` is `a o-> b` and so on. `Nil`
/// means no edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeType {
    Nil,
    Ta,
    At,
    Tt,
    Aa,
    Cc,
    Ca,
    Ac,
    Tc,
    Ct,
}

impl EdgeType {
    /// Every variant, in the fixed order used to break ties.
    pub const ALL: [EdgeType; 10] = [
        EdgeType::Nil,
        EdgeType::Ta,
        EdgeType::At,
        EdgeType::Tt,
        EdgeType::Aa,
        EdgeType::Cc,
        EdgeType::Ca,
        EdgeType::Ac,
        EdgeType::Tc,
        EdgeType::Ct,
    ];

    pub fn from_endpoints(at_a: Endpoint, at_b: Endpoint) -> EdgeType {
        use Endpoint::*;
        match (at_a, at_b) {
            (Tail, Arrow) => EdgeType::Ta,
            (Arrow, Tail) => EdgeType::At,
            (Tail, Tail) => EdgeType::Tt,
            (Arrow, Arrow) => EdgeType::Aa,
            (Circle, Circle) => EdgeType::Cc,
            (Circle, Arrow) => EdgeType::Ca,
            (Arrow, Circle) => EdgeType::Ac,
            (Tail, Circle) => EdgeType::Tc,
            (Circle, Tail) => EdgeType::Ct,
        }
    }

    /// Endpoint pair `(at a, at b)`, or `None` for `Nil`.
    pub fn endpoints(self) -> Option<(Endpoint, Endpoint)> {
        use Endpoint::*;
        Some(match self {
            EdgeType::Nil => return None,
            EdgeType::Ta => (Tail, Arrow),
            EdgeType::At => (Arrow, Tail),
            EdgeType::Tt => (Tail, Tail),
            EdgeType::Aa => (Arrow, Arrow),
            EdgeType::Cc => (Circle, Circle),
            EdgeType::Ca => (Circle, Arrow),
            EdgeType::Ac => (Arrow, Circle),
            EdgeType::Tc => (Tail, Circle),
            EdgeType::Ct => (Circle, Tail),
        })
    }
}

/// Frequency of one edge shape across a set of resampled graphs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeTypeProbability {
    pub edge_type: EdgeType,
    pub probability: f64,
}

/// An edge between two distinct nodes.
///
/// Equality and hashing consider only the two nodes and their endpoints, and
/// are symmetric: `Edge::new(a, b, e1, e2) == Edge::new(b, a, e2, e1)`.
/// Properties and probabilities are annotations that never affect identity.
#[derive(Clone)]
pub struct Edge {
    node1: Node,
    node2: Node,
    endpoint1: Endpoint,
    endpoint2: Endpoint,
    properties: SmallVec<[EdgeProperty; 2]>,
    probability: Option<f64>,
    type_probabilities: Vec<EdgeTypeProbability>,
}

impl Edge {
    pub fn new(node1: Node, node2: Node, endpoint1: Endpoint, endpoint2: Endpoint) -> Self {
        Self {
            node1,
            node2,
            endpoint1,
            endpoint2,
            properties: SmallVec::new(),
            probability: None,
            type_probabilities: Vec::new(),
        }
    }

    /// `tail --> head`
    pub fn directed(tail: Node, head: Node) -> Self {
        Self::new(tail, head, Endpoint::Tail, Endpoint::Arrow)
    }

    /// `a --- b`
    pub fn undirected(a: Node, b: Node) -> Self {
        Self::new(a, b, Endpoint::Tail, Endpoint::Tail)
    }

    /// `a <-> b`
    pub fn bidirected(a: Node, b: Node) -> Self {
        Self::new(a, b, Endpoint::Arrow, Endpoint::Arrow)
    }

    /// `a o-o b`
    pub fn nondirected(a: Node, b: Node) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Circle)
    }

    /// `a o-> b`
    pub fn partially_oriented(a: Node, b: Node) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Arrow)
    }

    pub fn node1(&self) -> &Node {
        &self.node1
    }

    pub fn node2(&self) -> &Node {
        &self.node2
    }

    pub fn endpoint1(&self) -> Endpoint {
        self.endpoint1
    }

    pub fn endpoint2(&self) -> Endpoint {
        self.endpoint2
    }

    pub fn kind(&self) -> EdgeKind {
        EdgeKind::classify(self.endpoint1, self.endpoint2)
    }

    pub fn is_directed(&self) -> bool {
        self.kind() == EdgeKind::Directed
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.node1 == *node || self.node2 == *node
    }

    /// Endpoint at `node`'s end of the edge.
    pub fn proximal_endpoint(&self, node: &Node) -> Option<Endpoint> {
        if self.node1 == *node {
            Some(self.endpoint1)
        } else if self.node2 == *node {
            Some(self.endpoint2)
        } else {
            None
        }
    }

    /// Endpoint at the end opposite `node`.
    pub fn distal_endpoint(&self, node: &Node) -> Option<Endpoint> {
        if self.node1 == *node {
            Some(self.endpoint2)
        } else if self.node2 == *node {
            Some(self.endpoint1)
        } else {
            None
        }
    }

    /// The node at the end opposite `node`.
    pub fn distal_node(&self, node: &Node) -> Option<&Node> {
        if self.node1 == *node {
            Some(&self.node2)
        } else if self.node2 == *node {
            Some(&self.node1)
        } else {
            None
        }
    }

    /// True if this is a directed edge whose head is `node`.
    pub fn points_towards(&self, node: &Node) -> bool {
        self.is_directed() && self.proximal_endpoint(node) == Some(Endpoint::Arrow)
    }

    /// `(tail, head)` for a directed edge.
    pub fn tail_and_head(&self) -> Option<(&Node, &Node)> {
        match (self.endpoint1, self.endpoint2) {
            (Endpoint::Tail, Endpoint::Arrow) => Some((&self.node1, &self.node2)),
            (Endpoint::Arrow, Endpoint::Tail) => Some((&self.node2, &self.node1)),
            _ => None,
        }
    }

    /// Edge shape as seen from the ordered pair `(a, b)`.
    pub fn edge_type_from(&self, a: &Node) -> Option<EdgeType> {
        let at_a = self.proximal_endpoint(a)?;
        let at_b = self.distal_endpoint(a)?;
        Some(EdgeType::from_endpoints(at_a, at_b))
    }

    /// Returns a copy with the endpoint at `node` replaced.
    pub(crate) fn with_endpoint_at(&self, node: &Node, endpoint: Endpoint) -> Option<Edge> {
        let mut edge = self.clone();
        if edge.node1 == *node {
            edge.endpoint1 = endpoint;
        } else if edge.node2 == *node {
            edge.endpoint2 = endpoint;
        } else {
            return None;
        }
        Some(edge)
    }

    /// Rebinds the node handles (same names) to the given replacements.
    pub(crate) fn rebind(&mut self, node1: Node, node2: Node) {
        debug_assert!(node1 == self.node1 && node2 == self.node2);
        self.node1 = node1;
        self.node2 = node2;
    }

    pub fn properties(&self) -> &[EdgeProperty] {
        &self.properties
    }

    pub fn add_property(&mut self, property: EdgeProperty) {
        if !self.properties.contains(&property) {
            self.properties.push(property);
            self.properties.sort_unstable();
        }
    }

    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    pub fn set_probability(&mut self, probability: f64) {
        self.probability = Some(probability);
    }

    pub fn edge_type_probabilities(&self) -> &[EdgeTypeProbability] {
        &self.type_probabilities
    }

    pub fn set_edge_type_probabilities(&mut self, probabilities: Vec<EdgeTypeProbability>) {
        self.type_probabilities = probabilities;
    }

    /// Canonical `(first, second, endpoint at first, endpoint at second)`,
    /// with the nodes in name order.
    fn canonical(&self) -> (&Node, &Node, Endpoint, Endpoint) {
        if self.node1 <= self.node2 {
            (&self.node1, &self.node2, self.endpoint1, self.endpoint2)
        } else {
            (&self.node2, &self.node1, self.endpoint2, self.endpoint1)
        }
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.node1,
            self.endpoint1.left_glyph(),
            self.endpoint2.right_glyph(),
            self.node2
        )?;
        for property in &self.properties {
            write!(f, " {}", property)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(name: &str) -> Node {
        Node::new(name)
    }

    #[test]
    fn equality_is_orientation_aware_and_symmetric() {
        let ab = Edge::directed(n("A"), n("B"));
        let ab_flipped = Edge::new(n("B"), n("A"), Endpoint::Arrow, Endpoint::Tail);
        let ba = Edge::directed(n("B"), n("A"));

        assert_eq!(ab, ab_flipped);
        assert_ne!(ab, ba);
    }

    #[test]
    fn rendering() {
        assert_eq!(Edge::directed(n("A"), n("B")).to_string(), "A --> B");
        assert_eq!(Edge::undirected(n("A"), n("B")).to_string(), "A --- B");
        assert_eq!(Edge::bidirected(n("A"), n("B")).to_string(), "A <-> B");
        assert_eq!(Edge::nondirected(n("A"), n("B")).to_string(), "A o-o B");
        assert_eq!(
            Edge::partially_oriented(n("A"), n("B")).to_string(),
            "A o-> B"
        );
    }

    #[test]
    fn edge_type_is_relative_to_the_first_node() {
        let e = Edge::directed(n("A"), n("B"));
        assert_eq!(e.edge_type_from(&n("A")), Some(EdgeType::Ta));
        assert_eq!(e.edge_type_from(&n("B")), Some(EdgeType::At));
        assert_eq!(e.edge_type_from(&n("C")), None);
    }

    #[test]
    fn properties_are_kept_sorted_without_duplicates() {
        let mut e = Edge::partially_oriented(n("A"), n("B"));
        e.add_property(EdgeProperty::Pl);
        e.add_property(EdgeProperty::Dd);
        e.add_property(EdgeProperty::Pl);
        assert_eq!(e.properties(), &[EdgeProperty::Dd, EdgeProperty::Pl]);
        assert_eq!(e.to_string(), "A o-> B dd pl");
    }

    #[test]
    fn points_towards_only_for_directed_heads() {
        let e = Edge::directed(n("A"), n("B"));
        assert!(e.points_towards(&n("B")));
        assert!(!e.points_towards(&n("A")));
        assert!(!Edge::bidirected(n("A"), n("B")).points_towards(&n("B")));
    }
}
