//! Edge-end markers and the edge kinds derived from them.

use std::fmt;

/// The mark at one end of an edge.
///
/// `Tail` and `Arrow` carry the usual DAG meaning; `Circle` is the PAG
/// "undetermined" mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endpoint {
    Tail,
    Arrow,
    Circle,
}

impl Endpoint {
    /// Glyph used when the endpoint is on the left of a rendered edge.
    pub(crate) fn left_glyph(self) -> char {
        match self {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '<',
            Endpoint::Circle => 'o',
        }
    }

    /// Glyph used when the endpoint is on the right of a rendered edge.
    pub(crate) fn right_glyph(self) -> char {
        match self {
            Endpoint::Tail => '-',
            Endpoint::Arrow => '>',
            Endpoint::Circle => 'o',
        }
    }
}

/// Semantic classification of an edge, fully determined by its endpoint pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// `A --> B`
    Directed,
    /// `A --- B`
    Undirected,
    /// `A <-> B`
    Bidirected,
    /// `A o-o B`
    Nondirected,
    /// `A o-> B`
    PartiallyOriented,
    /// `A --o B`; legal in a graph but outside the four standard kinds.
    TailCircle,
}

impl EdgeKind {
    /// Classifies an endpoint pair. The result does not depend on which end is
    /// listed first.
    pub fn classify(e1: Endpoint, e2: Endpoint) -> EdgeKind {
        use Endpoint::*;
        match (e1, e2) {
            (Tail, Arrow) | (Arrow, Tail) => EdgeKind::Directed,
            (Tail, Tail) => EdgeKind::Undirected,
            (Arrow, Arrow) => EdgeKind::Bidirected,
            (Circle, Circle) => EdgeKind::Nondirected,
            (Circle, Arrow) | (Arrow, Circle) => EdgeKind::PartiallyOriented,
            (Tail, Circle) | (Circle, Tail) => EdgeKind::TailCircle,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Endpoint::Tail => "TAIL",
            Endpoint::Arrow => "ARROW",
            Endpoint::Circle => "CIRCLE",
        };
        f.write_str(s)
    }
}
