//! Meek orientation rules and DAG to CPDAG conversion.
//!
//! The rules only turn undirected edges `a --- b` into `a --> b`; they never
//! reverse or remove an edge. With knowledge attached, an orientation the
//! knowledge forbids is never made, and required or forbidden directions are
//! applied before the rules run.

use tracing::debug;

use crate::errors::CausalError;
use crate::graph::{Edge, EdgeKind, Endpoint, Graph, Node};
use crate::knowledge::Knowledge;

/// True if `a --- b`.
pub(crate) fn is_undirected(graph: &Graph, a: &Node, b: &Node) -> bool {
    graph
        .edge(a, b)
        .is_some_and(|e| e.kind() == EdgeKind::Undirected)
}

/// Turns `a --- b` into `a --> b`.
pub(crate) fn orient(graph: &mut Graph, a: &Node, b: &Node) -> Result<(), CausalError> {
    graph.set_endpoint(a, b, Endpoint::Arrow)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeekRules<'k> {
    knowledge: Option<&'k Knowledge>,
}

impl<'k> MeekRules<'k> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_knowledge(knowledge: &'k Knowledge) -> Self {
        Self {
            knowledge: Some(knowledge),
        }
    }

    fn allowed(&self, a: &Node, b: &Node) -> bool {
        self.knowledge
            .map_or(true, |k| !k.is_forbidden(a.name(), b.name()))
    }

    /// Applies knowledge, then rules R1-R4 to a fixed point. Returns the number
    /// of edges oriented.
    pub fn orient_implied(&self, graph: &mut Graph) -> Result<usize, CausalError> {
        let mut oriented = match self.knowledge {
            Some(knowledge) => orient_by_knowledge(graph, knowledge)?,
            None => 0,
        };
        loop {
            let Some((a, b)) = self.next_orientation(graph) else {
                break;
            };
            orient(graph, &a, &b)?;
            oriented += 1;
        }
        debug!(oriented, "meek rules reached a fixed point");
        Ok(oriented)
    }

    fn next_orientation(&self, graph: &Graph) -> Option<(Node, Node)> {
        for edge in graph.edges() {
            if edge.kind() != EdgeKind::Undirected {
                continue;
            }
            let (x, y) = (edge.node1(), edge.node2());
            for (a, b) in [(x, y), (y, x)] {
                if self.allowed(a, b)
                    && (rule1(graph, a, b)
                        || rule2(graph, a, b)
                        || rule3(graph, a, b)
                        || rule4(graph, a, b))
                {
                    return Some((a.clone(), b.clone()));
                }
            }
        }
        None
    }
}

/// R1: `c --> a --- b`, `c` and `b` nonadjacent.
fn rule1(graph: &Graph, a: &Node, b: &Node) -> bool {
    graph
        .parents(a)
        .iter()
        .any(|c| c != b && !graph.is_adjacent_to(c, b))
}

/// R2: `a --> c --> b` with `a --- b`.
fn rule2(graph: &Graph, a: &Node, b: &Node) -> bool {
    graph
        .children(a)
        .iter()
        .any(|c| graph.is_parent_of(c, b))
}

/// R3: `a --- c --> b`, `a --- d --> b`, `c` and `d` nonadjacent.
fn rule3(graph: &Graph, a: &Node, b: &Node) -> bool {
    let candidates: Vec<Node> = graph
        .parents(b)
        .into_iter()
        .filter(|c| is_undirected(graph, a, c))
        .collect();
    candidates.iter().enumerate().any(|(i, c)| {
        candidates[i + 1..]
            .iter()
            .any(|d| !graph.is_adjacent_to(c, d))
    })
}

/// R4: `a --- k --> l --> b`, `k` and `b` nonadjacent, `a` adjacent to `l`.
fn rule4(graph: &Graph, a: &Node, b: &Node) -> bool {
    graph.parents(b).iter().any(|l| {
        graph.is_adjacent_to(a, l)
            && graph.parents(l).iter().any(|k| {
                k != b && !graph.is_adjacent_to(k, b) && is_undirected(graph, a, k)
            })
    })
}

/// Orients undirected edges whose direction the knowledge settles: a
/// required direction wins; otherwise a forbidden direction forces the
/// opposite one. Returns the number of edges oriented.
pub fn orient_by_knowledge(graph: &mut Graph, knowledge: &Knowledge) -> Result<usize, CausalError> {
    let undirected: Vec<(Node, Node)> = graph
        .edges()
        .iter()
        .filter(|e| e.kind() == EdgeKind::Undirected)
        .map(|e| (e.node1().clone(), e.node2().clone()))
        .collect();
    let mut oriented = 0;
    for (x, y) in undirected {
        let (xn, yn) = (x.name(), y.name());
        let direction = if knowledge.is_required(xn, yn) {
            Some((&x, &y))
        } else if knowledge.is_required(yn, xn) {
            Some((&y, &x))
        } else if knowledge.is_forbidden(xn, yn) && !knowledge.is_forbidden(yn, xn) {
            Some((&y, &x))
        } else if knowledge.is_forbidden(yn, xn) && !knowledge.is_forbidden(xn, yn) {
            Some((&x, &y))
        } else {
            None
        };
        if let Some((from, to)) = direction {
            orient(graph, from, to)?;
            oriented += 1;
        }
    }
    Ok(oriented)
}

/// The CPDAG (completed partially directed graph) of the Markov equivalence
/// class of `dag`: the skeleton with unshielded colliders oriented and every
/// compelled edge directed by the Meek rules.
///
/// # Errors
///
/// `InvalidArgument` if `dag` has a non-directed edge or a directed cycle.
pub fn cpdag_from_dag(dag: &Graph) -> Result<Graph, CausalError> {
    if let Some(edge) = dag.edges().iter().find(|e| !e.is_directed()) {
        return Err(CausalError::invalid(format!("{} is not a directed edge", edge)));
    }
    if !dag.paths().is_acyclic() {
        return Err(CausalError::invalid("graph has a directed cycle"));
    }

    let mut cpdag = Graph::with_nodes(dag.nodes().iter().cloned());
    for edge in dag.edges() {
        cpdag.add_edge(Edge::undirected(edge.node1().clone(), edge.node2().clone()))?;
    }
    for c in dag.nodes() {
        let parents = dag.parents(c);
        for (i, a) in parents.iter().enumerate() {
            for b in &parents[i + 1..] {
                if !dag.is_adjacent_to(a, b) {
                    orient(&mut cpdag, a, c)?;
                    orient(&mut cpdag, b, c)?;
                }
            }
        }
    }
    MeekRules::new().orient_implied(&mut cpdag)?;
    Ok(cpdag)
}
