//! Path, ancestry and separation queries.
//!
//! [`Paths`] borrows a [`Graph`] and never mutates it. Every traversal keeps
//! a visited set, so all queries terminate on graphs with directed or mixed
//! cycles.
//!
//! ## Self-ancestry policy
//!
//! Path queries are *nontrivial*: a path has at least one edge. Hence
//! `is_ancestor_of(x, x)` holds only when `x` lies on a directed cycle, and
//! `exists_semi_directed_path(x, {x, ..})` only when `x` lies on a
//! semi-directed cycle. The set-valued [`Paths::ancestors_of`] and
//! [`Paths::descendants_of`] are reflexive (they contain their inputs).

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use super::{Edge, Endpoint, Graph, Node};
use crate::errors::CausalError;

/// Read-only query view over a graph.
#[derive(Debug, Clone, Copy)]
pub struct Paths<'g> {
    graph: &'g Graph,
}

impl<'g> Paths<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    // ------------------------------------------------------------------
    // Directed reachability
    // ------------------------------------------------------------------

    /// True if there is a directed path `x --> ... --> y` of length >= 1.
    pub fn exists_directed_path(&self, x: &Node, y: &Node) -> bool {
        self.reachable(x, |target| target == y, |g, n| g.children(n))
    }

    /// True if `x` is a (proper) ancestor of `y`. See the module docs for
    /// the `x == y` policy.
    pub fn is_ancestor_of(&self, x: &Node, y: &Node) -> bool {
        self.exists_directed_path(x, y)
    }

    pub fn is_descendant_of(&self, y: &Node, x: &Node) -> bool {
        self.exists_directed_path(x, y)
    }

    /// All ancestors of any node in `nodes`, including the nodes themselves,
    /// in graph node order.
    pub fn ancestors_of(&self, nodes: &[Node]) -> Vec<Node> {
        let closed = self.closure(nodes, |g, n| g.parents(n));
        self.in_graph_order(&closed)
    }

    /// All descendants of any node in `nodes`, including the nodes
    /// themselves, in graph node order.
    pub fn descendants_of(&self, nodes: &[Node]) -> Vec<Node> {
        let closed = self.closure(nodes, |g, n| g.children(n));
        self.in_graph_order(&closed)
    }

    /// Enumerates simple directed paths from `x` to `y`, optionally bounded in
    /// number of edges. Each path lists its nodes from `x` to `y`.
    pub fn directed_paths(&self, x: &Node, y: &Node, max_len: Option<usize>) -> Vec<Vec<Node>> {
        let mut out = Vec::new();
        if x == y || !self.graph.contains_node(x) {
            return out;
        }
        let limit = max_len.unwrap_or(usize::MAX);

        // Iterative DFS; each frame holds the pending children of a path node.
        let mut path = vec![x.clone()];
        let mut on_path: FxHashSet<Node> = FxHashSet::default();
        on_path.insert(x.clone());
        let mut stack: Vec<Vec<Node>> = vec![self.graph.children(x)];

        while let Some(frame) = stack.last_mut() {
            let Some(next) = frame.pop() else {
                stack.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done);
                }
                continue;
            };
            if on_path.contains(&next) {
                continue;
            }
            if next == *y {
                if path.len() > limit {
                    continue;
                }
                let mut found = path.clone();
                found.push(next);
                out.push(found);
                continue;
            }
            if path.len() < limit {
                on_path.insert(next.clone());
                stack.push(self.graph.children(&next));
                path.push(next);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Semi-directed reachability
    // ------------------------------------------------------------------

    /// True if a semi-directed path of length >= 1 leads from `x` into any
    /// node of `targets`.
    ///
    /// An edge may be crossed from `a` to `b` when the endpoint at `a` is a
    /// tail or a circle, i.e. no arrowhead points back along the direction of
    /// travel. Directed edges can only be followed forwards; undirected,
    /// nondirected and partially oriented segments are allowed.
    pub fn exists_semi_directed_path(&self, x: &Node, targets: &[Node]) -> bool {
        let targets: FxHashSet<&Node> = targets.iter().collect();
        self.reachable(
            x,
            |n| targets.contains(n),
            |g, n| {
                g.edges_of(n)
                    .iter()
                    .filter_map(|e| traverse_semi_directed(n, e))
                    .collect()
            },
        )
    }

    pub fn exists_semi_directed_path_to(&self, x: &Node, y: &Node) -> bool {
        self.exists_semi_directed_path(x, std::slice::from_ref(y))
    }

    // ------------------------------------------------------------------
    // Triples
    // ------------------------------------------------------------------

    /// `a *-> b <-* c`: both edges exist and both have an arrowhead at `b`.
    pub fn is_def_collider(&self, a: &Node, b: &Node, c: &Node) -> bool {
        let (Some(ab), Some(cb)) = (self.graph.edge(a, b), self.graph.edge(c, b)) else {
            return false;
        };
        ab.proximal_endpoint(b) == Some(Endpoint::Arrow)
            && cb.proximal_endpoint(b) == Some(Endpoint::Arrow)
    }

    /// True if `b` is definitely not a collider on `a *-* b *-* c`:
    /// either edge has a tail at `b`; or both marks at `b` are circles and
    /// `a`, `c` are not adjacent; or the triple is underlined.
    pub fn is_def_noncollider(&self, a: &Node, b: &Node, c: &Node) -> bool {
        let (Some(ab), Some(cb)) = (self.graph.edge(a, b), self.graph.edge(c, b)) else {
            return false;
        };
        let at_b_from_a = ab.proximal_endpoint(b);
        let at_b_from_c = cb.proximal_endpoint(b);

        if at_b_from_a == Some(Endpoint::Tail) || at_b_from_c == Some(Endpoint::Tail) {
            return true;
        }
        if at_b_from_a == Some(Endpoint::Circle)
            && at_b_from_c == Some(Endpoint::Circle)
            && !self.graph.is_adjacent_to(a, c)
        {
            return true;
        }
        self.graph.is_underline_triple(a, b, c)
    }

    pub fn is_unshielded_collider(&self, a: &Node, b: &Node, c: &Node) -> bool {
        a != c && self.is_def_collider(a, b, c) && !self.graph.is_adjacent_to(a, c)
    }

    // ------------------------------------------------------------------
    // Cycles and orders
    // ------------------------------------------------------------------

    /// True if some directed cycle exists.
    pub fn exists_directed_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Fresh,
            Open,
            Closed,
        }

        let index: rustc_hash::FxHashMap<&Node, usize> = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n, i))
            .collect();
        let mut marks = vec![Mark::Fresh; self.graph.num_nodes()];

        for start in 0..self.graph.num_nodes() {
            if marks[start] != Mark::Fresh {
                continue;
            }
            let root = &self.graph.nodes()[start];
            marks[start] = Mark::Open;
            let mut stack: Vec<(usize, Vec<Node>)> = vec![(start, self.graph.children(root))];

            while let Some((current, pending)) = stack.last_mut() {
                let current = *current;
                match pending.pop() {
                    Some(child) => {
                        let Some(&ci) = index.get(&child) else {
                            continue;
                        };
                        match marks[ci] {
                            Mark::Open => return true,
                            Mark::Closed => {}
                            Mark::Fresh => {
                                marks[ci] = Mark::Open;
                                let grandchildren = self.graph.children(&child);
                                stack.push((ci, grandchildren));
                            }
                        }
                    }
                    None => {
                        marks[current] = Mark::Closed;
                        stack.pop();
                    }
                }
            }
        }
        false
    }

    pub fn is_acyclic(&self) -> bool {
        !self.exists_directed_cycle()
    }

    /// A topological order of the nodes (parents before children). Ties are
    /// broken by graph node order.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the graph has a directed cycle.
    pub fn valid_order(&self) -> Result<Vec<Node>, CausalError> {
        let nodes = self.graph.nodes();
        let mut indegree: Vec<usize> = nodes.iter().map(|n| self.graph.indegree(n)).collect();
        let index: rustc_hash::FxHashMap<&Node, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n, i)).collect();

        let mut ready: std::collections::BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(i) = ready.pop_first() {
            order.push(nodes[i].clone());
            for child in self.graph.children(&nodes[i]) {
                if let Some(&ci) = index.get(&child) {
                    indegree[ci] -= 1;
                    if indegree[ci] == 0 {
                        ready.insert(ci);
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            return Err(CausalError::invalid(
                "graph contains a directed cycle; no valid order exists",
            ));
        }
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Separation
    // ------------------------------------------------------------------

    /// True if `x` and `y` are m-separated given `z` (d-separation on DAGs).
    ///
    /// A collider is a node with arrowheads from both adjacent path edges;
    /// it is open when it or one of its descendants is in `z`. Any other
    /// node is open when it is not in `z`. Circle marks are treated as
    /// non-arrowheads.
    pub fn is_m_separated(&self, x: &Node, y: &Node, z: &[Node]) -> bool {
        !self.is_m_connected(x, y, z)
    }

    pub fn is_m_connected(&self, x: &Node, y: &Node, z: &[Node]) -> bool {
        if x == y {
            return true;
        }
        let conditioned: FxHashSet<&Node> = z.iter().collect();
        let open_colliders: FxHashSet<Node> = self.ancestors_of(z).into_iter().collect();

        // State: arrived at `b` from `a`, with or without an arrowhead at `b`.
        let mut visited: FxHashSet<(Node, Node, bool)> = FxHashSet::default();
        let mut queue: VecDeque<(Node, Node, bool)> = VecDeque::new();

        for edge in self.graph.edges_of(x) {
            let Some(b) = edge.distal_node(x) else { continue };
            if b == y {
                return true;
            }
            let state = (x.clone(), b.clone(), edge.proximal_endpoint(b) == Some(Endpoint::Arrow));
            if visited.insert(state.clone()) {
                queue.push_back(state);
            }
        }

        while let Some((a, b, arrow_at_b)) = queue.pop_front() {
            for edge in self.graph.edges_of(&b) {
                let Some(c) = edge.distal_node(&b) else { continue };
                if *c == a {
                    continue;
                }
                let collider = arrow_at_b && edge.proximal_endpoint(&b) == Some(Endpoint::Arrow);
                let passable = if collider {
                    open_colliders.contains(&b)
                } else {
                    !conditioned.contains(&b)
                };
                if !passable {
                    continue;
                }
                if c == y {
                    return true;
                }
                let state = (
                    b.clone(),
                    c.clone(),
                    edge.proximal_endpoint(c) == Some(Endpoint::Arrow),
                );
                if visited.insert(state.clone()) {
                    queue.push_back(state);
                }
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Breadth-first search from the successors of `start` (so the empty path
    /// never counts) until `is_target` accepts a node.
    fn reachable<T, S>(&self, start: &Node, is_target: T, successors: S) -> bool
    where
        T: Fn(&Node) -> bool,
        S: Fn(&Graph, &Node) -> Vec<Node>,
    {
        let mut visited: FxHashSet<Node> = FxHashSet::default();
        let mut queue: VecDeque<Node> = successors(self.graph, start).into_iter().collect();

        while let Some(node) = queue.pop_front() {
            if is_target(&node) {
                return true;
            }
            if !visited.insert(node.clone()) {
                continue;
            }
            for next in successors(self.graph, &node) {
                if !visited.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    fn closure<S>(&self, seeds: &[Node], step: S) -> FxHashSet<Node>
    where
        S: Fn(&Graph, &Node) -> Vec<Node>,
    {
        let mut closed: FxHashSet<Node> = FxHashSet::default();
        let mut queue: VecDeque<Node> = seeds
            .iter()
            .filter(|n| self.graph.contains_node(n))
            .cloned()
            .collect();
        while let Some(node) = queue.pop_front() {
            if !closed.insert(node.clone()) {
                continue;
            }
            queue.extend(step(self.graph, &node).into_iter().filter(|n| !closed.contains(n)));
        }
        closed
    }

    fn in_graph_order(&self, set: &FxHashSet<Node>) -> Vec<Node> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| set.contains(*n))
            .cloned()
            .collect()
    }
}

/// The node reached by crossing `edge` from `node` along a semi-directed
/// path, if the crossing is allowed.
fn traverse_semi_directed(node: &Node, edge: &Edge) -> Option<Node> {
    match edge.proximal_endpoint(node)? {
        Endpoint::Tail | Endpoint::Circle => edge.distal_node(node).cloned(),
        Endpoint::Arrow => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(names: &[&str]) -> (Graph, Vec<Node>) {
        let nodes: Vec<Node> = names.iter().map(|n| Node::new(n)).collect();
        (Graph::with_nodes(nodes.clone()), nodes)
    }

    #[test]
    fn chain_queries() {
        let (mut g, v) = graph(&["A", "B", "C"]);
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[2]).unwrap();
        let paths = g.paths();

        assert!(paths.is_ancestor_of(&v[0], &v[2]));
        assert!(!paths.is_ancestor_of(&v[2], &v[0]));
        assert!(paths.is_descendant_of(&v[2], &v[0]));
        assert!(!paths.is_descendant_of(&v[0], &v[2]));
        assert!(!paths.is_descendant_of(&v[1], &v[1]));
        assert!(!paths.is_ancestor_of(&v[0], &v[0]));
        assert!(!paths.exists_semi_directed_path_to(&v[2], &v[0]));
        assert!(paths.exists_semi_directed_path_to(&v[0], &v[2]));
        assert!(paths.is_def_noncollider(&v[0], &v[1], &v[2]));
        assert!(!paths.is_def_collider(&v[0], &v[1], &v[2]));
    }

    #[test]
    fn self_ancestry_only_through_cycles() {
        let (mut g, v) = graph(&["A", "B", "C"]);
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[0]).unwrap();
        g.add_directed_edge(&v[1], &v[2]).unwrap();
        let paths = g.paths();

        assert!(paths.is_ancestor_of(&v[0], &v[0]));
        assert!(paths.is_ancestor_of(&v[1], &v[1]));
        assert!(!paths.is_ancestor_of(&v[2], &v[2]));
        assert!(paths.exists_directed_cycle());
        assert!(paths.valid_order().is_err());
    }

    #[test]
    fn semi_directed_allows_undirected_segments() {
        let (mut g, v) = graph(&["A", "B", "C", "D"]);
        g.add_undirected_edge(&v[0], &v[1]).unwrap();
        g.add_partially_oriented_edge(&v[1], &v[2]).unwrap();
        g.add_directed_edge(&v[3], &v[2]).unwrap();
        let paths = g.paths();

        assert!(paths.exists_semi_directed_path_to(&v[0], &v[2]));
        assert!(paths.exists_semi_directed_path_to(&v[1], &v[0]));
        assert!(!paths.exists_semi_directed_path_to(&v[2], &v[1]));
        assert!(!paths.exists_semi_directed_path_to(&v[2], &v[3]));
        assert!(!paths.exists_directed_path(&v[0], &v[2]));
    }

    #[test]
    fn colliders() {
        let (mut g, v) = graph(&["A", "B", "C"]);
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[2], &v[1]).unwrap();
        let paths = g.paths();

        assert!(paths.is_def_collider(&v[0], &v[1], &v[2]));
        assert!(paths.is_unshielded_collider(&v[0], &v[1], &v[2]));
        assert!(!paths.is_def_noncollider(&v[0], &v[1], &v[2]));
    }

    #[test]
    fn circle_triples_are_noncolliders_only_when_unshielded() {
        let (mut g, v) = graph(&["A", "B", "C"]);
        g.add_nondirected_edge(&v[0], &v[1]).unwrap();
        g.add_nondirected_edge(&v[1], &v[2]).unwrap();
        assert!(g.paths().is_def_noncollider(&v[0], &v[1], &v[2]));

        g.add_nondirected_edge(&v[0], &v[2]).unwrap();
        assert!(!g.paths().is_def_noncollider(&v[0], &v[1], &v[2]));
        g.add_underline_triple(&v[0], &v[1], &v[2]);
        assert!(g.paths().is_def_noncollider(&v[0], &v[1], &v[2]));
    }

    #[test]
    fn ancestors_and_descendants_are_reflexive() {
        let (mut g, v) = graph(&["A", "B", "C", "D"]);
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[2]).unwrap();
        let paths = g.paths();

        assert_eq!(
            paths.ancestors_of(&[v[2].clone()]),
            vec![v[0].clone(), v[1].clone(), v[2].clone()]
        );
        assert_eq!(paths.descendants_of(&[v[3].clone()]), vec![v[3].clone()]);
    }

    #[test]
    fn valid_order_respects_edges() {
        let (mut g, v) = graph(&["C", "B", "A"]);
        g.add_directed_edge(&v[2], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[0]).unwrap();
        let order = g.paths().valid_order().unwrap();
        assert_eq!(order, vec![v[2].clone(), v[1].clone(), v[0].clone()]);
    }

    #[test]
    fn directed_paths_are_enumerated_and_bounded() {
        let (mut g, v) = graph(&["A", "B", "C", "D"]);
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[3]).unwrap();
        g.add_directed_edge(&v[0], &v[2]).unwrap();
        g.add_directed_edge(&v[2], &v[3]).unwrap();
        g.add_directed_edge(&v[0], &v[3]).unwrap();
        g.add_directed_edge(&v[3], &v[0]).unwrap();
        let paths = g.paths();

        assert_eq!(paths.directed_paths(&v[0], &v[3], None).len(), 3);
        assert_eq!(paths.directed_paths(&v[0], &v[3], Some(1)).len(), 1);
    }

    #[test]
    fn d_separation_on_collider_and_chain() {
        let (mut g, v) = graph(&["A", "B", "C", "D"]);
        // A -> B <- C, B -> D
        g.add_directed_edge(&v[0], &v[1]).unwrap();
        g.add_directed_edge(&v[2], &v[1]).unwrap();
        g.add_directed_edge(&v[1], &v[3]).unwrap();
        let paths = g.paths();

        assert!(paths.is_m_separated(&v[0], &v[2], &[]));
        assert!(!paths.is_m_separated(&v[0], &v[2], &[v[1].clone()]));
        assert!(!paths.is_m_separated(&v[0], &v[2], &[v[3].clone()]));
        assert!(!paths.is_m_separated(&v[0], &v[3], &[]));
        assert!(paths.is_m_separated(&v[0], &v[3], &[v[1].clone()]));
    }

    #[test]
    fn bidirected_edges_form_colliders() {
        let (mut g, v) = graph(&["A", "B", "C"]);
        g.add_bidirected_edge(&v[0], &v[1]).unwrap();
        g.add_bidirected_edge(&v[1], &v[2]).unwrap();
        let paths = g.paths();

        assert!(paths.is_m_separated(&v[0], &v[2], &[]));
        assert!(paths.is_m_connected(&v[0], &v[2], &[v[1].clone()]));
    }
}
