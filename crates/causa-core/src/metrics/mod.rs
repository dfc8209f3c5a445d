//! Comparison statistics between a true graph and an estimated graph.
//!
//! Built-ins (registered by [`StatisticRegistry::with_builtins`]):
//! - `AP` / `AR`: adjacency precision and recall
//! - `AHP` / `AHR`: arrowhead precision and recall
//! - `AncP` / `AncR`: ancestor precision and recall
//! - `NoSemidirectedP` / `NoSemidirectedR`: precision and recall of the
//!   absence of semi-directed paths
//! - `EdgesEst` / `EdgesTrue`: edge counts
//!
//! Notes:
//! - Nodes are matched by name. Ordered-pair statistics range over the true
//!   graph's nodes.
//! - A ratio with a zero denominator is `NaN`.
//! - Both no-semidirected statistics query the true graph as given, never
//!   its CPDAG, so the two stay comparable.

use std::collections::BTreeMap;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::graph::{Endpoint, Graph, Node};

/// A scalar comparison of an estimated graph against the truth.
pub trait Statistic: Send + Sync + 'static {
    /// Short column name, e.g. `AP`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64;
}

#[derive(Default, Clone)]
pub struct StatisticRegistry {
    inner: BTreeMap<String, Arc<dyn Statistic>>,
}

impl StatisticRegistry {
    pub fn with_builtins() -> Self {
        let mut r = StatisticRegistry::default();
        r.register(Arc::new(AdjacencyPrecision));
        r.register(Arc::new(AdjacencyRecall));
        r.register(Arc::new(ArrowheadPrecision));
        r.register(Arc::new(ArrowheadRecall));
        r.register(Arc::new(AncestorPrecision));
        r.register(Arc::new(AncestorRecall));
        r.register(Arc::new(NoSemidirectedPrecision));
        r.register(Arc::new(NoSemidirectedRecall));
        r.register(Arc::new(EdgesEst));
        r.register(Arc::new(EdgesTrue));
        r
    }

    /// Registers (or replaces) a statistic under its own name.
    pub fn register(&mut self, statistic: Arc<dyn Statistic>) {
        self.inner.insert(statistic.name().to_string(), statistic);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Statistic>> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).collect()
    }

    /// Every registered statistic, by name.
    pub fn compare(&self, true_graph: &Graph, estimated: &Graph) -> Vec<(String, f64)> {
        let stats: Vec<&Arc<dyn Statistic>> = self.inner.values().collect();

        #[cfg(feature = "parallel")]
        let values: Vec<f64> = stats
            .par_iter()
            .map(|s| s.compute(true_graph, estimated))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let values: Vec<f64> = stats
            .iter()
            .map(|s| s.compute(true_graph, estimated))
            .collect();

        stats
            .iter()
            .map(|s| s.name().to_string())
            .zip(values)
            .collect()
    }
}

impl std::fmt::Debug for StatisticRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticRegistry")
            .field("statistics", &self.names())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Counting helpers
// ----------------------------------------------------------------------------

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 {
        f64::NAN
    } else {
        hits as f64 / total as f64
    }
}

/// (est-only, true-only, both) counts over unordered adjacent pairs.
fn adjacency_counts(true_graph: &Graph, estimated: &Graph) -> (usize, usize, usize) {
    let pairs = |g: &Graph| -> std::collections::BTreeSet<(Node, Node)> {
        g.edges()
            .iter()
            .map(|e| {
                let (a, b) = (e.node1().clone(), e.node2().clone());
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect()
    };
    let est = pairs(estimated);
    let truth = pairs(true_graph);
    let both = est.intersection(&truth).count();
    (est.len(), truth.len(), both)
}

/// Arrowheads of `g` as `(from, into)`: an arrow at `into` on an edge
/// between the two.
fn arrowheads(g: &Graph) -> Vec<(Node, Node)> {
    let mut out = Vec::new();
    for e in g.edges() {
        if e.endpoint2() == Endpoint::Arrow {
            out.push((e.node1().clone(), e.node2().clone()));
        }
        if e.endpoint1() == Endpoint::Arrow {
            out.push((e.node2().clone(), e.node1().clone()));
        }
    }
    out
}

fn has_arrowhead(g: &Graph, from: &Node, into: &Node) -> bool {
    g.edges_between(from, into)
        .iter()
        .any(|e| e.proximal_endpoint(into) == Some(Endpoint::Arrow))
}

fn ordered_pairs(g: &Graph) -> impl Iterator<Item = (&Node, &Node)> {
    let nodes = g.nodes();
    nodes
        .iter()
        .flat_map(move |x| nodes.iter().filter(move |y| *y != x).map(move |y| (x, y)))
}

// ----------------------------------------------------------------------------
// Built-ins
// ----------------------------------------------------------------------------

struct AdjacencyPrecision;
impl Statistic for AdjacencyPrecision {
    fn name(&self) -> &str {
        "AP"
    }
    fn description(&self) -> &str {
        "Adjacency precision"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (est, _, both) = adjacency_counts(true_graph, estimated);
        ratio(both, est)
    }
}

struct AdjacencyRecall;
impl Statistic for AdjacencyRecall {
    fn name(&self) -> &str {
        "AR"
    }
    fn description(&self) -> &str {
        "Adjacency recall"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (_, truth, both) = adjacency_counts(true_graph, estimated);
        ratio(both, truth)
    }
}

struct ArrowheadPrecision;
impl Statistic for ArrowheadPrecision {
    fn name(&self) -> &str {
        "AHP"
    }
    fn description(&self) -> &str {
        "Arrowhead precision"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let est = arrowheads(estimated);
        let hits = est
            .iter()
            .filter(|(from, into)| has_arrowhead(true_graph, from, into))
            .count();
        ratio(hits, est.len())
    }
}

struct ArrowheadRecall;
impl Statistic for ArrowheadRecall {
    fn name(&self) -> &str {
        "AHR"
    }
    fn description(&self) -> &str {
        "Arrowhead recall"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let truth = arrowheads(true_graph);
        let hits = truth
            .iter()
            .filter(|(from, into)| has_arrowhead(estimated, from, into))
            .count();
        ratio(hits, truth.len())
    }
}

struct AncestorPrecision;
impl Statistic for AncestorPrecision {
    fn name(&self) -> &str {
        "AncP"
    }
    fn description(&self) -> &str {
        "Ancestor precision"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (truth, est) = (true_graph.paths(), estimated.paths());
        let (mut hits, mut total) = (0, 0);
        for (x, y) in ordered_pairs(true_graph) {
            if est.is_ancestor_of(x, y) {
                total += 1;
                if truth.is_ancestor_of(x, y) {
                    hits += 1;
                }
            }
        }
        ratio(hits, total)
    }
}

struct AncestorRecall;
impl Statistic for AncestorRecall {
    fn name(&self) -> &str {
        "AncR"
    }
    fn description(&self) -> &str {
        "Ancestor recall"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (truth, est) = (true_graph.paths(), estimated.paths());
        let (mut hits, mut total) = (0, 0);
        for (x, y) in ordered_pairs(true_graph) {
            if truth.is_ancestor_of(x, y) {
                total += 1;
                if est.is_ancestor_of(x, y) {
                    hits += 1;
                }
            }
        }
        ratio(hits, total)
    }
}

struct NoSemidirectedPrecision;
impl Statistic for NoSemidirectedPrecision {
    fn name(&self) -> &str {
        "NoSemidirectedP"
    }
    fn description(&self) -> &str {
        "Precision of 'no semi-directed path from X to Y'"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (truth, est) = (true_graph.paths(), estimated.paths());
        let (mut hits, mut total) = (0, 0);
        for (x, y) in ordered_pairs(true_graph) {
            if !est.exists_semi_directed_path_to(x, y) {
                total += 1;
                if !truth.exists_semi_directed_path_to(x, y) {
                    hits += 1;
                }
            }
        }
        ratio(hits, total)
    }
}

struct NoSemidirectedRecall;
impl Statistic for NoSemidirectedRecall {
    fn name(&self) -> &str {
        "NoSemidirectedR"
    }
    fn description(&self) -> &str {
        "Recall of 'no semi-directed path from X to Y'"
    }
    fn compute(&self, true_graph: &Graph, estimated: &Graph) -> f64 {
        let (truth, est) = (true_graph.paths(), estimated.paths());
        let (mut hits, mut total) = (0, 0);
        for (x, y) in ordered_pairs(true_graph) {
            if !truth.exists_semi_directed_path_to(x, y) {
                total += 1;
                if !est.exists_semi_directed_path_to(x, y) {
                    hits += 1;
                }
            }
        }
        ratio(hits, total)
    }
}

struct EdgesEst;
impl Statistic for EdgesEst {
    fn name(&self) -> &str {
        "EdgesEst"
    }
    fn description(&self) -> &str {
        "Number of edges in the estimated graph"
    }
    fn compute(&self, _true_graph: &Graph, estimated: &Graph) -> f64 {
        estimated.num_edges() as f64
    }
}

struct EdgesTrue;
impl Statistic for EdgesTrue {
    fn name(&self) -> &str {
        "EdgesTrue"
    }
    fn description(&self) -> &str {
        "Number of edges in the true graph"
    }
    fn compute(&self, true_graph: &Graph, _estimated: &Graph) -> f64 {
        true_graph.num_edges() as f64
    }
}
