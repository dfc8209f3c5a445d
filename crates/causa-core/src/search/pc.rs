//! PC: constraint-based search with knowledge.
//!
//! ## Design
//!
//! - **Adjacency search** (PC-stable when `stable` is set): start from the
//!   complete undirected graph, drop pairs the knowledge forbids in both
//!   directions, then remove `x --- y` as soon as some subset of the current
//!   neighbours of `x` separates them. Required pairs are never tested.
//! - **Orientation**: knowledge directions first, then unshielded colliders
//!   `a --> c <-- b` whenever `c` is not in the separating set of `a` and `b`,
//!   then the Meek rules.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::meek::{self, MeekRules};
use super::{subsets_of_size, Algorithm, IndependenceTest, TestChoice};
use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::{Endpoint, Graph, Node};
use crate::knowledge::Knowledge;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PcConfig {
    /// Largest conditioning set size; `None` for unbounded.
    pub depth: Option<usize>,
    /// Freeze neighbourhoods at the start of each depth (PC-stable), so the
    /// result does not depend on variable order.
    pub stable: bool,
    /// Orient colliders and apply the Meek rules; otherwise return the
    /// skeleton.
    pub orient: bool,
}

impl Default for PcConfig {
    fn default() -> Self {
        Self {
            depth: None,
            stable: true,
            orient: true,
        }
    }
}

/// Separating sets keyed by the name-ordered pair.
type SepSets = FxHashMap<(Node, Node), Vec<Node>>;

fn pair_key(a: &Node, b: &Node) -> (Node, Node) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Debug, Clone)]
pub struct Pc {
    test: TestChoice,
    config: PcConfig,
}

impl Pc {
    pub fn new(test: TestChoice) -> Self {
        Self::with_config(test, PcConfig::default())
    }

    pub fn with_config(test: TestChoice, config: PcConfig) -> Self {
        Self { test, config }
    }

    pub fn config(&self) -> &PcConfig {
        &self.config
    }

    /// Runs the search against an already constructed test.
    pub fn search_with_test(
        &self,
        test: &dyn IndependenceTest,
        knowledge: &Knowledge,
    ) -> Result<Graph, CausalError> {
        let nodes = test.nodes().to_vec();
        let (mut graph, sepsets) = self.adjacency_search(test, &nodes, knowledge)?;
        if self.config.orient {
            meek::orient_by_knowledge(&mut graph, knowledge)?;
            orient_colliders(&mut graph, &sepsets, knowledge)?;
            MeekRules::with_knowledge(knowledge).orient_implied(&mut graph)?;
        }
        info!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            "pc search finished"
        );
        Ok(graph)
    }

    fn adjacency_search(
        &self,
        test: &dyn IndependenceTest,
        nodes: &[Node],
        knowledge: &Knowledge,
    ) -> Result<(Graph, SepSets), CausalError> {
        let mut graph = Graph::with_nodes(nodes.iter().cloned());
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                let (an, bn) = (a.name(), b.name());
                if knowledge.is_forbidden(an, bn) && knowledge.is_forbidden(bn, an) {
                    continue;
                }
                graph.add_undirected_edge(a, b)?;
            }
        }

        let mut sepsets = SepSets::default();
        let max_depth = self.config.depth.unwrap_or(usize::MAX);
        let mut depth = 0;
        while depth <= max_depth {
            let frozen: FxHashMap<Node, Vec<Node>> = nodes
                .iter()
                .map(|n| (n.clone(), graph.adjacent_nodes(n)))
                .collect();
            let mut more = false;

            for x in nodes {
                let neighbours = if self.config.stable {
                    frozen.get(x).cloned().unwrap_or_default()
                } else {
                    graph.adjacent_nodes(x)
                };
                for y in &neighbours {
                    if !graph.is_adjacent_to(x, y) || !knowledge.no_edge_required(x.name(), y.name()) {
                        continue;
                    }
                    let others: Vec<Node> = neighbours.iter().filter(|n| *n != y).cloned().collect();
                    if others.len() < depth {
                        continue;
                    }
                    if others.len() > depth {
                        more = true;
                    }
                    for z in subsets_of_size(&others, depth) {
                        let result = test.check_independence(x, y, &z)?;
                        if result.independent {
                            debug!(%x, %y, sepset = ?z, p = result.p_value, "removed adjacency");
                            graph.remove_edges_between(x, y);
                            sepsets.insert(pair_key(x, y), z);
                            break;
                        }
                    }
                }
            }

            if !more {
                break;
            }
            depth += 1;
        }
        Ok((graph, sepsets))
    }
}

/// Orients `a --> c <-- b` for each unshielded triple whose middle node is
/// not in the separating set. An orientation that would put an arrowhead on
/// an existing arrow's tail end, or that the knowledge forbids, is skipped.
fn orient_colliders(graph: &mut Graph, sepsets: &SepSets, knowledge: &Knowledge) -> Result<(), CausalError> {
    let nodes = graph.nodes().to_vec();
    for c in &nodes {
        let adjacent = graph.adjacent_nodes(c);
        for (i, a) in adjacent.iter().enumerate() {
            for b in &adjacent[i + 1..] {
                if graph.is_adjacent_to(a, b) {
                    continue;
                }
                let separated_by_c = sepsets
                    .get(&pair_key(a, b))
                    .is_some_and(|s| s.contains(c));
                if separated_by_c {
                    continue;
                }
                if !can_point_into(graph, knowledge, a, c) || !can_point_into(graph, knowledge, b, c) {
                    continue;
                }
                debug!(%a, %c, %b, "oriented collider");
                graph.set_endpoint(a, c, Endpoint::Arrow)?;
                graph.set_endpoint(b, c, Endpoint::Arrow)?;
            }
        }
    }
    Ok(())
}

fn can_point_into(graph: &Graph, knowledge: &Knowledge, from: &Node, into: &Node) -> bool {
    graph.endpoint(into, from) != Some(Endpoint::Arrow)
        && !knowledge.is_forbidden(from.name(), into.name())
}

impl Algorithm for Pc {
    fn name(&self) -> &str {
        "pc"
    }

    fn search(&self, data: &DataSet, knowledge: &Knowledge) -> Result<Graph, CausalError> {
        let test = self.test.build(data)?;
        self.search_with_test(test.as_ref(), knowledge)
    }
}
