//! Greedy hill climbing over DAGs.

use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::meek::{cpdag_from_dag, MeekRules};
use super::{Algorithm, Score, ScoreChoice};
use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::{Edge, Graph, Node};
use crate::knowledge::Knowledge;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HillClimbConfig {
    pub max_iterations: usize,
    /// Largest in-degree the search may create; `None` for unbounded.
    pub max_parents: Option<usize>,
    /// Smallest score gain that counts as an improvement.
    pub min_improvement: f64,
    /// Return the CPDAG of the final DAG instead of the DAG itself.
    pub output_cpdag: bool,
}

impl Default for HillClimbConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000,
            max_parents: None,
            min_improvement: 1e-9,
            output_cpdag: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Move {
    Add,
    Delete,
    Reverse,
}

/// Starts from the required edges and repeatedly applies the single edge
/// addition, deletion or reversal with the largest score gain, keeping the
/// graph acyclic and consistent with the knowledge.
#[derive(Debug, Clone)]
pub struct HillClimb {
    score: ScoreChoice,
    config: HillClimbConfig,
}

impl HillClimb {
    pub fn new(score: ScoreChoice) -> Self {
        Self::with_config(score, HillClimbConfig::default())
    }

    pub fn with_config(score: ScoreChoice, config: HillClimbConfig) -> Self {
        Self { score, config }
    }

    pub fn config(&self) -> &HillClimbConfig {
        &self.config
    }

    pub fn search_with_score(&self, score: &dyn Score, knowledge: &Knowledge) -> Result<Graph, CausalError> {
        let nodes = score.nodes().to_vec();
        let mut graph = Graph::with_nodes(nodes.iter().cloned());
        for (from, to) in knowledge.required_edges() {
            let (Some(a), Some(b)) = (graph.node(&from).cloned(), graph.node(&to).cloned()) else {
                continue;
            };
            if graph.paths().exists_directed_path(&b, &a) {
                return Err(CausalError::Search(format!(
                    "required edges {} --> {} close a directed cycle",
                    a, b
                )));
            }
            graph.add_directed_edge(&a, &b)?;
        }

        let mut local: FxHashMap<Node, f64> = FxHashMap::default();
        for node in &nodes {
            local.insert(node.clone(), score.local_score(node, &graph.parents(node))?);
        }

        let mut iterations = 0;
        while iterations < self.config.max_iterations {
            let Some((gain, step, x, y)) = self.best_move(score, &graph, &local, knowledge)? else {
                break;
            };
            debug!(?step, %x, %y, gain, "hill climb step");
            match step {
                Move::Add => {
                    graph.add_directed_edge(&x, &y)?;
                }
                Move::Delete => {
                    graph.remove_edge(&Edge::directed(x.clone(), y.clone()));
                }
                Move::Reverse => {
                    graph.remove_edge(&Edge::directed(x.clone(), y.clone()));
                    graph.add_directed_edge(&y, &x)?;
                }
            }
            for node in [&x, &y] {
                local.insert(node.clone(), score.local_score(node, &graph.parents(node))?);
            }
            iterations += 1;
        }

        let total: f64 = local.values().sum();
        info!(iterations, edges = graph.num_edges(), score = total, "hill climb finished");

        if self.config.output_cpdag {
            let mut cpdag = cpdag_from_dag(&graph)?;
            MeekRules::with_knowledge(knowledge).orient_implied(&mut cpdag)?;
            return Ok(cpdag);
        }
        Ok(graph)
    }

    fn best_move(
        &self,
        score: &dyn Score,
        graph: &Graph,
        local: &FxHashMap<Node, f64>,
        knowledge: &Knowledge,
    ) -> Result<Option<(f64, Move, Node, Node)>, CausalError> {
        let current = |n: &Node| local.get(n).copied().unwrap_or(f64::NEG_INFINITY);
        let mut best: Option<(f64, Move, Node, Node)> = None;
        let mut consider = |gain: f64, step: Move, x: &Node, y: &Node| {
            if gain > self.config.min_improvement && best.as_ref().map_or(true, |b| gain > b.0) {
                best = Some((gain, step, x.clone(), y.clone()));
            }
        };

        for x in graph.nodes() {
            for y in graph.nodes() {
                if x == y {
                    continue;
                }
                let (xn, yn) = (x.name(), y.name());
                let parents_y = graph.parents(y);

                if !graph.is_adjacent_to(x, y) {
                    if knowledge.is_forbidden(xn, yn)
                        || self.config.max_parents.is_some_and(|m| parents_y.len() >= m)
                        || graph.paths().exists_directed_path(y, x)
                    {
                        continue;
                    }
                    let mut with_x = parents_y.clone();
                    with_x.push(x.clone());
                    consider(score.local_score(y, &with_x)? - current(y), Move::Add, x, y);
                    continue;
                }

                if !graph.is_parent_of(x, y) || knowledge.is_required(xn, yn) {
                    continue;
                }
                let without_x: Vec<Node> = parents_y.iter().filter(|p| *p != x).cloned().collect();
                let delete_gain = score.local_score(y, &without_x)? - current(y);
                consider(delete_gain, Move::Delete, x, y);

                if knowledge.is_forbidden(yn, xn)
                    || self.config.max_parents.is_some_and(|m| graph.indegree(x) >= m)
                {
                    continue;
                }
                let mut parents_x = graph.parents(x);
                parents_x.push(y.clone());
                let reverse_gain = delete_gain + score.local_score(x, &parents_x)? - current(x);
                if reverse_gain > self.config.min_improvement && !reversal_closes_cycle(graph, x, y) {
                    consider(reverse_gain, Move::Reverse, x, y);
                }
            }
        }
        Ok(best)
    }
}

/// True if another directed path `x --> ... --> y` exists besides the edge
/// itself, so that reversing the edge would close a cycle.
fn reversal_closes_cycle(graph: &Graph, x: &Node, y: &Node) -> bool {
    let mut trial = graph.clone();
    trial.remove_edge(&Edge::directed(x.clone(), y.clone()));
    trial.paths().exists_directed_path(x, y)
}

impl Algorithm for HillClimb {
    fn name(&self) -> &str {
        "hill-climb"
    }

    fn search(&self, data: &DataSet, knowledge: &Knowledge) -> Result<Graph, CausalError> {
        let score = self.score.build(data)?;
        self.search_with_score(score.as_ref(), knowledge)
    }
}
