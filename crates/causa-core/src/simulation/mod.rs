//! # Simulation
//!
//! Random forward DAGs and a linear structural equation model over them.
//! A simulation owns its generated data sets and true graphs; each
//! [`Simulation::create_data`] call replaces both wholesale.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use statrs::distribution::Normal;
use tracing::info;

use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::{Graph, Node};

/// Produces data sets together with the graphs that generated them.
pub trait Simulation {
    /// Regenerates every data set and true graph.
    fn create_data(&mut self) -> Result<(), CausalError>;

    fn num_data_sets(&self) -> usize;

    fn data_set(&self, index: usize) -> Option<&DataSet>;

    fn true_graph(&self, index: usize) -> Option<&Graph>;
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    pub num_nodes: usize,
    /// Requested edge count, capped at `n (n - 1) / 2`.
    pub num_edges: usize,
    pub sample_size: usize,
    /// Data sets per `create_data` call, each over its own random graph.
    pub num_runs: usize,
    /// Edge coefficients are drawn uniformly from `[coef_low, coef_high]`.
    pub coef_low: f64,
    pub coef_high: f64,
    /// Flip the sign of each coefficient with probability one half.
    pub coef_symmetric: bool,
    /// Error variances are drawn uniformly from this range.
    pub error_variance_low: f64,
    pub error_variance_high: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_nodes: 5,
            num_edges: 5,
            sample_size: 1_000,
            num_runs: 1,
            coef_low: 0.5,
            coef_high: 1.5,
            coef_symmetric: true,
            error_variance_low: 1.0,
            error_variance_high: 3.0,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    fn validate(&self) -> Result<(), CausalError> {
        if self.num_nodes == 0 {
            return Err(CausalError::invalid("simulation needs at least one node"));
        }
        let bounds = [
            self.coef_low,
            self.coef_high,
            self.error_variance_low,
            self.error_variance_high,
        ];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(CausalError::invalid("simulation ranges must be finite"));
        }
        if self.coef_low > self.coef_high || self.error_variance_low > self.error_variance_high {
            return Err(CausalError::invalid("simulation ranges must have low <= high"));
        }
        if self.error_variance_low <= 0.0 {
            return Err(CausalError::invalid("error variances must be positive"));
        }
        Ok(())
    }
}

/// A random DAG over `X1..Xn` whose edges all point from lower to higher
/// index.
pub fn random_forward_dag<R: Rng>(num_nodes: usize, num_edges: usize, rng: &mut R) -> Graph {
    let nodes: Vec<Node> = (1..=num_nodes).map(|i| Node::new(format!("X{}", i))).collect();
    let mut pairs: Vec<(usize, usize)> = (0..num_nodes)
        .flat_map(|i| (i + 1..num_nodes).map(move |j| (i, j)))
        .collect();
    let wanted = num_edges.min(pairs.len());
    // Partial Fisher-Yates: the first `wanted` pairs become a uniform sample.
    for k in 0..wanted {
        let pick = rng.gen_range(k..pairs.len());
        pairs.swap(k, pick);
    }
    pairs.truncate(wanted);
    pairs.sort_unstable();

    let mut graph = Graph::with_nodes(nodes.iter().cloned());
    for (i, j) in pairs {
        // Distinct member nodes with no prior edge.
        let added = graph.add_directed_edge(&nodes[i], &nodes[j]);
        debug_assert!(matches!(added, Ok(true)), "forward edge rejected: {:?}", added);
    }
    graph
}

/// Coefficients keyed by `(parent, child)`.
pub type EdgeCoefficients = FxHashMap<(Node, Node), f64>;

#[derive(Debug, Clone, Default)]
pub struct LinearSemSimulation {
    config: SimulationConfig,
    graphs: Vec<Graph>,
    data_sets: Vec<DataSet>,
    coefficients: Vec<EdgeCoefficients>,
}

impl LinearSemSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn coefficients(&self, index: usize) -> Option<&EdgeCoefficients> {
        self.coefficients.get(index)
    }

    /// Samples `sample_size` rows from the linear SEM over `graph`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `graph` is cyclic.
    pub fn sample<R: Rng>(
        graph: &Graph,
        coefficients: &EdgeCoefficients,
        error_std: &FxHashMap<Node, f64>,
        sample_size: usize,
        rng: &mut R,
    ) -> Result<DataSet, CausalError> {
        let order = graph.paths().valid_order()?;
        let standard = Normal::new(0.0, 1.0).map_err(|e| CausalError::Internal(e.to_string()))?;
        let mut columns: FxHashMap<Node, Vec<f64>> = FxHashMap::default();

        for node in &order {
            let sd = error_std.get(node).copied().unwrap_or(1.0);
            let mut values: Vec<f64> = (0..sample_size)
                .map(|_| sd * standard.sample(rng))
                .collect();
            for parent in graph.parents(node) {
                let coef = coefficients
                    .get(&(parent.clone(), node.clone()))
                    .copied()
                    .unwrap_or(0.0);
                let parent_values = columns.get(&parent).ok_or_else(|| {
                    CausalError::Internal(format!("{} sampled before its parent {}", node, parent))
                })?;
                for (v, p) in values.iter_mut().zip(parent_values) {
                    *v += coef * p;
                }
            }
            columns.insert(node.clone(), values);
        }

        let nodes = graph.nodes().to_vec();
        let ordered = nodes
            .iter()
            .map(|n| columns.remove(n).unwrap_or_default())
            .collect();
        DataSet::continuous(nodes, ordered)
    }
}

impl Simulation for LinearSemSimulation {
    fn create_data(&mut self) -> Result<(), CausalError> {
        self.config.validate()?;
        let cfg = &self.config;
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let mut graphs = Vec::with_capacity(cfg.num_runs);
        let mut data_sets = Vec::with_capacity(cfg.num_runs);
        let mut all_coefficients = Vec::with_capacity(cfg.num_runs);

        for run in 0..cfg.num_runs {
            let graph = random_forward_dag(cfg.num_nodes, cfg.num_edges, &mut rng);
            let mut coefficients = EdgeCoefficients::default();
            for edge in graph.edges() {
                if let Some((tail, head)) = edge.tail_and_head() {
                    let mut c = rng.gen_range(cfg.coef_low..=cfg.coef_high);
                    if cfg.coef_symmetric && rng.gen_bool(0.5) {
                        c = -c;
                    }
                    coefficients.insert((tail.clone(), head.clone()), c);
                }
            }
            let error_std: FxHashMap<Node, f64> = graph
                .nodes()
                .iter()
                .map(|n| {
                    let variance = rng.gen_range(cfg.error_variance_low..=cfg.error_variance_high);
                    (n.clone(), variance.sqrt())
                })
                .collect();
            let data = Self::sample(&graph, &coefficients, &error_std, cfg.sample_size, &mut rng)?;
            info!(run, edges = graph.num_edges(), rows = data.num_rows(), "simulated linear SEM");

            graphs.push(graph);
            data_sets.push(data);
            all_coefficients.push(coefficients);
        }

        self.graphs = graphs;
        self.data_sets = data_sets;
        self.coefficients = all_coefficients;
        Ok(())
    }

    fn num_data_sets(&self) -> usize {
        self.data_sets.len()
    }

    fn data_set(&self, index: usize) -> Option<&DataSet> {
        self.data_sets.get(index)
    }

    fn true_graph(&self, index: usize) -> Option<&Graph> {
        self.graphs.get(index)
    }
}
