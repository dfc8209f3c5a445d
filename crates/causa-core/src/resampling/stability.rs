//! Stability selection over a grid of algorithm settings.
//!
//! Every setting is run on the same family of subsamples; an edge is stable
//! when, for some setting, it appears in at least `threshold` of the
//! subsamples. The `(setting, subsample)` tasks are executed by recursive
//! fork/join splitting down to `leaf_size` tasks per leaf.

use std::collections::BTreeMap;

use tracing::info;

use super::{aggregate_graphs, EdgeEnsemble, ResamplingConfig, ResamplingMethod, ResamplingSearch};
use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::{Edge, Graph, Node};
use crate::knowledge::Knowledge;
use crate::search::Algorithm;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StabilityConfig {
    /// How each subsample is drawn. `add_original_dataset` is ignored.
    pub resampling: ResamplingConfig,
    /// Selection frequency an edge needs under some setting.
    pub threshold: f64,
    /// Largest number of tasks a fork/join leaf runs sequentially.
    pub leaf_size: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            resampling: ResamplingConfig {
                method: ResamplingMethod::Subsample,
                num_resamples: 20,
                percent_resample_size: 50.0,
                add_original_dataset: false,
                seed: 0,
            },
            threshold: 0.6,
            leaf_size: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StabilityResult {
    /// Per setting: the `Preserved` aggregate, whose edges carry their
    /// selection frequencies.
    pub frequencies: Vec<Graph>,
    /// Per setting: failed tasks.
    pub dropped: Vec<usize>,
    /// Edges selected by at least one setting.
    pub stable: Graph,
}

#[derive(Debug, Clone, Default)]
pub struct StabilitySelection {
    config: StabilityConfig,
}

impl StabilitySelection {
    pub fn new(config: StabilityConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        settings: &[&dyn Algorithm],
        data: &DataSet,
        knowledge: &Knowledge,
    ) -> Result<StabilityResult, CausalError> {
        if !(0.0..=1.0).contains(&self.config.threshold) {
            return Err(CausalError::invalid(format!(
                "stability threshold must lie in [0, 1], got {}",
                self.config.threshold
            )));
        }
        let resampling = ResamplingConfig {
            add_original_dataset: false,
            ..self.config.resampling.clone()
        };
        let per_setting = resampling.num_resamples;
        if per_setting == 0 {
            return Err(CausalError::invalid("stability selection needs at least one subsample"));
        }
        let size = resampling.resample_size(data.num_rows())?;
        let search = ResamplingSearch::new(resampling);

        let tasks: Vec<(usize, usize)> = (0..settings.len())
            .flat_map(|s| (0..per_setting).map(move |r| (s, r)))
            .collect();
        let job = Job {
            search: &search,
            settings,
            size,
            data,
            knowledge,
            leaf_size: self.config.leaf_size.max(1),
        };
        let outcomes = job.fork_join(&tasks);

        let mut result = StabilityResult::default();
        for chunk in outcomes.chunks(per_setting) {
            let graphs: Vec<Graph> = chunk.iter().flatten().cloned().collect();
            result.dropped.push(chunk.len() - graphs.len());
            result.frequencies.push(aggregate_graphs(&graphs, EdgeEnsemble::Preserved));
        }
        result.stable = self.select_stable(settings.len(), data, &outcomes, per_setting)?;
        info!(
            settings = settings.len(),
            tasks = tasks.len(),
            stable_edges = result.stable.num_edges(),
            "stability selection finished"
        );
        Ok(result)
    }

    /// Union of the per-setting threshold aggregates. A pair selected by more
    /// than one setting keeps the edge with the highest frequency, the
    /// earlier setting winning ties.
    fn select_stable(
        &self,
        num_settings: usize,
        data: &DataSet,
        outcomes: &[Option<Graph>],
        per_setting: usize,
    ) -> Result<Graph, CausalError> {
        let mut chosen: BTreeMap<(Node, Node), Edge> = BTreeMap::new();
        for chunk in outcomes.chunks(per_setting).take(num_settings) {
            let graphs: Vec<Graph> = chunk.iter().flatten().cloned().collect();
            let selected = aggregate_graphs(&graphs, EdgeEnsemble::Threshold(self.config.threshold));
            for edge in selected.edges() {
                let key = if edge.node1() <= edge.node2() {
                    (edge.node1().clone(), edge.node2().clone())
                } else {
                    (edge.node2().clone(), edge.node1().clone())
                };
                let better = chosen
                    .get(&key)
                    .map_or(true, |e| edge.probability() > e.probability());
                if better {
                    chosen.insert(key, edge.clone());
                }
            }
        }
        let mut stable = Graph::with_nodes(data.nodes());
        for edge in chosen.into_values() {
            stable.add_edge(edge)?;
        }
        Ok(stable)
    }
}

/// Shared inputs of one fork/join run.
struct Job<'a> {
    search: &'a ResamplingSearch,
    settings: &'a [&'a dyn Algorithm],
    size: usize,
    data: &'a DataSet,
    knowledge: &'a Knowledge,
    leaf_size: usize,
}

impl Job<'_> {
    /// Runs `tasks` and returns their outcomes in task order.
    fn fork_join(&self, tasks: &[(usize, usize)]) -> Vec<Option<Graph>> {
        if tasks.len() <= self.leaf_size {
            return tasks
                .iter()
                .map(|&(setting, resample)| {
                    self.search.run_task(
                        resample,
                        self.size,
                        self.settings[setting],
                        self.data,
                        self.knowledge,
                    )
                })
                .collect();
        }
        let (left, right) = tasks.split_at(tasks.len() / 2);

        #[cfg(feature = "parallel")]
        let (mut first, second) = rayon::join(|| self.fork_join(left), || self.fork_join(right));

        #[cfg(not(feature = "parallel"))]
        let (mut first, second) = (self.fork_join(left), self.fork_join(right));

        first.extend(second);
        first
    }
}
