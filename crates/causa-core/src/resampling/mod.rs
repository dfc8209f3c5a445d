//! # Resampling orchestration
//!
//! Runs one search per resampled data set and gathers the resulting graphs
//! for aggregation.
//!
//! ## Design
//!
//! - **Independent tasks**: each task draws its own rows from a generator
//!   seeded by `(seed, task index)`, owns its resampled data set and searches
//!   with a private clone of the knowledge. No state is shared between tasks
//!   except the read-only input data and algorithm.
//! - **Deterministic gathering**: results come back in task index order,
//!   whatever the scheduling, so a fixed seed gives a fixed result.
//! - **Failure accounting**: a task whose search returns an error or panics
//!   is logged, left out of the result and counted in
//!   [`ResamplingResult::dropped`].
//!
//! ## Feature gating
//!
//! Tasks run on rayon's pool behind the `parallel` feature and sequentially
//! without it.

mod aggregate;
mod stability;

use std::panic::{self, AssertUnwindSafe};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::Graph;
use crate::knowledge::Knowledge;
use crate::search::Algorithm;

pub use aggregate::{aggregate_graphs, edge_type_probabilities, EdgeEnsemble};
pub use stability::{StabilityConfig, StabilityResult, StabilitySelection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResamplingMethod {
    /// Draw rows with replacement.
    #[default]
    Bootstrap,
    /// Draw rows without replacement.
    Subsample,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResamplingConfig {
    pub method: ResamplingMethod,
    pub num_resamples: usize,
    /// Resample size as a percentage of the input rows. Subsampling needs a
    /// value in `(0, 100]`; bootstrap may exceed 100.
    pub percent_resample_size: f64,
    /// Also search the unmodified input; its graph comes last.
    pub add_original_dataset: bool,
    pub seed: u64,
}

impl Default for ResamplingConfig {
    fn default() -> Self {
        Self {
            method: ResamplingMethod::Bootstrap,
            num_resamples: 10,
            percent_resample_size: 100.0,
            add_original_dataset: false,
            seed: 0,
        }
    }
}

impl ResamplingConfig {
    fn resample_size(&self, rows: usize) -> Result<usize, CausalError> {
        let pct = self.percent_resample_size;
        if !pct.is_finite() || pct <= 0.0 {
            return Err(CausalError::invalid(format!(
                "resample size must be a positive percentage, got {}",
                pct
            )));
        }
        if self.method == ResamplingMethod::Subsample && pct > 100.0 {
            return Err(CausalError::invalid(format!(
                "subsampling cannot draw {}% of the rows",
                pct
            )));
        }
        let size = (rows as f64 * pct / 100.0).floor() as usize;
        if size == 0 {
            return Err(CausalError::invalid(format!(
                "{}% of {} rows is an empty resample",
                pct, rows
            )));
        }
        Ok(size)
    }
}

/// Graphs from the tasks that succeeded, in task order, plus the number of
/// tasks that failed.
#[derive(Debug, Clone, Default)]
pub struct ResamplingResult {
    pub graphs: Vec<Graph>,
    pub dropped: usize,
}

impl ResamplingResult {
    pub fn aggregate(&self, ensemble: EdgeEnsemble) -> Graph {
        aggregate_graphs(&self.graphs, ensemble)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResamplingSearch {
    config: ResamplingConfig,
}

impl ResamplingSearch {
    pub fn new(config: ResamplingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResamplingConfig {
        &self.config
    }

    /// Runs `algorithm` on every resample of `data`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unusable configuration (no tasks, empty
    /// resample, subsample larger than the data). Per-task failures never
    /// surface here; they are counted in [`ResamplingResult::dropped`].
    pub fn run(
        &self,
        algorithm: &dyn Algorithm,
        data: &DataSet,
        knowledge: &Knowledge,
    ) -> Result<ResamplingResult, CausalError> {
        let tasks = self.config.num_resamples + usize::from(self.config.add_original_dataset);
        if tasks == 0 {
            return Err(CausalError::invalid("resampling needs at least one task"));
        }
        let size = if self.config.num_resamples > 0 {
            self.config.resample_size(data.num_rows())?
        } else {
            data.num_rows()
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<Option<Graph>> = (0..tasks)
            .into_par_iter()
            .map(|task| self.run_task(task, size, algorithm, data, knowledge))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<Option<Graph>> = (0..tasks)
            .map(|task| self.run_task(task, size, algorithm, data, knowledge))
            .collect();

        let dropped = outcomes.iter().filter(|o| o.is_none()).count();
        let graphs: Vec<Graph> = outcomes.into_iter().flatten().collect();
        info!(
            algorithm = algorithm.name(),
            tasks,
            succeeded = graphs.len(),
            dropped,
            "resampling finished"
        );
        Ok(ResamplingResult { graphs, dropped })
    }

    fn run_task(
        &self,
        task: usize,
        size: usize,
        algorithm: &dyn Algorithm,
        data: &DataSet,
        knowledge: &Knowledge,
    ) -> Option<Graph> {
        let outcome = self.resample(task, size, data).and_then(|sample| {
            let knowledge = knowledge.clone();
            let sample = sample.as_ref().unwrap_or(data);
            panic::catch_unwind(AssertUnwindSafe(|| algorithm.search(sample, &knowledge)))
                .unwrap_or_else(|payload| Err(CausalError::Search(panic_message(payload.as_ref()))))
        });
        match outcome {
            Ok(graph) => Some(graph),
            Err(err) => {
                warn!(task, error = %err, "resampling task failed; dropping it");
                None
            }
        }
    }

    /// The rows for `task`; `None` for the original-data task.
    fn resample(&self, task: usize, size: usize, data: &DataSet) -> Result<Option<DataSet>, CausalError> {
        if task >= self.config.num_resamples {
            return Ok(None);
        }
        let mut rng = task_rng(self.config.seed, task);
        let n = data.num_rows();
        let rows: Vec<usize> = match self.config.method {
            ResamplingMethod::Bootstrap => (0..size).map(|_| rng.gen_range(0..n)).collect(),
            ResamplingMethod::Subsample => index::sample(&mut rng, n, size).into_vec(),
        };
        data.select_rows(&rows).map(Some)
    }
}

/// Generator for one task, independent of how tasks are scheduled.
pub(crate) fn task_rng(seed: u64, task: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (task as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("search panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("search panicked: {}", s)
    } else {
        "search panicked".to_string()
    }
}
