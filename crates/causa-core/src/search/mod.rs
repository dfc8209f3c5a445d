//! # Structure search
//!
//! Seams and a small set of searches built on the public graph and knowledge
//! query surface:
//!
//! - [`IndependenceTest`] with [`FisherZ`] (continuous data) and [`MSepTest`]
//!   (an m-separation oracle over a known graph).
//! - [`Score`] with [`SemBicScore`] (linear-Gaussian BIC).
//! - [`Algorithm`] with [`Pc`] (constraint-based) and [`HillClimb`]
//!   (score-based), both knowledge-aware.
//! - [`meek`] orientation rules and DAG to CPDAG conversion.
//! - [`AlgorithmRegistry`], an explicit name -> descriptor table.
//!
//! Searches read [`Knowledge`] through a shared reference and never mutate it.

mod fisher_z;
mod hill_climb;
pub mod meek;
mod msep;
mod pc;
mod registry;
mod sem_bic;

use std::fmt;

use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::{Graph, Node};
use crate::knowledge::Knowledge;

pub use fisher_z::FisherZ;
pub use hill_climb::{HillClimb, HillClimbConfig};
pub use msep::MSepTest;
pub use pc::{Pc, PcConfig};
pub use registry::{AlgorithmDescriptor, AlgorithmFactory, AlgorithmRegistry};
pub use sem_bic::SemBicScore;

/// Outcome of one conditional independence check.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndependenceResult {
    pub independent: bool,
    pub p_value: f64,
}

/// A conditional independence test over a fixed set of variables.
pub trait IndependenceTest: Send + Sync {
    /// The variables the test can answer questions about.
    fn nodes(&self) -> &[Node];

    /// Tests `x _||_ y | z`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for unknown variables; `Numerical` when the statistic
    /// is undefined (singular conditioning set, NaN p-value, too few rows).
    fn check_independence(
        &self,
        x: &Node,
        y: &Node,
        z: &[Node],
    ) -> Result<IndependenceResult, CausalError>;
}

/// A decomposable score; higher is better.
pub trait Score: Send + Sync {
    fn nodes(&self) -> &[Node];

    /// Score contribution of `node` given `parents`.
    fn local_score(&self, node: &Node, parents: &[Node]) -> Result<f64, CausalError>;
}

/// A structure search over a data set under background knowledge.
pub trait Algorithm: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, data: &DataSet, knowledge: &Knowledge) -> Result<Graph, CausalError>;
}

/// Which independence test an algorithm builds from its data.
#[derive(Debug, Clone)]
pub enum TestChoice {
    FisherZ { alpha: f64 },
    /// Oracle answers read off `graph`; the data only has to name its nodes.
    MSep { graph: Graph },
}

impl TestChoice {
    pub fn name(&self) -> &'static str {
        match self {
            TestChoice::FisherZ { .. } => "fisher-z",
            TestChoice::MSep { .. } => "m-sep",
        }
    }

    pub fn build(&self, data: &DataSet) -> Result<Box<dyn IndependenceTest>, CausalError> {
        match self {
            TestChoice::FisherZ { alpha } => Ok(Box::new(FisherZ::new(data, *alpha)?)),
            TestChoice::MSep { graph } => Ok(Box::new(MSepTest::for_data(graph.clone(), data)?)),
        }
    }
}

impl fmt::Display for TestChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestChoice::FisherZ { alpha } => write!(f, "fisher-z(alpha={})", alpha),
            TestChoice::MSep { .. } => f.write_str("m-sep"),
        }
    }
}

/// Which score an algorithm builds from its data.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoreChoice {
    SemBic { penalty_discount: f64 },
}

impl ScoreChoice {
    pub fn name(&self) -> &'static str {
        match self {
            ScoreChoice::SemBic { .. } => "sem-bic",
        }
    }

    pub fn build(&self, data: &DataSet) -> Result<Box<dyn Score>, CausalError> {
        match self {
            ScoreChoice::SemBic { penalty_discount } => {
                Ok(Box::new(SemBicScore::new(data, *penalty_discount)?))
            }
        }
    }
}

impl fmt::Display for ScoreChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreChoice::SemBic { penalty_discount } => {
                write!(f, "sem-bic(penalty={})", penalty_discount)
            }
        }
    }
}

/// All subsets of `items` of size `k`, in lexicographic index order.
pub(crate) fn subsets_of_size<T: Clone>(items: &[T], k: usize) -> Vec<Vec<T>> {
    if k > items.len() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.iter().map(|&i| items[i].clone()).collect());
        let Some(pos) = (0..k).rev().find(|&i| idx[i] != i + items.len() - k) else {
            return out;
        };
        idx[pos] += 1;
        for j in pos + 1..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
}
