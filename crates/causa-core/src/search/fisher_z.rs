//! Fisher-Z partial correlation test for continuous data.

use nalgebra::DMatrix;
use rustc_hash::FxHashMap;
use statrs::distribution::{ContinuousCDF, Normal};

use super::{IndependenceResult, IndependenceTest};
use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::Node;

/// Tests `x _||_ y | z` by the Fisher transform of the partial correlation,
/// computed from the inverse of the covariance submatrix over `{x, y} ∪ z`.
///
/// The covariance is computed once at construction; each check inverts a
/// `(|z| + 2)`-square submatrix.
#[derive(Debug, Clone)]
pub struct FisherZ {
    nodes: Vec<Node>,
    index: FxHashMap<Node, usize>,
    covariance: DMatrix<f64>,
    sample_size: usize,
    alpha: f64,
    normal: Normal,
}

impl FisherZ {
    pub fn new(data: &DataSet, alpha: f64) -> Result<Self, CausalError> {
        let (covariance, sample_size) = data.covariance()?;
        Self::from_covariance(data.nodes(), covariance, sample_size, alpha)
    }

    pub fn from_covariance(
        nodes: Vec<Node>,
        covariance: DMatrix<f64>,
        sample_size: usize,
        alpha: f64,
    ) -> Result<Self, CausalError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(CausalError::invalid(format!(
                "alpha must lie in [0, 1], got {}",
                alpha
            )));
        }
        if covariance.nrows() != nodes.len() || covariance.ncols() != nodes.len() {
            return Err(CausalError::invalid(format!(
                "covariance is {}x{} for {} variables",
                covariance.nrows(),
                covariance.ncols(),
                nodes.len()
            )));
        }
        let normal = Normal::new(0.0, 1.0).map_err(|e| CausalError::Internal(e.to_string()))?;
        let index = nodes.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
        Ok(Self {
            nodes,
            index,
            covariance,
            sample_size,
            alpha,
            normal,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn position(&self, node: &Node) -> Result<usize, CausalError> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| CausalError::invalid(format!("{} is not a test variable", node)))
    }

    /// Partial correlation of `x` and `y` given `z`.
    pub fn partial_correlation(&self, x: &Node, y: &Node, z: &[Node]) -> Result<f64, CausalError> {
        let mut idx = Vec::with_capacity(z.len() + 2);
        idx.push(self.position(x)?);
        idx.push(self.position(y)?);
        for node in z {
            idx.push(self.position(node)?);
        }
        let sub = self.covariance.select_rows(&idx).select_columns(&idx);
        let precision = sub.try_inverse().ok_or_else(|| {
            CausalError::Numerical(format!(
                "singular covariance for {} _||_ {} | {:?}",
                x, y, z
            ))
        })?;
        let denom = (precision[(0, 0)] * precision[(1, 1)]).sqrt();
        Ok(-precision[(0, 1)] / denom)
    }
}

impl IndependenceTest for FisherZ {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn check_independence(
        &self,
        x: &Node,
        y: &Node,
        z: &[Node],
    ) -> Result<IndependenceResult, CausalError> {
        let dof = self.sample_size as f64 - z.len() as f64 - 3.0;
        if dof <= 0.0 {
            return Err(CausalError::Numerical(format!(
                "{} rows are too few to condition on {} variables",
                self.sample_size,
                z.len()
            )));
        }
        let r = self.partial_correlation(x, y, z)?;
        let fisher = 0.5 * dof.sqrt() * ((1.0 + r) / (1.0 - r)).ln();
        let p_value = 2.0 * (1.0 - self.normal.cdf(fisher.abs()));
        if p_value.is_nan() {
            return Err(CausalError::Numerical(format!(
                "undefined p-value for {} _||_ {} | {:?} (r = {})",
                x, y, z, r
            )));
        }
        Ok(IndependenceResult {
            independent: p_value > self.alpha,
            p_value,
        })
    }
}
