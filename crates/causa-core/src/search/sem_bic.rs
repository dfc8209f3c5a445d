//! Linear-Gaussian BIC score.

use nalgebra::{Cholesky, DMatrix};
use rustc_hash::FxHashMap;

use super::Score;
use crate::data::DataSet;
use crate::errors::CausalError;
use crate::graph::Node;

/// `-n ln(σ²) - c k ln(n)`, where `σ²` is the residual variance of a node
/// regressed on its `k` parents and `c` is the penalty discount.
#[derive(Debug, Clone)]
pub struct SemBicScore {
    nodes: Vec<Node>,
    index: FxHashMap<Node, usize>,
    covariance: DMatrix<f64>,
    sample_size: usize,
    penalty_discount: f64,
}

impl SemBicScore {
    pub fn new(data: &DataSet, penalty_discount: f64) -> Result<Self, CausalError> {
        if penalty_discount < 0.0 {
            return Err(CausalError::invalid(format!(
                "penalty discount must be non-negative, got {}",
                penalty_discount
            )));
        }
        let (covariance, sample_size) = data.covariance()?;
        let nodes = data.nodes();
        let index = nodes.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
        Ok(Self {
            nodes,
            index,
            covariance,
            sample_size,
            penalty_discount,
        })
    }

    pub fn penalty_discount(&self) -> f64 {
        self.penalty_discount
    }

    fn position(&self, node: &Node) -> Result<usize, CausalError> {
        self.index
            .get(node)
            .copied()
            .ok_or_else(|| CausalError::invalid(format!("{} is not a score variable", node)))
    }

    /// Residual variance of `node` given `parents`.
    pub fn residual_variance(&self, node: &Node, parents: &[Node]) -> Result<f64, CausalError> {
        let y = self.position(node)?;
        let variance = self.covariance[(y, y)];
        if parents.is_empty() {
            return Ok(variance);
        }
        let p = parents
            .iter()
            .map(|n| self.position(n))
            .collect::<Result<Vec<_>, _>>()?;
        let c_pp = self.covariance.select_rows(&p).select_columns(&p);
        let c_py = self.covariance.select_rows(&p).select_columns(&[y]);
        let chol = Cholesky::new(c_pp).ok_or_else(|| {
            CausalError::Numerical(format!("singular regression of {} on {:?}", node, parents))
        })?;
        let beta = chol.solve(&c_py);
        Ok(variance - (c_py.transpose() * beta)[(0, 0)])
    }
}

impl Score for SemBicScore {
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn local_score(&self, node: &Node, parents: &[Node]) -> Result<f64, CausalError> {
        let sigma2 = self.residual_variance(node, parents)?;
        if sigma2.is_nan() || sigma2 <= 0.0 {
            return Err(CausalError::Numerical(format!(
                "non-positive residual variance {} for {}",
                sigma2, node
            )));
        }
        let n = self.sample_size as f64;
        Ok(-n * sigma2.ln() - self.penalty_discount * parents.len() as f64 * n.ln())
    }
}
