//! # Tabular data
//!
//! [`DataSet`] is a column-major table whose columns are either continuous
//! (`f64`, missing = `NaN`) or discrete (`i32` category indices, missing =
//! [`DISCRETE_MISSING`]). Each column is bound to a [`Node`] so that searches
//! can map results straight back onto graph nodes.
//!
//! Resampling only ever needs [`DataSet::select_rows`]; the statistics used by
//! the searches only need [`DataSet::covariance`].

mod interner;

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::errors::CausalError;
use crate::graph::Node;

pub use interner::CategoryInterner;

/// Missing-value marker for discrete columns.
pub const DISCRETE_MISSING: i32 = -99;

#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    Continuous,
    Discrete { categories: Arc<[String]> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub node: Node,
    pub kind: VariableKind,
}

#[derive(Debug, Clone, PartialEq)]
enum Column {
    Continuous(Vec<f64>),
    Discrete(Vec<i32>),
}

impl Column {
    fn len(&self) -> usize {
        match self {
            Column::Continuous(v) => v.len(),
            Column::Discrete(v) => v.len(),
        }
    }

    fn select(&self, rows: &[usize]) -> Column {
        match self {
            Column::Continuous(v) => Column::Continuous(rows.iter().map(|&r| v[r]).collect()),
            Column::Discrete(v) => Column::Discrete(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSet {
    variables: Vec<Variable>,
    columns: Vec<Column>,
    num_rows: usize,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A continuous data set from column-major values.
    pub fn continuous(nodes: Vec<Node>, columns: Vec<Vec<f64>>) -> Result<Self, CausalError> {
        if nodes.len() != columns.len() {
            return Err(CausalError::invalid(format!(
                "{} variables but {} columns",
                nodes.len(),
                columns.len()
            )));
        }
        let mut data = Self::new();
        for (node, values) in nodes.into_iter().zip(columns) {
            data.add_continuous_column(node, values)?;
        }
        Ok(data)
    }

    /// A continuous data set from an `rows x variables` matrix.
    pub fn from_matrix(nodes: Vec<Node>, matrix: &DMatrix<f64>) -> Result<Self, CausalError> {
        let columns = matrix
            .column_iter()
            .map(|column| column.iter().copied().collect())
            .collect();
        Self::continuous(nodes, columns)
    }

    pub fn add_continuous_column(&mut self, node: Node, values: Vec<f64>) -> Result<(), CausalError> {
        self.push_column(node, VariableKind::Continuous, Column::Continuous(values))
    }

    /// Adds a discrete column. Values are indices into `categories`, or
    /// [`DISCRETE_MISSING`].
    pub fn add_discrete_column(
        &mut self,
        node: Node,
        categories: &[String],
        values: Vec<i32>,
        interner: &CategoryInterner,
    ) -> Result<(), CausalError> {
        let bound = categories.len() as i32;
        if let Some(bad) = values
            .iter()
            .find(|&&v| v != DISCRETE_MISSING && !(0..bound).contains(&v))
        {
            return Err(CausalError::invalid(format!(
                "value {} of {} is not a category index (0..{})",
                bad, node, bound
            )));
        }
        let kind = VariableKind::Discrete {
            categories: interner.intern(categories),
        };
        self.push_column(node, kind, Column::Discrete(values))
    }

    fn push_column(&mut self, node: Node, kind: VariableKind, column: Column) -> Result<(), CausalError> {
        if self.column_index(node.name()).is_some() {
            return Err(CausalError::invalid(format!("duplicate variable {}", node)));
        }
        if !self.columns.is_empty() && column.len() != self.num_rows {
            return Err(CausalError::invalid(format!(
                "column {} has {} rows, expected {}",
                node,
                column.len(),
                self.num_rows
            )));
        }
        self.num_rows = column.len();
        self.variables.push(Variable { node, kind });
        self.columns.push(column);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.variables.iter().map(|v| v.node.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.node.name() == name)
    }

    pub fn is_continuous(&self) -> bool {
        self.columns.iter().all(|c| matches!(c, Column::Continuous(_)))
    }

    pub fn continuous_column(&self, index: usize) -> Option<&[f64]> {
        match self.columns.get(index)? {
            Column::Continuous(v) => Some(v),
            Column::Discrete(_) => None,
        }
    }

    pub fn discrete_column(&self, index: usize) -> Option<&[i32]> {
        match self.columns.get(index)? {
            Column::Discrete(v) => Some(v),
            Column::Continuous(_) => None,
        }
    }

    /// True if any cell holds a missing-value marker.
    pub fn has_missing(&self) -> bool {
        self.columns.iter().any(|c| match c {
            Column::Continuous(v) => v.iter().any(|x| x.is_nan()),
            Column::Discrete(v) => v.contains(&DISCRETE_MISSING),
        })
    }

    /// A new data set holding the given rows, in the given order. Rows may
    /// repeat (bootstrap draws).
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a row index is out of range.
    pub fn select_rows(&self, rows: &[usize]) -> Result<DataSet, CausalError> {
        if let Some(&bad) = rows.iter().find(|&&r| r >= self.num_rows) {
            return Err(CausalError::invalid(format!(
                "row {} out of range ({} rows)",
                bad, self.num_rows
            )));
        }
        Ok(DataSet {
            variables: self.variables.clone(),
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            num_rows: rows.len(),
        })
    }

    /// The data as a `rows x variables` matrix, dropping rows with a missing
    /// value.
    ///
    /// # Errors
    ///
    /// `Unsupported` if any column is discrete.
    pub fn to_matrix(&self) -> Result<DMatrix<f64>, CausalError> {
        let columns = self
            .columns
            .iter()
            .zip(&self.variables)
            .map(|(c, v)| match c {
                Column::Continuous(values) => Ok(values.as_slice()),
                Column::Discrete(_) => Err(CausalError::Unsupported(format!(
                    "{} is discrete; a continuous matrix is required",
                    v.node
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let complete: Vec<usize> = (0..self.num_rows)
            .filter(|&r| columns.iter().all(|c| !c[r].is_nan()))
            .collect();
        Ok(DMatrix::from_fn(complete.len(), columns.len(), |r, c| {
            columns[c][complete[r]]
        }))
    }

    /// Sample covariance matrix (denominator `n - 1`) over complete rows,
    /// together with the number of rows used.
    ///
    /// # Errors
    ///
    /// `Unsupported` for discrete columns; `Numerical` with fewer than two
    /// complete rows.
    pub fn covariance(&self) -> Result<(DMatrix<f64>, usize), CausalError> {
        let matrix = self.to_matrix()?;
        let n = matrix.nrows();
        if n < 2 {
            return Err(CausalError::Numerical(format!(
                "covariance needs at least 2 complete rows, found {}",
                n
            )));
        }
        let means = matrix.row_mean();
        let centered = DMatrix::from_fn(n, matrix.ncols(), |r, c| matrix[(r, c)] - means[c]);
        let cov = (centered.transpose() * &centered) / (n as f64 - 1.0);
        Ok((cov, n))
    }
}
