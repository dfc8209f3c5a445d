//! # Causa Core
//!
//! Graph model, path queries, background knowledge and resampling for causal
//! discovery, plus the searches, tests, simulations and statistics that
//! exercise them.
//!
//! ## Layout
//!
//! - [`graph`]: typed-endpoint multigraph and the [`graph::Paths`] query view
//! - [`knowledge`]: tiers, forbidden/required rules, wildcards, groups
//! - [`data`]: in-memory data sets
//! - [`search`]: independence tests, scores, PC, hill climbing, registry
//! - [`simulation`]: random DAGs and linear SEM data
//! - [`resampling`]: bootstrap/subsample searches, aggregation, stability
//! - [`metrics`]: comparison statistics
//! - [`layout`]: tier and causal-order layouts
//!
//! ## Feature gating
//!
//! - `parallel` (default): rayon for resampling, stability selection and
//!   statistic evaluation
//! - `serde`: serialization of configs, enums and results

pub mod data;
pub mod errors;
pub mod graph;
pub mod knowledge;
pub mod layout;
pub mod metrics;
pub mod resampling;
pub mod search;
pub mod simulation;

// Re-export commonly used types
pub use data::{CategoryInterner, DataSet};
pub use errors::CausalError;
pub use graph::{Edge, EdgeKind, Endpoint, Graph, Node, NodeType, Paths};
pub use knowledge::{Knowledge, KnowledgeGraph};
pub use resampling::{EdgeEnsemble, ResamplingConfig, ResamplingMethod, ResamplingSearch};
pub use search::{Algorithm, AlgorithmRegistry, IndependenceTest, Score};
