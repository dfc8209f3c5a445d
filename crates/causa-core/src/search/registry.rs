//! Name -> algorithm table with declared capabilities.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Algorithm, HillClimb, Pc, ScoreChoice, TestChoice};
use crate::errors::CausalError;

/// Builds an algorithm from the test and score the caller supplied. The
/// registry has already checked them against the descriptor.
pub type AlgorithmFactory = Arc<
    dyn Fn(Option<&TestChoice>, Option<&ScoreChoice>) -> Result<Box<dyn Algorithm>, CausalError>
        + Send
        + Sync,
>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlgorithmDescriptor {
    pub name: String,
    pub description: String,
    pub requires_test: bool,
    pub requires_score: bool,
}

#[derive(Default, Clone)]
pub struct AlgorithmRegistry {
    inner: BTreeMap<String, (AlgorithmDescriptor, AlgorithmFactory)>,
}

impl AlgorithmRegistry {
    pub fn with_builtins() -> Self {
        let mut r = AlgorithmRegistry::default();
        r.register(
            AlgorithmDescriptor {
                name: "pc".into(),
                description: "PC-stable adjacency search with collider and Meek orientation".into(),
                requires_test: true,
                requires_score: false,
            },
            Arc::new(build_pc),
        );
        r.register(
            AlgorithmDescriptor {
                name: "hill-climb".into(),
                description: "Greedy add/delete/reverse search over DAGs".into(),
                requires_test: false,
                requires_score: true,
            },
            Arc::new(build_hill_climb),
        );
        r
    }

    /// Registers (or replaces) an algorithm under `descriptor.name`.
    pub fn register(&mut self, descriptor: AlgorithmDescriptor, factory: AlgorithmFactory) {
        self.inner.insert(descriptor.name.clone(), (descriptor, factory));
    }

    pub fn descriptor(&self, name: &str) -> Option<&AlgorithmDescriptor> {
        self.inner.get(name).map(|(d, _)| d)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).collect()
    }

    /// Builds the named algorithm.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unknown name, or when a test or score the
    /// descriptor requires is missing.
    pub fn build(
        &self,
        name: &str,
        test: Option<&TestChoice>,
        score: Option<&ScoreChoice>,
    ) -> Result<Box<dyn Algorithm>, CausalError> {
        let (descriptor, factory) = self.inner.get(name).ok_or_else(|| {
            CausalError::invalid(format!(
                "unknown algorithm '{}' (known: {})",
                name,
                self.names().join(", ")
            ))
        })?;
        if descriptor.requires_test && test.is_none() {
            return Err(CausalError::invalid(format!(
                "{} needs an independence test",
                name
            )));
        }
        if descriptor.requires_score && score.is_none() {
            return Err(CausalError::invalid(format!("{} needs a score", name)));
        }
        factory(test, score)
    }
}

fn build_pc(
    test: Option<&TestChoice>,
    _score: Option<&ScoreChoice>,
) -> Result<Box<dyn Algorithm>, CausalError> {
    let test = test.ok_or_else(|| CausalError::Internal("pc built without a test".into()))?;
    Ok(Box::new(Pc::new(test.clone())))
}

fn build_hill_climb(
    _test: Option<&TestChoice>,
    score: Option<&ScoreChoice>,
) -> Result<Box<dyn Algorithm>, CausalError> {
    let score = score.ok_or_else(|| CausalError::Internal("hill-climb built without a score".into()))?;
    Ok(Box::new(HillClimb::new(*score)))
}

impl fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmRegistry")
            .field("algorithms", &self.names())
            .finish()
    }
}
