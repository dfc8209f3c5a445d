//! Legacy knowledge groups: typed from-set/to-set pairs.

use std::collections::BTreeSet;
use std::fmt;

use crate::errors::CausalError;

use super::wildcard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupKind {
    Forbidden,
    Required,
}

/// Every edge from a member of `from` to a member of `to` is forbidden or
/// required, depending on `kind`.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeGroup {
    kind: GroupKind,
    from: BTreeSet<String>,
    to: BTreeSet<String>,
}

impl KnowledgeGroup {
    /// # Errors
    ///
    /// `InvalidArgument` if a name is illegal or the two sets share a member.
    pub fn new<F, T, S>(kind: GroupKind, from: F, to: T) -> Result<Self, CausalError>
    where
        F: IntoIterator<Item = S>,
        T: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let from = collect_names(from)?;
        let to = collect_names(to)?;
        if let Some(shared) = from.intersection(&to).next() {
            return Err(CausalError::invalid(format!(
                "knowledge group lists '{}' on both sides",
                shared
            )));
        }
        Ok(Self { kind, from, to })
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn from(&self) -> &BTreeSet<String> {
        &self.from
    }

    pub fn to(&self) -> &BTreeSet<String> {
        &self.to
    }

    pub fn covers(&self, from: &str, to: &str) -> bool {
        self.from.contains(from) && self.to.contains(to)
    }

    pub(crate) fn remove_variable(&mut self, name: &str) {
        self.from.remove(name);
        self.to.remove(name);
    }
}

fn collect_names<I, S>(names: I) -> Result<BTreeSet<String>, CausalError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            let name = name.as_ref();
            wildcard::validate_name(name)?;
            Ok(name.to_string())
        })
        .collect()
}

impl fmt::Display for KnowledgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(" ");
        write!(f, "{} --> {}", join(&self.from), join(&self.to))
    }
}
