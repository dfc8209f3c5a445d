//! # Background knowledge
//!
//! [`Knowledge`] constrains which directed edges a search may produce:
//!
//! - **Tiers**: an ordered partition of the variables. An edge from tier `j`
//!   into an earlier tier `i < j` is forbidden (the future cannot cause the
//!   past). A tier may additionally forbid edges among its own members, or
//!   allow edges only into the next tier.
//! - **Rules**: explicit forbidden and required rules, each an ordered pair of
//!   variable sets expanded from names or `*` wildcard patterns.
//! - **Groups**: typed from-set/to-set pairs, the older way of writing rules.
//!
//! Required always wins: [`Knowledge::is_forbidden`] is false for any pair
//! that is required.
//!
//! Wildcards expand against the variables known *at call time*. A variable
//! added later is not picked up by a pattern registered earlier.
//!
//! Knowledge is built with `&mut self` methods during configuration and
//! queried through `&self` during a search; searches take `&Knowledge`, so it
//! cannot change mid-run. Parallel workers receive their own clone.

mod graph_view;
mod group;
mod wildcard;

use std::collections::BTreeSet;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::errors::CausalError;
use crate::graph::Graph;

pub use graph_view::{KnowledgeEdgeKind, KnowledgeGraph};
pub use group::{GroupKind, KnowledgeGroup};

/// Highest number of tiers a [`Knowledge`] may hold.
pub const MAX_TIERS: usize = 1 << 16;

/// One temporal tier.
#[derive(Debug, Clone, Default, PartialEq)]
struct Tier {
    members: BTreeSet<String>,
    forbidden_within: bool,
    only_next_tier: bool,
}

/// An ordered (from-set, to-set) rule.
#[derive(Debug, Clone, PartialEq)]
struct Rule {
    from: BTreeSet<String>,
    to: BTreeSet<String>,
}

impl Rule {
    fn covers(&self, from: &str, to: &str) -> bool {
        self.from.contains(from) && self.to.contains(to)
    }
}

/// Background knowledge over a set of named variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Knowledge {
    variables: BTreeSet<String>,
    tiers: Vec<Tier>,
    forbidden: Vec<Rule>,
    required: Vec<Rule>,
    groups: Vec<KnowledgeGroup>,
    /// Variable name -> tier position; rebuilt whenever tiers change.
    tier_index: FxHashMap<String, usize>,
}

impl Knowledge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates knowledge over the given variable names.
    pub fn with_variables<I, S>(names: I) -> Result<Self, CausalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut knowledge = Self::new();
        for name in names {
            knowledge.add_variable(name.as_ref())?;
        }
        Ok(knowledge)
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Adds a variable to the universe. Returns false if already present.
    pub fn add_variable(&mut self, name: &str) -> Result<bool, CausalError> {
        wildcard::validate_name(name)?;
        Ok(self.variables.insert(name.to_string()))
    }

    /// Removes a variable from the universe, its tier, every rule and every
    /// group.
    pub fn remove_variable(&mut self, name: &str) -> bool {
        if !self.variables.remove(name) {
            return false;
        }
        for tier in &mut self.tiers {
            tier.members.remove(name);
        }
        for rule in self.forbidden.iter_mut().chain(self.required.iter_mut()) {
            rule.from.remove(name);
            rule.to.remove(name);
        }
        self.forbidden.retain(|r| !r.from.is_empty() && !r.to.is_empty());
        self.required.retain(|r| !r.from.is_empty() && !r.to.is_empty());
        for group in &mut self.groups {
            group.remove_variable(name);
        }
        self.groups.retain(|g| !g.from().is_empty() && !g.to().is_empty());
        self.reindex_tiers();
        true
    }

    pub fn variables(&self) -> Vec<&str> {
        self.variables.iter().map(String::as_str).collect()
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    /// True if no tier has members and there are no rules or groups.
    pub fn is_empty(&self) -> bool {
        self.tiers.iter().all(|t| t.members.is_empty())
            && self.forbidden.is_empty()
            && self.required.is_empty()
            && self.groups.is_empty()
    }

    /// Drops all tiers, rules and groups; the variable universe is kept.
    pub fn clear(&mut self) {
        self.tiers.clear();
        self.forbidden.clear();
        self.required.clear();
        self.groups.clear();
        self.tier_index.clear();
    }

    /// Expands a name or pattern. Literal names are validated and, when
    /// `register` is set, added to the universe.
    fn extent(&mut self, spec: &str, register: bool) -> Result<BTreeSet<String>, CausalError> {
        if wildcard::is_pattern(spec) {
            wildcard::validate_spec(spec)?;
            return Ok(wildcard::expand(spec, &self.variables));
        }
        wildcard::validate_name(spec)?;
        if register {
            self.variables.insert(spec.to_string());
        }
        Ok(BTreeSet::from([spec.to_string()]))
    }

    // ------------------------------------------------------------------
    // Tiers
    // ------------------------------------------------------------------

    /// Places every variable matching `spec` into `tier`, creating empty tiers
    /// up to `tier` as needed. A variable moves out of any tier it was in.
    pub fn add_to_tier(&mut self, tier: usize, spec: &str) -> Result<(), CausalError> {
        self.check_tier(tier)?;
        let extent = self.extent(spec, true)?;
        self.ensure_tiers(tier);
        for name in extent {
            for t in &mut self.tiers {
                t.members.remove(&name);
            }
            self.tiers[tier].members.insert(name);
        }
        self.reindex_tiers();
        Ok(())
    }

    /// Replaces the contents of `tier` with the expansions of `specs`. On
    /// error nothing changes.
    pub fn set_tier<S: AsRef<str>>(&mut self, tier: usize, specs: &[S]) -> Result<(), CausalError> {
        self.check_tier(tier)?;
        let mut variables = self.variables.clone();
        let mut members = BTreeSet::new();
        for spec in specs {
            let spec = spec.as_ref();
            if wildcard::is_pattern(spec) {
                wildcard::validate_spec(spec)?;
                members.extend(wildcard::expand(spec, &variables));
            } else {
                wildcard::validate_name(spec)?;
                variables.insert(spec.to_string());
                members.insert(spec.to_string());
            }
        }

        self.variables = variables;
        self.ensure_tiers(tier);
        for (i, t) in self.tiers.iter_mut().enumerate() {
            if i == tier {
                t.members.clear();
            } else {
                t.members.retain(|name| !members.contains(name));
            }
        }
        self.tiers[tier].members = members;
        self.reindex_tiers();
        Ok(())
    }

    /// Removes the variables matching `spec` from `tier`.
    pub fn remove_from_tier(&mut self, tier: usize, spec: &str) -> Result<(), CausalError> {
        let extent = self.extent(spec, false)?;
        if let Some(t) = self.tiers.get_mut(tier) {
            for name in &extent {
                t.members.remove(name);
            }
        }
        self.reindex_tiers();
        Ok(())
    }

    /// Removes `name` from whichever tier holds it.
    pub fn remove_from_tiers(&mut self, name: &str) {
        for tier in &mut self.tiers {
            tier.members.remove(name);
        }
        self.reindex_tiers();
    }

    /// Deletes a tier; later tiers shift down by one.
    pub fn remove_tier(&mut self, tier: usize) -> Result<(), CausalError> {
        if tier >= self.tiers.len() {
            return Err(CausalError::invalid(format!(
                "tier {} does not exist ({} tiers)",
                tier,
                self.tiers.len()
            )));
        }
        self.tiers.remove(tier);
        self.reindex_tiers();
        Ok(())
    }

    /// Members of `tier` in name order; empty if the tier does not exist.
    pub fn tier(&self, tier: usize) -> Vec<&str> {
        self.tiers
            .get(tier)
            .map(|t| t.members.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn num_tiers(&self) -> usize {
        self.tiers.len()
    }

    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tier_index.get(name).copied()
    }

    pub fn set_tier_forbidden_within(&mut self, tier: usize, forbidden: bool) -> Result<(), CausalError> {
        self.check_tier(tier)?;
        self.ensure_tiers(tier);
        self.tiers[tier].forbidden_within = forbidden;
        Ok(())
    }

    pub fn is_tier_forbidden_within(&self, tier: usize) -> bool {
        self.tiers.get(tier).is_some_and(|t| t.forbidden_within)
    }

    /// Restricts `tier` so its members may only cause members of the next
    /// tier (or of their own tier).
    pub fn set_only_can_cause_next_tier(&mut self, tier: usize, only_next: bool) -> Result<(), CausalError> {
        self.check_tier(tier)?;
        self.ensure_tiers(tier);
        self.tiers[tier].only_next_tier = only_next;
        Ok(())
    }

    pub fn is_only_can_cause_next_tier(&self, tier: usize) -> bool {
        self.tiers.get(tier).is_some_and(|t| t.only_next_tier)
    }

    fn check_tier(&self, tier: usize) -> Result<(), CausalError> {
        if tier >= MAX_TIERS {
            return Err(CausalError::invalid(format!(
                "tier index {} exceeds the limit of {} tiers",
                tier, MAX_TIERS
            )));
        }
        Ok(())
    }

    fn ensure_tiers(&mut self, tier: usize) {
        if self.tiers.len() <= tier {
            self.tiers.resize_with(tier + 1, Tier::default);
        }
    }

    fn reindex_tiers(&mut self) {
        self.tier_index.clear();
        for (i, tier) in self.tiers.iter().enumerate() {
            for name in &tier.members {
                self.tier_index.insert(name.clone(), i);
            }
        }
    }

    /// True if a tier rule forbids `from --> to`.
    pub fn is_forbidden_by_tiers(&self, from: &str, to: &str) -> bool {
        let (Some(i), Some(j)) = (self.tier_of(from), self.tier_of(to)) else {
            return false;
        };
        if i > j {
            return true;
        }
        if i == j {
            return self.tiers[i].forbidden_within;
        }
        self.tiers[i].only_next_tier && j > i + 1
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Forbids every edge from a variable matching `from` to one matching
    /// `to`. Registering the same rule twice has no effect.
    pub fn set_forbidden(&mut self, from: &str, to: &str) -> Result<(), CausalError> {
        if from == to && !wildcard::is_pattern(from) {
            return Err(CausalError::invalid(format!(
                "cannot forbid the self edge {} --> {}",
                from, to
            )));
        }
        let rule = Rule {
            from: self.extent(from, true)?,
            to: self.extent(to, true)?,
        };
        if !self.forbidden.contains(&rule) {
            self.forbidden.push(rule);
        }
        Ok(())
    }

    /// Removes a forbidden rule registered with the same expansion.
    pub fn remove_forbidden(&mut self, from: &str, to: &str) -> Result<bool, CausalError> {
        let rule = Rule {
            from: self.extent(from, false)?,
            to: self.extent(to, false)?,
        };
        let before = self.forbidden.len();
        self.forbidden.retain(|r| *r != rule);
        Ok(self.forbidden.len() != before)
    }

    /// Requires every edge from a variable matching `from` to one matching
    /// `to`. Registering the same rule twice has no effect.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the from and to expansions overlap, or if any of
    /// the new pairs is already required in the opposite direction.
    pub fn set_required(&mut self, from: &str, to: &str) -> Result<(), CausalError> {
        let rule = Rule {
            from: self.extent(from, true)?,
            to: self.extent(to, true)?,
        };
        if let Some(shared) = rule.from.intersection(&rule.to).next() {
            return Err(CausalError::invalid(format!(
                "required rule {} --> {} would require the self edge {} --> {}",
                from, to, shared, shared
            )));
        }
        for a in &rule.from {
            for b in &rule.to {
                if self.is_required(b, a) {
                    return Err(CausalError::invalid(format!(
                        "cannot require {} --> {}: {} --> {} is already required",
                        a, b, b, a
                    )));
                }
            }
        }
        if !self.required.contains(&rule) {
            self.required.push(rule);
        }
        Ok(())
    }

    /// Removes a required rule registered with the same expansion.
    pub fn remove_required(&mut self, from: &str, to: &str) -> Result<bool, CausalError> {
        let rule = Rule {
            from: self.extent(from, false)?,
            to: self.extent(to, false)?,
        };
        let before = self.required.len();
        self.required.retain(|r| *r != rule);
        Ok(self.required.len() != before)
    }

    /// True if `from --> to` is not required and is forbidden by an explicit
    /// rule, a tier rule or a forbidden group.
    pub fn is_forbidden(&self, from: &str, to: &str) -> bool {
        if self.is_required(from, to) {
            return false;
        }
        self.is_explicitly_forbidden(from, to)
            || self.is_forbidden_by_tiers(from, to)
            || self.is_forbidden_by_groups(from, to)
    }

    /// True if an explicit forbidden rule covers `from --> to`.
    pub fn is_explicitly_forbidden(&self, from: &str, to: &str) -> bool {
        self.forbidden.iter().any(|r| r.covers(from, to))
    }

    /// True if an explicit required rule or a required group covers
    /// `from --> to`.
    pub fn is_required(&self, from: &str, to: &str) -> bool {
        self.required.iter().any(|r| r.covers(from, to)) || self.is_required_by_groups(from, to)
    }

    pub fn is_forbidden_by_groups(&self, from: &str, to: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.kind() == GroupKind::Forbidden && g.covers(from, to))
    }

    pub fn is_required_by_groups(&self, from: &str, to: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.kind() == GroupKind::Required && g.covers(from, to))
    }

    /// True if neither `a --> b` nor `b --> a` is required.
    pub fn no_edge_required(&self, a: &str, b: &str) -> bool {
        !self.is_required(a, b) && !self.is_required(b, a)
    }

    /// Every `(from, to)` pair forbidden by an explicit rule or a forbidden
    /// group and not overridden by a requirement. Tier rules are not listed.
    pub fn forbidden_edges(&self) -> Vec<(String, String)> {
        let explicit = self.forbidden.iter().map(|r| (&r.from, &r.to));
        let grouped = self
            .groups
            .iter()
            .filter(|g| g.kind() == GroupKind::Forbidden)
            .map(|g| (g.from(), g.to()));
        let mut pairs = expand_pairs(explicit.chain(grouped));
        pairs.retain(|(a, b)| !self.is_required(a, b));
        pairs
    }

    /// Every `(from, to)` pair required by an explicit rule or a required
    /// group.
    pub fn required_edges(&self) -> Vec<(String, String)> {
        let explicit = self.required.iter().map(|r| (&r.from, &r.to));
        let grouped = self
            .groups
            .iter()
            .filter(|g| g.kind() == GroupKind::Required)
            .map(|g| (g.from(), g.to()));
        expand_pairs(explicit.chain(grouped))
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Appends a knowledge group; its variables join the universe.
    pub fn add_knowledge_group(&mut self, group: KnowledgeGroup) -> Result<(), CausalError> {
        for name in group.from().iter().chain(group.to().iter()) {
            self.add_variable(name)?;
        }
        self.groups.push(group);
        Ok(())
    }

    /// Replaces the group at `index`.
    pub fn set_knowledge_group(
        &mut self,
        index: usize,
        group: KnowledgeGroup,
    ) -> Result<(), CausalError> {
        if index >= self.groups.len() {
            return Err(CausalError::invalid(format!(
                "knowledge group {} does not exist",
                index
            )));
        }
        for name in group.from().iter().chain(group.to().iter()) {
            self.add_variable(name)?;
        }
        self.groups[index] = group;
        Ok(())
    }

    pub fn remove_knowledge_group(&mut self, index: usize) -> Option<KnowledgeGroup> {
        (index < self.groups.len()).then(|| self.groups.remove(index))
    }

    pub fn knowledge_groups(&self) -> &[KnowledgeGroup] {
        &self.groups
    }

    // ------------------------------------------------------------------
    // Graph checks
    // ------------------------------------------------------------------

    /// True if some directed edge `tail --> head` of `graph` is forbidden.
    pub fn is_violated_by(&self, graph: &Graph) -> bool {
        graph.edges().iter().any(|edge| {
            edge.tail_and_head()
                .is_some_and(|(tail, head)| self.is_forbidden(tail.name(), head.name()))
        })
    }
}

fn expand_pairs<'a, I>(rules: I) -> Vec<(String, String)>
where
    I: Iterator<Item = (&'a BTreeSet<String>, &'a BTreeSet<String>)>,
{
    let mut pairs = BTreeSet::new();
    for (from, to) in rules {
        for a in from {
            for b in to {
                if a != b {
                    pairs.insert((a.clone(), b.clone()));
                }
            }
        }
    }
    pairs.into_iter().collect()
}

impl fmt::Display for Knowledge {
    /// Renders the `/knowledge` text block: tiers (numbered from 1, `*` for
    /// forbidden-within, `-` for next-tier-only), then groups, then explicit
    /// rules.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/knowledge")?;
        writeln!(f, "addtemporal")?;
        writeln!(f)?;
        for (i, tier) in self.tiers.iter().enumerate() {
            let mut label = (i + 1).to_string();
            if tier.forbidden_within {
                label.push('*');
            }
            if tier.only_next_tier {
                label.push('-');
            }
            let members: Vec<&str> = tier.members.iter().map(String::as_str).collect();
            if members.is_empty() {
                writeln!(f, "{}", label)?;
            } else {
                writeln!(f, "{} {}", label, members.join(" "))?;
            }
        }

        for (title, kind) in [
            ("forbiddengroup", GroupKind::Forbidden),
            ("requiredgroup", GroupKind::Required),
        ] {
            writeln!(f)?;
            writeln!(f, "{}", title)?;
            for group in self.groups.iter().filter(|g| g.kind() == kind) {
                writeln!(f, "{}", group)?;
            }
        }

        for (title, rules) in [
            ("forbiddirect", &self.forbidden),
            ("requiredirect", &self.required),
        ] {
            writeln!(f)?;
            writeln!(f, "{}", title)?;
            for (a, b) in expand_pairs(rules.iter().map(|r| (&r.from, &r.to))) {
                writeln!(f, "{} {}", a, b)?;
            }
        }
        Ok(())
    }
}
