//! Variable-name validation and `*` wildcard expansion.

use std::collections::BTreeSet;

use crate::errors::CausalError;

/// Characters allowed in a variable name: letters, digits, `:`, `_`, `-`, `.`.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-' | '.')
}

pub(crate) fn validate_name(name: &str) -> Result<(), CausalError> {
    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(CausalError::invalid(format!(
            "'{}' is not a legal variable name (use letters, digits, ':', '_', '-', '.')",
            name
        )));
    }
    Ok(())
}

pub(crate) fn is_pattern(spec: &str) -> bool {
    spec.contains('*')
}

pub(crate) fn validate_spec(spec: &str) -> Result<(), CausalError> {
    if spec.is_empty() || !spec.chars().all(|c| c == '*' || is_name_char(c)) {
        return Err(CausalError::invalid(format!(
            "'{}' is not a legal variable name or wildcard pattern",
            spec
        )));
    }
    Ok(())
}

/// Glob match where `*` stands for any (possibly empty) run of name
/// characters.
pub(crate) fn matches(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = name.chars().collect();
    let (mut pi, mut si) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while si < s.len() {
        if pi < p.len() && p[pi] == '*' {
            backtrack = Some((pi, si));
            pi += 1;
        } else if pi < p.len() && p[pi] == s[si] {
            pi += 1;
            si += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            si = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '*')
}

/// Variables of `universe` matched by `pattern`.
pub(crate) fn expand(pattern: &str, universe: &BTreeSet<String>) -> BTreeSet<String> {
    universe
        .iter()
        .filter(|name| matches(pattern, name))
        .cloned()
        .collect()
}
