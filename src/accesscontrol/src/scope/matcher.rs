//! Scope grammar validation and wildcard matching
//!
//! A scope is a colon-separated path such as `datasources:id:7`. A pattern may
//! end in `*` when the preceding character is `:` or `/`:
//! - `datasources:id:*` (every datasource id)
//! - `folders:uid:general/*` (everything under a path)
//! - `*` (everything)

use crate::error::{AccessControlError, Result};

/// The universal wildcard scope
pub const WILDCARD: &str = "*";

/// Checks whether a granted scope pattern covers a concrete scope
///
/// Matching is case-sensitive and performs no normalization.
///
/// # Examples
///
/// ```
/// use scopegate_accesscontrol::scope::matches;
///
/// assert!(matches("datasources:id:*", "datasources:id:7"));
/// assert!(matches("datasources:id:7", "datasources:id:7"));
/// assert!(!matches("datasources:id:7", "datasources:id:70"));
/// ```
pub fn matches(pattern: &str, concrete: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) if is_wildcard_prefix(prefix) => concrete.starts_with(prefix),
        _ => pattern == concrete,
    }
}

/// Validates a scope pattern accepted from configuration
///
/// The empty scope (global action) and the lone `*` are valid. A trailing `*`
/// must follow `:` or `/`, and `*` or `?` may not appear anywhere else.
pub fn validate_scope(scope: &str) -> bool {
    let body = match scope.strip_suffix('*') {
        Some(prefix) => {
            if !is_wildcard_prefix(prefix) {
                return false;
            }
            prefix
        }
        None => scope,
    };

    !body.contains(['*', '?'])
}

/// Like [`validate_scope`], returning `InvalidScopeSyntax` on failure
pub fn ensure_valid_scope(scope: &str) -> Result<()> {
    if validate_scope(scope) {
        Ok(())
    } else {
        Err(AccessControlError::InvalidScopeSyntax(scope.to_string()))
    }
}

fn is_wildcard_prefix(prefix: &str) -> bool {
    prefix.is_empty() || prefix.ends_with(':') || prefix.ends_with('/')
}

/// Joins scope parts with `:`
///
/// `scope(&["datasources", "id", "7"])` gives `datasources:id:7`.
pub fn scope(parts: &[&str]) -> String {
    parts.join(":")
}

/// Scope covering every resource of a root, e.g. `datasources:*`
pub fn resource_all_scope(root: &str) -> String {
    scope(&[root, WILDCARD])
}

/// Scope covering every value of an attribute, e.g. `datasources:id:*`
///
/// Accepts the attribute prefix with or without its trailing colon.
pub fn resource_all_attribute_scope(attribute_prefix: &str) -> String {
    scope(&[attribute_prefix.trim_end_matches(':'), WILDCARD])
}
