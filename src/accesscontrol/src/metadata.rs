//! Per-resource capability metadata for list responses
//!
//! Given a user's scopes grouped by action and the ids of the resources on the
//! current page, computes which actions the user holds on each resource.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{AccessControlError, Result};
use crate::scope::{resource_all_attribute_scope, resource_all_scope, WILDCARD};
use crate::types::Metadata;

/// Root and attribute prefixes of a metadata scope prefix
///
/// `datasources:id:` splits into `datasources:` and `datasources:id:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePrefixes {
    pub root: String,
    pub attribute: String,
}

/// Splits a `root:attribute:` prefix, or `None` if it is not two segments
pub fn extract_prefixes(prefix: &str) -> Option<ScopePrefixes> {
    let trimmed = prefix.strip_suffix(':').unwrap_or(prefix);
    let mut parts = trimmed.split(':');

    match (parts.next(), parts.next(), parts.next()) {
        (Some(root), Some(attribute), None) => {
            let root = format!("{}:", root);
            let attribute = format!("{}{}:", root, attribute);
            Some(ScopePrefixes { root, attribute })
        }
        _ => None,
    }
}

/// Like [`extract_prefixes`], returning `MalformedPrefix` on failure
pub fn ensure_valid_prefix(prefix: &str) -> Result<ScopePrefixes> {
    extract_prefixes(prefix).ok_or_else(|| AccessControlError::MalformedPrefix(prefix.to_string()))
}

/// Computes, for each resource id, the actions granted on it
///
/// A scope of `*`, `<root>:*` or `<root>:<attribute>:*` grants its action on
/// every id. Any other scope grants its action on the id following the
/// attribute prefix when that id is part of `resource_ids`; scopes naming
/// other resources are ignored.
///
/// Ids without any granted action are absent from the result. A prefix that
/// is not `<root>:<attribute>:` yields an empty result.
///
/// # Examples
///
/// ```
/// use scopegate_accesscontrol::metadata::get_resources_metadata;
/// use std::collections::{HashMap, HashSet};
///
/// let permissions = HashMap::from([(
///     "datasources:read".to_string(),
///     vec!["datasources:id:1".to_string()],
/// )]);
/// let ids: HashSet<String> = ["1", "2"].into_iter().map(String::from).collect();
///
/// let metadata = get_resources_metadata(&permissions, "datasources:id:", &ids);
/// assert_eq!(metadata["1"]["datasources:read"], true);
/// assert!(!metadata.contains_key("2"));
/// ```
pub fn get_resources_metadata(
    permissions: &HashMap<String, Vec<String>>,
    prefix: &str,
    resource_ids: &HashSet<String>,
) -> HashMap<String, Metadata> {
    let Some(prefixes) = extract_prefixes(prefix) else {
        debug!(prefix = %prefix, "Malformed metadata scope prefix, skipping metadata");
        return HashMap::new();
    };

    let all_scope = resource_all_scope(prefixes.root.trim_end_matches(':'));
    let all_attribute_scope = resource_all_attribute_scope(&prefixes.attribute);

    let mut result: HashMap<String, Metadata> = HashMap::new();

    for (action, scopes) in permissions {
        for scope in scopes {
            if scope == WILDCARD || *scope == all_scope || *scope == all_attribute_scope {
                for id in resource_ids {
                    add_action(&mut result, action, id);
                }
            } else if let Some(id) = scope.strip_prefix(prefixes.attribute.as_str()) {
                if !id.is_empty() && resource_ids.contains(id) {
                    add_action(&mut result, action, id);
                }
            }
        }
    }

    result
}

fn add_action(result: &mut HashMap<String, Metadata>, action: &str, id: &str) {
    match result.get_mut(id) {
        Some(metadata) => {
            metadata.insert(action.to_string(), true);
        }
        None => {
            result.insert(id.to_string(), Metadata::from([(action.to_string(), true)]));
        }
    }
}
