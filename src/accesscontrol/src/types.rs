//! Core access control types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Organization id used for permissions assigned outside any organization
pub const GLOBAL_ORG_ID: i64 = 0;

/// Per-resource capability map, e.g. `{"datasources:read": true}`
pub type Metadata = HashMap<String, bool>;

/// A granted (action, scope) pair
///
/// An empty scope denotes a global action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// Action identifier (e.g., "datasources:read")
    pub action: String,

    /// Scope the action applies to (e.g., "datasources:id:7")
    #[serde(default)]
    pub scope: String,
}

impl Permission {
    /// Create a new permission
    pub fn new(action: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            scope: scope.into(),
        }
    }

    /// Create a permission without scope
    pub fn global(action: impl Into<String>) -> Self {
        Self::new(action, "")
    }
}

/// Granted scopes of one principal, keyed by action
///
/// Scopes keep the order in which the permissions were supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    scopes: HashMap<String, Vec<String>>,
}

impl PermissionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Group a permission list by action
    pub fn from_permissions<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Self {
        Self {
            scopes: group_scopes_by_action(permissions),
        }
    }

    /// Add a granted scope under an action
    pub fn with(mut self, action: impl Into<String>, scope: impl Into<String>) -> Self {
        self.insert(action, scope);
        self
    }

    /// Add a granted scope under an action
    pub fn insert(&mut self, action: impl Into<String>, scope: impl Into<String>) {
        self.scopes.entry(action.into()).or_default().push(scope.into());
    }

    /// Scopes granted for an action
    pub fn scopes(&self, action: &str) -> Option<&[String]> {
        self.scopes.get(action).map(Vec::as_slice)
    }

    /// Whether at least one permission carries the action
    pub fn has_action(&self, action: &str) -> bool {
        self.scopes.get(action).is_some_and(|scopes| !scopes.is_empty())
    }

    /// Actions present in the set
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Borrow the underlying action → scopes map
    pub fn as_map(&self) -> &HashMap<String, Vec<String>> {
        &self.scopes
    }

    /// Number of distinct actions
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the set holds no action
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl From<HashMap<String, Vec<String>>> for PermissionSet {
    fn from(scopes: HashMap<String, Vec<String>>) -> Self {
        Self { scopes }
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::new();
        for permission in iter {
            set.insert(permission.action, permission.scope);
        }
        set
    }
}

/// Set of actions held, whatever their scope
pub fn build_permissions_map<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> HashMap<String, bool> {
    permissions
        .into_iter()
        .map(|p| (p.action.clone(), true))
        .collect()
}

/// Groups scopes on action, preserving input order
pub fn group_scopes_by_action<'a>(
    permissions: impl IntoIterator<Item = &'a Permission>,
) -> HashMap<String, Vec<String>> {
    let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
    for p in permissions {
        grouped.entry(p.action.clone()).or_default().push(p.scope.clone());
    }
    grouped
}

/// Organization role of a signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgRole {
    Viewer,
    Editor,
    Admin,
}

impl OrgRole {
    /// Canonical role name ("Viewer", "Editor", "Admin")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Editor => "Editor",
            Self::Admin => "Admin",
        }
    }
}

/// Identity of the user an access check is performed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub user_id: i64,
    pub org_id: i64,

    #[serde(default)]
    pub org_role: Option<OrgRole>,

    #[serde(default)]
    pub is_grafana_admin: bool,

    #[serde(default)]
    pub is_signed_in: bool,
}

impl SignedInUser {
    /// Create a signed-in user in an organization
    pub fn new(user_id: i64, org_id: i64) -> Self {
        Self {
            user_id,
            org_id,
            org_role: None,
            is_grafana_admin: false,
            is_signed_in: true,
        }
    }

    /// Set the organization role
    pub fn with_org_role(mut self, role: OrgRole) -> Self {
        self.org_role = Some(role);
        self
    }

    /// Mark the user as server administrator
    pub fn with_grafana_admin(mut self) -> Self {
        self.is_grafana_admin = true;
        self
    }

    /// Copy of this user detached from any organization
    pub fn to_global(&self) -> Self {
        Self {
            org_id: GLOBAL_ORG_ID,
            org_role: None,
            ..self.clone()
        }
    }
}

/// Options for permission lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Ask the provider to bypass any cache it keeps
    #[serde(default)]
    pub reload_cache: bool,
}

/// Fixed role definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDto {
    /// Role name, must start with `fixed:`
    pub name: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl RoleDto {
    /// Create a role with no permissions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: String::new(),
            description: String::new(),
            permissions: Vec::new(),
        }
    }

    /// Add a permission
    pub fn with_permission(mut self, action: impl Into<String>, scope: impl Into<String>) -> Self {
        self.permissions.push(Permission::new(action, scope));
        self
    }
}

/// A fixed role and the built-in roles it is granted to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistration {
    pub role: RoleDto,

    /// Built-in role names ("Viewer", "Editor", "Admin", "Grafana Admin")
    #[serde(default)]
    pub grants: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_scopes_by_action() {
        let permissions = vec![
            Permission::new("datasources:read", "datasources:id:1"),
            Permission::new("datasources:write", "datasources:id:1"),
            Permission::new("datasources:read", "datasources:id:2"),
        ];

        let grouped = group_scopes_by_action(&permissions);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["datasources:read"], vec!["datasources:id:1", "datasources:id:2"]);
        assert_eq!(grouped["datasources:write"], vec!["datasources:id:1"]);
    }

    #[test]
    fn test_build_permissions_map() {
        let permissions = vec![
            Permission::new("teams:read", "teams:id:1"),
            Permission::global("users:create"),
        ];

        let map = build_permissions_map(&permissions);
        assert_eq!(map.get("teams:read"), Some(&true));
        assert_eq!(map.get("users:create"), Some(&true));
        assert!(!map.contains_key("teams:write"));
    }

    #[test]
    fn test_permission_set() {
        let set: PermissionSet = vec![
            Permission::new("ds:read", "ds:id:*"),
            Permission::global("ds:query"),
        ]
        .into_iter()
        .collect();

        assert!(set.has_action("ds:read"));
        assert!(set.has_action("ds:query"));
        assert!(!set.has_action("ds:write"));
        assert_eq!(set.scopes("ds:query"), Some(&[String::new()][..]));
    }

    #[test]
    fn test_permission_set_serde() {
        let set = PermissionSet::new().with("ds:read", "ds:id:1");
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, serde_json::json!({"ds:read": ["ds:id:1"]}));

        let back: PermissionSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_global_user_copy() {
        let user = SignedInUser::new(5, 3).with_org_role(OrgRole::Editor);
        let global = user.to_global();

        assert_eq!(global.user_id, 5);
        assert_eq!(global.org_id, GLOBAL_ORG_ID);
        assert!(global.org_role.is_none());
        assert_eq!(user.org_id, 3);
    }
}
