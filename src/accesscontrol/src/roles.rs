//! Managed role naming
//!
//! Managed roles hold the permissions granted directly to a user, a team or a
//! built-in role. Their names double as storage keys, so they are derived
//! deterministically from the subject.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every managed role
pub const MANAGED_ROLE_PREFIX: &str = "managed:";

/// Prefix required for fixed roles
pub const FIXED_ROLE_PREFIX: &str = "fixed:";

/// Kind of subject a managed role belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Users,
    Teams,
    Builtins,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Teams => "teams",
            Self::Builtins => "builtins",
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Managed role name, `managed:<kind>:<id>:permissions`
///
/// Built-in role names are case-insensitive and lower-cased.
///
/// # Examples
///
/// ```
/// use scopegate_accesscontrol::roles::{managed_role_name, SubjectKind};
///
/// assert_eq!(managed_role_name(SubjectKind::Teams, "5"), "managed:teams:5:permissions");
/// assert_eq!(
///     managed_role_name(SubjectKind::Builtins, "Editor"),
///     managed_role_name(SubjectKind::Builtins, "editor"),
/// );
/// ```
pub fn managed_role_name(kind: SubjectKind, id: &str) -> String {
    let id = match kind {
        SubjectKind::Builtins => id.to_lowercase(),
        SubjectKind::Users | SubjectKind::Teams => id.to_string(),
    };
    format!("{}{}:{}:permissions", MANAGED_ROLE_PREFIX, kind, id)
}

pub fn managed_user_role_name(user_id: i64) -> String {
    managed_role_name(SubjectKind::Users, &user_id.to_string())
}

pub fn managed_team_role_name(team_id: i64) -> String {
    managed_role_name(SubjectKind::Teams, &team_id.to_string())
}

pub fn managed_builtin_role_name(builtin_role: &str) -> String {
    managed_role_name(SubjectKind::Builtins, builtin_role)
}
