//! # Scopegate Access Control
//!
//! Attribute-scoped permission evaluation.
//!
//! ## Features
//!
//! - **Scope matching** with trailing `:*` / `/*` wildcards and strict validation
//! - **Attribute scope resolvers** expanding named scopes into canonical ones
//! - **Evaluator trees** combining requirements with short-circuiting `all`/`any`
//! - **Resource metadata** listing the actions held on each resource of a page
//! - **Managed role names** derived from users, teams and built-in roles
//!
//! ## Example
//!
//! ```rust
//! use scopegate_accesscontrol::{EvalContext, Evaluator, PermissionSet, ResolverRegistry};
//!
//! # tokio_test::block_on(async {
//! let permissions = PermissionSet::new()
//!     .with("datasources:read", "datasources:id:*")
//!     .with("datasources:write", "datasources:id:7");
//!
//! let evaluator = Evaluator::all([
//!     Evaluator::permission("datasources:read", ["datasources:id:7"]),
//!     Evaluator::action("datasources:write"),
//! ]);
//!
//! let registry = ResolverRegistry::new();
//! let granted = evaluator
//!     .evaluate(&permissions, &registry, &EvalContext::new())
//!     .await
//!     .unwrap();
//! assert!(granted);
//! # });
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod metadata;
pub mod provider;
pub mod roles;
pub mod scope;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::AccessControlConfig;
pub use context::EvalContext;
pub use error::{AccessControlError, Result};
pub use evaluator::{Evaluator, Requirement};
pub use metadata::get_resources_metadata;
pub use provider::{GetUserPermissionsQuery, InMemoryPermissionsProvider, PermissionsProvider};
pub use roles::{managed_role_name, SubjectKind};
pub use scope::{AttributeScopeResolver, FnResolver, ResolverRegistry};
pub use service::{has_access, has_global_access, AccessControl, AccessControlService};
pub use types::{
    build_permissions_map, group_scopes_by_action, Metadata, OrgRole, Options, Permission,
    PermissionSet, RoleDto, RoleRegistration, SignedInUser, GLOBAL_ORG_ID,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
