//! Scope grammar, wildcard matching and attribute scope resolution
//!
//! # Examples
//!
//! ```
//! use scopegate_accesscontrol::scope::{matches, validate_scope};
//!
//! assert!(validate_scope("datasources:id:*"));
//! assert!(!validate_scope("datasources:id*"));
//! assert!(matches("datasources:id:*", "datasources:id:7"));
//! ```

mod matcher;
mod resolver;

pub use matcher::{
    ensure_valid_scope, matches, resource_all_attribute_scope, resource_all_scope, scope,
    validate_scope, WILDCARD,
};
pub use resolver::{AttributeScopeResolver, FnResolver, ResolverRef, ResolverRegistry};
