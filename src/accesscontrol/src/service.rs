//! Access control service
//!
//! Composes a permission provider, the attribute resolver registry and the
//! declared fixed roles behind the [`AccessControl`] trait consumed by the
//! API layer.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, error, info};

use crate::config::AccessControlConfig;
use crate::context::EvalContext;
use crate::error::{AccessControlError, Result};
use crate::evaluator::Evaluator;
use crate::provider::{GetUserPermissionsQuery, PermissionsProvider};
use crate::roles::FIXED_ROLE_PREFIX;
use crate::scope::{ensure_valid_scope, ResolverRef, ResolverRegistry};
use crate::types::{OrgRole, Options, Permission, PermissionSet, RoleDto, RoleRegistration, SignedInUser};

/// Built-in role granted to server administrators
pub const ROLE_GRAFANA_ADMIN: &str = "Grafana Admin";

/// Access control operations used by the API layer
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Evaluates access of `user` against `evaluator`
    async fn evaluate(&self, ctx: &EvalContext, user: &SignedInUser, evaluator: &Evaluator) -> Result<bool>;

    /// Returns the permissions of `user` in its current organization
    async fn get_user_permissions(&self, user: &SignedInUser, options: Options) -> Result<Vec<Permission>>;

    /// Returns the declared fixed roles granted to the built-in roles of `user`
    async fn get_user_roles(&self, user: &SignedInUser) -> Result<Vec<RoleDto>>;

    /// Whether access control is disabled
    fn is_disabled(&self) -> bool;

    /// Declares fixed roles and the built-in roles they are granted to
    ///
    /// Every registration is validated first; on error nothing is stored.
    fn declare_fixed_roles(&self, registrations: Vec<RoleRegistration>) -> Result<()>;

    /// Registers a scope resolver for a prefix (e.g. `datasources:name:`)
    fn register_attribute_scope_resolver(&self, prefix: &str, resolver: ResolverRef);
}

/// Default [`AccessControl`] implementation
pub struct AccessControlService {
    config: AccessControlConfig,
    provider: Arc<dyn PermissionsProvider>,
    resolvers: ResolverRegistry,
    fixed_roles: DashMap<String, RoleRegistration>,
}

impl AccessControlService {
    /// Create a service over a permission provider
    pub fn new(config: AccessControlConfig, provider: Arc<dyn PermissionsProvider>) -> Self {
        Self::with_resolvers(config, provider, ResolverRegistry::new())
    }

    /// Create a service sharing an existing resolver registry
    pub fn with_resolvers(
        config: AccessControlConfig,
        provider: Arc<dyn PermissionsProvider>,
        resolvers: ResolverRegistry,
    ) -> Self {
        info!(enabled = config.enabled, "Access control service initialized");
        Self {
            config,
            provider,
            resolvers,
            fixed_roles: DashMap::new(),
        }
    }

    /// The resolver registry used for evaluations
    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// A declared fixed role by name
    pub fn fixed_role(&self, name: &str) -> Option<RoleRegistration> {
        self.fixed_roles.get(name).map(|entry| entry.value().clone())
    }

    /// Fixed roles granted to a built-in role, sorted by name
    pub fn fixed_roles_granted_to(&self, builtin_role: &str) -> Vec<RoleDto> {
        let mut roles: Vec<RoleDto> = self
            .fixed_roles
            .iter()
            .filter(|entry| entry.grants.iter().any(|grant| grant == builtin_role))
            .map(|entry| entry.role.clone())
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }
}

#[async_trait]
impl AccessControl for AccessControlService {
    async fn evaluate(&self, ctx: &EvalContext, user: &SignedInUser, evaluator: &Evaluator) -> Result<bool> {
        let ctx = ctx.clone().or_timeout(self.config.resolver_timeout());

        let query = GetUserPermissionsQuery::for_user(user, Options::default());
        let permissions = ctx
            .run(async {
                self.provider
                    .get_user_permissions(&query)
                    .await
                    .map_err(AccessControlError::Provider)
            })
            .await?;

        let permissions = PermissionSet::from_permissions(&permissions);
        let granted = evaluator.evaluate(&permissions, &self.resolvers, &ctx).await?;

        debug!(user_id = user.user_id, org_id = user.org_id, evaluator = %evaluator, granted, "Access evaluated");
        Ok(granted)
    }

    async fn get_user_permissions(&self, user: &SignedInUser, options: Options) -> Result<Vec<Permission>> {
        let query = GetUserPermissionsQuery::for_user(user, options);
        self.provider
            .get_user_permissions(&query)
            .await
            .map_err(AccessControlError::Provider)
    }

    async fn get_user_roles(&self, user: &SignedInUser) -> Result<Vec<RoleDto>> {
        let mut builtins: Vec<&str> = user.org_role.iter().map(|role| role.as_str()).collect();
        if user.is_grafana_admin {
            builtins.push(ROLE_GRAFANA_ADMIN);
        }

        let mut roles: Vec<RoleDto> = builtins
            .into_iter()
            .flat_map(|builtin| self.fixed_roles_granted_to(builtin))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles.dedup_by(|a, b| a.name == b.name);
        Ok(roles)
    }

    fn is_disabled(&self) -> bool {
        !self.config.enabled
    }

    fn declare_fixed_roles(&self, registrations: Vec<RoleRegistration>) -> Result<()> {
        for registration in &registrations {
            validate_registration(registration)?;
        }

        for registration in registrations {
            info!(role = %registration.role.name, grants = ?registration.grants, "Declared fixed role");
            self.fixed_roles.insert(registration.role.name.clone(), registration);
        }

        Ok(())
    }

    fn register_attribute_scope_resolver(&self, prefix: &str, resolver: ResolverRef) {
        self.resolvers.register_arc(prefix, resolver);
    }
}

fn validate_registration(registration: &RoleRegistration) -> Result<()> {
    let role = &registration.role;

    if !role.name.starts_with(FIXED_ROLE_PREFIX) {
        return Err(AccessControlError::InvalidRoleName(role.name.clone()));
    }

    for grant in &registration.grants {
        if !is_builtin_role(grant) {
            return Err(AccessControlError::InvalidRoleName(grant.clone()));
        }
    }

    for permission in &role.permissions {
        ensure_valid_scope(&permission.scope)?;
    }

    Ok(())
}

fn is_builtin_role(name: &str) -> bool {
    name == ROLE_GRAFANA_ADMIN
        || [OrgRole::Viewer, OrgRole::Editor, OrgRole::Admin]
            .iter()
            .any(|role| role.as_str() == name)
}

/// Checks access for `user`, falling back to `fallback` when access control is disabled
///
/// Evaluation errors are logged and deny access.
pub async fn has_access<A, F>(
    ac: &A,
    ctx: &EvalContext,
    user: &SignedInUser,
    fallback: F,
    evaluator: &Evaluator,
) -> bool
where
    A: AccessControl + ?Sized,
    F: FnOnce(&SignedInUser) -> bool,
{
    if ac.is_disabled() {
        return fallback(user);
    }

    match ac.evaluate(ctx, user, evaluator).await {
        Ok(granted) => granted,
        Err(err) => {
            error!(user_id = user.user_id, error = %err, "Error from access control system");
            false
        }
    }
}

/// Like [`has_access`], using only permissions assigned outside any organization
pub async fn has_global_access<A, F>(
    ac: &A,
    ctx: &EvalContext,
    user: &SignedInUser,
    fallback: F,
    evaluator: &Evaluator,
) -> bool
where
    A: AccessControl + ?Sized,
    F: FnOnce(&SignedInUser) -> bool,
{
    if ac.is_disabled() {
        return fallback(user);
    }

    has_access(ac, ctx, &user.to_global(), fallback, evaluator).await
}

/// Legacy fallback: any signed-in user
pub fn req_signed_in(user: &SignedInUser) -> bool {
    user.is_signed_in
}

/// Legacy fallback: server administrators
pub fn req_grafana_admin(user: &SignedInUser) -> bool {
    user.is_grafana_admin
}

/// Legacy fallback: organization administrators
pub fn req_org_admin(user: &SignedInUser) -> bool {
    user.org_role == Some(OrgRole::Admin)
}

/// Legacy fallback: organization administrators and editors
pub fn req_org_admin_or_editor(user: &SignedInUser) -> bool {
    matches!(user.org_role, Some(OrgRole::Admin | OrgRole::Editor))
}
