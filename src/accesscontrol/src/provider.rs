//! Permission providers
//!
//! The permission store is external; this module defines the seam and an
//! in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::{Options, Permission, SignedInUser};

/// Lookup of the permissions held by a user in an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserPermissionsQuery {
    pub org_id: i64,
    pub user_id: i64,
    pub options: Options,
}

impl GetUserPermissionsQuery {
    /// Query for a signed-in user in their current organization
    pub fn for_user(user: &SignedInUser, options: Options) -> Self {
        Self {
            org_id: user.org_id,
            user_id: user.user_id,
            options,
        }
    }
}

/// Source of permission sets
#[async_trait]
pub trait PermissionsProvider: Send + Sync {
    /// Permissions of `query.user_id` within `query.org_id`
    async fn get_user_permissions(&self, query: &GetUserPermissionsQuery) -> anyhow::Result<Vec<Permission>>;
}

/// In-memory permission provider
#[derive(Clone, Default)]
pub struct InMemoryPermissionsProvider {
    permissions: Arc<RwLock<HashMap<(i64, i64), Vec<Permission>>>>,
}

impl InMemoryPermissionsProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant permissions to a user in an organization
    pub async fn grant(&self, org_id: i64, user_id: i64, permissions: impl IntoIterator<Item = Permission>) {
        let mut store = self.permissions.write().await;
        store.entry((org_id, user_id)).or_default().extend(permissions);
    }

    /// Remove every permission of a user in an organization
    pub async fn revoke_all(&self, org_id: i64, user_id: i64) {
        let mut store = self.permissions.write().await;
        store.remove(&(org_id, user_id));
    }
}

#[async_trait]
impl PermissionsProvider for InMemoryPermissionsProvider {
    async fn get_user_permissions(&self, query: &GetUserPermissionsQuery) -> anyhow::Result<Vec<Permission>> {
        let store = self.permissions.read().await;
        Ok(store
            .get(&(query.org_id, query.user_id))
            .cloned()
            .unwrap_or_default())
    }
}
