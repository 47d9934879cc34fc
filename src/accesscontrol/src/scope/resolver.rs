//! Attribute scope resolvers and their registry
//!
//! Feature modules register a resolver under a scope prefix such as
//! `datasources:name:` at startup. During evaluation, a target scope starting
//! with a registered prefix is replaced by whatever the resolver returns,
//! typically the canonical `datasources:id:<id>` form.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::context::EvalContext;
use crate::error::{AccessControlError, Result};

/// Expands a named scope into canonical scopes
///
/// Receives the full scope string. May return zero, one or many scopes.
#[async_trait]
pub trait AttributeScopeResolver: Send + Sync {
    /// Resolve one scope
    async fn resolve(&self, scope: &str) -> anyhow::Result<Vec<String>>;
}

/// Adapter turning a synchronous closure into a resolver
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    /// Wrap a closure
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> AttributeScopeResolver for FnResolver<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    async fn resolve(&self, scope: &str) -> anyhow::Result<Vec<String>> {
        (self.0)(scope)
    }
}

/// Shared handle to a registered resolver
pub type ResolverRef = Arc<dyn AttributeScopeResolver>;

/// Registry mapping scope prefixes to resolvers
///
/// Owned by the composition root and passed by reference into evaluations.
/// Registration takes a write lock and swaps in a new snapshot; resolution
/// only holds the read lock long enough to clone the snapshot, so resolver
/// calls never run under the lock.
///
/// # Examples
///
/// ```
/// use scopegate_accesscontrol::scope::{FnResolver, ResolverRegistry};
/// use scopegate_accesscontrol::EvalContext;
///
/// # tokio_test::block_on(async {
/// let registry = ResolverRegistry::new();
/// registry.register("datasources:name:", FnResolver::new(|scope: &str| {
///     Ok(match scope {
///         "datasources:name:prod" => vec!["datasources:id:7".to_string()],
///         _ => vec![],
///     })
/// }));
///
/// let resolved = registry.resolve(&EvalContext::new(), "datasources:name:prod").await.unwrap();
/// assert_eq!(resolved, vec!["datasources:id:7".to_string()]);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: Arc<RwLock<Arc<HashMap<String, ResolverRef>>>>,
}

impl ResolverRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolver under a prefix, replacing any previous one
    pub fn register<R>(&self, prefix: impl Into<String>, resolver: R)
    where
        R: AttributeScopeResolver + 'static,
    {
        self.register_arc(prefix, Arc::new(resolver));
    }

    /// Registers an already shared resolver
    pub fn register_arc(&self, prefix: impl Into<String>, resolver: ResolverRef) {
        let prefix = prefix.into();
        let mut guard = self.resolvers.write();
        let mut next: HashMap<String, ResolverRef> = (**guard).clone();
        if next.insert(prefix.clone(), resolver).is_some() {
            warn!(prefix = %prefix, "Replacing attribute scope resolver");
        } else {
            info!(prefix = %prefix, "Registered attribute scope resolver");
        }
        *guard = Arc::new(next);
    }

    /// Number of registered prefixes
    pub fn len(&self) -> usize {
        self.resolvers.read().len()
    }

    /// Whether no resolver is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any registered prefix applies to the scope
    pub fn has_resolver_for(&self, scope: &str) -> bool {
        self.lookup(scope).is_some()
    }

    /// Finds the resolver registered under the longest prefix of `scope`
    fn lookup(&self, scope: &str) -> Option<(String, ResolverRef)> {
        let snapshot = self.resolvers.read().clone();
        snapshot
            .iter()
            .filter(|(prefix, _)| scope.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, resolver)| (prefix.clone(), Arc::clone(resolver)))
    }

    /// Resolves a scope into the scopes used for matching
    ///
    /// Without a matching prefix the scope is returned unchanged. Resolver
    /// failures surface as `ResolutionFailed`; cancellation and deadline
    /// expiry of `ctx` surface as `Cancelled` and `DeadlineExceeded`.
    pub async fn resolve(&self, ctx: &EvalContext, scope: &str) -> Result<Vec<String>> {
        let Some((prefix, resolver)) = self.lookup(scope) else {
            return Ok(vec![scope.to_string()]);
        };

        let resolved = ctx
            .run(async {
                resolver.resolve(scope).await.map_err(|source| {
                    warn!(scope = %scope, prefix = %prefix, error = %source, "Attribute scope resolution failed");
                    AccessControlError::ResolutionFailed {
                        scope: scope.to_string(),
                        source,
                    }
                })
            })
            .await?;

        debug!(scope = %scope, resolved = ?resolved, "Resolved attribute scope");
        Ok(resolved)
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.resolvers.read().clone();
        let mut prefixes: Vec<_> = snapshot.keys().collect();
        prefixes.sort();
        f.debug_struct("ResolverRegistry")
            .field("prefixes", &prefixes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn name_resolver() -> FnResolver<impl Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync> {
        FnResolver::new(|scope: &str| {
            let name = scope.strip_prefix("ds:name:").unwrap_or_default();
            Ok(match name {
                "prod" => vec!["ds:id:1".to_string()],
                "renamed" => vec!["ds:id:2".to_string(), "ds:id:3".to_string()],
                _ => vec![],
            })
        })
    }

    #[tokio::test]
    async fn test_passthrough_without_prefix() {
        let registry = ResolverRegistry::new();
        registry.register("ds:name:", name_resolver());

        let resolved = registry.resolve(&EvalContext::new(), "other:x").await.unwrap();
        assert_eq!(resolved, vec!["other:x".to_string()]);
    }

    #[tokio::test]
    async fn test_resolver_expansion() {
        let registry = ResolverRegistry::new();
        registry.register("ds:name:", name_resolver());
        let ctx = EvalContext::new();

        assert_eq!(registry.resolve(&ctx, "ds:name:prod").await.unwrap(), vec!["ds:id:1"]);
        assert_eq!(
            registry.resolve(&ctx, "ds:name:renamed").await.unwrap(),
            vec!["ds:id:2", "ds:id:3"]
        );
        assert!(registry.resolve(&ctx, "ds:name:missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_longest_prefix_wins() {
        let registry = ResolverRegistry::new();
        registry.register("ds:", FnResolver::new(|_: &str| Ok(vec!["short".to_string()])));
        registry.register("ds:name:", FnResolver::new(|_: &str| Ok(vec!["long".to_string()])));

        let resolved = registry.resolve(&EvalContext::new(), "ds:name:prod").await.unwrap();
        assert_eq!(resolved, vec!["long".to_string()]);

        let resolved = registry.resolve(&EvalContext::new(), "ds:uid:abc").await.unwrap();
        assert_eq!(resolved, vec!["short".to_string()]);
    }

    #[tokio::test]
    async fn test_resolver_failure() {
        let registry = ResolverRegistry::new();
        registry.register(
            "ds:name:",
            FnResolver::new(|_: &str| Err(anyhow::anyhow!("lookup unavailable"))),
        );

        let err = registry
            .resolve(&EvalContext::new(), "ds:name:prod")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccessControlError::ResolutionFailed { ref scope, .. } if scope == "ds:name:prod"
        ));
    }

    #[tokio::test]
    async fn test_reregistration_replaces() {
        let registry = ResolverRegistry::new();
        registry.register("ds:name:", FnResolver::new(|_: &str| Ok(vec!["a".to_string()])));
        registry.register("ds:name:", FnResolver::new(|_: &str| Ok(vec!["b".to_string()])));

        assert_eq!(registry.len(), 1);
        let resolved = registry.resolve(&EvalContext::new(), "ds:name:x").await.unwrap();
        assert_eq!(resolved, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_cancelled_context_skips_resolver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registry = ResolverRegistry::new();
        registry.register(
            "ds:name:",
            FnResolver::new(move |_: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(vec![])
            }),
        );

        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let ctx = EvalContext::new().with_cancellation(token);

        let err = registry.resolve(&ctx, "ds:name:prod").await.unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        use std::thread;

        let registry = ResolverRegistry::new();
        let mut handles = vec![];

        for i in 0..10 {
            let registry = registry.clone();
            handles.push(thread::spawn(move || {
                registry.register(
                    format!("kind{}:name:", i),
                    FnResolver::new(|_: &str| Ok(vec![])),
                );
                registry.has_resolver_for(&format!("kind{}:name:x", i))
            }));
        }

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(registry.len(), 10);
    }
}
