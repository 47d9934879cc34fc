//! Evaluator trees over required permissions
//!
//! An evaluator is an immutable boolean expression built once per access
//! check call site:
//!
//! ```text
//! all(datasources:read[datasources:name:prod], any(teams:read, teams:write[teams:id:3]))
//! ```
//!
//! Leaves require an action, optionally over one of a list of target scopes.
//! Target scopes are expanded through the [`ResolverRegistry`] before being
//! matched against the granted scope patterns.

use std::fmt;

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::EvalContext;
use crate::error::Result;
use crate::scope::{matches, ResolverRegistry};
use crate::types::PermissionSet;

/// Leaf requirement: hold `action` over at least one of `scopes`
///
/// Empty `scopes` requires the bare action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub action: String,

    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Requirement {
    async fn evaluate(
        &self,
        permissions: &PermissionSet,
        registry: &ResolverRegistry,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let granted = match permissions.scopes(&self.action) {
            Some(granted) if !granted.is_empty() => granted,
            // Not held at all: no resolved scope could change the outcome
            _ => return Ok(false),
        };

        if self.scopes.is_empty() {
            return Ok(true);
        }

        let mut targets = Vec::with_capacity(self.scopes.len());
        for scope in &self.scopes {
            targets.extend(registry.resolve(ctx, scope).await?);
        }

        Ok(granted
            .iter()
            .any(|pattern| targets.iter().any(|target| matches(pattern, target))))
    }
}

/// Boolean expression over permission requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Evaluator {
    /// A single requirement
    Permission(Requirement),
    /// Every child must be satisfied
    All(Vec<Evaluator>),
    /// At least one child must be satisfied
    Any(Vec<Evaluator>),
}

impl Evaluator {
    /// Require `action` over at least one of `scopes`
    pub fn permission<I, S>(action: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Permission(Requirement {
            action: action.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        })
    }

    /// Require `action` regardless of scope
    pub fn action(action: impl Into<String>) -> Self {
        Self::permission(action, Vec::<String>::new())
    }

    /// Conjunction of evaluators
    pub fn all(children: impl IntoIterator<Item = Evaluator>) -> Self {
        Self::All(children.into_iter().collect())
    }

    /// Disjunction of evaluators
    pub fn any(children: impl IntoIterator<Item = Evaluator>) -> Self {
        Self::Any(children.into_iter().collect())
    }

    /// Evaluates the tree against a permission set
    ///
    /// `Ok(false)` means access denied. Errors mean the decision could not be
    /// made: a resolver failed, or `ctx` was cancelled or ran past its deadline.
    ///
    /// `All` stops at the first unsatisfied or failing child. `Any` stops at
    /// the first satisfied child; a resolver failure in one branch does not
    /// hide a sibling that evaluates cleanly, and only when every child failed
    /// is the last failure returned. Cancellation always propagates.
    pub async fn evaluate(
        &self,
        permissions: &PermissionSet,
        registry: &ResolverRegistry,
        ctx: &EvalContext,
    ) -> Result<bool> {
        let granted = self.evaluate_node(permissions, registry, ctx).await?;
        debug!(evaluator = %self, granted, "Evaluated permissions");
        Ok(granted)
    }

    fn evaluate_node<'a>(
        &'a self,
        permissions: &'a PermissionSet,
        registry: &'a ResolverRegistry,
        ctx: &'a EvalContext,
    ) -> BoxFuture<'a, Result<bool>> {
        async move {
            ctx.check()?;

            match self {
                Self::Permission(requirement) => requirement.evaluate(permissions, registry, ctx).await,
                Self::All(children) => {
                    for child in children {
                        if !child.evaluate_node(permissions, registry, ctx).await? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                Self::Any(children) => {
                    let mut last_err = None;
                    let mut evaluated = false;

                    for child in children {
                        match child.evaluate_node(permissions, registry, ctx).await {
                            Ok(true) => return Ok(true),
                            Ok(false) => evaluated = true,
                            Err(err) if err.is_cancellation() => return Err(err),
                            Err(err) => {
                                debug!(evaluator = %child, error = %err, "Branch failed to evaluate");
                                last_err = Some(err);
                            }
                        }
                    }

                    match last_err {
                        Some(err) if !evaluated => Err(err),
                        _ => Ok(false),
                    }
                }
            }
        }
        .boxed()
    }

    /// Whether evaluating this tree may call an attribute resolver
    ///
    /// Trees for which this is false never suspend on external lookups.
    pub fn needs_resolution(&self, registry: &ResolverRegistry) -> bool {
        match self {
            Self::Permission(requirement) => requirement
                .scopes
                .iter()
                .any(|scope| registry.has_resolver_for(scope)),
            Self::All(children) | Self::Any(children) => {
                children.iter().any(|child| child.needs_resolution(registry))
            }
        }
    }
}

impl fmt::Display for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, children) = match self {
            Self::Permission(requirement) => {
                write!(f, "{}", requirement.action)?;
                if !requirement.scopes.is_empty() {
                    write!(f, "[{}]", requirement.scopes.join(", "))?;
                }
                return Ok(());
            }
            Self::All(children) => ("all", children),
            Self::Any(children) => ("any", children),
        };

        write!(f, "{}(", name)?;
        for (idx, child) in children.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}
