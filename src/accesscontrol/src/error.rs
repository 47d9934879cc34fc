//! Error types for the access control engine

use thiserror::Error;

/// Access control errors
///
/// A plain `Ok(false)` from an evaluation is the normal "access denied"
/// outcome and is never represented here.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// Scope pattern rejected at declaration time
    #[error("Invalid scope syntax: {0}")]
    InvalidScopeSyntax(String),

    /// Fixed role name without the `fixed:` prefix
    #[error("Invalid role name: {0}")]
    InvalidRoleName(String),

    /// Metadata scope prefix that is not `root:attribute:`
    #[error("Malformed scope prefix: {0}")]
    MalformedPrefix(String),

    /// An attribute resolver could not expand a scope
    #[error("Failed to resolve scope {scope}: {source}")]
    ResolutionFailed {
        /// Scope handed to the resolver
        scope: String,
        /// Underlying resolver error
        #[source]
        source: anyhow::Error,
    },

    /// The caller cancelled the evaluation
    #[error("Evaluation cancelled")]
    Cancelled,

    /// The evaluation deadline passed before completion
    #[error("Evaluation deadline exceeded")]
    DeadlineExceeded,

    /// Permission provider error
    #[error("Permission provider error: {0}")]
    Provider(#[source] anyhow::Error),
}

impl AccessControlError {
    /// Whether the error comes from the caller's context rather than the engine
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Whether the error comes from an attribute resolver
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::ResolutionFailed { .. })
    }
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AccessControlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert!(AccessControlError::Cancelled.is_cancellation());
        assert!(AccessControlError::DeadlineExceeded.is_cancellation());

        let err = AccessControlError::ResolutionFailed {
            scope: "datasources:name:prod".to_string(),
            source: anyhow::anyhow!("index unavailable"),
        };
        assert!(err.is_resolution_failure());
        assert!(!err.is_cancellation());
        assert_eq!(
            err.to_string(),
            "Failed to resolve scope datasources:name:prod: index unavailable"
        );
    }
}
