//! Evaluation context carrying cancellation and deadline

use crate::error::{AccessControlError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline for one evaluation
///
/// Forwarded to every attribute resolver call. A cancelled or expired context
/// fails the evaluation instead of reporting "not authorized".
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl EvalContext {
    /// Create a context that is never cancelled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Attach an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Attach a deadline only if none is set
    pub(crate) fn or_timeout(self, timeout: Option<Duration>) -> Self {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.with_timeout(timeout),
            _ => self,
        }
    }

    /// The cancellation token of this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline of this context, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fails if the context is already cancelled or past its deadline
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AccessControlError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AccessControlError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Runs a future until it completes, the context is cancelled, or the deadline passes
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| AccessControlError::DeadlineExceeded)?,
                None => fut.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(AccessControlError::Cancelled),
            result = bounded => result,
        }
    }
}
