use super::request_models::{ClaimTransition, Request};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Request for message {0} is already registered")]
    Duplicate(u64),
}

/// Registry of announced requests, keyed by announcement message id.
///
/// Implementations must make `try_claim` atomic per request: two concurrent
/// calls for the same message can never both return `Won`.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, request: Request) -> Result<(), StoreError>;

    async fn get(&self, message_id: u64) -> Result<Option<Request>, StoreError>;

    /// Record the discussion thread opened for a tracked request. Leaves the
    /// claim state alone; a no-op if the request is no longer tracked.
    async fn set_thread(&self, message_id: u64, thread_id: u64) -> Result<(), StoreError>;

    /// Compare-and-set: if unclaimed, mark claimed by `by` at `at`.
    async fn try_claim(
        &self,
        message_id: u64,
        by: u64,
        at: DateTime<Utc>,
    ) -> Result<ClaimTransition, StoreError>;

    /// Drop every request created before `cutoff`. Returns how many were removed.
    async fn remove_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}
