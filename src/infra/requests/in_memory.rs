// In-memory implementation of RequestStore.
//
// Requests are never persisted: a restart forgets every open request, and
// clicks on their old buttons are answered as "no longer open".

use crate::core::requests::{ClaimState, ClaimTransition, Request, RequestStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Announcement message id -> request.
///
/// **Atomic claims:**
/// `try_claim` does its check and its write while holding the shard's write
/// guard from `get_mut`, and never awaits inside it. That guard is the
/// per-request mutual exclusion that makes the claim a compare-and-set.
pub struct InMemoryRequestStore {
    requests: DashMap<u64, Request>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }
}

impl Default for InMemoryRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, request: Request) -> Result<(), StoreError> {
        let message_id = request.announcement.message_id;
        match self.requests.entry(message_id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(message_id)),
            Entry::Vacant(slot) => {
                slot.insert(request);
                Ok(())
            }
        }
    }

    async fn get(&self, message_id: u64) -> Result<Option<Request>, StoreError> {
        Ok(self.requests.get(&message_id).map(|entry| entry.clone()))
    }

    async fn set_thread(&self, message_id: u64, thread_id: u64) -> Result<(), StoreError> {
        if let Some(mut entry) = self.requests.get_mut(&message_id) {
            entry.thread_id = Some(thread_id);
        }
        Ok(())
    }

    async fn try_claim(
        &self,
        message_id: u64,
        by: u64,
        at: DateTime<Utc>,
    ) -> Result<ClaimTransition, StoreError> {
        let Some(mut entry) = self.requests.get_mut(&message_id) else {
            return Ok(ClaimTransition::Missing);
        };

        if let ClaimState::Claimed { by: holder, .. } = &entry.claim {
            return Ok(ClaimTransition::Lost { by: *holder });
        }

        entry.claim = ClaimState::Claimed { by, at };
        Ok(ClaimTransition::Won(entry.value().clone()))
    }

    async fn remove_created_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.requests.len();
        self.requests.retain(|_, request| request.created_at >= cutoff);
        Ok(before.saturating_sub(self.requests.len()))
    }
}
