//! Persistence boundary for share records.
//!
//! The production store is SQL-backed and lives with the surrounding
//! application; [`MemoryShareStore`] backs tests and single-process
//! deployments. Implementors must make `conditional_increment` a single
//! atomic read-modify-write — a separate read-compare-write sequence
//! breaks the download quota under concurrent access.

use crate::error::{ShareError, ShareResult};
use crate::types::FileShare;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Transactional store for [`FileShare`] records.
#[allow(async_fn_in_trait)]
pub trait ShareStore: Send + Sync {
    /// Inserts a new share. Returns `false` (without inserting) when the
    /// share token collides with a live record, so the caller can retry
    /// with a fresh token.
    async fn insert(&self, share: FileShare) -> ShareResult<bool>;

    async fn get(&self, id: Uuid) -> ShareResult<Option<FileShare>>;

    async fn get_by_token(&self, token: &str) -> ShareResult<Option<FileShare>>;

    /// Replaces an existing record. `NotFound` if the id is unknown.
    async fn update(&self, share: FileShare) -> ShareResult<()>;

    /// Atomically re-checks the download quota and increments the counter.
    /// Returns `true` if the increment was committed, `false` if it would
    /// have exceeded `max_downloads`. The check and the write happen under
    /// one critical section.
    async fn conditional_increment(&self, id: Uuid) -> ShareResult<bool>;

    /// Deletes a share. Returns `false` if the id was unknown.
    async fn delete(&self, id: Uuid) -> ShareResult<bool>;
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<Uuid, FileShare>,
    by_token: HashMap<String, Uuid>,
}

/// In-memory share store.
///
/// All mutations take the write lock, so the quota re-check and increment
/// in [`ShareStore::conditional_increment`] are serialized per store.
#[derive(Clone, Default)]
pub struct MemoryShareStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live shares.
    pub async fn len(&self) -> usize {
        self.inner.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.by_id.is_empty()
    }
}

impl ShareStore for MemoryShareStore {
    async fn insert(&self, share: FileShare) -> ShareResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.by_token.contains_key(&share.share_token) {
            return Ok(false);
        }
        if inner.by_id.contains_key(&share.id) {
            return Err(ShareError::Internal(format!(
                "duplicate share id {}",
                share.id
            )));
        }
        inner.by_token.insert(share.share_token.clone(), share.id);
        inner.by_id.insert(share.id, share);
        Ok(true)
    }

    async fn get(&self, id: Uuid) -> ShareResult<Option<FileShare>> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn get_by_token(&self, token: &str) -> ShareResult<Option<FileShare>> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_token
            .get(token)
            .and_then(|id| inner.by_id.get(id))
            .cloned())
    }

    async fn update(&self, share: FileShare) -> ShareResult<()> {
        let mut inner = self.inner.write().await;
        match inner.by_id.get_mut(&share.id) {
            Some(existing) => {
                // The token is immutable; updates never remap the index.
                debug_assert_eq!(existing.share_token, share.share_token);
                *existing = share;
                Ok(())
            }
            None => Err(ShareError::NotFound),
        }
    }

    async fn conditional_increment(&self, id: Uuid) -> ShareResult<bool> {
        let mut inner = self.inner.write().await;
        let share = inner.by_id.get_mut(&id).ok_or(ShareError::NotFound)?;

        if let Some(max) = share.max_downloads {
            if share.download_count >= max {
                return Ok(false);
            }
        }
        share.download_count += 1;
        share.updated_at = chrono::Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> ShareResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.by_id.remove(&id) {
            Some(share) => {
                inner.by_token.remove(&share.share_token);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
