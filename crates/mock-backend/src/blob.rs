//! In-memory blob store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use assistant_core::{user_scope, BackendError, BlobRef, BlobStore, FileRecord};
use async_trait::async_trait;

use crate::fanout::lock;

/// Blob store keeping file metadata per user scope.
///
/// Listing can be made to fail as a whole, and metadata reads can be made to
/// fail for individual file names.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    scopes: Mutex<HashMap<String, BTreeMap<String, FileRecord>>>,
    broken_metadata: Mutex<HashSet<String>>,
    listing_fails: AtomicBool,
    list_calls: AtomicUsize,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a file for a user.
    pub fn put(&self, user_id: &str, record: FileRecord) {
        lock(&self.scopes)
            .entry(user_scope(user_id))
            .or_default()
            .insert(record.file_name.clone(), record);
    }

    /// Delete a user's file. Returns whether it existed.
    pub fn remove(&self, user_id: &str, file_name: &str) -> bool {
        lock(&self.scopes)
            .get_mut(&user_scope(user_id))
            .map_or(false, |files| files.remove(file_name).is_some())
    }

    /// Make metadata reads for `file_name` fail (or succeed again).
    pub fn set_metadata_failure(&self, file_name: &str, failing: bool) {
        let mut broken = lock(&self.broken_metadata);
        if failing {
            broken.insert(file_name.to_string());
        } else {
            broken.remove(file_name);
        }
    }

    /// Make every listing fail (or succeed again).
    pub fn set_listing_failure(&self, failing: bool) {
        self.listing_fails.store(failing, Ordering::SeqCst);
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, scope: &str) -> Result<Vec<BlobRef>, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("listing unavailable".to_string()));
        }

        Ok(lock(&self.scopes)
            .get(scope)
            .map(|files| files.keys().map(|name| BlobRef::new(scope, name.as_str())).collect())
            .unwrap_or_default())
    }

    async fn metadata(&self, item: &BlobRef) -> Result<FileRecord, BackendError> {
        if lock(&self.broken_metadata).contains(&item.name) {
            return Err(BackendError::Transport(format!(
                "metadata unavailable for {}",
                item.name
            )));
        }

        let scope = item
            .full_path
            .strip_suffix(item.name.as_str())
            .map(|s| s.trim_end_matches('/'))
            .unwrap_or_default();

        lock(&self.scopes)
            .get(scope)
            .and_then(|files| files.get(&item.name))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                entity: "file",
                id: item.full_path.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_list_and_metadata() {
        let store = MemoryBlobStore::new();
        store.put("u1", FileRecord::new("b.pdf", 20, Utc::now()));
        store.put("u1", FileRecord::new("a.pdf", 10, Utc::now()));
        store.put("u2", FileRecord::new("other.pdf", 30, Utc::now()));

        let items = store.list(&user_scope("u1")).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);

        let record = store.metadata(&items[0]).await.unwrap();
        assert_eq!(record.size, 10);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryBlobStore::new();
        store.put("u1", FileRecord::new("a.pdf", 10, Utc::now()));
        store.set_metadata_failure("a.pdf", true);

        let items = store.list(&user_scope("u1")).await.unwrap();
        assert!(store.metadata(&items[0]).await.is_err());

        store.set_metadata_failure("a.pdf", false);
        assert!(store.metadata(&items[0]).await.is_ok());

        store.set_listing_failure(true);
        assert!(store.list(&user_scope("u1")).await.is_err());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MemoryBlobStore::new();
        store.put("u1", FileRecord::new("a.pdf", 10, Utc::now()));

        assert!(store.remove("u1", "a.pdf"));
        assert!(!store.remove("u1", "a.pdf"));
        assert!(store.list(&user_scope("u1")).await.unwrap().is_empty());
    }
}
