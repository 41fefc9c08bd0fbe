//! Ephemeral in-memory content handles.
//!
//! A handle is a short-lived, host-addressable URL (`blob:pagegrab/<n>`) around
//! text the save host can read. Handles are owned through [`HandleLease`],
//! which schedules release a fixed grace period after it is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

const SCHEME_PREFIX: &str = "blob:pagegrab/";

/// Address of materialized content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Registry of live handles. Clones share the registry.
#[derive(Clone, Default)]
pub struct HandleStore {
    live: Arc<Mutex<HashMap<ContentHandle, Arc<str>>>>,
    next_id: Arc<AtomicU64>,
}

impl HandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `text` under a fresh handle.
    pub fn create(&self, text: String) -> ContentHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = ContentHandle(format!("{}{}", SCHEME_PREFIX, id));
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle.clone(), Arc::from(text));
        handle
    }

    /// Content behind `handle`, if it has not been released.
    pub fn read(&self, handle: &ContentHandle) -> Option<Arc<str>> {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(handle)
            .cloned()
    }

    /// Releases `handle`. Returns false if it was already gone.
    pub fn release(&self, handle: &ContentHandle) -> bool {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(handle)
            .is_some()
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Materializes `text` and returns the lease that owns it.
    pub fn lease(&self, text: String, grace: Duration) -> HandleLease {
        HandleLease {
            store: self.clone(),
            handle: self.create(text),
            grace,
        }
    }
}

/// Scoped owner of one handle. Dropping it schedules the release after the
/// grace period, since a save may still be reading from the handle.
pub struct HandleLease {
    store: HandleStore,
    handle: ContentHandle,
    grace: Duration,
}

impl HandleLease {
    pub fn handle(&self) -> &ContentHandle {
        &self.handle
    }
}

impl Drop for HandleLease {
    fn drop(&mut self) {
        let store = self.store.clone();
        let handle = self.handle.clone();
        let grace = self.grace;
        match tokio::runtime::Handle::try_current() {
            Ok(rt) if !grace.is_zero() => {
                rt.spawn(async move {
                    tokio::time::sleep(grace).await;
                    store.release(&handle);
                    tracing::trace!(%handle, "content handle released");
                });
            }
            _ => {
                store.release(&handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_read_release() {
        let store = HandleStore::new();
        let h = store.create("var a;".into());
        assert!(h.as_str().starts_with("blob:pagegrab/"));
        assert_eq!(store.read(&h).as_deref(), Some("var a;"));
        assert!(store.release(&h));
        assert!(!store.release(&h));
        assert!(store.read(&h).is_none());
    }

    #[test]
    fn handles_are_distinct() {
        let store = HandleStore::new();
        let a = store.create("a".into());
        let b = store.create("a".into());
        assert_ne!(a, b);
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn lease_without_runtime_releases_on_drop() {
        let store = HandleStore::new();
        let lease = store.lease("x".into(), Duration::from_secs(5));
        assert_eq!(store.live_count(), 1);
        drop(lease);
        assert_eq!(store.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lease_release_waits_for_grace_period() {
        let store = HandleStore::new();
        let lease = store.lease("x".into(), Duration::from_millis(500));
        let handle = lease.handle().clone();
        drop(lease);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.read(&handle).is_some(), "still readable during grace");

        tokio::time::sleep(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert!(store.read(&handle).is_none());
        assert_eq!(store.live_count(), 0);
    }
}
