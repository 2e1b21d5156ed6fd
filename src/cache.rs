//! The bounded, LRU-ordered response cache. Capacity is small by
//! construction (at most ~10 resident entries), so every operation is a
//! linear scan over a `Vec` ordered LRU (index 0) to MRU (last index). A
//! single mutex guards it and is never held across network I/O.

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Largest single response this cache will admit.
pub const MAX_OBJECT_SIZE: usize = 102_400;
/// Largest total resident size across all cached responses.
pub const MAX_CACHE_SIZE: usize = 1_048_576;

struct CacheObject {
    key: Bytes,
    bytes: Bytes,
    in_use: usize,
}

impl CacheObject {
    fn size(&self) -> usize {
        self.bytes.len()
    }
}

struct Inner {
    // LRU at index 0, MRU at the last index.
    objects: Vec<CacheObject>,
    total_size: usize,
}

pub struct CacheStore {
    inner: Mutex<Inner>,
}

/// Must be passed to [`CacheStore::release`] exactly once. While held, the
/// object cannot be evicted.
pub struct Lease {
    key: Bytes,
    bytes: Bytes,
}

impl Lease {
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                objects: Vec::new(),
                total_size: 0,
            }),
        }
    }

    /// Byte-exact lookup. On a hit, pins the object, promotes it to MRU,
    /// and returns a lease over its bytes.
    pub async fn lookup(&self, key: &[u8]) -> Option<Lease> {
        let mut inner = self.inner.lock().await;
        let pos = inner.objects.iter().position(|o| o.key.as_ref() == key)?;

        inner.objects[pos].in_use += 1;
        let object = inner.objects.remove(pos);
        let lease = Lease {
            key: object.key.clone(),
            bytes: object.bytes.clone(),
        };
        trace!(size = lease.bytes.len(), "cache hit");
        inner.objects.push(object);
        Some(lease)
    }

    pub async fn release(&self, lease: Lease) {
        let mut inner = self.inner.lock().await;
        if let Some(object) = inner
            .objects
            .iter_mut()
            .find(|o| o.key.as_ref() == lease.key.as_ref())
        {
            object.in_use = object.in_use.saturating_sub(1);
        }
    }

    /// Silently does nothing if `key` is already resident or capacity can't
    /// be reclaimed without evicting an in-use object. Caller must ensure
    /// `bytes.len() <= MAX_OBJECT_SIZE`.
    pub async fn admit(&self, key: Bytes, bytes: Bytes) {
        let len = bytes.len();
        debug_assert!(len >= 1 && len <= MAX_OBJECT_SIZE);

        let mut inner = self.inner.lock().await;

        if inner.objects.iter().any(|o| o.key.as_ref() == key.as_ref()) {
            trace!("admit: duplicate key, discarding");
            return;
        }

        while inner.total_size + len > MAX_CACHE_SIZE {
            match inner.objects.iter().position(|o| o.in_use == 0) {
                Some(victim) => {
                    let evicted = inner.objects.remove(victim);
                    inner.total_size -= evicted.size();
                    debug!(size = evicted.size(), "evicted cache object");
                }
                None => {
                    trace!("admit: no evictable victim, dropping new object");
                    return;
                }
            }
        }

        inner.total_size += len;
        inner.objects.push(CacheObject {
            key,
            bytes,
            in_use: 0,
        });
    }

    pub async fn total_size(&self) -> usize {
        self.inner.lock().await.total_size
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.objects.len()
    }

    /// Keys in LRU (front) to MRU (back) order.
    pub async fn keys_lru_order(&self) -> Vec<Bytes> {
        self.inner
            .lock()
            .await
            .objects
            .iter()
            .map(|o| o.key.clone())
            .collect()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
