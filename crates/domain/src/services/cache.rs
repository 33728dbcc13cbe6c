use std::time::Duration;

use moka::sync::Cache;

/// Short-lived memory of admitted signatures.
///
/// This is a fast path only: a hit means the signature was admitted before,
/// a miss means nothing and the durable store still decides.
pub trait SignatureCache: Send + Sync {
    fn seen(&self, signature: &str) -> bool;

    fn mark_seen(&self, signature: &str);
}

#[derive(Debug)]
pub struct InMemorySignatureCache {
    seen: Cache<String, ()>,
}

impl SignatureCache for InMemorySignatureCache {
    fn seen(&self, signature: &str) -> bool {
        self.seen.contains_key(signature)
    }

    fn mark_seen(&self, signature: &str) {
        self.seen.insert(signature.to_owned(), ());
    }
}

impl InMemorySignatureCache {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);
    pub const DEFAULT_CAPACITY: u64 = 200_000;

    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(capacity)
                .build(),
        }
    }
}

impl Default for InMemorySignatureCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_marked_signatures() {
        let cache = InMemorySignatureCache::default();
        assert!(!cache.seen("sig-1"));
        cache.mark_seen("sig-1");
        assert!(cache.seen("sig-1"));
        assert!(!cache.seen("sig-2"));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = InMemorySignatureCache::new(Duration::from_millis(20));
        cache.mark_seen("sig-1");
        std::thread::sleep(Duration::from_millis(40));
        assert!(!cache.seen("sig-1"));
    }
}
