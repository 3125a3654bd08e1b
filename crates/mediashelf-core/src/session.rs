use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

struct Held {
    bytes: Arc<[u8]>,
    mime: String,
    reference: Option<String>,
}

/// Payloads that exist only for the lifetime of this process.
///
/// Each entry owns the uploaded bytes and at most one live transient
/// reference (`session://media/<id>/<generation>`). References are revoked
/// when the entry is released; the bytes can always mint a fresh one.
#[derive(Default)]
pub struct SessionCache {
    entries: HashMap<u64, Held>,
    live: HashSet<String>,
    generation: u64,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("entries", &self.entries.len())
            .field("live", &self.live.len())
            .finish()
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, mime: impl Into<String>, bytes: Vec<u8>) {
        self.release(id);
        self.entries.insert(
            id,
            Held {
                bytes: bytes.into(),
                mime: mime.into(),
                reference: None,
            },
        );
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn bytes(&self, id: u64) -> Option<Arc<[u8]>> {
        self.entries.get(&id).map(|held| Arc::clone(&held.bytes))
    }

    pub fn mime(&self, id: u64) -> Option<&str> {
        self.entries.get(&id).map(|held| held.mime.as_str())
    }

    /// Live reference for `id`, minting one from the held bytes if needed.
    pub fn reference(&mut self, id: u64) -> Option<String> {
        let held = self.entries.get_mut(&id)?;
        if let Some(existing) = &held.reference {
            return Some(existing.clone());
        }
        self.generation += 1;
        let reference = format!("session://media/{}/{}", id, self.generation);
        debug!(id, %reference, "minted session reference");
        held.reference = Some(reference.clone());
        self.live.insert(reference.clone());
        Some(reference)
    }

    /// Revoke the live reference, if any, keeping the bytes.
    pub fn revoke(&mut self, id: u64) {
        if let Some(reference) = self.entries.get_mut(&id).and_then(|h| h.reference.take()) {
            debug!(id, %reference, "revoked session reference");
            self.live.remove(&reference);
        }
    }

    /// Revoke and drop everything held for `id`.
    pub fn release(&mut self, id: u64) {
        self.revoke(id);
        self.entries.remove(&id);
    }

    pub fn is_live(&self, reference: &str) -> bool {
        self.live.contains(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_is_stable_until_revoked() {
        let mut cache = SessionCache::new();
        cache.insert(1, "video/mp4", vec![1, 2, 3]);

        let first = cache.reference(1).unwrap();
        assert_eq!(cache.reference(1).unwrap(), first);
        assert!(cache.is_live(&first));

        cache.revoke(1);
        assert!(!cache.is_live(&first));
        let second = cache.reference(1).unwrap();
        assert_ne!(first, second);
        assert!(cache.is_live(&second));
    }

    #[test]
    fn test_release_drops_bytes_and_reference() {
        let mut cache = SessionCache::new();
        cache.insert(7, "video/webm", vec![9; 4]);
        let reference = cache.reference(7).unwrap();

        cache.release(7);
        assert!(!cache.contains(7));
        assert!(!cache.is_live(&reference));
        assert!(cache.reference(7).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unknown_id() {
        let mut cache = SessionCache::new();
        assert!(cache.reference(3).is_none());
        assert!(cache.bytes(3).is_none());
        cache.release(3);
    }
}
