// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation busy guard and continuity token store.
//!
//! A conversation admits at most one in-flight message. The check-and-set in
//! [`ConversationStore::try_acquire`] is synchronous so there is no suspension
//! point between reading and writing the busy flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use giggle_core::ConversationKey;
use tracing::debug;

/// Mutable state the relay keeps for one conversation.
pub trait ConversationStore: Send + Sync {
    /// Marks the conversation busy. Returns `false` if it already was.
    fn try_acquire(&self, key: &ConversationKey) -> bool;

    /// Clears the busy flag. Idempotent.
    fn release(&self, key: &ConversationKey);

    fn continuity_token(&self, key: &ConversationKey) -> Option<String>;

    fn set_continuity_token(&self, key: &ConversationKey, token: String);

    fn clear_continuity_token(&self, key: &ConversationKey);

    fn is_busy(&self, key: &ConversationKey) -> bool;

    /// Number of tracked conversations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct ConversationEntry {
    busy: bool,
    continuity_token: Option<String>,
    last_used: u64,
}

/// [`ConversationStore`] backed by a sharded concurrent map.
///
/// Holds at most `capacity` entries. When a new conversation arrives at
/// capacity, a batch of the least recently used idle entries (a tenth of the
/// capacity) is evicted; busy entries are never evicted.
pub struct InMemoryConversationStore {
    entries: DashMap<ConversationKey, ConversationEntry>,
    capacity: usize,
    clock: AtomicU64,
}

impl InMemoryConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Entries freed per eviction pass, so a full store is scanned at most
    /// once per batch of new conversations.
    fn eviction_batch(&self) -> usize {
        (self.capacity / 10).max(1)
    }

    fn evict_idle(&self) {
        let excess = (self.entries.len() + self.eviction_batch()).saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }

        let mut idle: Vec<(ConversationKey, u64)> = self
            .entries
            .iter()
            .filter(|e| !e.value().busy)
            .map(|e| (e.key().clone(), e.value().last_used))
            .collect();
        idle.sort_by_key(|(_, last_used)| *last_used);

        let mut evicted = 0;
        for (key, _) in idle.into_iter().take(excess) {
            if self.entries.remove_if(&key, |_, e| !e.busy).is_some() {
                evicted += 1;
            }
        }
        debug!(evicted, capacity = self.capacity, "evicted idle conversations");
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn try_acquire(&self, key: &ConversationKey) -> bool {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(key) {
            self.evict_idle();
        }

        let now = self.tick();
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.busy {
                    return false;
                }
                entry.busy = true;
                entry.last_used = now;
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ConversationEntry {
                    busy: true,
                    continuity_token: None,
                    last_used: now,
                });
                true
            }
        }
    }

    fn release(&self, key: &ConversationKey) {
        let now = self.tick();
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.busy = false;
            entry.last_used = now;
        }
    }

    fn continuity_token(&self, key: &ConversationKey) -> Option<String> {
        self.entries
            .get(key)
            .and_then(|entry| entry.continuity_token.clone())
    }

    fn set_continuity_token(&self, key: &ConversationKey, token: String) {
        self.entries.entry(key.clone()).or_default().continuity_token = Some(token);
    }

    fn clear_continuity_token(&self, key: &ConversationKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.continuity_token = None;
        }
    }

    fn is_busy(&self, key: &ConversationKey) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.busy)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Holds a conversation's busy flag for as long as it lives.
///
/// Dropping the permit releases the conversation, on every exit path.
pub struct ConversationPermit {
    store: Arc<dyn ConversationStore>,
    key: ConversationKey,
}

impl ConversationPermit {
    /// Returns `None` if the conversation is already busy.
    pub fn acquire(store: &Arc<dyn ConversationStore>, key: &ConversationKey) -> Option<Self> {
        store.try_acquire(key).then(|| Self {
            store: Arc::clone(store),
            key: key.clone(),
        })
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }
}

impl Drop for ConversationPermit {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ConversationKey {
        ConversationKey::from(s)
    }

    #[test]
    fn second_acquire_is_denied_until_release() {
        let store = InMemoryConversationStore::new(10);
        assert!(store.try_acquire(&key("c1")));
        assert!(!store.try_acquire(&key("c1")));
        assert!(store.is_busy(&key("c1")));

        store.release(&key("c1"));
        assert!(!store.is_busy(&key("c1")));
        assert!(store.try_acquire(&key("c1")));
    }

    #[test]
    fn conversations_are_independent() {
        let store = InMemoryConversationStore::new(10);
        assert!(store.try_acquire(&key("c1")));
        assert!(store.try_acquire(&key("c2")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let store = InMemoryConversationStore::new(10);
        store.release(&key("unknown"));
        assert!(store.try_acquire(&key("c1")));
        store.release(&key("c1"));
        store.release(&key("c1"));
        assert!(!store.is_busy(&key("c1")));
    }

    #[test]
    fn continuity_token_survives_release() {
        let store = InMemoryConversationStore::new(10);
        assert!(store.continuity_token(&key("c1")).is_none());

        store.try_acquire(&key("c1"));
        store.set_continuity_token(&key("c1"), "resp_1".into());
        store.release(&key("c1"));
        assert_eq!(store.continuity_token(&key("c1")).as_deref(), Some("resp_1"));

        store.clear_continuity_token(&key("c1"));
        assert!(store.continuity_token(&key("c1")).is_none());
    }

    #[test]
    fn eviction_drops_least_recently_used_idle_entry() {
        let store = InMemoryConversationStore::new(2);
        store.try_acquire(&key("old"));
        store.set_continuity_token(&key("old"), "t-old".into());
        store.release(&key("old"));
        store.try_acquire(&key("recent"));
        store.release(&key("recent"));

        assert!(store.try_acquire(&key("new")));
        assert_eq!(store.len(), 2);
        assert!(store.continuity_token(&key("old")).is_none());
        assert!(!store.is_busy(&key("recent")));
    }

    #[test]
    fn eviction_frees_a_batch_at_a_time() {
        let store = InMemoryConversationStore::new(20);
        for i in 0..20 {
            let k = key(&format!("c{i}"));
            store.try_acquire(&k);
            store.release(&k);
        }

        assert!(store.try_acquire(&key("n1")));
        assert_eq!(store.len(), 19);
        assert!(store.continuity_token(&key("c0")).is_none());
        assert!(!store.entries.contains_key(&key("c0")));
        assert!(!store.entries.contains_key(&key("c1")));
        assert!(store.entries.contains_key(&key("c2")));

        assert!(store.try_acquire(&key("n2")));
        assert_eq!(store.len(), 20);
        assert!(store.entries.contains_key(&key("c2")));
    }

    #[test]
    fn busy_entries_are_never_evicted() {
        let store = InMemoryConversationStore::new(2);
        store.try_acquire(&key("a"));
        store.try_acquire(&key("b"));

        assert!(store.try_acquire(&key("c")));
        assert!(store.is_busy(&key("a")));
        assert!(store.is_busy(&key("b")));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn permit_releases_on_drop() {
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new(10));
        let permit = ConversationPermit::acquire(&store, &key("c1")).expect("first acquire");
        assert_eq!(permit.key(), &key("c1"));
        assert!(ConversationPermit::acquire(&store, &key("c1")).is_none());

        drop(permit);
        assert!(!store.is_busy(&key("c1")));
    }

    #[test]
    fn permit_releases_on_panic() {
        let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new(10));
        let cloned = Arc::clone(&store);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _permit = ConversationPermit::acquire(&cloned, &key("c1"));
            panic!("mid-exchange");
        }));
        assert!(result.is_err());
        assert!(!store.is_busy(&key("c1")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_acquires_admit_exactly_one() {
        let store = Arc::new(InMemoryConversationStore::new(10));
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.try_acquire(&key("hot")) }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
