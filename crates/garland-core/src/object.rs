//! Decorations and the bounded object store.
//!
//! Decorations are placed on a channel's shared canvas. The store keeps them
//! in insertion order and evicts the oldest entry once the channel's capacity
//! is reached.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A decoration identifier, unique within its channel.
pub type ObjectId = String;

/// Atomic counter for ensuring unique IDs even within the same nanosecond.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique decoration id.
///
/// Ids are minted by the caller before pushing; the store treats them as
/// opaque keys.
#[must_use]
pub fn generate_object_id() -> ObjectId {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("obj_{:x}", timestamp.wrapping_add(counter))
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// Position of a decoration on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A placed decoration.
///
/// Owned by the channel's store once pushed; never mutated after insertion,
/// only removed by eviction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    /// Caller-minted id, unique within the channel.
    pub id: ObjectId,
    /// Asset reference rendered by the client.
    pub url: String,
    /// Free-text comment shown alongside the decoration.
    pub comment: String,
    /// Creation timestamp in Unix milliseconds.
    pub created_at: u64,
    /// Where the decoration sits on the canvas.
    pub position: Position,
}

impl Decoration {
    /// Create a new decoration stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<ObjectId>,
        url: impl Into<String>,
        comment: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            comment: comment.into(),
            created_at: now_millis(),
            position,
        }
    }
}

/// Insertion-ordered decoration store with FIFO eviction.
///
/// Eviction order is insertion order, not timestamp order.
#[derive(Debug, Default)]
pub struct DecorationStore {
    items: HashMap<ObjectId, Decoration>,
    order: VecDeque<ObjectId>,
}

impl DecorationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored decorations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if a decoration id is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Look up a decoration by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Decoration> {
        self.items.get(id)
    }

    /// Insert a decoration, evicting the oldest-inserted entry if the store
    /// is at `capacity`. Returns the evicted id, if any.
    ///
    /// Re-inserting an existing id overwrites it in place and never evicts.
    pub fn insert(&mut self, decoration: Decoration, capacity: usize) -> Option<ObjectId> {
        if self.items.contains_key(&decoration.id) {
            self.items.insert(decoration.id.clone(), decoration);
            return None;
        }

        let evicted = if self.items.len() >= capacity {
            self.order.pop_front().map(|id| {
                self.items.remove(&id);
                id
            })
        } else {
            None
        };

        self.order.push_back(decoration.id.clone());
        self.items.insert(decoration.id.clone(), decoration);
        evicted
    }

    /// Snapshot of all decorations in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Decoration> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deco(id: &str) -> Decoration {
        Decoration::new(id, "/decos/bauble.png", "hello", Position::new(1, 2))
    }

    #[test]
    fn test_insert_under_capacity() {
        let mut store = DecorationStore::new();

        assert_eq!(store.insert(deco("a"), 2), None);
        assert_eq!(store.insert(deco("b"), 2), None);
        assert_eq!(store.len(), 2);
        assert!(store.contains("a"));
        assert!(store.contains("b"));
    }

    #[test]
    fn test_fifo_eviction() {
        let mut store = DecorationStore::new();
        store.insert(deco("a"), 2);
        store.insert(deco("b"), 2);

        // "a" was inserted first, so it goes first.
        assert_eq!(store.insert(deco("c"), 2), Some("a".to_string()));
        assert_eq!(store.len(), 2);
        assert!(!store.contains("a"));

        assert_eq!(store.insert(deco("d"), 2), Some("b".to_string()));
        let ids: Vec<_> = store.snapshot().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut store = DecorationStore::new();
        store.insert(deco("a"), 1);

        let replacement = Decoration::new("a", "/decos/star.png", "again", Position::new(9, 9));
        assert_eq!(store.insert(replacement, 1), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().comment, "again");
    }

    #[test]
    fn test_snapshot_insertion_order() {
        let mut store = DecorationStore::new();
        store.insert(deco("x"), 10);
        store.insert(deco("y"), 10);
        store.insert(deco("z"), 10);

        let ids: Vec<_> = store.snapshot().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_unique_object_ids() {
        let id1 = generate_object_id();
        let id2 = generate_object_id();
        assert_ne!(id1, id2);
        assert!(id1.starts_with("obj_"));
    }
}
