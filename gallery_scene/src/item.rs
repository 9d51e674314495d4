//! Gallery items and the pool they live in.

use glam::Vec3;
use std::fmt;

// ════════════════════════════════════════════════════════════════════════════
// ItemId
// ════════════════════════════════════════════════════════════════════════════

/// Stable identifier for a gallery item.
///
/// Assigned once at upload time and preserved across sessions by the
/// manifest; never reused within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Item
// ════════════════════════════════════════════════════════════════════════════

/// A single photo (or ornament) in the gallery.
///
/// Both target positions are fixed when the item is created; repositioning
/// an item means deleting it and uploading a regenerated one.
#[derive(Clone, Debug)]
pub struct Item {
    pub id: ItemId,
    /// Image URL or storage handle. Never decoded here.
    pub image: String,
    /// Slot on the assembled cone arrangement.
    pub assembled: Vec3,
    /// Slot on the dispersed sphere band.
    pub dispersed: Vec3,
}

// ════════════════════════════════════════════════════════════════════════════
// ItemPool
// ════════════════════════════════════════════════════════════════════════════

/// The pool of gallery items.
///
/// Iteration order is insertion order (the round-robin focus cursor indexes
/// into it); lookups are by id. The pool is mutated only by upload and
/// delete, never by the per-tick pipeline.
#[derive(Debug, Default)]
pub struct ItemPool {
    items: Vec<Item>,
    next_id: u64,
}

impl ItemPool {
    pub fn new() -> Self {
        ItemPool::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn nth(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Insert a fully-formed item, e.g. one restored from the manifest.
    /// Keeps the id counter ahead of every persisted id.
    pub fn insert(&mut self, item: Item) {
        self.next_id = self.next_id.max(item.id.0 + 1);
        self.items.push(item);
    }

    /// Allocate a fresh id and append a new item with the given positions.
    pub fn upload(&mut self, image: &str, assembled: Vec3, dispersed: Vec3) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        self.items.push(Item {
            id,
            image: image.to_string(),
            assembled,
            dispersed,
        });
        id
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == id)?;
        Some(self.items.remove(index))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(n: usize) -> ItemPool {
        let mut pool = ItemPool::new();
        for i in 0..n {
            pool.upload(&format!("img-{}", i), Vec3::ZERO, Vec3::ONE);
        }
        pool
    }

    #[test]
    fn upload_assigns_distinct_ids() {
        let mut pool = ItemPool::new();
        let a = pool.upload("a", Vec3::ZERO, Vec3::ZERO);
        let b = pool.upload("b", Vec3::ZERO, Vec3::ZERO);
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn lookup_by_id_and_index() {
        let pool = pool_of(3);
        let second = pool.nth(1).unwrap().id;
        assert_eq!(pool.get(second).unwrap().image, "img-1");
    }

    #[test]
    fn remove_returns_item_and_shrinks() {
        let mut pool = pool_of(3);
        let victim = pool.nth(0).unwrap().id;
        assert!(pool.remove(victim).is_some());
        assert_eq!(pool.len(), 2);
        assert!(pool.get(victim).is_none());
        // Removing again is a no-op
        assert!(pool.remove(victim).is_none());
    }

    #[test]
    fn ids_not_reused_after_remove() {
        let mut pool = pool_of(2);
        let last = pool.nth(1).unwrap().id;
        pool.remove(last);
        let fresh = pool.upload("c", Vec3::ZERO, Vec3::ZERO);
        assert!(fresh > last);
    }

    #[test]
    fn insert_keeps_id_counter_ahead() {
        let mut pool = ItemPool::new();
        pool.insert(Item {
            id: ItemId(41),
            image: "persisted".into(),
            assembled: Vec3::ZERO,
            dispersed: Vec3::ZERO,
        });
        let fresh = pool.upload("new", Vec3::ZERO, Vec3::ZERO);
        assert!(fresh.0 > 41);
    }
}
