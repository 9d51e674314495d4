//! Gallery manifest persistence.
//!
//! The manifest is an ordered JSON list of item records. It is the only
//! file format this system owns: images themselves live behind the
//! `image` handle and are some other component's problem.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::{Item, ItemId, ItemPool};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("manifest i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest parse: {0}")]
    Parse(#[from] serde_json::Error),
}

// ════════════════════════════════════════════════════════════════════════════
// Records
// ════════════════════════════════════════════════════════════════════════════

/// One persisted item. Positions are stored exactly as generated at upload
/// time and are never recomputed on load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: u64,
    pub image: String,
    pub assembled: [f32; 3],
    pub dispersed: [f32; 3],
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Manifest {
    pub items: Vec<ItemRecord>,
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        ItemRecord {
            id: item.id.0,
            image: item.image.clone(),
            assembled: item.assembled.to_array(),
            dispersed: item.dispersed.to_array(),
        }
    }
}

impl From<ItemRecord> for Item {
    fn from(rec: ItemRecord) -> Self {
        Item {
            id: ItemId(rec.id),
            image: rec.image,
            assembled: Vec3::from_array(rec.assembled),
            dispersed: Vec3::from_array(rec.dispersed),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Load / save
// ════════════════════════════════════════════════════════════════════════════

/// Read a manifest and rebuild the pool in record order.
pub fn load_manifest(path: &Path) -> Result<ItemPool, StoreError> {
    let text = fs::read_to_string(path)?;
    let manifest: Manifest = serde_json::from_str(&text)?;

    let mut pool = ItemPool::new();
    for record in manifest.items {
        pool.insert(record.into());
    }
    Ok(pool)
}

/// Write the pool back out, preserving its insertion order.
pub fn save_manifest(path: &Path, pool: &ItemPool) -> Result<(), StoreError> {
    let manifest = Manifest {
        items: pool.items().iter().map(ItemRecord::from).collect(),
    };
    let text = serde_json::to_string_pretty(&manifest)?;
    fs::write(path, text)?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_preserves_order_and_positions() {
        let mut pool = ItemPool::new();
        pool.upload("first.jpg", Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        pool.upload("second.jpg", Vec3::new(-1.0, 0.5, 0.0), Vec3::new(0.0, -7.0, 2.0));

        let path = std::env::temp_dir().join("gallery_scene_store_test.json");
        save_manifest(&path, &pool).unwrap();
        let restored = load_manifest(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(restored.len(), 2);
        let a = restored.nth(0).unwrap();
        assert_eq!(a.image, "first.jpg");
        assert_eq!(a.assembled, Vec3::new(1.0, 2.0, 3.0));
        let b = restored.nth(1).unwrap();
        assert_eq!(b.dispersed, Vec3::new(0.0, -7.0, 2.0));
    }

    #[test]
    fn restored_pool_keeps_allocating_fresh_ids() {
        let mut pool = ItemPool::new();
        pool.upload("a", Vec3::ZERO, Vec3::ZERO);
        let last = pool.upload("b", Vec3::ZERO, Vec3::ZERO);

        let path = std::env::temp_dir().join("gallery_scene_store_ids_test.json");
        save_manifest(&path, &pool).unwrap();
        let mut restored = load_manifest(&path).unwrap();
        fs::remove_file(&path).ok();

        let fresh = restored.upload("c", Vec3::ZERO, Vec3::ZERO);
        assert!(fresh > last);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_manifest(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
    }
}
