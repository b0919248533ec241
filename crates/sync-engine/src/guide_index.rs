// crates/sync-engine/src/guide_index.rs
//! Guide custom formats indexed by content key

use crate::cache::IdentityCacheStore;
use crate::error::SyncResult;
use guidesync_core::{ContentKey, InstanceName};
use guidesync_guide::GuideCustomFormat;
use std::collections::HashMap;

/// What the score passes need to know about one custom format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFormat {
    pub trash_id: ContentKey,
    pub name: String,
    pub default_score: Option<i32>,
    /// Numeric service id, once the format exists remotely
    pub remote_id: Option<i64>,
}

/// Lookup table from content key to custom format
#[derive(Debug, Clone, Default)]
pub struct GuideIndex {
    formats: HashMap<ContentKey, IndexedFormat>,
}

impl GuideIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes guide formats, resolving remote ids through the identity cache
    pub fn build(
        formats: &[GuideCustomFormat],
        cache: &dyn IdentityCacheStore,
        instance: &InstanceName,
    ) -> SyncResult<Self> {
        let mut index = Self::new();
        for cf in formats {
            let remote_id = cache
                .lookup(instance, &cf.trash_id)?
                .and_then(|id| id.as_i64());
            index.insert(IndexedFormat {
                trash_id: cf.trash_id.clone(),
                name: cf.name.clone(),
                default_score: cf.default_score,
                remote_id,
            });
        }
        Ok(index)
    }

    /// Adds a format; an existing entry with the same key is kept
    pub fn insert(&mut self, format: IndexedFormat) {
        self.formats.entry(format.trash_id.clone()).or_insert(format);
    }

    /// Sets the remote id of a format that has none yet
    pub fn assign_remote_id(&mut self, key: &ContentKey, id: i64) {
        if let Some(format) = self.formats.get_mut(key) {
            format.remote_id.get_or_insert(id);
        }
    }

    pub fn get(&self, key: &ContentKey) -> Option<&IndexedFormat> {
        self.formats.get(key)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::types::CacheEntry;
    use guidesync_core::RemoteId;
    use serde_json::json;

    #[test]
    fn test_build_resolves_cached_ids() {
        let formats = vec![
            GuideCustomFormat::from_document(json!({ "trash_id": "a1", "trash_score": 10, "name": "A" }))
                .unwrap(),
            GuideCustomFormat::from_document(json!({ "trash_id": "b2", "name": "B" })).unwrap(),
        ];
        let instance = InstanceName::new("movies");
        let cache = MemoryCacheStore::new();
        cache
            .store(&instance, CacheEntry::new("a1".into(), "A", RemoteId::from(9)))
            .unwrap();

        let index = GuideIndex::build(&formats, &cache, &instance).unwrap();
        assert_eq!(index.len(), 2);

        let a = index.get(&ContentKey::from("A1")).unwrap();
        assert_eq!(a.remote_id, Some(9));
        assert_eq!(a.default_score, Some(10));
        assert_eq!(index.get(&ContentKey::from("b2")).unwrap().remote_id, None);
    }

    #[test]
    fn test_first_insert_wins() {
        let mut index = GuideIndex::new();
        for name in ["first", "second"] {
            index.insert(IndexedFormat {
                trash_id: "k".into(),
                name: name.to_string(),
                default_score: None,
                remote_id: None,
            });
        }
        assert_eq!(index.get(&"k".into()).unwrap().name, "first");
    }
}
