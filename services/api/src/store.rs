//! Asset store for the captioning session
//!
//! Every mutation builds a new [`StoreSnapshot`] from the current one and
//! swaps it in whole, so a reader holding an `Arc<StoreSnapshot>` never sees
//! a half-applied change. Observers subscribe to the underlying watch channel.

use common::{CaptionSet, CaptionSlot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::media::{Asset, AssetId};

/// Immutable view of the session's assets, selection and active asset
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    order: Vec<AssetId>,
    assets: HashMap<AssetId, Arc<Asset>>,
    selection: Vec<AssetId>,
    active: Option<AssetId>,
}

impl StoreSnapshot {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Assets in ingestion order
    pub fn assets(&self) -> impl Iterator<Item = &Arc<Asset>> {
        self.order.iter().filter_map(|id| self.assets.get(id))
    }

    pub fn get(&self, id: &AssetId) -> Option<&Arc<Asset>> {
        self.assets.get(id)
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    /// Selected ids in selection order, restricted to assets that exist
    pub fn selected_ids(&self) -> Vec<AssetId> {
        self.selection
            .iter()
            .filter(|id| self.contains(id))
            .cloned()
            .collect()
    }

    pub fn is_selected(&self, id: &AssetId) -> bool {
        self.contains(id) && self.selection.contains(id)
    }

    pub fn active_id(&self) -> Option<&AssetId> {
        self.active.as_ref().filter(|id| self.contains(id))
    }

    /// Append a batch in input order; the first new asset becomes active and
    /// the sole selected asset.
    pub fn with_ingested(&self, assets: Vec<Asset>) -> (Self, Vec<AssetId>) {
        let mut next = self.clone();
        let mut ids = Vec::with_capacity(assets.len());

        for mut asset in assets {
            while next.assets.contains_key(&asset.id) {
                debug!("Asset id collision for {}, re-rolling", asset.id);
                asset.id = AssetId::generate(&asset.source.file_name, asset.source.last_modified);
            }
            ids.push(asset.id.clone());
            next.order.push(asset.id.clone());
            next.assets.insert(asset.id.clone(), Arc::new(asset));
        }

        if let Some(first) = ids.first() {
            next.active = Some(first.clone());
            next.selection = vec![first.clone()];
        }

        (next, ids)
    }

    /// Activate `id` and toggle its selection.
    ///
    /// Additive toggles membership and leaves the rest of the selection alone.
    /// Non-additive replaces the selection with `{id}`, except that when `id`
    /// is already the only selected asset the selection becomes empty.
    pub fn with_selection_toggled(&self, id: &AssetId, additive: bool) -> Option<Self> {
        if !self.contains(id) {
            return None;
        }

        let current = self.selected_ids();
        let selection = if additive {
            let mut working = current;
            match working.iter().position(|selected| selected == id) {
                Some(index) => {
                    working.remove(index);
                }
                None => working.push(id.clone()),
            }
            working
        } else if current.len() == 1 && current[0] == *id {
            Vec::new()
        } else {
            vec![id.clone()]
        };

        let mut next = self.clone();
        next.selection = selection;
        next.active = Some(id.clone());
        Some(next)
    }

    /// Replace an asset's captions wholesale
    pub fn with_captions(&self, id: &AssetId, captions: CaptionSet) -> Option<Self> {
        let current = self.assets.get(id)?;
        let mut asset = Asset::clone(current);
        asset.captions = Some(captions);

        let mut next = self.clone();
        next.assets.insert(id.clone(), Arc::new(asset));
        Some(next)
    }

    /// Replace the text of one caption slot, keeping its id and the other slots
    pub fn with_caption_text(&self, id: &AssetId, slot: CaptionSlot, text: &str) -> Option<Self> {
        let current = self.assets.get(id)?;
        let captions = current.captions.as_ref()?.with_text(slot, text);
        let mut asset = Asset::clone(current);
        asset.captions = Some(captions);

        let mut next = self.clone();
        next.assets.insert(id.clone(), Arc::new(asset));
        Some(next)
    }
}

/// Shared handle to the session's asset state
#[derive(Clone)]
pub struct AssetStore {
    state: Arc<watch::Sender<Arc<StoreSnapshot>>>,
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(StoreSnapshot::default()));
        Self {
            state: Arc::new(state),
        }
    }

    /// Current snapshot; cheap to clone and never mutated in place
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.state.borrow().clone()
    }

    /// Receiver notified after every effective mutation
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.state.subscribe()
    }

    fn apply<F>(&self, transition: F) -> bool
    where
        F: FnOnce(&StoreSnapshot) -> Option<StoreSnapshot>,
    {
        self.state.send_if_modified(|current| match transition(current) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    /// Add a batch of assets, returning their ids in input order
    pub fn ingest(&self, assets: Vec<Asset>) -> Vec<AssetId> {
        if assets.is_empty() {
            return Vec::new();
        }

        let mut ids = Vec::new();
        self.state.send_modify(|current| {
            let (next, new_ids) = current.with_ingested(assets);
            *current = Arc::new(next);
            ids = new_ids;
        });

        info!("Ingested {} assets", ids.len());
        ids
    }

    /// Returns false when `id` is not in the store
    pub fn select_toggle(&self, id: &AssetId, additive: bool) -> bool {
        self.apply(|current| current.with_selection_toggled(id, additive))
    }

    /// No-op (returns false) when the asset no longer exists
    pub fn merge_captions(&self, id: &AssetId, captions: CaptionSet) -> bool {
        let merged = self.apply(|current| current.with_captions(id, captions));
        if !merged {
            debug!("Dropping captions for missing asset {}", id);
        }
        merged
    }

    /// No-op (returns false) when the asset or its captions are absent
    pub fn edit_caption_text(&self, id: &AssetId, slot: CaptionSlot, text: &str) -> bool {
        self.apply(|current| current.with_caption_text(id, slot, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::SourceFile;
    use bytes::Bytes;
    use chrono::Utc;
    use common::MediaKind;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn asset(name: &str, kind: MediaKind) -> Asset {
        let modified = Utc::now();
        let source = Arc::new(SourceFile {
            path: PathBuf::from(format!("/tmp/{}", name)),
            file_name: name.to_string(),
            mime_type: match kind {
                MediaKind::Image => "image/jpeg".to_string(),
                MediaKind::Video => "video/mp4".to_string(),
            },
            last_modified: modified,
            size: 1,
        });
        Asset::new(AssetId::generate(name, modified), source, kind, None)
    }

    fn captions() -> CaptionSet {
        CaptionSet::from_texts("Title", "Short", "Long", "#one #two")
    }

    #[test]
    fn test_ids_unique_across_ingests() {
        let store = AssetStore::new();
        let mut seen = HashSet::new();
        for _ in 0..5 {
            let ids = store.ingest(vec![
                asset("cat.jpg", MediaKind::Image),
                asset("cat.jpg", MediaKind::Image),
            ]);
            for id in ids {
                assert!(seen.insert(id), "duplicate asset id");
            }
        }
        assert_eq!(store.snapshot().len(), 10);
    }

    #[test]
    fn test_colliding_id_is_rerolled() {
        let store = AssetStore::new();
        let first = asset("dup.jpg", MediaKind::Image);
        let mut second = asset("dup.jpg", MediaKind::Image);
        second.id = first.id.clone();

        let ids = store.ingest(vec![first, second]);
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn test_ingest_resets_selection_to_first_new_asset() {
        let store = AssetStore::new();
        let old = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        store.select_toggle(&old[0], true);

        let new = store.ingest(vec![
            asset("b.jpg", MediaKind::Image),
            asset("c.mp4", MediaKind::Video),
        ]);
        let snapshot = store.snapshot();

        assert_eq!(snapshot.active_id(), Some(&new[0]));
        assert_eq!(snapshot.selected_ids(), vec![new[0].clone()]);
        let order: Vec<_> = snapshot.assets().map(|a| a.id.clone()).collect();
        assert_eq!(order, vec![old[0].clone(), new[0].clone(), new[1].clone()]);
    }

    #[test]
    fn test_empty_ingest_leaves_state_untouched() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        assert!(store.ingest(Vec::new()).is_empty());
        assert_eq!(store.snapshot().active_id(), Some(&ids[0]));
    }

    #[test]
    fn test_single_image_scenario() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("cat.jpg", MediaKind::Image)]);
        let snapshot = store.snapshot();
        let cat = snapshot.get(&ids[0]).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(cat.media_kind, MediaKind::Image);
        assert_eq!(cat.poster_url(), cat.preview_url());
        assert!(cat.captions.is_none());
    }

    #[test]
    fn test_non_additive_click_on_sole_selection_deselects() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);

        assert!(store.select_toggle(&ids[0], false));
        let snapshot = store.snapshot();
        assert!(snapshot.selected_ids().is_empty());
        assert_eq!(snapshot.active_id(), Some(&ids[0]));
    }

    #[test]
    fn test_non_additive_click_replaces_selection() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![
            asset("a.jpg", MediaKind::Image),
            asset("b.jpg", MediaKind::Image),
            asset("c.jpg", MediaKind::Image),
        ]);
        store.select_toggle(&ids[1], true);

        store.select_toggle(&ids[2], false);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.selected_ids(), vec![ids[2].clone()]);
        assert_eq!(snapshot.active_id(), Some(&ids[2]));

        // Clicking a selected member of a larger selection narrows to it.
        store.select_toggle(&ids[0], true);
        store.select_toggle(&ids[0], false);
        assert_eq!(store.snapshot().selected_ids(), vec![ids[0].clone()]);
    }

    #[test]
    fn test_additive_toggle_preserves_other_members() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![
            asset("a.jpg", MediaKind::Image),
            asset("b.jpg", MediaKind::Image),
            asset("c.jpg", MediaKind::Image),
        ]);

        store.select_toggle(&ids[1], true);
        store.select_toggle(&ids[2], true);
        assert_eq!(store.snapshot().selected_ids(), ids);

        store.select_toggle(&ids[1], true);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.selected_ids(), vec![ids[0].clone(), ids[2].clone()]);
        assert_eq!(snapshot.active_id(), Some(&ids[1]));
        assert!(!snapshot.is_selected(&ids[1]));
    }

    #[test]
    fn test_select_unknown_id_is_rejected() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);

        assert!(!store.select_toggle(&AssetId::from("missing"), false));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.active_id(), Some(&ids[0]));
        assert_eq!(snapshot.selected_ids(), ids);
    }

    #[test]
    fn test_merge_captions_sets_complete_set() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        let set = captions();

        assert!(store.merge_captions(&ids[0], set.clone()));
        let snapshot = store.snapshot();
        let merged = snapshot.get(&ids[0]).unwrap().captions.as_ref().unwrap();
        assert_eq!(merged, &set);
        for slot in CaptionSlot::ALL {
            assert!(!merged.get(slot).id.is_empty());
        }
    }

    #[test]
    fn test_merge_captions_for_missing_asset_is_noop() {
        let store = AssetStore::new();
        store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        let before = store.snapshot();

        assert!(!store.merge_captions(&AssetId::from("gone"), captions()));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_edit_caption_text_changes_only_that_slot() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        store.merge_captions(&ids[0], captions());
        let before = store.snapshot().get(&ids[0]).unwrap().captions.clone().unwrap();

        assert!(store.edit_caption_text(&ids[0], CaptionSlot::Short, "New text"));
        let after = store.snapshot().get(&ids[0]).unwrap().captions.clone().unwrap();

        assert_eq!(after.short.text, "New text");
        assert_eq!(after.short.id, before.short.id);
        assert_eq!(after.seo_title, before.seo_title);
        assert_eq!(after.long, before.long);
        assert_eq!(after.hashtags, before.hashtags);
    }

    #[test]
    fn test_edit_without_captions_is_noop() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.jpg", MediaKind::Image)]);

        assert!(!store.edit_caption_text(&ids[0], CaptionSlot::Long, "text"));
        assert!(!store.edit_caption_text(&AssetId::from("missing"), CaptionSlot::Long, "text"));
        assert!(store.snapshot().get(&ids[0]).unwrap().captions.is_none());
    }

    #[test]
    fn test_old_snapshots_are_not_mutated() {
        let store = AssetStore::new();
        let ids = store.ingest(vec![asset("a.mp4", MediaKind::Video)]);
        let before = store.snapshot();

        store.merge_captions(&ids[0], captions());
        assert!(before.get(&ids[0]).unwrap().captions.is_none());
        assert!(store.snapshot().get(&ids[0]).unwrap().captions.is_some());
    }

    #[test]
    fn test_video_with_poster_keeps_distinct_url() {
        let store = AssetStore::new();
        let mut clip = asset("clip.mp4", MediaKind::Video);
        clip.poster = Some(Bytes::from_static(&[0xFF, 0xD8, 0xFF]));
        let ids = store.ingest(vec![clip]);

        let snapshot = store.snapshot();
        let stored = snapshot.get(&ids[0]).unwrap();
        assert_eq!(stored.media_kind, MediaKind::Video);
        assert_ne!(stored.poster_url(), stored.preview_url());
    }

    #[tokio::test]
    async fn test_subscribers_notified_only_on_change() {
        let store = AssetStore::new();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.merge_captions(&AssetId::from("missing"), captions());
        assert!(!rx.has_changed().unwrap());

        store.ingest(vec![asset("a.jpg", MediaKind::Image)]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
