use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use super::{AssetFilter, AssetPatch, AssetStore, SortOrder, StatusGuard, StoreError};
use crate::assets::{Asset, AssetId, NewAssetRecord};

/// Ordered set of asset documents with the store operations applied in place.
///
/// Shared by the in-memory store and the file store, which persists it as JSON.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct AssetCollection {
    #[serde(default)]
    next_sequence: u64,
    #[serde(default)]
    assets: Vec<Asset>,
}

impl AssetCollection {
    pub(crate) fn insert(&mut self, record: NewAssetRecord) -> Asset {
        self.next_sequence += 1;
        let asset = record.into_asset(AssetId::new(), self.next_sequence);
        self.assets.push(asset.clone());
        debug!(asset_id = %asset.id, sequence = asset.sequence, "Inserted asset");
        asset
    }

    pub(crate) fn find_by_id(&self, id: &AssetId) -> Option<Asset> {
        self.assets.iter().find(|asset| asset.id == *id).cloned()
    }

    pub(crate) fn find_where(
        &self,
        filter: &AssetFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Vec<Asset> {
        let mut found: Vec<Asset> = self
            .assets
            .iter()
            .filter(|asset| filter.matches(asset))
            .cloned()
            .collect();
        sort.sort(&mut found);
        if let Some(limit) = limit {
            found.truncate(limit);
        }
        found
    }

    pub(crate) fn update_one(
        &mut self,
        id: &AssetId,
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> u64 {
        match self
            .assets
            .iter_mut()
            .find(|asset| asset.id == *id && guard.permits(asset.status))
        {
            Some(asset) => {
                patch.apply(asset);
                1
            }
            None => 0,
        }
    }

    pub(crate) fn update_many(
        &mut self,
        ids: &[AssetId],
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> u64 {
        let targeted = |asset: &Asset| ids.contains(&asset.id) && guard.permits(asset.status);

        let matching = self.assets.iter().filter(|asset| targeted(asset)).count();
        if guard.is_conditional() && matching != ids.len() {
            debug!(
                requested = ids.len(),
                matching, "Guarded update_many rejected; nothing written"
            );
            return 0;
        }

        for asset in self.assets.iter_mut().filter(|asset| targeted(asset)) {
            patch.apply(asset);
        }
        matching as u64
    }

    pub(crate) fn delete_one(&mut self, id: &AssetId) -> u64 {
        let before = self.assets.len();
        self.assets.retain(|asset| asset.id != *id);
        (before - self.assets.len()) as u64
    }
}

/// Process-local store; every operation runs under a single `RwLock`
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    collection: RwLock<AssetCollection>,
    closed: AtomicBool,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.write().await.insert(record))
    }

    async fn find_all(&self) -> Result<Vec<Asset>, StoreError> {
        self.find_where(&AssetFilter::all(), SortOrder::OldestFirst, None)
            .await
    }

    async fn find_by_id(&self, id: &AssetId) -> Result<Option<Asset>, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.read().await.find_by_id(id))
    }

    async fn find_where(
        &self,
        filter: &AssetFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Asset>, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.read().await.find_where(filter, sort, limit))
    }

    async fn update_one(
        &self,
        id: &AssetId,
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.write().await.update_one(id, guard, patch))
    }

    async fn update_many(
        &self,
        ids: &[AssetId],
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.write().await.update_many(ids, guard, patch))
    }

    async fn delete_one(&self, id: &AssetId) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.collection.write().await.delete_one(id))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
