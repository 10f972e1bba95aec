#![allow(dead_code)]

// Shared builders for the integration tests
use asset_dispatch::store::{AssetStore, MemoryAssetStore};
use asset_dispatch::workflow::{DispatchEngine, EngineConfig};
use asset_dispatch::{Asset, NewAssetRecord};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

/// Engine over a fresh in-memory store, also returning the store handle
pub fn memory_engine() -> (Arc<DispatchEngine>, Arc<dyn AssetStore>) {
    let store: Arc<dyn AssetStore> = Arc::new(MemoryAssetStore::new());
    let engine = Arc::new(DispatchEngine::new(
        Arc::clone(&store),
        EngineConfig::default(),
    ));
    (engine, store)
}

/// Insert an asset received `offset_secs` after `base_time()`
pub async fn receive(store: &Arc<dyn AssetStore>, serial: &str, offset_secs: i64) -> Asset {
    store
        .insert(NewAssetRecord::intake(
            format!("Asset {serial}"),
            serial.to_string(),
            base_time() + Duration::seconds(offset_secs),
        ))
        .await
        .unwrap()
}
