// Dispatch workflow engine
//
// Owns the store handle and enforces the FIFO allocation and transition rules.
// Status-dependent writes are always conditional on the status that was read.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn, Instrument};

use super::allocator::{
    allocation_patch, select_fifo, validate_quantity, AllocationResult, BatchIdGenerator,
};
use super::stats::StockStats;
use super::transitions::{plan_transition, WorkflowAction};
use crate::assets::{Asset, AssetId, AssetStatus, NewAssetRecord};
use crate::config::EngineSettings;
use crate::errors::{DispatchError, Result};
use crate::store::{AssetFilter, AssetPatch, AssetStore, SortOrder, StatusGuard, StoreError};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

/// Guarded writes are attempted at most this many times before reporting a conflict
const MAX_UPDATE_ATTEMPTS: usize = 2;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on every single store call
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5000),
        }
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            store_timeout: Duration::from_millis(settings.store_timeout_ms),
        }
    }
}

/// Snapshot of every asset plus the stock counts computed from that same snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub assets: Vec<Asset>,
    pub stats: StockStats,
}

pub struct DispatchEngine {
    store: Arc<dyn AssetStore>,
    config: EngineConfig,
    // serializes select-then-claim so concurrent requests never see the same candidates
    allocation_lock: Mutex<()>,
    batch_ids: BatchIdGenerator,
}

impl DispatchEngine {
    pub fn new(store: Arc<dyn AssetStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            allocation_lock: Mutex::new(()),
            batch_ids: BatchIdGenerator::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    async fn store_call<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Asset store call failed");
                Err(e.into())
            }
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    "Asset store call timed out"
                );
                Err(StoreError::Timeout(self.config.store_timeout).into())
            }
        }
    }

    async fn require_asset(&self, id: &AssetId) -> Result<Asset> {
        self.store_call("find_by_id", self.store.find_by_id(id))
            .await?
            .ok_or_else(|| DispatchError::not_found(id))
    }

    /// All assets in FIFO order with their stock stats
    pub async fn list_assets_with_stats(&self) -> Result<Inventory> {
        let assets = self.store_call("find_all", self.store.find_all()).await?;
        let stats = StockStats::from_assets(&assets);
        debug!(total = stats.total, "Inventory snapshot read");
        Ok(Inventory { assets, stats })
    }

    pub async fn get_asset(&self, id: &AssetId) -> Result<Asset> {
        self.require_asset(id).await
    }

    /// Register a new asset at the warehouse
    pub async fn create_asset(&self, description: &str, serial_number: &str) -> Result<Asset> {
        let description = description.trim();
        let serial_number = serial_number.trim();
        if description.is_empty() || serial_number.is_empty() {
            warn!("Rejected asset intake with missing description or serial number");
            return Err(DispatchError::validation(
                "description and serial_number are required",
            ));
        }

        let record =
            NewAssetRecord::intake(description.to_string(), serial_number.to_string(), Utc::now());
        let asset = self.store_call("insert", self.store.insert(record)).await?;
        info!(asset_id = %asset.id, serial = %asset.serial_number, "Asset registered");
        Ok(asset)
    }

    /// Claim the oldest `quantity` available assets under a fresh batch id
    pub async fn allocate(&self, quantity: i64) -> Result<AllocationResult> {
        let requested = match validate_quantity(quantity) {
            Ok(requested) => requested,
            Err(e) => {
                warn!(quantity, "Rejected allocation request: {}", e);
                return Err(e);
            }
        };

        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("allocate", None, Some(&correlation_id));

        async move {
            let _critical = self.allocation_lock.lock().await;

            let candidates = self
                .store_call(
                    "find_where",
                    self.store.find_where(
                        &AssetFilter::with_status(AssetStatus::Available),
                        SortOrder::OldestFirst,
                        Some(requested),
                    ),
                )
                .await?;

            let asset_ids = match select_fifo(&candidates, requested) {
                Ok(ids) => ids,
                Err(e) => {
                    warn!(requested, available = candidates.len(), "Insufficient stock");
                    return Err(e);
                }
            };

            let batch = self.batch_ids.next_id();
            let matched = self
                .store_call(
                    "update_many",
                    self.store.update_many(
                        &asset_ids,
                        &StatusGuard::only(AssetStatus::Available),
                        &allocation_patch(&batch),
                    ),
                )
                .await?;

            if matched != asset_ids.len() as u64 {
                warn!(
                    batch = %batch,
                    matched,
                    requested,
                    "Allocation lost a race, nothing claimed"
                );
                return Err(DispatchError::Conflict {
                    reason: format!(
                        "selected assets were modified before batch {batch} could claim them"
                    ),
                });
            }

            info!(batch = %batch, allocated = matched, "Assets allocated");
            Ok(AllocationResult {
                batch,
                allocated: matched,
                asset_ids,
            })
        }
        .instrument(span)
        .await
    }

    /// Apply a named workflow action; unknown names are rejected as invalid transitions
    pub async fn apply_transition(&self, id: &AssetId, action: &str) -> Result<Asset> {
        let current = self.require_asset(id).await?;
        let action = match WorkflowAction::parse_for(action, current.status) {
            Ok(action) => action,
            Err(e) => {
                warn!(asset_id = %id, action, "Unknown workflow action");
                return Err(e);
            }
        };
        self.run_transition(current, action).await
    }

    pub async fn transition(&self, id: &AssetId, action: WorkflowAction) -> Result<Asset> {
        let current = self.require_asset(id).await?;
        self.run_transition(current, action).await
    }

    async fn run_transition(&self, current: Asset, action: WorkflowAction) -> Result<Asset> {
        let id = current.id;
        let asset_id = id.to_string();
        let span = create_workflow_span(action.as_str(), Some(&asset_id), None);

        async move {
            let from = current.status;
            let updated = self
                .guarded_update(current, |asset| plan_transition(asset, action))
                .await;
            match &updated {
                Ok(asset) => info!(
                    asset_id = %id,
                    action = %action,
                    from = %from,
                    to = %asset.status,
                    "Asset transitioned"
                ),
                Err(e) => warn!(asset_id = %id, action = %action, "Transition rejected: {}", e),
            }
            updated
        }
        .instrument(span)
        .await
    }

    /// Move an asset that has not yet left the site
    pub async fn relocate(&self, id: &AssetId, location: &str) -> Result<Asset> {
        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(DispatchError::validation("location must not be empty"));
        }

        let current = self.require_asset(id).await?;
        let updated = self
            .guarded_update(current, |asset| {
                if asset.status == AssetStatus::Dispatched {
                    return Err(DispatchError::invalid_transition("relocate", asset.status));
                }
                Ok(AssetPatch::new().location(location.clone()))
            })
            .await;

        match &updated {
            Ok(asset) => info!(asset_id = %id, location = %asset.location, "Asset relocated"),
            Err(e) => warn!(asset_id = %id, "Relocation rejected: {}", e),
        }
        updated
    }

    /// Write the patch planned for `current`, conditional on the status it was planned from.
    ///
    /// A guard miss means another writer got there first: the asset is re-read and
    /// re-planned once, so the caller sees `AssetNotFound` or `InvalidTransition` for
    /// the fresh state, or `Conflict` if the write keeps losing. On success the stored
    /// document is read back, so fields written by other workers are reflected as well.
    async fn guarded_update<P>(&self, mut current: Asset, plan: P) -> Result<Asset>
    where
        P: Fn(&Asset) -> Result<AssetPatch>,
    {
        let id = current.id;
        let mut attempt = 1;
        loop {
            let patch = plan(&current)?;
            let matched = self
                .store_call(
                    "update_one",
                    self.store
                        .update_one(&id, &StatusGuard::only(current.status), &patch),
                )
                .await?;

            if matched > 0 {
                return self.require_asset(&id).await;
            }
            if attempt == MAX_UPDATE_ATTEMPTS {
                return Err(DispatchError::Conflict {
                    reason: format!("asset {id} kept changing during update"),
                });
            }

            debug!(asset_id = %id, attempt, "Guarded update missed, re-reading asset");
            attempt += 1;
            current = self.require_asset(&id).await?;
        }
    }

    /// Assets claimed by `batch`, oldest first
    pub async fn batch_assets(&self, batch: &str) -> Result<Vec<Asset>> {
        let batch = batch.trim();
        if batch.is_empty() {
            return Err(DispatchError::validation("batch id must not be empty"));
        }
        self.store_call(
            "find_where",
            self.store
                .find_where(&AssetFilter::in_batch(batch), SortOrder::OldestFirst, None),
        )
        .await
    }

    /// Remove an asset regardless of its status
    pub async fn delete_asset(&self, id: &AssetId) -> Result<()> {
        let deleted = self.store_call("delete_one", self.store.delete_one(id)).await?;
        if deleted == 0 {
            warn!(asset_id = %id, "Delete requested for unknown asset");
            return Err(DispatchError::not_found(id));
        }
        info!(asset_id = %id, "Asset deleted");
        Ok(())
    }

    /// Close the underlying store; later operations fail with `StoreUnavailable`
    pub async fn shutdown(&self) -> Result<()> {
        self.store_call("close", self.store.close()).await?;
        info!("Dispatch engine shut down");
        Ok(())
    }
}
