//! Asset store abstraction
//!
//! The workflow engine never talks to a database directly. It works against the
//! [`AssetStore`] document-store contract, which keeps the engine testable with
//! the in-memory backend and lets deployments pick a file or SQLite backend.
//!
//! Conditional updates carry a [`StatusGuard`]: a document is only modified when
//! its current status satisfies the guard. This is how the engine turns
//! "check status, then write" into a single atomic store operation.

pub mod file;
pub mod memory;
#[cfg(feature = "database")]
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use crate::assets::{Asset, AssetId, AssetStatus, NewAssetRecord};
use crate::config::{StoreBackend, StoreConfig};

pub use file::FileAssetStore;
pub use memory::MemoryAssetStore;
#[cfg(feature = "database")]
pub use sqlite::SqliteAssetStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(feature = "database")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt asset record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("Asset store is closed")]
    Closed,

    #[error("Store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Store call was abandoned before its write was committed")]
    Abandoned,

    #[error("Store backend failure: {0}")]
    Backend(String),
}

/// Precondition on the current status of a document for a conditional update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusGuard {
    /// Update regardless of status
    Any,
    /// Update only when the current status is one of these
    OneOf(Vec<AssetStatus>),
}

impl StatusGuard {
    pub fn only(status: AssetStatus) -> Self {
        StatusGuard::OneOf(vec![status])
    }

    pub fn permits(&self, status: AssetStatus) -> bool {
        match self {
            StatusGuard::Any => true,
            StatusGuard::OneOf(allowed) => allowed.contains(&status),
        }
    }

    pub fn is_conditional(&self) -> bool {
        !matches!(self, StatusGuard::Any)
    }
}

/// Change to the allocation batch carried by a patch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BatchUpdate {
    #[default]
    Keep,
    Set(String),
    Clear,
}

/// Field-level `$set` applied by `update_one` / `update_many`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPatch {
    pub status: Option<AssetStatus>,
    pub location: Option<String>,
    pub allocation_batch: BatchUpdate,
}

impl AssetPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: AssetStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn batch(mut self, batch: BatchUpdate) -> Self {
        self.allocation_batch = batch;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.location.is_none()
            && self.allocation_batch == BatchUpdate::Keep
    }

    pub fn apply(&self, asset: &mut Asset) {
        if let Some(status) = self.status {
            asset.status = status;
        }
        if let Some(location) = &self.location {
            asset.location = location.clone();
        }
        match &self.allocation_batch {
            BatchUpdate::Keep => {}
            BatchUpdate::Set(batch) => asset.allocation_batch = Some(batch.clone()),
            BatchUpdate::Clear => asset.allocation_batch = None,
        }
    }
}

/// Equality filter for `find_where`; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
    pub allocation_batch: Option<String>,
}

impl AssetFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: AssetStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn in_batch(batch: impl Into<String>) -> Self {
        Self {
            allocation_batch: Some(batch.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, asset: &Asset) -> bool {
        self.status.map_or(true, |status| asset.status == status)
            && self
                .allocation_batch
                .as_deref()
                .map_or(true, |batch| asset.allocation_batch.as_deref() == Some(batch))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending `(created_at, sequence)`: FIFO
    #[default]
    OldestFirst,
    NewestFirst,
}

impl SortOrder {
    pub fn sort(&self, assets: &mut [Asset]) {
        match self {
            SortOrder::OldestFirst => assets.sort_by_key(Asset::fifo_key),
            SortOrder::NewestFirst => {
                assets.sort_by_key(Asset::fifo_key);
                assets.reverse();
            }
        }
    }
}

/// Document-store contract consumed by the dispatch engine
///
/// `update_one` and `update_many` return the number of documents matched.
/// When the guard is conditional, `update_many` is all-or-nothing: either
/// every listed id exists and satisfies the guard and all are updated, or
/// nothing is written and `0` is returned.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, StoreError>;

    /// All assets in FIFO order
    async fn find_all(&self) -> Result<Vec<Asset>, StoreError>;

    async fn find_by_id(&self, id: &AssetId) -> Result<Option<Asset>, StoreError>;

    async fn find_where(
        &self,
        filter: &AssetFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Asset>, StoreError>;

    async fn update_one(
        &self,
        id: &AssetId,
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError>;

    async fn update_many(
        &self,
        ids: &[AssetId],
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, id: &AssetId) -> Result<u64, StoreError>;

    /// Release connections and file handles; later calls fail with `StoreError::Closed`
    async fn close(&self) -> Result<(), StoreError>;
}

/// Build the store backend selected in configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn AssetStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory asset store; data will not survive restart");
            Ok(Arc::new(MemoryAssetStore::new()))
        }
        StoreBackend::File => {
            info!(path = %config.path, "Using file asset store");
            Ok(Arc::new(FileAssetStore::new(&config.path)))
        }
        #[cfg(feature = "database")]
        StoreBackend::Sqlite => {
            let store = SqliteAssetStore::connect(
                &config.database_url,
                config.max_connections,
                config.auto_migrate,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "database"))]
        StoreBackend::Sqlite => Err(StoreError::Backend(
            "sqlite backend requires building with the `database` feature".to_string(),
        )),
    }
}
