//! JSON document file store
//!
//! The whole asset collection lives in one JSON file. Every operation takes an
//! advisory `fd-lock` on a sibling `.lock` file for its full read-modify-write
//! cycle, so several CLI processes pointed at the same file serialize cleanly.
//! Writes go to a temporary file that is renamed over the original.

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::memory::AssetCollection;
use super::{AssetFilter, AssetPatch, AssetStore, SortOrder, StatusGuard, StoreError};
use crate::assets::{Asset, AssetId, NewAssetRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

#[derive(Debug)]
pub struct FileAssetStore {
    path: Arc<PathBuf>,
    closed: AtomicBool,
}

impl FileAssetStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        let mut lock = path.as_os_str().to_owned();
        lock.push(".lock");
        PathBuf::from(lock)
    }

    fn load(path: &Path) -> Result<AssetCollection, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Ok(AssetCollection::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AssetCollection::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(path: &Path, collection: &AssetCollection) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(collection)?;
        let mut temp = path.as_os_str().to_owned();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, serialized)?;
        fs::rename(&temp, path)?;
        Ok(())
    }

    /// Run `op` against the collection while holding the file lock.
    ///
    /// `op` returns its result plus whether the collection changed; only a
    /// changed collection is written back.
    ///
    /// Dropping the returned future (for example when the engine's store timeout
    /// fires) cannot stop the blocking task, so a flag marks the call as abandoned
    /// and a write that has not reached `save` yet is skipped. A save already in
    /// progress still completes and its result is discarded.
    async fn with_collection<T, F>(&self, access: Access, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut AssetCollection) -> (T, bool) + Send + 'static,
    {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let path = Arc::clone(&self.path);
        let abandoned = Arc::new(AtomicBool::new(false));
        let _on_drop = AbandonOnDrop(Arc::clone(&abandoned));
        tokio::task::spawn_blocking(move || run_locked(&path, access, &abandoned, op))
            .await
            .map_err(|e| StoreError::Backend(format!("file store task failed: {e}")))?
    }
}

/// Marks an in-flight file operation as abandoned when its caller goes away
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

fn run_locked<T, F>(
    path: &Path,
    access: Access,
    abandoned: &AtomicBool,
    op: F,
) -> Result<T, StoreError>
where
    F: FnOnce(&mut AssetCollection) -> (T, bool),
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let lock_file: File = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(FileAssetStore::lock_path(path))?;
    let mut lock = FileLock::new(lock_file);

    match access {
        Access::Read => {
            let _guard = lock.read()?;
            let mut collection = FileAssetStore::load(path)?;
            let (out, _) = op(&mut collection);
            Ok(out)
        }
        Access::Write => {
            let _guard = lock.write()?;
            let mut collection = FileAssetStore::load(path)?;
            let (out, changed) = op(&mut collection);
            if changed {
                if abandoned.load(Ordering::Acquire) {
                    warn!(path = ?path, "Caller gave up before write, asset file left unchanged");
                    return Err(StoreError::Abandoned);
                }
                FileAssetStore::save(path, &collection)?;
                debug!(path = ?path, "Asset file written");
            }
            Ok(out)
        }
    }
}

#[async_trait]
impl AssetStore for FileAssetStore {
    async fn insert(&self, record: NewAssetRecord) -> Result<Asset, StoreError> {
        self.with_collection(Access::Write, move |collection| {
            (collection.insert(record), true)
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<Asset>, StoreError> {
        self.find_where(&AssetFilter::all(), SortOrder::OldestFirst, None)
            .await
    }

    async fn find_by_id(&self, id: &AssetId) -> Result<Option<Asset>, StoreError> {
        let id = *id;
        self.with_collection(Access::Read, move |collection| {
            (collection.find_by_id(&id), false)
        })
        .await
    }

    async fn find_where(
        &self,
        filter: &AssetFilter,
        sort: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Asset>, StoreError> {
        let filter = filter.clone();
        self.with_collection(Access::Read, move |collection| {
            (collection.find_where(&filter, sort, limit), false)
        })
        .await
    }

    async fn update_one(
        &self,
        id: &AssetId,
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        let (id, guard, patch) = (*id, guard.clone(), patch.clone());
        self.with_collection(Access::Write, move |collection| {
            let matched = collection.update_one(&id, &guard, &patch);
            (matched, matched > 0)
        })
        .await
    }

    async fn update_many(
        &self,
        ids: &[AssetId],
        guard: &StatusGuard,
        patch: &AssetPatch,
    ) -> Result<u64, StoreError> {
        let (ids, guard, patch) = (ids.to_vec(), guard.clone(), patch.clone());
        self.with_collection(Access::Write, move |collection| {
            let matched = collection.update_many(&ids, &guard, &patch);
            (matched, matched > 0)
        })
        .await
    }

    async fn delete_one(&self, id: &AssetId) -> Result<u64, StoreError> {
        let id = *id;
        self.with_collection(Access::Write, move |collection| {
            let deleted = collection.delete_one(&id);
            (deleted, deleted > 0)
        })
        .await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        info!(path = ?self.path, "File asset store closed");
        Ok(())
    }
}
