// FIFO selection and allocation batch identifiers

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::assets::{Asset, AssetId, AssetStatus, STAGING_LOCATION};
use crate::errors::{DispatchError, Result};
use crate::store::{AssetPatch, BatchUpdate};

/// Outcome of a successful allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub batch: String,
    pub allocated: u64,
    /// Allocated assets, oldest first
    pub asset_ids: Vec<AssetId>,
}

/// Generates batch ids of the form `BATCH-<utc millis>-<counter>-<random>`.
///
/// The counter is process-monotonic, so ids minted within the same clock tick
/// still differ; the random suffix separates concurrent processes.
#[derive(Debug, Default)]
pub struct BatchIdGenerator {
    counter: AtomicU64,
}

impl BatchIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let suffix: u32 = rand::rng().random();
        format!(
            "BATCH-{}-{:04}-{:08x}",
            Utc::now().format("%Y%m%d%H%M%S%3f"),
            sequence,
            suffix
        )
    }
}

/// Validate a requested allocation quantity
pub fn validate_quantity(requested: i64) -> Result<usize> {
    if requested <= 0 {
        return Err(DispatchError::validation(format!(
            "quantity must be a positive integer, got {requested}"
        )));
    }
    usize::try_from(requested)
        .map_err(|_| DispatchError::validation(format!("quantity {requested} is too large")))
}

/// Pick the oldest `requested` candidates, or fail without selecting anything
///
/// `candidates` must already be in FIFO order.
pub fn select_fifo(candidates: &[Asset], requested: usize) -> Result<Vec<AssetId>> {
    let available: Vec<&Asset> = candidates
        .iter()
        .filter(|asset| asset.status == AssetStatus::Available)
        .collect();
    if available.len() < requested {
        return Err(DispatchError::InsufficientStock {
            requested: requested as u64,
            available: available.len() as u64,
        });
    }
    Ok(available
        .into_iter()
        .take(requested)
        .map(|asset| asset.id)
        .collect())
}

/// Patch applied to every asset claimed by `batch`
pub fn allocation_patch(batch: &str) -> AssetPatch {
    AssetPatch::new()
        .status(AssetStatus::Allocated)
        .location(STAGING_LOCATION)
        .batch(BatchUpdate::Set(batch.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::NewAssetRecord;
    use crate::errors::ErrorKind;
    use chrono::Duration;
    use std::collections::HashSet;

    fn stock(count: usize) -> Vec<Asset> {
        let start = Utc::now();
        (0..count)
            .map(|n| {
                NewAssetRecord::intake(
                    format!("Item {n}"),
                    format!("SN-{n}"),
                    start + Duration::seconds(n as i64),
                )
                .into_asset(AssetId::new(), n as u64 + 1)
            })
            .collect()
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert_eq!(validate_quantity(0).unwrap_err().kind(), ErrorKind::ValidationError);
        assert_eq!(validate_quantity(-3).unwrap_err().kind(), ErrorKind::ValidationError);
        assert_eq!(validate_quantity(4).unwrap(), 4);
    }

    #[test]
    fn test_select_takes_oldest_first() {
        let assets = stock(5);
        let selected = select_fifo(&assets, 3).unwrap();
        let expected: Vec<_> = assets[..3].iter().map(|a| a.id).collect();
        assert_eq!(selected, expected);
    }

    #[test]
    fn test_select_ignores_non_available_candidates() {
        let mut assets = stock(3);
        assets[0].status = AssetStatus::Allocated;
        let selected = select_fifo(&assets, 2).unwrap();
        assert_eq!(selected, vec![assets[1].id, assets[2].id]);
    }

    #[test]
    fn test_insufficient_stock_reports_shortfall() {
        let err = select_fifo(&stock(2), 3).unwrap_err();
        match err {
            DispatchError::InsufficientStock {
                requested,
                available,
            } => {
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_batch_ids_do_not_collide() {
        let generator = BatchIdGenerator::new();
        let ids: HashSet<String> = (0..1000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("BATCH-")));
    }

    #[test]
    fn test_allocation_patch_stages_assets() {
        let patch = allocation_patch("BATCH-X");
        assert_eq!(patch.status, Some(AssetStatus::Allocated));
        assert_eq!(patch.location.as_deref(), Some(STAGING_LOCATION));
        assert_eq!(patch.allocation_batch, BatchUpdate::Set("BATCH-X".into()));
    }
}
