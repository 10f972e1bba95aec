use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetStatus};

/// Aggregate stock counts for a snapshot of assets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockStats {
    pub total: u64,
    pub in_stock: u64,
    pub out_stock: u64,
}

impl StockStats {
    pub fn from_assets(assets: &[Asset]) -> Self {
        Self::from_statuses(assets.iter().map(|asset| asset.status))
    }

    pub fn from_statuses(statuses: impl IntoIterator<Item = AssetStatus>) -> Self {
        let mut stats = StockStats::default();
        for status in statuses {
            stats.total += 1;
            if AssetStatus::IN_STOCK.contains(&status) {
                stats.in_stock += 1;
            } else if AssetStatus::OUT_OF_STOCK.contains(&status) {
                stats.out_stock += 1;
            }
        }
        stats
    }

    pub fn by_status(assets: &[Asset]) -> StatusBreakdown {
        StatusBreakdown::from_assets(assets)
    }
}

/// Per-status counts, used by the `stats` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub available: u64,
    pub allocated: u64,
    pub picked: u64,
    pub on_hold: u64,
    pub dispatched: u64,
}

impl StatusBreakdown {
    pub fn from_assets(assets: &[Asset]) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for asset in assets {
            let counter = match asset.status {
                AssetStatus::Available => &mut breakdown.available,
                AssetStatus::Allocated => &mut breakdown.allocated,
                AssetStatus::Picked => &mut breakdown.picked,
                AssetStatus::OnHold => &mut breakdown.on_hold,
                AssetStatus::Dispatched => &mut breakdown.dispatched,
            };
            *counter += 1;
        }
        breakdown
    }

    pub fn count(&self, status: AssetStatus) -> u64 {
        match status {
            AssetStatus::Available => self.available,
            AssetStatus::Allocated => self.allocated,
            AssetStatus::Picked => self.picked,
            AssetStatus::OnHold => self.on_hold,
            AssetStatus::Dispatched => self.dispatched,
        }
    }
}
