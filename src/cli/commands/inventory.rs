use anyhow::Result;
use serde::Serialize;

use super::{emit, print_asset_details, print_asset_line, Command};
use crate::api::AssetApi;
use crate::assets::AssetStatus;
use crate::workflow::{StatusBreakdown, StockStats};

pub struct ListCommand {
    pub json: bool,
}

impl ListCommand {
    pub fn new() -> Self {
        Self { json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for ListCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for ListCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let inventory = api.list().await?.body;
        emit(self.json, &inventory, |inventory| {
            println!("📋 INVENTORY");
            println!("════════════");
            if inventory.assets.is_empty() {
                println!("📭 No assets registered");
            }
            for asset in &inventory.assets {
                print_asset_line(asset);
            }
            println!();
            println!(
                "📊 Total: {}   🟢 In stock: {}   🚚 Out of stock: {}",
                inventory.stats.total, inventory.stats.in_stock, inventory.stats.out_stock
            );
        })
    }
}

#[derive(Debug, Serialize)]
struct StatsReport {
    stats: StockStats,
    by_status: StatusBreakdown,
}

pub struct StatsCommand {
    pub json: bool,
}

impl StatsCommand {
    pub fn new() -> Self {
        Self { json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Default for StatsCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for StatsCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let inventory = api.list().await?.body;
        let report = StatsReport {
            stats: inventory.stats,
            by_status: StockStats::by_status(&inventory.assets),
        };
        emit(self.json, &report, |report| {
            println!("📊 STOCK STATISTICS");
            println!("───────────────────");
            println!("   🎯 Total:        {}", report.stats.total);
            println!("   🟢 In stock:     {}", report.stats.in_stock);
            println!("   🚚 Out of stock: {}", report.stats.out_stock);
            println!();
            for status in AssetStatus::ALL {
                println!("   {:<11} {}", status.as_str(), report.by_status.count(status));
            }
        })
    }
}

pub struct ShowCommand {
    pub id: String,
    pub json: bool,
}

impl ShowCommand {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for ShowCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let asset = api.show(&self.id).await?.body;
        emit(self.json, &asset, print_asset_details)
    }
}

pub struct BatchCommand {
    pub batch: String,
    pub json: bool,
}

impl BatchCommand {
    pub fn new(batch: impl Into<String>) -> Self {
        Self {
            batch: batch.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for BatchCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let response = api.batch(&self.batch).await?.body;
        emit(self.json, &response, |response| {
            println!("📦 BATCH {}", response.batch);
            if response.assets.is_empty() {
                println!("📭 No assets in this batch");
            }
            for asset in &response.assets {
                print_asset_line(asset);
            }
        })
    }
}
