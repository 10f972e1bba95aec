use anyhow::Result;

use super::{emit, print_asset_details, Command};
use crate::api::{AllocateRequest, AssetApi, RelocateRequest, TransitionRequest};
use crate::workflow::available_actions;

pub struct AllocateCommand {
    pub quantity: i64,
    pub json: bool,
}

impl AllocateCommand {
    pub fn new(quantity: i64) -> Self {
        Self {
            quantity,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for AllocateCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let response = api
            .allocate(AllocateRequest {
                quantity: self.quantity,
            })
            .await?
            .body;
        emit(self.json, &response, |response| {
            println!("🎯 {}", response.message);
            println!("   📦 Batch: {}", response.batch);
            println!(
                "   💡 Review with: asset-dispatch batch {}",
                response.batch
            );
        })
    }
}

pub struct TransitionCommand {
    pub id: String,
    pub action: String,
    pub json: bool,
}

impl TransitionCommand {
    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for TransitionCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let response = api
            .transition(TransitionRequest {
                asset_id: self.id.clone(),
                action: self.action.clone(),
            })
            .await?
            .body;
        emit(self.json, &response, |response| {
            println!("✅ {}", response.message);
            println!("   🆔 {}", response.asset_id);
            let next: Vec<&str> = available_actions(response.status)
                .iter()
                .map(|action| action.as_str())
                .collect();
            if next.is_empty() {
                println!("   🏁 No further actions available");
            } else {
                println!("   ➡️  Next: {}", next.join(", "));
            }
        })
    }
}

pub struct RelocateCommand {
    pub id: String,
    pub location: String,
    pub json: bool,
}

impl RelocateCommand {
    pub fn new(id: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for RelocateCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let asset = api
            .relocate(RelocateRequest {
                asset_id: self.id.clone(),
                location: self.location.clone(),
            })
            .await?
            .body;
        emit(self.json, &asset, |asset| {
            println!("📍 Asset relocated");
            print_asset_details(asset);
        })
    }
}
