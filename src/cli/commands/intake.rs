use anyhow::Result;

use super::{emit, print_asset_details, Command};
use crate::api::{AssetApi, CreateAssetRequest, DeleteRequest};

pub struct AddCommand {
    pub description: String,
    pub serial_number: String,
    pub json: bool,
}

impl AddCommand {
    pub fn new(description: impl Into<String>, serial_number: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            serial_number: serial_number.into(),
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

impl Command for AddCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let asset = api
            .create(CreateAssetRequest {
                description: self.description.clone(),
                serial_number: self.serial_number.clone(),
            })
            .await?
            .body;
        emit(self.json, &asset, |asset| {
            println!("✅ Asset registered");
            print_asset_details(asset);
        })
    }
}

pub struct DeleteCommand {
    pub id: String,
    pub json: bool,
}

impl DeleteCommand {
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

impl Command for DeleteCommand {
    async fn execute(&self, api: &AssetApi) -> Result<()> {
        let response = api
            .delete(DeleteRequest {
                id: self.id.clone(),
            })
            .await?
            .body;
        emit(self.json, &response, |response| {
            println!("🗑️  {}", response.message);
        })
    }
}
