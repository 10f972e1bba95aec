use anyhow::Result;
use serde::Serialize;

use crate::api::AssetApi;
use crate::assets::Asset;

pub mod dispatch;
pub mod intake;
pub mod inventory;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self, api: &AssetApi) -> Result<()>;
}

/// Print `body` as pretty JSON, or hand it to `human` for formatted output
pub(crate) fn emit<T: Serialize>(json: bool, body: &T, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(body)?);
    } else {
        human(body);
    }
    Ok(())
}

pub(crate) fn print_asset_line(asset: &Asset) {
    let batch = asset.allocation_batch.as_deref().unwrap_or("-");
    println!(
        "{} {:<10} {:<24} {:<14} {:<16} {}",
        status_emoji(asset),
        asset.status.as_str(),
        asset.description,
        asset.serial_number,
        asset.location,
        batch
    );
    println!("   🆔 {}", asset.id);
}

pub(crate) fn print_asset_details(asset: &Asset) {
    println!("{} {}", status_emoji(asset), asset.description);
    println!("   🆔 Id:        {}", asset.id);
    println!("   🔢 Serial:    {}", asset.serial_number);
    println!("   📌 Status:    {}", asset.status);
    println!("   📍 Location:  {}", asset.location);
    if let Some(batch) = &asset.allocation_batch {
        println!("   📦 Batch:     {}", batch);
    }
    println!("   🕒 Received:  {}", asset.created_at.to_rfc3339());
}

fn status_emoji(asset: &Asset) -> &'static str {
    use crate::assets::AssetStatus;
    match asset.status {
        AssetStatus::Available => "🟢",
        AssetStatus::Allocated => "📦",
        AssetStatus::Picked => "🛒",
        AssetStatus::OnHold => "⏸️ ",
        AssetStatus::Dispatched => "🚚",
    }
}

pub fn show_how_to_get_started() -> Result<()> {
    println!("📦 asset-dispatch - Warehouse dispatch workflow");
    println!();
    println!("To get started:");
    println!("  ➕ asset-dispatch add --description <d> --serial <s>  # Register stock");
    println!("  📋 asset-dispatch list                               # Inventory overview");
    println!("  🎯 asset-dispatch allocate <qty>                     # Stage oldest stock");
    println!("  🔁 asset-dispatch transition <id> <action>           # pick/hold/approve/return");
    println!();
    println!("💡 Add --json to any command for machine-readable output.");
    Ok(())
}
