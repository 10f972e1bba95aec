// Core types for warehouse assets and their dispatch status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Default location for stock sitting on the shelf
pub const WAREHOUSE_LOCATION: &str = "Warehouse-A";
/// Location of freshly allocated stock awaiting picking
pub const STAGING_LOCATION: &str = "Staging Area";
/// Location of stock that has left the building
pub const CUSTOMER_SITE_LOCATION: &str = "Customer Site";

/// Opaque asset identifier assigned by the store on creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AssetId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Position of an asset in the dispatch workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetStatus {
    /// On the shelf and free to allocate
    Available,
    /// Reserved for an order as part of an allocation batch
    Allocated,
    /// Pulled from the shelf by a picker
    Picked,
    /// Parked pending a decision
    OnHold,
    /// Shipped to the customer; terminal
    Dispatched,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 5] = [
        AssetStatus::Available,
        AssetStatus::Allocated,
        AssetStatus::Picked,
        AssetStatus::OnHold,
        AssetStatus::Dispatched,
    ];

    /// Statuses counted as stock in the warehouse
    pub const IN_STOCK: [AssetStatus; 1] = [AssetStatus::Available];

    /// Statuses counted as stock committed to an order
    pub const OUT_OF_STOCK: [AssetStatus; 4] = [
        AssetStatus::Allocated,
        AssetStatus::Picked,
        AssetStatus::OnHold,
        AssetStatus::Dispatched,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "Available",
            AssetStatus::Allocated => "Allocated",
            AssetStatus::Picked => "Picked",
            AssetStatus::OnHold => "OnHold",
            AssetStatus::Dispatched => "Dispatched",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AssetStatus::Dispatched)
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown asset status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for AssetStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A tracked inventory item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub description: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub location: String,
    pub allocation_batch: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Store-assigned insertion counter, breaks `created_at` ties
    pub sequence: u64,
}

impl Asset {
    /// FIFO ordering key: oldest stock first, insertion order on ties
    pub fn fifo_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.sequence)
    }
}

/// Fields the engine hands to the store on insert; the store assigns id and sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssetRecord {
    pub description: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl NewAssetRecord {
    /// Intake record with workflow defaults applied
    pub fn intake(description: String, serial_number: String, created_at: DateTime<Utc>) -> Self {
        Self {
            description,
            serial_number,
            status: AssetStatus::Available,
            location: WAREHOUSE_LOCATION.to_string(),
            created_at,
        }
    }

    pub fn into_asset(self, id: AssetId, sequence: u64) -> Asset {
        Asset {
            id,
            description: self.description,
            serial_number: self.serial_number,
            status: self.status,
            location: self.location,
            allocation_batch: None,
            created_at: self.created_at,
            sequence,
        }
    }
}
