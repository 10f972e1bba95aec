// Asset domain types shared by the store and the workflow engine

pub mod types;

pub use types::{
    Asset, AssetId, AssetStatus, NewAssetRecord, UnknownStatus, CUSTOMER_SITE_LOCATION,
    STAGING_LOCATION, WAREHOUSE_LOCATION,
};
