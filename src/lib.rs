// asset-dispatch library - warehouse asset dispatch workflow
// This exposes the core components for testing and integration

pub mod api;
pub mod assets;
pub mod cli;
pub mod config;
pub mod errors;
pub mod shutdown;
pub mod store;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use api::{ApiError, AssetApi, ErrorBody};
pub use assets::{Asset, AssetId, AssetStatus, NewAssetRecord};
pub use config::{DispatchConfig, StoreBackend, StoreConfig};
pub use errors::{DispatchError, ErrorKind};
pub use shutdown::ShutdownCoordinator;
pub use store::{open_store, AssetStore, FileAssetStore, MemoryAssetStore, StoreError};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    AllocationResult, DispatchEngine, EngineConfig, Inventory, StockStats, WorkflowAction,
};
