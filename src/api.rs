//! Request and response contracts for callers fronting the engine
//!
//! Each operation pairs a serde DTO with an HTTP-equivalent status code so a
//! web layer (or the CLI's `--json` mode) can pass results through unchanged.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::assets::{Asset, AssetId, AssetStatus};
use crate::errors::{DispatchError, ErrorKind};
use crate::workflow::{DispatchEngine, StockStats};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateAssetRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub serial_number: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocateRequest {
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AllocateResponse {
    pub message: String,
    pub batch: String,
    pub allocated: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransitionRequest {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransitionResponse {
    pub message: String,
    pub asset_id: String,
    pub status: AssetStatus,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelocateRequest {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub location: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeleteRequest {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InventoryResponse {
    pub assets: Vec<Asset>,
    pub stats: StockStats,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchResponse {
    pub batch: String,
    pub assets: Vec<Asset>,
}

/// Error body returned for every failed operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(flatten)]
    pub body: ErrorBody,
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        Self {
            status: err.status_code(),
            body: ErrorBody {
                error: err.to_string(),
                kind: err.kind(),
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.body.error, self.status)
    }
}

impl std::error::Error for ApiError {}

/// Successful reply with its status code
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply<T> {
    pub status: u16,
    pub body: T,
}

impl<T> ApiReply<T> {
    fn ok(body: T) -> Self {
        Self { status: 200, body }
    }

    fn created(body: T) -> Self {
        Self { status: 201, body }
    }
}

pub type ApiResult<T> = Result<ApiReply<T>, ApiError>;

/// Ids that do not parse can never resolve to an asset
fn parse_asset_id(raw: &str) -> Result<AssetId, DispatchError> {
    AssetId::from_str(raw.trim()).map_err(|_| DispatchError::AssetNotFound {
        id: raw.to_string(),
    })
}

#[derive(Clone)]
pub struct AssetApi {
    engine: Arc<DispatchEngine>,
}

impl AssetApi {
    pub fn new(engine: Arc<DispatchEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<DispatchEngine> {
        &self.engine
    }

    pub async fn list(&self) -> ApiResult<InventoryResponse> {
        let inventory = self.engine.list_assets_with_stats().await?;
        Ok(ApiReply::ok(InventoryResponse {
            assets: inventory.assets,
            stats: inventory.stats,
        }))
    }

    pub async fn create(&self, request: CreateAssetRequest) -> ApiResult<Asset> {
        let asset = self
            .engine
            .create_asset(&request.description, &request.serial_number)
            .await?;
        Ok(ApiReply::created(asset))
    }

    pub async fn show(&self, id: &str) -> ApiResult<Asset> {
        let id = parse_asset_id(id)?;
        Ok(ApiReply::ok(self.engine.get_asset(&id).await?))
    }

    pub async fn allocate(&self, request: AllocateRequest) -> ApiResult<AllocateResponse> {
        let result = self.engine.allocate(request.quantity).await?;
        Ok(ApiReply::ok(AllocateResponse {
            message: format!(
                "Allocated {} asset(s) to batch {}",
                result.allocated, result.batch
            ),
            batch: result.batch,
            allocated: result.allocated,
        }))
    }

    pub async fn transition(&self, request: TransitionRequest) -> ApiResult<TransitionResponse> {
        let id = parse_asset_id(&request.asset_id)?;
        let asset = self.engine.apply_transition(&id, &request.action).await?;
        Ok(ApiReply::ok(TransitionResponse {
            message: format!("Asset moved to {}", asset.status),
            asset_id: asset.id.to_string(),
            status: asset.status,
        }))
    }

    pub async fn relocate(&self, request: RelocateRequest) -> ApiResult<Asset> {
        let id = parse_asset_id(&request.asset_id)?;
        Ok(ApiReply::ok(
            self.engine.relocate(&id, &request.location).await?,
        ))
    }

    pub async fn batch(&self, batch: &str) -> ApiResult<BatchResponse> {
        let assets = self.engine.batch_assets(batch).await?;
        Ok(ApiReply::ok(BatchResponse {
            batch: batch.trim().to_string(),
            assets,
        }))
    }

    pub async fn delete(&self, request: DeleteRequest) -> ApiResult<MessageResponse> {
        let id = parse_asset_id(&request.id)?;
        self.engine.delete_asset(&id).await?;
        Ok(ApiReply::ok(MessageResponse {
            message: "Asset deleted successfully".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryAssetStore;
    use crate::workflow::EngineConfig;
    use serde_json::json;

    fn api() -> AssetApi {
        AssetApi::new(Arc::new(DispatchEngine::new(
            Arc::new(MemoryAssetStore::new()),
            EngineConfig::default(),
        )))
    }

    #[test]
    fn test_transition_request_uses_camel_case_id() {
        let request: TransitionRequest =
            serde_json::from_value(json!({"assetId": "abc", "action": "pick"})).unwrap();
        assert_eq!(request.asset_id, "abc");
        assert_eq!(request.action, "pick");
    }

    #[test]
    fn test_error_body_shape() {
        let err = ApiError::from(DispatchError::InsufficientStock {
            requested: 5,
            available: 2,
        });
        assert_eq!(err.status, 409);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "InsufficientStock");
        assert_eq!(json["error"], "Insufficient stock: requested 5, only 2 available");
        assert!(json.get("status").is_none());
    }

    #[tokio::test]
    async fn test_create_missing_fields_is_bad_request() {
        let request: CreateAssetRequest =
            serde_json::from_value(json!({"description": "Monitor"})).unwrap();
        let err = api().create(request).await.unwrap_err();
        assert_eq!(err.status, 400);
        assert_eq!(err.body.kind, ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_create_allocate_transition_flow() {
        let api = api();
        let created = api
            .create(CreateAssetRequest {
                description: "Monitor".into(),
                serial_number: "MN-1".into(),
            })
            .await
            .unwrap();
        assert_eq!(created.status, 201);

        let allocated = api.allocate(AllocateRequest { quantity: 1 }).await.unwrap();
        assert_eq!(allocated.body.allocated, 1);
        assert!(allocated.body.batch.starts_with("BATCH-"));

        let picked = api
            .transition(TransitionRequest {
                asset_id: created.body.id.to_string(),
                action: "pick".into(),
            })
            .await
            .unwrap();
        assert_eq!(picked.body.status, AssetStatus::Picked);
        let json = serde_json::to_value(&picked.body).unwrap();
        assert_eq!(json["status"], "Picked");

        let listed = api.list().await.unwrap().body;
        assert_eq!(listed.stats.out_stock, 1);
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let err = api()
            .delete(DeleteRequest {
                id: "not-a-uuid".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status, 404);
        assert_eq!(err.body.kind, ErrorKind::AssetNotFound);
    }
}
