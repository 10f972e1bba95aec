use serde::Serialize;
use thiserror::Error;

use crate::assets::{AssetId, AssetStatus};
use crate::store::StoreError;

/// Errors surfaced by the dispatch engine to its callers.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Insufficient stock: requested {requested}, only {available} available")]
    InsufficientStock { requested: u64, available: u64 },

    #[error("Asset not found: {id}")]
    AssetNotFound { id: String },

    #[error("Invalid transition: cannot {action} an asset that is {from}")]
    InvalidTransition { action: String, from: String },

    #[error("Concurrent update conflict: {reason}")]
    Conflict { reason: String },

    #[error("Asset store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}

/// Stable error classification reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ValidationError,
    InsufficientStock,
    AssetNotFound,
    InvalidTransition,
    Conflict,
    StoreUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::InsufficientStock => "InsufficientStock",
            ErrorKind::AssetNotFound => "AssetNotFound",
            ErrorKind::InvalidTransition => "InvalidTransition",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::StoreUnavailable => "StoreUnavailable",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DispatchError {
    pub fn validation(reason: impl Into<String>) -> Self {
        DispatchError::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(id: &AssetId) -> Self {
        DispatchError::AssetNotFound { id: id.to_string() }
    }

    pub fn invalid_transition(action: impl std::fmt::Display, from: AssetStatus) -> Self {
        DispatchError::InvalidTransition {
            action: action.to_string(),
            from: from.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::Validation { .. } => ErrorKind::ValidationError,
            DispatchError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DispatchError::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            DispatchError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DispatchError::Conflict { .. } => ErrorKind::Conflict,
            DispatchError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
        }
    }

    /// HTTP-equivalent status code for callers that front the engine with a web layer.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::ValidationError => 400,
            ErrorKind::AssetNotFound => 404,
            ErrorKind::InsufficientStock
            | ErrorKind::InvalidTransition
            | ErrorKind::Conflict => 409,
            ErrorKind::StoreUnavailable => 503,
        }
    }
}

impl From<StoreError> for DispatchError {
    fn from(err: StoreError) -> Self {
        DispatchError::StoreUnavailable {
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
