// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the write path and the ingestion pipeline

use ordo_adapters::PublishError;
use ordo_core::{ApiError, ErrorKind, ItemId, ProjectId, ValidationError};
use ordo_storage::{SinkError, StoreError};
use thiserror::Error;

/// Errors from orchestrated item operations
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("item {id} not found in project {project_id}")]
    NotFound { project_id: ProjectId, id: ItemId },
    #[error("storage error: {0}")]
    Storage(StoreError),
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("operation cancelled")]
    Cancelled,
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => ServiceError::Validation(e),
            StoreError::NotFound { project_id, id } => ServiceError::NotFound { project_id, id },
            StoreError::Cancelled => ServiceError::Cancelled,
            other => ServiceError::Storage(other),
        }
    }
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Storage(_) => ErrorKind::Storage,
            ServiceError::Publish(_) => ErrorKind::Publish,
            ServiceError::Encode(_) => ErrorKind::Encode,
            ServiceError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// User-facing form carrying the stable code
    pub fn to_api(&self) -> ApiError {
        ApiError::new(self.kind(), self)
    }
}

/// Errors from the ingestion batcher
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed change event: {0}")]
    Decode(serde_json::Error),
    #[error("batch write failed: {0}")]
    Flush(#[from] SinkError),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Decode(_) => ErrorKind::Decode,
            IngestError::Flush(_) => ErrorKind::Storage,
        }
    }
}
