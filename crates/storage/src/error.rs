// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use ordo_core::{ItemId, ProjectId, ValidationError};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors from rank store operations
///
/// Any error raised inside a transaction means the transaction was rolled
/// back: no partial write is visible afterwards.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("item {id} not found in project {project_id}")]
    NotFound { project_id: ProjectId, id: ItemId },
    #[error("timed out waiting for a lock")]
    LockTimeout,
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
    #[error("storage backend: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => StoreError::LockTimeout,
            Some(ErrorCode::OperationInterrupted) => StoreError::Cancelled,
            Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(err.to_string()),
            _ => StoreError::Sqlite(err),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Backend(format!("blocking task failed: {err}"))
    }
}

/// Errors from writing to the analytical event sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("sink backend: {0}")]
    Backend(String),
}

impl From<tokio::task::JoinError> for SinkError {
    fn from(err: tokio::task::JoinError) -> Self {
        SinkError::Backend(format!("blocking task failed: {err}"))
    }
}
