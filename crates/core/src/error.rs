// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error classification shared by every layer
//!
//! Each crate keeps its own error enum. What callers rely on is the
//! [`ErrorKind`]: a stable numeric code plus the status class the request
//! surface reports. Internal error text only travels in [`ApiError::details`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Input rejected before any store interaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("rank {rank} is outside 1..={max}")]
    RankOutOfRange { rank: i64, max: i64 },
}

/// Stable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Storage,
    NotFound,
    Publish,
    Decode,
    Cancelled,
    Encode,
}

/// Response class of an error at the request surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    BadRequest,
    NotFound,
    ServerError,
}

impl ErrorKind {
    pub fn code(self) -> u16 {
        match self {
            ErrorKind::Validation => 1,
            ErrorKind::Storage => 2,
            ErrorKind::NotFound => 3,
            ErrorKind::Publish => 4,
            ErrorKind::Decode => 5,
            ErrorKind::Cancelled => 6,
            ErrorKind::Encode => 7,
        }
    }

    /// Message key reported to callers
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Validation => "errors.common.invalid",
            ErrorKind::Storage => "errors.common.storage",
            ErrorKind::NotFound => "errors.common.notFound",
            ErrorKind::Publish => "errors.common.publish",
            ErrorKind::Decode => "errors.common.decode",
            ErrorKind::Cancelled => "errors.common.cancelled",
            ErrorKind::Encode => "errors.common.encode",
        }
    }

    pub fn status(self) -> StatusClass {
        match self {
            ErrorKind::Validation => StatusClass::BadRequest,
            ErrorKind::NotFound => StatusClass::NotFound,
            ErrorKind::Storage
            | ErrorKind::Publish
            | ErrorKind::Decode
            | ErrorKind::Cancelled
            | ErrorKind::Encode => StatusClass::ServerError,
        }
    }
}

/// User-facing error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    pub status: StatusClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, details: impl std::fmt::Display) -> Self {
        Self {
            code: kind.code(),
            message: kind.message().to_string(),
            status: kind.status(),
            details: Some(details.to_string()),
        }
    }

    /// Error for a malformed request that never reached a service
    pub fn bad_request(details: impl std::fmt::Display) -> Self {
        Self::new(ErrorKind::Validation, details)
    }
}
