// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Component-agnostic error taxonomy.
//!
//! Every user-visible failure in the control plane is tagged with one of
//! these kinds; the gateway maps the kind to an HTTP status and serializes
//! the whole thing as `{error, code, remediation?}`. Background loops never
//! surface a kind directly — they convert failures into status conditions
//! on the governing resource.

use serde::{Deserialize, Serialize};

/// Stable error classification shared by all components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    SemanticValidation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    PreconditionFailed,
    RateLimited,
    TransientCluster,
    Provider,
    Timeout,
    Internal,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        SemanticValidation => "semantic_validation",
        Unauthenticated => "unauthenticated",
        Forbidden => "forbidden",
        NotFound => "not_found",
        Conflict => "conflict",
        PreconditionFailed => "precondition_failed",
        RateLimited => "rate_limited",
        TransientCluster => "transient_cluster",
        Provider => "provider",
        Timeout => "timeout",
        Internal => "internal",
    }
}

impl ErrorKind {
    /// HTTP status code this kind maps to at the gateway boundary.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::SemanticValidation => 422,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::PreconditionFailed => 412,
            ErrorKind::RateLimited => 429,
            ErrorKind::TransientCluster => 503,
            ErrorKind::Provider => 502,
            ErrorKind::Timeout => 504,
            ErrorKind::Internal => 500,
        }
    }

    /// Only transient cluster errors are retried locally (reconciler backoff).
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::TransientCluster)
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {error}")]
pub struct ApiError {
    pub error: String,
    pub code: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorKind, error: impl Into<String>) -> Self {
        Self { error: error.into(), code, remediation: None }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, msg)
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, msg)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
