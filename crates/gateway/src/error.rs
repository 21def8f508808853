// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway error responses.
//!
//! Every failure serializes as `{error, code, remediation?}` with the
//! status mapping of the shared taxonomy. Cluster and provider errors
//! pass through with their own classification and remediation.

use ambient_core::{ApiError, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// A failed request.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct GatewayError(pub ApiError);

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self(ApiError::new(kind, message))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self(ApiError::validation(message))
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self(ApiError::unauthenticated(message))
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(ApiError::forbidden(message))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self(ApiError::not_found(message))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self(ApiError::conflict(message))
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self(ApiError::precondition_failed(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self(ApiError::internal(message))
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.0.remediation = Some(remediation.into());
        self
    }
}

impl From<kube::Error> for GatewayError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(ae) => {
                let kind = match ae.code {
                    401 => ErrorKind::Unauthenticated,
                    403 => ErrorKind::Forbidden,
                    404 => ErrorKind::NotFound,
                    409 => ErrorKind::Conflict,
                    422 => ErrorKind::SemanticValidation,
                    429 => ErrorKind::RateLimited,
                    code if code >= 500 => ErrorKind::TransientCluster,
                    _ => ErrorKind::Internal,
                };
                Self(ApiError::new(kind, ae.message))
            }
            other => Self(ApiError::new(ErrorKind::TransientCluster, other.to_string())),
        }
    }
}

impl From<ambient_cluster::ClusterError> for GatewayError {
    fn from(e: ambient_cluster::ClusterError) -> Self {
        match e {
            ambient_cluster::ClusterError::Api(inner) => inner.into(),
            ambient_cluster::ClusterError::Invalid(msg) => {
                // Cluster-layer Invalid covers both bad input and conflicts;
                // conflicts carry "already" in their message by convention.
                if msg.contains("already") {
                    Self(ApiError::conflict(msg))
                } else {
                    Self(ApiError::validation(msg))
                }
            }
            ambient_cluster::ClusterError::NotFound(msg) => Self(ApiError::not_found(msg)),
            ambient_cluster::ClusterError::Config(msg) => {
                Self(ApiError::new(ErrorKind::Internal, msg))
            }
        }
    }
}

impl From<ambient_providers::ProviderError> for GatewayError {
    fn from(e: ambient_providers::ProviderError) -> Self {
        let mut api = ApiError::new(e.api_kind(), e.message.clone());
        api.remediation = Some(e.remediation.clone());
        Self(api)
    }
}

impl From<ambient_events::EventLogError> for GatewayError {
    fn from(e: ambient_events::EventLogError) -> Self {
        Self(ApiError::internal(e.to_string()))
    }
}

impl From<ambient_events::MailboxError> for GatewayError {
    fn from(e: ambient_events::MailboxError) -> Self {
        Self(ApiError::internal(e.to_string()))
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
