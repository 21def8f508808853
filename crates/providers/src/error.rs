// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider error taxonomy and remediation mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Auth,
    Permissions,
    NotFound,
    RateLimit,
    Validation,
    Other,
}

ambient_core::simple_display! {
    ProviderErrorKind {
        Auth => "auth",
        Permissions => "permissions",
        NotFound => "not_found",
        RateLimit => "rate_limit",
        Validation => "validation",
        Other => "other",
    }
}

/// A classified provider failure with a human-readable remediation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub remediation: String,
    /// When rate-limited, the instant the limit resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit_reset: Option<DateTime<Utc>>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            remediation: default_remediation(kind).to_string(),
            rate_limit_reset: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message)
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }

    /// Classify an HTTP response status, attaching the rate-limit reset
    /// when the provider signalled one.
    pub fn from_status(
        status: u16,
        message: impl Into<String>,
        rate_limit_reset: Option<DateTime<Utc>>,
    ) -> Self {
        let kind = match status {
            401 => ProviderErrorKind::Auth,
            403 if rate_limit_reset.is_some() => ProviderErrorKind::RateLimit,
            403 => ProviderErrorKind::Permissions,
            404 => ProviderErrorKind::NotFound,
            429 => ProviderErrorKind::RateLimit,
            400 | 409 | 422 => ProviderErrorKind::Validation,
            _ => ProviderErrorKind::Other,
        };
        let mut err = Self::new(kind, message);
        if kind == ProviderErrorKind::RateLimit {
            err.rate_limit_reset = rate_limit_reset;
            if let Some(reset) = rate_limit_reset {
                err.remediation =
                    format!("Rate limited; retry after {}", reset.to_rfc3339());
            }
        }
        err
    }

    /// Map onto the control plane's error taxonomy for response codes.
    pub fn api_kind(&self) -> ambient_core::ErrorKind {
        match self.kind {
            ProviderErrorKind::Auth => ambient_core::ErrorKind::Unauthenticated,
            ProviderErrorKind::Permissions => ambient_core::ErrorKind::Forbidden,
            ProviderErrorKind::NotFound => ambient_core::ErrorKind::NotFound,
            ProviderErrorKind::RateLimit => ambient_core::ErrorKind::RateLimited,
            ProviderErrorKind::Validation => ambient_core::ErrorKind::Validation,
            ProviderErrorKind::Other => ambient_core::ErrorKind::Provider,
        }
    }
}

fn default_remediation(kind: ProviderErrorKind) -> &'static str {
    match kind {
        ProviderErrorKind::Auth => {
            "Authentication failed; reconnect the git provider or refresh the token"
        }
        ProviderErrorKind::Permissions => {
            "The token lacks access to this repository; grant access or use another account"
        }
        ProviderErrorKind::NotFound => {
            "Repository or resource not found; check the URL and that the app is installed"
        }
        ProviderErrorKind::RateLimit => "Rate limited; retry later",
        ProviderErrorKind::Validation => "The provider rejected the request; check the parameters",
        ProviderErrorKind::Other => "Unexpected provider error; retry or check provider status",
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
