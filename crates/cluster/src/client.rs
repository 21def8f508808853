// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-request cluster clients bound to the caller's identity.
//!
//! The factory holds only the base (service-account) config. For every
//! request it produces a fresh client either carrying the caller's bearer
//! token or impersonating the caller's user and groups — handlers never
//! see a long-lived privileged client.

use ambient_core::Role;
use kube::config::AuthInfo;
use kube::{Client, Config};
use secrecy::SecretString;

/// Cluster-layer failure.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("cluster config unavailable: {0}")]
    Config(String),
    #[error("kube api error: {0}")]
    Api(#[from] kube::Error),
    #[error("{0}")]
    Invalid(String),
    /// Resource absent or outside the managed boundary; both read as
    /// not-found so unmanaged namespaces stay invisible.
    #[error("{0}")]
    NotFound(String),
}

/// The authenticated caller, as recorded in request context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub display_name: String,
    pub groups: Vec<String>,
    /// Bearer token presented directly, when scheme (2) matched.
    pub token: Option<String>,
    /// Role granted by an access key, when scheme (3) matched.
    pub key_role: Option<Role>,
}

impl Identity {
    pub fn from_forwarded(user_id: &str, display_name: &str, groups: Vec<String>) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            groups,
            token: None,
            key_role: None,
        }
    }

    pub fn from_token(token: &str) -> Self {
        Self { token: Some(token.to_string()), ..Default::default() }
    }
}

/// Builds per-request clients from the in-cluster base config.
#[derive(Clone)]
pub struct ClientFactory {
    base: Config,
}

impl ClientFactory {
    /// Infer the base config (in-cluster or kubeconfig).
    pub async fn infer() -> Result<Self, ClusterError> {
        let base = Config::infer().await.map_err(|e| ClusterError::Config(e.to_string()))?;
        Ok(Self { base })
    }

    pub fn new(base: Config) -> Self {
        Self { base }
    }

    /// The unimpersonated service-account client. Reserved for the
    /// operator's own loops and for the key-auth pre-step; request
    /// handlers must use [`Self::for_identity`].
    pub fn privileged(&self) -> Result<Client, ClusterError> {
        Client::try_from(self.base.clone()).map_err(ClusterError::from)
    }

    /// A client acting as the caller: bearer token when one was presented,
    /// otherwise the service account impersonating the user and groups.
    pub fn for_identity(&self, identity: &Identity) -> Result<Client, ClusterError> {
        let mut config = self.base.clone();
        match identity.token {
            Some(ref token) => {
                config.auth_info = AuthInfo {
                    token: Some(SecretString::from(token.clone())),
                    ..AuthInfo::default()
                };
            }
            None => {
                if identity.user_id.is_empty() {
                    return Err(ClusterError::Invalid(
                        "identity carries neither token nor user".to_string(),
                    ));
                }
                config.auth_info.impersonate = Some(identity.user_id.clone());
                config.auth_info.impersonate_groups = if identity.groups.is_empty() {
                    None
                } else {
                    Some(identity.groups.clone())
                };
            }
        }
        Client::try_from(config).map_err(ClusterError::from)
    }

    /// Treat a kube not-found error as success (idempotent delete).
    pub fn ignore_not_found<T>(result: Result<T, kube::Error>) -> Result<Option<T>, kube::Error> {
        match result {
            Ok(v) => Ok(Some(v)),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
