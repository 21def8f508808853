// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project access keys.
//!
//! Keys live in the project's `ambient-access-keys` Secret, one JSON
//! record per key id. Only the SHA-256 hash and a short display prefix
//! are stored; the cleartext is returned exactly once at creation.

use crate::client::ClusterError;
use ambient_core::{AccessKeyMeta, Clock, KeyId, Role};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Cleartext key tokens start with this prefix.
pub const KEY_TOKEN_PREFIX: &str = "ambk_";

/// Length of the random token body.
const TOKEN_BODY_LEN: usize = 40;

/// Characters of the token stored for identification in listings.
const DISPLAY_PREFIX_LEN: usize = 12;

/// Name of the per-project Secret holding key records.
const KEYS_SECRET_NAME: &str = "ambient-access-keys";

/// Persisted key record. Never contains the cleartext token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAccessKey {
    pub id: KeyId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub role: Role,
    pub prefix: String,
    /// Hex SHA-256 of the full cleartext token.
    pub hash: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl StoredAccessKey {
    pub fn meta(&self) -> AccessKeyMeta {
        AccessKeyMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            role: self.role,
            prefix: self.prefix.clone(),
            created_at: self.created_at,
            last_used_at: self.last_used_at,
        }
    }
}

/// Creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewKeyRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub role: Role,
}

/// The one-time creation response carrying the cleartext.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedKey {
    #[serde(flatten)]
    pub meta: AccessKeyMeta,
    /// Shown exactly once; never retrievable again.
    pub key: String,
}

/// Generate a fresh cleartext token.
pub fn generate_token() -> String {
    let body: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_BODY_LEN).map(char::from).collect();
    format!("{KEY_TOKEN_PREFIX}{body}")
}

/// Display prefix of a token.
pub fn token_prefix(token: &str) -> String {
    ambient_core::short(token, DISPLAY_PREFIX_LEN).to_string()
}

/// Hex SHA-256 of a token.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Secret-backed key store for one project.
pub struct AccessKeyStore {
    api: Api<Secret>,
    project: String,
}

impl AccessKeyStore {
    /// Uses the privileged client: key records must be readable before the
    /// caller has an identity.
    pub fn new(client: Client, project: &str) -> Self {
        Self { api: Api::namespaced(client, project), project: project.to_string() }
    }

    /// List key metadata (no hashes leave this module).
    pub async fn list(&self) -> Result<Vec<AccessKeyMeta>, ClusterError> {
        Ok(self.load().await?.into_iter().map(|k| k.meta()).collect())
    }

    /// Create a key; rejects duplicate (project, name) pairs.
    pub async fn create(
        &self,
        request: &NewKeyRequest,
        clock: &impl Clock,
    ) -> Result<RevealedKey, ClusterError> {
        let existing = self.load().await?;
        if existing.iter().any(|k| k.name == request.name) {
            return Err(ClusterError::Invalid(format!(
                "key named {:?} already exists in project {}",
                request.name, self.project
            )));
        }

        let token = generate_token();
        let record = StoredAccessKey {
            id: KeyId::new(),
            name: request.name.clone(),
            description: request.description.clone(),
            role: request.role,
            prefix: token_prefix(&token),
            hash: hash_token(&token),
            created_at: clock.now_utc(),
            last_used_at: None,
        };

        self.store(&record).await?;
        Ok(RevealedKey { meta: record.meta(), key: token })
    }

    /// Delete by id. Idempotent.
    pub async fn delete(&self, id: &KeyId) -> Result<(), ClusterError> {
        let patch = serde_json::json!({ "data": { id.as_str(): null } });
        match self.api.patch(KEYS_SECRET_NAME, &PatchParams::default(), &Patch::Merge(&patch)).await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticate a presented token: prefix match, then hash compare.
    /// Updates `lastUsedAt` on success.
    pub async fn authenticate(
        &self,
        token: &str,
        clock: &impl Clock,
    ) -> Result<Option<StoredAccessKey>, ClusterError> {
        if !token.starts_with(KEY_TOKEN_PREFIX) {
            return Ok(None);
        }
        let prefix = token_prefix(token);
        let hash = hash_token(token);
        let keys = self.load().await?;
        let Some(mut matched) =
            keys.into_iter().find(|k| k.prefix == prefix && k.hash == hash)
        else {
            return Ok(None);
        };

        matched.last_used_at = Some(clock.now_utc());
        self.store(&matched).await?;
        Ok(Some(matched))
    }

    async fn load(&self) -> Result<Vec<StoredAccessKey>, ClusterError> {
        let secret = match self.api.get(KEYS_SECRET_NAME).await {
            Ok(s) => s,
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        for (id, bytes) in secret.data.unwrap_or_default() {
            match serde_json::from_slice::<StoredAccessKey>(&bytes.0) {
                Ok(key) => keys.push(key),
                Err(e) => {
                    tracing::warn!(project = %self.project, key_id = %id, error = %e, "skipping unreadable key record");
                }
            }
        }
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(keys)
    }

    async fn store(&self, record: &StoredAccessKey) -> Result<(), ClusterError> {
        let body = serde_json::to_vec(record)
            .map_err(|e| ClusterError::Invalid(format!("key record serialization: {e}")))?;
        let mut data = BTreeMap::new();
        data.insert(record.id.to_string(), ByteString(body));

        let patch = Secret {
            metadata: kube::api::ObjectMeta {
                name: Some(KEYS_SECRET_NAME.to_string()),
                namespace: Some(self.project.clone()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        match self
            .api
            .patch(
                KEYS_SECRET_NAME,
                &PatchParams::apply("ambient-gateway").force(),
                &Patch::Apply(&patch),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                self.api.create(&PostParams::default(), &patch).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
