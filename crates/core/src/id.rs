// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions.
//!
//! Cluster resources are addressed by their Kubernetes names; the IDs here
//! cover the entities the control plane mints itself (workflows, access
//! keys, protocol message groups). All are string newtypes with a short
//! type prefix followed by a random nanoid suffix.

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Define a newtype ID wrapper around `String` with a type prefix.
///
/// Generates `new()` for random ID generation, `from_string()` for parsing,
/// `as_str()`, `suffix()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `Borrow<str>`, and `Deref` implementations.
///
/// The ID format is `{prefix}{nanoid}` where `prefix` is a short type
/// indicator (e.g. "rfe-", "key-") and `nanoid` is a 12-character random
/// suffix, URL-safe and valid in Kubernetes object names.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize, schemars::JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Generate a new random ID with the type prefix.
            ///
            /// Uses a lowercase alphanumeric alphabet so the ID is always a
            /// valid DNS-1123 label fragment.
            pub fn new() -> Self {
                const ALPHABET: [char; 36] = [
                    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e',
                    'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't',
                    'u', 'v', 'w', 'x', 'y', 'z',
                ];
                Self(format!("{}{}", Self::PREFIX, nanoid::nanoid!(12, &ALPHABET)))
            }

            /// Create an ID from an existing string (for parsing/deserialization).
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Get the ID suffix (without prefix).
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from_string(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::from_string(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

crate::define_id! {
    /// Unique identifier for an RFE or BugFix workflow.
    ///
    /// Doubles as the custom-resource name, so it must stay a valid
    /// DNS-1123 label.
    pub struct WorkflowId("wf-");
}

crate::define_id! {
    /// Unique identifier for a project access key.
    ///
    /// Identifies the key record; never derived from the secret material.
    pub struct KeyId("key-");
}

crate::define_id! {
    /// Identifier for a text-message event group in the AG-UI protocol.
    pub struct MessageId("msg-");
}

crate::define_id! {
    /// Identifier for a tool-call event group in the AG-UI protocol.
    pub struct ToolCallId("tool-");
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
