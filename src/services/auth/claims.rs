use std::{collections::BTreeSet, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::Single(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// A capability string such as `view:movies`.
///
/// Compared by exact string equality; there is no hierarchy or wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission(Arc<str>);

impl Permission {
    pub fn new(permission: impl Into<Arc<str>>) -> Self {
        Self(permission.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(permission: &str) -> Self {
        Self::new(permission)
    }
}

/// Claims of a token whose signature, expiry, issuer and audience have been checked.
///
/// Only `TokenVerifier` constructs this type, so holding one is proof of a
/// verified token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenClaims {
    issuer: String,
    audience: Audience,
    expires_at: DateTime<Utc>,
    subject: String,
    // None: the token has no `permissions` claim at all (not the same as empty).
    permissions: Option<BTreeSet<String>>,
    // Provider-defined fields (`azp`, `scope`, `iat`, ...).
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    pub(super) fn new(
        issuer: String,
        audience: Audience,
        expires_at: DateTime<Utc>,
        subject: String,
        permissions: Option<BTreeSet<String>>,
        extra: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            issuer,
            audience,
            expires_at,
            subject,
            permissions,
            extra,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn permissions(&self) -> Option<&BTreeSet<String>> {
        self.permissions.as_ref()
    }

    pub fn extra(&self, name: &str) -> Option<&serde_json::Value> {
        self.extra.get(name)
    }
}
