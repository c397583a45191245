//! Verify-then-authorize entry point used by every protected operation.
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use crate::services::auth::{
    claims::{Permission, TokenClaims},
    error::AuthError,
    extractor,
    key_set::KeySetProvider,
    permissions::PermissionAuthorizer,
    verifier::TokenVerifier,
};

#[derive(Debug)]
pub struct AuthorizationGate {
    keys: Arc<KeySetProvider>,
    verifier: TokenVerifier,
    authorizer: PermissionAuthorizer,
    // Refetch the key set once when a token names an unknown `kid`.
    refresh_on_unknown_key: bool,
}

impl AuthorizationGate {
    pub fn new(
        keys: Arc<KeySetProvider>,
        verifier: TokenVerifier,
        refresh_on_unknown_key: bool,
    ) -> Self {
        Self {
            keys,
            verifier,
            authorizer: PermissionAuthorizer,
            refresh_on_unknown_key,
        }
    }

    pub fn key_set_provider(&self) -> &KeySetProvider {
        &self.keys
    }

    pub async fn authorize(
        &self,
        required: &Permission,
        headers: &HeaderMap,
    ) -> Result<TokenClaims, AuthError> {
        self.authorize_at(required, headers, Utc::now()).await
    }

    /// Extract → verify → authorize, stopping at the first failure and
    /// returning it unchanged.
    pub async fn authorize_at(
        &self,
        required: &Permission,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, AuthError> {
        let token = extractor::extract(headers)?;
        let claims = self.verify_at(token, now).await?;
        self.authorizer.authorize(claims, required)
    }

    async fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, AuthError> {
        // Structure and algorithm are judged before the key set is consulted.
        self.verifier.parse_header(token)?;
        let keys = self.keys.get_key_set().await?;

        match self.verifier.verify_at(token, &keys, now) {
            Err(AuthError::UnknownSigningKey) if self.refresh_on_unknown_key => {
                // The provider may have rotated keys since our snapshot.
                let refreshed = match self.keys.refresh_after(&keys).await {
                    Ok(refreshed) => refreshed,
                    Err(_) => return Err(AuthError::UnknownSigningKey),
                };
                if Arc::ptr_eq(&refreshed, &keys) {
                    return Err(AuthError::UnknownSigningKey);
                }
                self.verifier.verify_at(token, &refreshed, now)
            }
            result => result,
        }
    }
}
