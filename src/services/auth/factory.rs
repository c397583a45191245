/// Factory: build `AuthorizationGate` from application `Config`.
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::services::auth::{
    AuthorizationGate,
    key_set::{KeySetPolicy, KeySetProvider},
    key_source::HttpKeySetSource,
    verifier::TokenVerifier,
};

pub fn build_authorization_gate(config: &AuthConfig) -> Result<Arc<AuthorizationGate>, AppError> {
    let source = HttpKeySetSource::new(config.jwks_url.clone(), config.jwks_timeout).map_err(|e| {
        tracing::error!(error = %e, "failed to build key set http client");
        AppError::Internal
    })?;

    let provider = KeySetProvider::new(
        Arc::new(source),
        KeySetPolicy {
            ttl: config.jwks_ttl,
            refresh_cooldown: config.jwks_refresh_cooldown,
            default_algorithm: config.algorithm,
        },
    );

    let verifier = TokenVerifier::new(
        config.algorithm,
        &config.issuer,
        &config.audience,
        config.leeway_seconds,
    )
    .map_err(|e| {
        tracing::error!(error = %e, "invalid token verifier configuration");
        AppError::Internal
    })?;

    tracing::info!(
        algorithm = ?verifier.algorithm(),
        issuer = %config.issuer,
        jwks_url = %config.jwks_url,
        "token verifier configured"
    );

    Ok(Arc::new(AuthorizationGate::new(
        Arc::new(provider),
        verifier,
        config.refresh_on_unknown_key,
    )))
}
