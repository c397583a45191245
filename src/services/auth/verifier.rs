//! Bearer token verification.
//!
//! ```text
//! token → split header.payload.signature     (InvalidTokenStructure)
//!       → header.alg == accepted algorithm?  (UnsupportedAlgorithm)
//!       → key_set[header.kid]                (UnknownSigningKey)
//!       → signature                          (InvalidSignature)
//!       → exp > now                          (TokenExpired)
//!       → iss == issuer                      (InvalidIssuer)
//!       → aud ∋ audience                     (InvalidAudience)
//!       → TokenClaims
//! ```
//!
//! Pure given a `KeySet` snapshot and a captured `now`.
use std::{collections::BTreeSet, fmt, str::FromStr};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};
use serde::Deserialize;

use crate::services::auth::{
    claims::{Audience, TokenClaims},
    error::AuthError,
    key_set::KeySet,
};

/// Unverified token header, used only to pick a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    pub key_id: String,
    pub algorithm: Algorithm,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
    kid: Option<String>,
}

#[derive(Deserialize)]
struct RawClaims {
    iss: Option<String>,
    aud: Option<Audience>,
    exp: Option<i64>,
    sub: Option<String>,
    permissions: Option<BTreeSet<String>>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

pub fn is_asymmetric(algorithm: Algorithm) -> bool {
    !matches!(
        algorithm,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
    )
}

#[derive(Clone)]
pub struct TokenVerifier {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    leeway_seconds: u64,
    // Signature-only validation; claims are checked against a captured `now` below.
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl TokenVerifier {
    /// Fails when `algorithm` is symmetric: HMAC keys cannot come from a public key set.
    pub fn new(
        algorithm: Algorithm,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        leeway_seconds: u64,
    ) -> Result<Self, String> {
        if !is_asymmetric(algorithm) {
            return Err(format!("{algorithm:?} is not an asymmetric algorithm"));
        }

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            algorithm,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway_seconds,
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn verify_at(
        &self,
        token: &str,
        key_set: &KeySet,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, AuthError> {
        let header = self.parse_header(token)?;

        let record = key_set
            .get(&header.key_id)
            .ok_or(AuthError::UnknownSigningKey)?;

        // A key published for another algorithm cannot have produced this signature.
        if record.algorithm() != header.algorithm {
            return Err(AuthError::InvalidSignature);
        }

        let data = jsonwebtoken::decode::<RawClaims>(token, record.decoding_key(), &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => AuthError::InvalidTokenStructure,
            })?;

        self.validate_claims(data.claims, now)
    }

    /// Steps before any key lookup: structure, then algorithm.
    pub fn parse_header(&self, token: &str) -> Result<TokenHeader, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(_signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidTokenStructure);
        };
        if header.is_empty() || payload.is_empty() {
            return Err(AuthError::InvalidTokenStructure);
        }

        let raw: RawHeader = URL_SAFE_NO_PAD
            .decode(header)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::InvalidTokenStructure)?;

        let (Some(alg), Some(kid)) = (raw.alg, raw.kid) else {
            return Err(AuthError::InvalidTokenStructure);
        };

        // `none` and HS* never parse into the accepted (asymmetric) algorithm.
        let algorithm = Algorithm::from_str(&alg).map_err(|_| AuthError::UnsupportedAlgorithm)?;
        if algorithm != self.algorithm {
            return Err(AuthError::UnsupportedAlgorithm);
        }

        Ok(TokenHeader {
            key_id: kid,
            algorithm,
        })
    }

    fn validate_claims(
        &self,
        raw: RawClaims,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, AuthError> {
        // A token without `exp` can never be shown to be unexpired.
        let exp = raw.exp.ok_or(AuthError::TokenExpired)?;
        if exp.saturating_add(self.leeway_seconds as i64) <= now.timestamp() {
            return Err(AuthError::TokenExpired);
        }
        let expires_at =
            DateTime::from_timestamp(exp, 0).ok_or(AuthError::InvalidTokenStructure)?;

        let issuer = raw.iss.ok_or(AuthError::InvalidIssuer)?;
        if issuer != self.issuer {
            return Err(AuthError::InvalidIssuer);
        }

        let audience = raw.aud.ok_or(AuthError::InvalidAudience)?;
        if !audience.contains(&self.audience) {
            return Err(AuthError::InvalidAudience);
        }

        let subject = raw
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or(AuthError::InvalidTokenStructure)?;

        Ok(TokenClaims::new(
            issuer,
            audience,
            expires_at,
            subject,
            raw.permissions,
            raw.extra,
        ))
    }
}
