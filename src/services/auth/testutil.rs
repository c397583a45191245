//! Test helpers: deterministic Ed25519 keys, token minting and key sources.
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration as StdDuration,
};

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use ed25519_dalek::SigningKey;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use serde_json::{Value, json};

use crate::services::auth::{
    key_set::SigningKeyRecord,
    key_source::{JwksDocument, KeySetError, KeySetSource},
    verifier::TokenVerifier,
};

pub const ISSUER: &str = "https://casting-agency.test/";
pub const AUDIENCE: &str = "casting";
pub const SUBJECT: &str = "auth0|producer";

/// An Ed25519 key pair derived from a fixed seed.
pub struct TestKey {
    kid: String,
    pkcs8_der: Vec<u8>,
    public_x: String,
}

impl TestKey {
    pub fn new(kid: &str, seed: u8) -> Self {
        let signing_key = SigningKey::from_bytes(&[seed; 32]);
        let public_x = URL_SAFE_NO_PAD.encode(signing_key.verifying_key().to_bytes());

        let mut pkcs8_der = vec![
            0x30, 0x2e, // SEQUENCE, 46 bytes
            0x02, 0x01, 0x00, // INTEGER version 0
            0x30, 0x05, // SEQUENCE, algorithm identifier
            0x06, 0x03, 0x2b, 0x65, 0x70, // OID 1.3.101.112 (Ed25519)
            0x04, 0x22, // OCTET STRING, 34 bytes
            0x04, 0x20, // OCTET STRING, 32 bytes
        ];
        pkcs8_der.extend_from_slice(&signing_key.to_bytes());

        Self {
            kid: kid.to_string(),
            pkcs8_der,
            public_x,
        }
    }

    pub fn jwk(&self) -> Value {
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "sig",
            "alg": "EdDSA",
            "kid": self.kid,
            "x": self.public_x,
        })
    }

    pub fn record(&self) -> SigningKeyRecord {
        let key = DecodingKey::from_ed_components(&self.public_x).expect("valid test key");
        SigningKeyRecord::new(self.kid.clone(), Algorithm::EdDSA, key)
    }

    pub fn sign(&self, claims: &Value) -> String {
        self.sign_as(&self.kid, claims)
    }

    /// Sign with this key but advertise another `kid` in the header.
    pub fn sign_as(&self, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(kid.to_string());

        let encoding_key = EncodingKey::from_ed_der(&self.pkcs8_der);
        jsonwebtoken::encode(&header, claims, &encoding_key).expect("failed to encode test JWT")
    }
}

/// Claims that pass verification at `now` (expires one hour later).
pub fn valid_claims(permissions: &[&str], now: DateTime<Utc>) -> Value {
    json!({
        "iss": ISSUER,
        "aud": [AUDIENCE, "https://casting-agency.test/userinfo"],
        "sub": SUBJECT,
        "iat": now.timestamp(),
        "exp": (now + Duration::hours(1)).timestamp(),
        "azp": "test-client",
        "permissions": permissions,
    })
}

/// Hand-assembled token with an arbitrary header and a bogus signature.
pub fn forged_token(header: &Value, claims: &Value, signature: &str) -> String {
    format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        signature
    )
}

pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(Algorithm::EdDSA, ISSUER, AUDIENCE, 0).expect("asymmetric algorithm")
}

/// Key source that counts fetches and can be made slow or failing.
pub struct CountingSource {
    keys: Mutex<Vec<Value>>,
    fetches: AtomicUsize,
    failing: AtomicBool,
    delay: Mutex<StdDuration>,
}

impl CountingSource {
    pub fn new(keys: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            keys: Mutex::new(keys),
            fetches: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Mutex::new(StdDuration::ZERO),
        })
    }

    pub fn failing() -> Arc<Self> {
        let source = Self::new(Vec::new());
        source.set_failing(true);
        source
    }

    pub fn set_keys(&self, keys: Vec<Value>) {
        *self.keys.lock().unwrap() = keys;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every fetch sleeps this long before answering.
    pub fn set_delay(&self, delay: StdDuration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for CountingSource {
    fn describe(&self) -> String {
        "counting".to_string()
    }

    async fn fetch(&self) -> Result<JwksDocument, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(KeySetError::Transport("connection refused".to_string()));
        }
        Ok(JwksDocument {
            keys: self.keys.lock().unwrap().clone(),
        })
    }
}
