//! Where signing keys come from.
//!
//! `KeySetSource` returns the identity provider's published key document
//! (JWKS). Turning the document into verified key records is done by
//! `KeySet::from_document`, so sources stay dumb transports.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Raw JWKS document: `{ "keys": [ {...}, ... ] }`.
///
/// Records are kept as JSON values so that one odd record (unknown `alg`,
/// encryption key, ...) can be judged individually instead of failing the
/// whole document at deserialization time.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<serde_json::Value>,
}

/// Failures while obtaining or interpreting the key document.
///
/// These are detail for logs; the gate surfaces all of them as
/// `AuthError::KeySetUnavailable`.
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Transport(String),
    #[error("key set endpoint answered with HTTP {0}")]
    Status(u16),
    #[error("malformed key set: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait KeySetSource: Send + Sync + 'static {
    // Short name for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<JwksDocument, KeySetError>;
}

/// Fetches the JWKS document over HTTP(S).
///
/// The request timeout bounds the whole fetch; dropping the future cancels it.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySetSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    fn describe(&self) -> String {
        self.url.to_string()
    }

    async fn fetch(&self) -> Result<JwksDocument, KeySetError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| KeySetError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }

        response
            .json::<JwksDocument>()
            .await
            .map_err(|e| KeySetError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn source_for(server: &MockServer) -> HttpKeySetSource {
        let url = Url::parse(&format!("{}/.well-known/jwks.json", server.uri())).unwrap();
        HttpKeySetSource::new(url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn fetches_key_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "keys": [{ "kid": "k1", "kty": "OKP", "crv": "Ed25519", "x": "abc" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let document = source_for(&server).await.fetch().await.unwrap();
        assert_eq!(document.keys.len(), 1);
        assert_eq!(document.keys[0]["kid"], "k1");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, KeySetError::Status(503)), "{err:?}");
    }

    #[tokio::test]
    async fn document_without_keys_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = source_for(&server).await.fetch().await.unwrap_err();
        assert!(matches!(err, KeySetError::Malformed(_)), "{err:?}");
    }

    #[tokio::test]
    async fn slow_endpoint_hits_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "keys": [] }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let source = HttpKeySetSource::new(url, Duration::from_millis(100)).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, KeySetError::Transport(_)), "{err:?}");
    }
}
