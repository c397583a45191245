//! Signing key set and its process-wide cache.
//!
//! ```text
//! get_key_set() → cached snapshot fresh?  → yes: Arc<KeySet>
//!                                        → no:  fetch → build new KeySet → swap
//! refresh_after(seen) → someone already replaced `seen`? → reuse theirs
//!                     → else fetch → build → swap
//! ```
//!
//! Readers never lock: they clone an `Arc<KeySet>` out of an `ArcSwapOption`.
//! A refresh builds a complete new `KeySet` and publishes it with one store, so
//! a reader sees either the old set or the new one, never a mix.
//! Refreshes are serialized by an async mutex so concurrent misses trigger a
//! single fetch. While a set is cached, callers never wait on that mutex: if a
//! refresh is already in flight they keep using the stale set. After a failed
//! fetch no new attempt is made for `refresh_cooldown`, and callers that were
//! queued behind the failed attempt share its result instead of refetching.
use std::{collections::HashMap, fmt, str::FromStr, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use jsonwebtoken::{Algorithm, DecodingKey, jwk::Jwk};
use tokio::{sync::Mutex, time::Instant};

use crate::services::auth::{
    error::AuthError,
    key_source::{JwksDocument, KeySetError, KeySetSource},
};

/// One published verification key.
#[derive(Clone)]
pub struct SigningKeyRecord {
    key_id: String,
    algorithm: Algorithm,
    key: DecodingKey,
}

impl SigningKeyRecord {
    pub fn new(key_id: impl Into<String>, algorithm: Algorithm, key: DecodingKey) -> Self {
        Self {
            key_id: key_id.into(),
            algorithm,
            key,
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.key
    }
}

impl fmt::Debug for SigningKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("SigningKeyRecord")
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Immutable `kid → key` lookup table.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: HashMap<String, SigningKeyRecord>,
    fetched_at: Instant,
}

impl KeySet {
    pub fn from_records(records: impl IntoIterator<Item = SigningKeyRecord>) -> Self {
        Self {
            keys: records
                .into_iter()
                .map(|record| (record.key_id.clone(), record))
                .collect(),
            fetched_at: Instant::now(),
        }
    }

    /// Build a key set from a JWKS document.
    ///
    /// - records marked `"use": "enc"` are skipped
    /// - records whose `alg` is not a JWS algorithm are skipped
    /// - a record without `alg` is taken to use `default_algorithm`
    /// - a record without `kid`, or whose key material cannot be loaded, makes
    ///   the whole document malformed
    pub fn from_document(
        document: JwksDocument,
        default_algorithm: Algorithm,
    ) -> Result<Self, KeySetError> {
        let mut records = Vec::with_capacity(document.keys.len());

        for value in document.keys {
            if value.get("use").and_then(|v| v.as_str()) == Some("enc") {
                tracing::debug!("skipping encryption key in key set");
                continue;
            }

            let key_id = value
                .get("kid")
                .and_then(|v| v.as_str())
                .filter(|kid| !kid.is_empty())
                .ok_or_else(|| KeySetError::Malformed("key record without kid".to_string()))?
                .to_string();

            let algorithm = match value.get("alg").and_then(|v| v.as_str()) {
                Some(alg) => match Algorithm::from_str(alg) {
                    Ok(alg) => alg,
                    Err(_) => {
                        tracing::debug!(kid = %key_id, alg, "skipping key with non-signing alg");
                        continue;
                    }
                },
                None => default_algorithm,
            };

            let jwk: Jwk = serde_json::from_value(value).map_err(|e| {
                KeySetError::Malformed(format!("key {key_id} is not a valid JWK: {e}"))
            })?;
            let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
                KeySetError::Malformed(format!("key {key_id} has unusable material: {e}"))
            })?;

            records.push(SigningKeyRecord::new(key_id, algorithm, key));
        }

        Ok(Self::from_records(records))
    }

    pub fn get(&self, key_id: &str) -> Option<&SigningKeyRecord> {
        self.keys.get(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

/// Cache policy for `KeySetProvider`.
#[derive(Debug, Clone, Copy)]
pub struct KeySetPolicy {
    // None: fetched once, kept for the process lifetime.
    pub ttl: Option<Duration>,
    // Minimum age of the cached set before an unknown `kid` may force a refetch,
    // and minimum spacing between fetch attempts after a failure.
    pub refresh_cooldown: Duration,
    // Used for key records that do not declare `alg`.
    pub default_algorithm: Algorithm,
}

pub struct KeySetProvider {
    source: Arc<dyn KeySetSource>,
    policy: KeySetPolicy,
    current: ArcSwapOption<KeySet>,
    refresh_lock: Mutex<()>,
    last_failure: ArcSwapOption<Instant>,
}

impl fmt::Debug for KeySetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySetProvider")
            .field("source", &self.source.describe())
            .field("policy", &self.policy)
            .field("cached_keys", &self.current.load_full().map(|k| k.len()))
            .finish()
    }
}

impl KeySetProvider {
    pub fn new(source: Arc<dyn KeySetSource>, policy: KeySetPolicy) -> Self {
        Self {
            source,
            policy,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
            last_failure: ArcSwapOption::empty(),
        }
    }

    /// Current key set, fetching it on first use or once the TTL has elapsed.
    ///
    /// When a TTL refresh fails, or another caller is already refreshing, the
    /// previous set is served rather than failing or waiting.
    pub async fn get_key_set(&self) -> Result<Arc<KeySet>, AuthError> {
        match self.current.load_full() {
            Some(keys) if !self.is_stale(&keys) => Ok(keys),
            Some(stale) => Ok(self.refresh_stale(stale).await),
            None => self.load_initial().await,
        }
    }

    async fn refresh_stale(&self, stale: Arc<KeySet>) -> Arc<KeySet> {
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            return stale;
        };

        // Another caller may have refreshed before we got the lock.
        if let Some(current) = self.current.load_full()
            && !Arc::ptr_eq(&current, &stale)
        {
            return current;
        }
        if self.in_backoff() {
            return stale;
        }

        match self.fetch().await {
            Ok(keys) => self.publish(keys),
            Err(err) => {
                self.record_failure();
                tracing::warn!(
                    error = %err,
                    source = %self.source.describe(),
                    "key set refresh failed, serving previous key set"
                );
                stale
            }
        }
    }

    async fn load_initial(&self) -> Result<Arc<KeySet>, AuthError> {
        let arrived = Instant::now();
        let _guard = self.refresh_lock.lock().await;

        if let Some(keys) = self.current.load_full() {
            return Ok(keys);
        }
        if self.failed_since(arrived) || self.in_backoff() {
            return Err(AuthError::KeySetUnavailable);
        }

        match self.fetch().await {
            Ok(keys) => Ok(self.publish(keys)),
            Err(err) => {
                self.record_failure();
                tracing::warn!(
                    error = %err,
                    source = %self.source.describe(),
                    "key set unavailable"
                );
                Err(AuthError::KeySetUnavailable)
            }
        }
    }

    /// Replace `seen` with a freshly fetched set.
    ///
    /// Used after a token referenced a `kid` that `seen` does not contain. If
    /// `seen` was already replaced by someone else, or is younger than the
    /// refresh cooldown, no fetch happens and the current set is returned.
    pub async fn refresh_after(&self, seen: &Arc<KeySet>) -> Result<Arc<KeySet>, AuthError> {
        let arrived = Instant::now();
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.current.load_full() {
            if !Arc::ptr_eq(&current, seen) {
                return Ok(current);
            }
            if current.fetched_at.elapsed() < self.policy.refresh_cooldown {
                tracing::debug!("key set refreshed recently, skipping forced refresh");
                return Ok(current);
            }
        }
        if self.failed_since(arrived) || self.in_backoff() {
            return Err(AuthError::KeySetUnavailable);
        }

        let keys = self.fetch().await.map_err(|err| {
            self.record_failure();
            tracing::warn!(
                error = %err,
                source = %self.source.describe(),
                "forced key set refresh failed"
            );
            AuthError::KeySetUnavailable
        })?;

        Ok(self.publish(keys))
    }

    fn record_failure(&self) {
        self.last_failure.store(Some(Arc::new(Instant::now())));
    }

    // A fetch failed while this caller was queued on the refresh lock.
    fn failed_since(&self, arrived: Instant) -> bool {
        self.last_failure
            .load_full()
            .is_some_and(|failed_at| *failed_at >= arrived)
    }

    fn in_backoff(&self) -> bool {
        self.last_failure
            .load_full()
            .is_some_and(|failed_at| failed_at.elapsed() < self.policy.refresh_cooldown)
    }

    fn is_stale(&self, keys: &KeySet) -> bool {
        self.policy
            .ttl
            .is_some_and(|ttl| keys.fetched_at.elapsed() >= ttl)
    }

    async fn fetch(&self) -> Result<KeySet, KeySetError> {
        let document = self.source.fetch().await?;
        KeySet::from_document(document, self.policy.default_algorithm)
    }

    fn publish(&self, keys: KeySet) -> Arc<KeySet> {
        if keys.is_empty() {
            tracing::warn!(source = %self.source.describe(), "key set contains no signing keys");
        }
        tracing::info!(
            source = %self.source.describe(),
            keys = keys.len(),
            "signing key set loaded"
        );
        tracing::debug!(kids = ?keys.key_ids().collect::<Vec<_>>(), "signing key ids");

        let keys = Arc::new(keys);
        self.current.store(Some(keys.clone()));
        self.last_failure.store(None);
        keys
    }
}
