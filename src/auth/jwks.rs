// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Security
//!
//! - Symmetric (`oct`) keys and keys marked for encryption are never used
//! - Each key is pinned to the algorithms its type supports, and to its
//!   declared `alg` when the key set carries one
//! - A fetch is bounded by the configured timeout; expiry is a resolution
//!   failure, never retried
//!
//! ## Caching
//!
//! Key sets are cached per JWKS URI with a TTL. A `kid` missing from a live
//! entry triggers one refetch, unless the entry was fetched within
//! [`MIN_REFRESH_INTERVAL`]. Refills are single-flight: concurrent misses
//! wait for the fetch in progress and then read its result from the cache,
//! or share its failure.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default key fetch timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// A kid miss only refetches a key set older than this.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Key type of a verification key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFamily {
    Rsa,
    EcP256,
    EcP384,
    Ed25519,
}

impl KeyFamily {
    /// Whether a token signed with `alg` can be checked by a key of this type.
    pub fn supports(self, alg: Algorithm) -> bool {
        match self {
            KeyFamily::Rsa => matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            ),
            KeyFamily::EcP256 => alg == Algorithm::ES256,
            KeyFamily::EcP384 => alg == Algorithm::ES384,
            KeyFamily::Ed25519 => alg == Algorithm::EdDSA,
        }
    }
}

/// Verification-ready public key taken from a key set.
#[derive(Clone)]
pub struct SigningKey {
    /// Key ID
    pub kid: Option<String>,
    /// Key type
    pub family: KeyFamily,
    /// Algorithm declared by the key set, if any
    pub algorithm: Option<Algorithm>,
    /// Public key material
    pub decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("family", &self.family)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Convert a JWK to a SigningKey.
    pub fn from_jwk(jwk: &Jwk) -> Result<Self, AuthError> {
        if matches!(
            jwk.common.public_key_use,
            Some(PublicKeyUse::Encryption) | Some(PublicKeyUse::Other(_))
        ) {
            return Err(unusable("key is not a signing key"));
        }

        let (family, decoding_key) = match &jwk.algorithm {
            AlgorithmParameters::RSA(rsa) => {
                let key = DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
                    .map_err(|e| unusable(format!("invalid RSA key: {e}")))?;
                (KeyFamily::Rsa, key)
            }
            AlgorithmParameters::EllipticCurve(ec) => {
                let family = match ec.curve {
                    EllipticCurve::P256 => KeyFamily::EcP256,
                    EllipticCurve::P384 => KeyFamily::EcP384,
                    ref other => return Err(unusable(format!("unsupported EC curve {other:?}"))),
                };
                let key = DecodingKey::from_ec_components(&ec.x, &ec.y)
                    .map_err(|e| unusable(format!("invalid EC key: {e}")))?;
                (family, key)
            }
            AlgorithmParameters::OctetKeyPair(okp) => {
                if !matches!(okp.curve, EllipticCurve::Ed25519) {
                    return Err(unusable(format!("unsupported OKP curve {:?}", okp.curve)));
                }
                let key = DecodingKey::from_ed_components(&okp.x)
                    .map_err(|e| unusable(format!("invalid Ed25519 key: {e}")))?;
                (KeyFamily::Ed25519, key)
            }
            _ => return Err(unusable("symmetric or unknown key type")),
        };

        let algorithm = match jwk.common.key_algorithm {
            None => None,
            Some(declared) => Some(
                signing_algorithm(declared)
                    .filter(|alg| family.supports(*alg))
                    .ok_or_else(|| {
                        unusable(format!("declared algorithm {declared:?} does not fit key"))
                    })?,
            ),
        };

        Ok(Self {
            kid: jwk.common.key_id.clone(),
            family,
            algorithm,
            decoding_key,
        })
    }

    /// Whether this key may verify a token whose header declares `alg`.
    pub fn accepts(&self, alg: Algorithm) -> bool {
        self.family.supports(alg) && self.algorithm.is_none_or(|declared| declared == alg)
    }
}

/// Raw key set; entries are parsed one by one so a single odd key does not
/// poison the whole set.
#[derive(Debug, Deserialize)]
struct RawKeySet {
    keys: Vec<serde_json::Value>,
}

/// JWKS cache entry.
struct CacheEntry {
    keys: Arc<[SigningKey]>,
    fetched_at: Instant,
}

/// Outcome of the most recent fetch, guarded by the refill lock.
#[derive(Default)]
struct RefillState {
    /// Fetches completed so far
    generation: u64,
    /// URI and reason of the last fetch, if it failed
    failure: Option<(String, String)>,
}

/// JWKS manager with per-URI caching.
#[derive(Clone)]
pub struct JwksManager {
    /// Fetch timeout
    timeout: Duration,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key sets by JWKS URI
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// Held while a key set is being fetched
    refill: Arc<Mutex<RefillState>>,
    /// Mirror of `RefillState::generation`, readable without the lock
    generation: Arc<AtomicU64>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager whose fetches are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(target: "edge_auth::jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            timeout,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(HashMap::new())),
            refill: Arc::new(Mutex::new(RefillState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            client,
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Resolve the signing key for `kid` from the key set at `jwks_uri`.
    ///
    /// Without a `kid` the key set must hold exactly one usable key.
    pub async fn resolve(&self, jwks_uri: &str, kid: Option<&str>) -> Result<SigningKey, AuthError> {
        if let Some(found) = self.lookup_cached(jwks_uri, kid).await {
            return found;
        }

        let seen = self.generation.load(Ordering::Acquire);
        let mut refill = self.refill.lock().await;

        // Another task may have refilled the cache while we waited.
        if let Some(found) = self.lookup_cached(jwks_uri, kid).await {
            return found;
        }
        if refill.generation != seen {
            if let Some((uri, reason)) = &refill.failure {
                if uri == jwks_uri {
                    return Err(AuthError::KeyResolutionFailure(reason.clone()));
                }
            }
        }

        let keys = self.fetch_locked(&mut refill, jwks_uri).await?;
        drop(refill);
        select_key(&keys, kid).ok_or_else(|| {
            warn!(target: "edge_auth::jwks", kid = ?kid, "Key not found in JWKS after refresh");
            AuthError::KeyNotFound
        })
    }

    /// Answer from the cache, or `None` when a fetch is needed.
    async fn lookup_cached(
        &self,
        jwks_uri: &str,
        kid: Option<&str>,
    ) -> Option<Result<SigningKey, AuthError>> {
        let (keys, age) = self.cached_keys(jwks_uri).await?;
        if let Some(key) = select_key(&keys, kid) {
            debug!(target: "edge_auth::jwks", kid = ?kid, "JWKS cache hit");
            return Some(Ok(key));
        }
        if age < MIN_REFRESH_INTERVAL {
            debug!(target: "edge_auth::jwks", kid = ?kid, "Key not found in fresh JWKS cache");
            return Some(Err(AuthError::KeyNotFound));
        }
        debug!(target: "edge_auth::jwks", kid = ?kid, "Key not found in JWKS cache, refetching");
        None
    }

    /// Force refresh the cache entry for `jwks_uri`.
    pub async fn refresh(&self, jwks_uri: &str) -> Result<(), AuthError> {
        let mut refill = self.refill.lock().await;
        self.fetch_locked(&mut refill, jwks_uri).await.map(|_| ())
    }

    /// Fetch while holding the refill lock and record the outcome.
    async fn fetch_locked(
        &self,
        refill: &mut RefillState,
        jwks_uri: &str,
    ) -> Result<Arc<[SigningKey]>, AuthError> {
        let result = self.fetch_and_store(jwks_uri).await;

        refill.generation += 1;
        refill.failure = match &result {
            Ok(_) => None,
            Err(AuthError::KeyResolutionFailure(reason)) => {
                Some((jwks_uri.to_string(), reason.clone()))
            }
            Err(e) => Some((jwks_uri.to_string(), e.to_string())),
        };
        self.generation.store(refill.generation, Ordering::Release);

        result
    }

    /// Check if the key set for `jwks_uri` is cached and within its TTL.
    pub async fn is_cached(&self, jwks_uri: &str) -> bool {
        self.cached_keys(jwks_uri).await.is_some()
    }

    /// Live cache entry and its age.
    async fn cached_keys(&self, jwks_uri: &str) -> Option<(Arc<[SigningKey]>, Duration)> {
        let cache = self.cache.read().await;
        let entry = cache.get(jwks_uri)?;
        let age = entry.fetched_at.elapsed();
        (age < self.cache_ttl).then(|| (Arc::clone(&entry.keys), age))
    }

    async fn fetch_and_store(&self, jwks_uri: &str) -> Result<Arc<[SigningKey]>, AuthError> {
        let keys: Arc<[SigningKey]> = self.fetch_jwks(jwks_uri).await?.into();

        let mut cache = self.cache.write().await;
        cache.insert(
            jwks_uri.to_string(),
            CacheEntry {
                keys: Arc::clone(&keys),
                fetched_at: Instant::now(),
            },
        );

        Ok(keys)
    }

    /// Fetch JWKS from the endpoint, bounded by the timeout.
    #[instrument(skip(self), fields(jwks_uri = %jwks_uri))]
    async fn fetch_jwks(&self, jwks_uri: &str) -> Result<Vec<SigningKey>, AuthError> {
        debug!(target: "edge_auth::jwks", "Fetching JWKS");

        let fetch = async {
            let response = self
                .client
                .get(jwks_uri)
                .send()
                .await
                .map_err(|e| AuthError::KeyResolutionFailure(e.to_string()))?;

            if !response.status().is_success() {
                return Err(AuthError::KeyResolutionFailure(format!(
                    "HTTP {} from JWKS endpoint",
                    response.status()
                )));
            }

            let key_set: RawKeySet = response
                .json()
                .await
                .map_err(|e| AuthError::KeyResolutionFailure(e.to_string()))?;

            Ok::<RawKeySet, AuthError>(key_set)
        };

        let key_set = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| {
                AuthError::KeyResolutionFailure(format!(
                    "JWKS fetch timed out after {} ms",
                    self.timeout.as_millis()
                ))
            })?
            .inspect_err(|e| warn!(target: "edge_auth::jwks", error = %e, "Failed to fetch JWKS"))?;

        let keys: Vec<SigningKey> = key_set
            .keys
            .into_iter()
            .filter_map(|value| {
                let parsed = serde_json::from_value::<Jwk>(value)
                    .map_err(|e| unusable(format!("unparseable JWK: {e}")))
                    .and_then(|jwk| SigningKey::from_jwk(&jwk));
                match parsed {
                    Ok(key) => Some(key),
                    Err(e) => {
                        debug!(target: "edge_auth::jwks", error = %e, "Skipping JWK");
                        None
                    }
                }
            })
            .collect();

        debug!(target: "edge_auth::jwks", key_count = keys.len(), "JWKS fetched");
        Ok(keys)
    }
}

fn select_key(keys: &[SigningKey], kid: Option<&str>) -> Option<SigningKey> {
    match kid {
        Some(kid) => keys.iter().find(|k| k.kid.as_deref() == Some(kid)).cloned(),
        None => match keys {
            [only] => Some(only.clone()),
            _ => None,
        },
    }
}

/// Asymmetric signature algorithm named by a JWK `alg`.
fn signing_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}

fn unusable(reason: impl Into<String>) -> AuthError {
    AuthError::KeyResolutionFailure(reason.into())
}
