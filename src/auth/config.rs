// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Trusted configuration for token verification.

use std::time::Duration;

use super::jwks::{DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};

/// Which tokens to trust and where their keys live.
///
/// Built once at startup and shared read-only for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedConfig {
    /// JWKS endpoint URL
    pub jwks_uri: String,
    /// Exact expected `iss`
    pub trusted_issuer: String,
    /// Expected `aud` (equal to, or contained in, the claim)
    pub trusted_audience: String,
    /// Upper bound for one key-set fetch
    pub timeout: Duration,
    /// How long a fetched key set is reused
    pub cache_ttl: Duration,
    /// Clock skew tolerance for `exp`/`nbf`, in seconds
    pub leeway: u64,
}

impl TrustedConfig {
    /// Create a new trusted configuration.
    ///
    /// # Arguments
    /// - `jwks_uri`: URL to fetch JWKS from
    /// - `trusted_issuer`: Expected token issuer
    /// - `trusted_audience`: Expected token audience
    pub fn new(
        jwks_uri: impl Into<String>,
        trusted_issuer: impl Into<String>,
        trusted_audience: impl Into<String>,
    ) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            trusted_issuer: trusted_issuer.into(),
            trusted_audience: trusted_audience.into(),
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            leeway: 0,
        }
    }

    /// Set the key fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the key cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the clock skew leeway.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }
}
