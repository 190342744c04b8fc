// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request interceptor: the authentication decision pipeline.
//!
//! ```text
//! Start ─► HasCredential ─► Decoded ─► IssuerTrusted ─► KeyResolved ─► Verified ─► Forward
//!   │            │             │              │               │             │
//!   └────────────┴─────────────┴──────────────┴───────────────┴─────────────┴─► Reject
//! ```
//!
//! The issuer is compared against the unverified payload before any key is
//! fetched, so tokens from foreign issuers never cost a network round trip.
//! Every failure, including a panic inside the pipeline, becomes
//! [`Decision::Reject`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use tracing::{debug, info, warn};

use super::config::TrustedConfig;
use super::credential::{extract_credential, AuthorizationSource, Credential};
use super::jwks::JwksManager;
use super::token::{decode_unverified, fingerprint};
use super::verifier::{VerifiedToken, Verifier};
use super::AuthError;

/// Outcome of intercepting a request.
#[derive(Debug)]
pub enum Decision<R> {
    /// Let the original request continue, untouched.
    Forward(R),
    /// Short-circuit with a bare 401.
    Reject(Rejection),
}

impl<R> Decision<R> {
    pub fn is_forward(&self) -> bool {
        matches!(self, Decision::Forward(_))
    }

    /// Internal reason for a rejection.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Forward(_) => None,
            Decision::Reject(rejection) => Some(rejection),
        }
    }
}

/// A rejected request.
///
/// The reason is kept for logs and tests; the response built from it is
/// always the same `401 Unauthorized` with no body.
#[derive(Debug)]
pub struct Rejection {
    reason: AuthError,
}

impl Rejection {
    pub fn reason(&self) -> &AuthError {
        &self.reason
    }

    pub fn status_code(&self) -> StatusCode {
        self.reason.status_code()
    }
}

impl From<AuthError> for Rejection {
    fn from(reason: AuthError) -> Self {
        Self { reason }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        self.reason.into_response()
    }
}

/// Authentication pipeline bound to one trusted configuration.
#[derive(Clone)]
pub struct Interceptor {
    config: Arc<TrustedConfig>,
    resolver: JwksManager,
    verifier: Verifier,
}

impl Interceptor {
    /// Create an interceptor with its own key cache.
    pub fn new(config: TrustedConfig) -> Self {
        let resolver = JwksManager::new(config.timeout).with_cache_ttl(config.cache_ttl);
        let verifier = Verifier::new(config.leeway);

        Self {
            config: Arc::new(config),
            resolver,
            verifier,
        }
    }

    pub fn config(&self) -> &TrustedConfig {
        &self.config
    }

    pub fn resolver(&self) -> &JwksManager {
        &self.resolver
    }

    /// Decide whether `request` may continue to the origin.
    pub async fn intercept<R>(&self, request: R) -> Decision<R>
    where
        R: AuthorizationSource,
    {
        // Only the extracted credential crosses the await below.
        let credential = extract_credential(&request);

        let outcome = AssertUnwindSafe(self.authorize(credential))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(AuthError::Internal(
                    "panic in authentication pipeline".to_string(),
                ))
            });

        match outcome {
            Ok(verified) => {
                info!(
                    target: "edge_auth::decision",
                    outcome = "forward",
                    kid = ?verified.kid,
                    sub = ?verified.subject,
                    expires_at = ?verified.expires_at,
                    "Request authenticated"
                );
                Decision::Forward(request)
            }
            Err(reason) => {
                match &reason {
                    AuthError::KeyResolutionFailure(_) | AuthError::Internal(_) => warn!(
                        target: "edge_auth::decision",
                        outcome = "reject",
                        reason = reason.error_code(),
                        detail = %reason,
                        "Request rejected"
                    ),
                    _ => info!(
                        target: "edge_auth::decision",
                        outcome = "reject",
                        reason = reason.error_code(),
                        detail = %reason,
                        "Request rejected"
                    ),
                }
                Decision::Reject(Rejection::from(reason))
            }
        }
    }

    async fn authorize(
        &self,
        credential: Result<Credential, AuthError>,
    ) -> Result<VerifiedToken, AuthError> {
        // HasCredential
        let token = credential?.into_token()?;
        debug!(target: "edge_auth::decision", token = %fingerprint(&token), "Token extracted");

        // Decoded
        let decoded = decode_unverified(&token)?;

        // IssuerTrusted
        if decoded.payload.iss.as_deref() != Some(self.config.trusted_issuer.as_str()) {
            debug!(target: "edge_auth::decision", iss = ?decoded.payload.iss, "Untrusted issuer");
            return Err(AuthError::UntrustedIssuer);
        }

        // KeyResolved
        let key = self
            .resolver
            .resolve(&self.config.jwks_uri, decoded.header.kid.as_deref())
            .await?;

        // Verified
        self.verifier.verify(
            &token,
            &key,
            &self.config.trusted_issuer,
            &self.config.trusted_audience,
        )
    }
}
