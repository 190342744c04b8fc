// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature and claims verification.
//!
//! The algorithm comes from the token header but is only honoured when the
//! resolved key accepts it, so a token cannot pick HMAC against an RSA or
//! Ed25519 public key.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde::Deserialize;
use tracing::debug;

use super::error::{AuthError, ClaimFailure};
use super::jwks::SigningKey;

/// Claims read after the signature has been accepted.
#[derive(Debug, Deserialize)]
struct VerifiedClaims {
    #[serde(default)]
    sub: Option<String>,
    iss: String,
    #[serde(default)]
    exp: Option<f64>,
}

/// What is known about the caller once a token is accepted.
///
/// Used for decision logging only; it never travels with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// `sub` claim, if present
    pub subject: Option<String>,
    /// Verified issuer
    pub issuer: String,
    /// Key that signed the token
    pub kid: Option<String>,
    /// `exp` claim, if present
    pub expires_at: Option<DateTime<Utc>>,
}

/// Checks signature, issuer, audience and time claims.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    /// Clock skew tolerance for `exp`/`nbf`, in seconds
    leeway: u64,
}

impl Verifier {
    pub fn new(leeway: u64) -> Self {
        Self { leeway }
    }

    /// Verify `token` against `key` and the trusted issuer/audience.
    pub fn verify(
        &self,
        token: &str,
        key: &SigningKey,
        trusted_issuer: &str,
        trusted_audience: &str,
    ) -> Result<VerifiedToken, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        if !key.accepts(header.alg) {
            debug!(
                target: "edge_auth::verifier",
                alg = ?header.alg,
                family = ?key.family,
                declared = ?key.algorithm,
                "Token algorithm not accepted by key"
            );
            return Err(AuthError::SignatureInvalid);
        }

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.leeway;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_issuer(&[trusted_issuer]);
        validation.set_audience(&[trusted_audience]);

        let data = decode::<VerifiedClaims>(token, &key.decoding_key, &validation)
            .map_err(|e| {
                let error = map_jwt_error(e.kind());
                debug!(target: "edge_auth::verifier", error = %error, detail = %e, "Token verification failed");
                error
            })?;

        let claims = data.claims;
        Ok(VerifiedToken {
            subject: claims.sub,
            issuer: claims.iss,
            kid: header.kid,
            expires_at: claims
                .exp
                .and_then(|exp| DateTime::<Utc>::from_timestamp(exp as i64, 0)),
        })
    }
}

fn map_jwt_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::ClaimValidationFailure(ClaimFailure::Expired),
        ErrorKind::ImmatureSignature => {
            AuthError::ClaimValidationFailure(ClaimFailure::NotYetValid)
        }
        ErrorKind::InvalidIssuer => AuthError::ClaimValidationFailure(ClaimFailure::Issuer),
        ErrorKind::InvalidAudience => AuthError::ClaimValidationFailure(ClaimFailure::Audience),
        ErrorKind::InvalidSubject => AuthError::ClaimValidationFailure(ClaimFailure::Subject),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::ClaimValidationFailure(ClaimFailure::Missing(claim.clone()))
        }
        ErrorKind::InvalidClaimFormat(claim) => {
            AuthError::ClaimValidationFailure(ClaimFailure::InvalidFormat(claim.clone()))
        }
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedToken
        }
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidEcdsaKey
        | ErrorKind::InvalidEddsaKey
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidKeyFormat => AuthError::SignatureInvalid,
        other => AuthError::Internal(format!("unexpected verification error: {other:?}")),
    }
}
