// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant is fatal for the request it occurs in and maps to the same
//! external outcome: a bare `401 Unauthorized`. The variant and its message
//! only ever reach the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// The claim that failed validation after the signature was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimFailure {
    /// `iss` differs from the trusted issuer
    Issuer,
    /// `aud` neither equals nor contains the trusted audience
    Audience,
    /// `exp` is in the past
    Expired,
    /// `nbf` is in the future
    NotYetValid,
    /// A required claim is absent
    Missing(String),
    /// A claim is present but has the wrong type or range
    InvalidFormat(String),
    /// `sub` is not an accepted subject
    Subject,
}

impl std::fmt::Display for ClaimFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimFailure::Issuer => write!(f, "issuer mismatch"),
            ClaimFailure::Audience => write!(f, "audience mismatch"),
            ClaimFailure::Expired => write!(f, "token expired"),
            ClaimFailure::NotYetValid => write!(f, "token not yet valid"),
            ClaimFailure::Missing(claim) => write!(f, "missing required claim `{claim}`"),
            ClaimFailure::InvalidFormat(claim) => write!(f, "malformed claim `{claim}`"),
            ClaimFailure::Subject => write!(f, "subject mismatch"),
        }
    }
}

/// Authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is required")]
    MissingCredential,
    /// Scheme is neither Basic nor Bearer
    #[error("Unsupported authorization scheme")]
    UnsupportedScheme,
    /// Credential or token is structurally invalid
    #[error("Token is malformed")]
    MalformedToken,
    /// Unverified `iss` claim is not the trusted issuer
    #[error("Token issuer is not trusted")]
    UntrustedIssuer,
    /// No usable key in the key set matches the token
    #[error("No matching key found in JWKS")]
    KeyNotFound,
    /// Key set could not be fetched or parsed in time
    #[error("Failed to resolve signing key: {0}")]
    KeyResolutionFailure(String),
    /// Signature or algorithm check failed
    #[error("Token signature is invalid")]
    SignatureInvalid,
    /// Signature was fine but a claim was not
    #[error("Token claims are invalid: {0}")]
    ClaimValidationFailure(ClaimFailure),
    /// Anything else that went wrong inside the pipeline
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::UnsupportedScheme => "unsupported_scheme",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UntrustedIssuer => "untrusted_issuer",
            AuthError::KeyNotFound => "key_not_found",
            AuthError::KeyResolutionFailure(_) => "key_resolution_failure",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::ClaimValidationFailure(_) => "claim_validation_failure",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Always 401: a key-set outage is indistinguishable from a bad token.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // The body stays empty so nothing about the failing stage leaks.
        self.status_code().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_error_is_a_bare_401() {
        let errors = [
            AuthError::MissingCredential,
            AuthError::UnsupportedScheme,
            AuthError::MalformedToken,
            AuthError::UntrustedIssuer,
            AuthError::KeyNotFound,
            AuthError::KeyResolutionFailure("timed out".to_string()),
            AuthError::SignatureInvalid,
            AuthError::ClaimValidationFailure(ClaimFailure::Expired),
            AuthError::Internal("boom".to_string()),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().is_empty());

            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(body.is_empty());
        }
    }

    #[test]
    fn claim_failure_is_specific_in_logs() {
        let error = AuthError::ClaimValidationFailure(ClaimFailure::Missing("aud".to_string()));
        assert_eq!(error.error_code(), "claim_validation_failure");
        assert_eq!(
            error.to_string(),
            "Token claims are invalid: missing required claim `aud`"
        );
    }
}
