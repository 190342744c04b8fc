// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! JWT verification for requests on their way to an unauthenticated origin.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>` (or Basic with the JWT as
//!    password)
//! 2. The interceptor:
//!    - Extracts the token from the header
//!    - Decodes it without verification to learn `kid` and `iss`
//!    - Rejects foreign issuers before touching the network
//!    - Fetches the signing key from the JWKS endpoint (cached with TTL)
//!    - Verifies signature, issuer, audience and expiry
//! 3. The original request is forwarded untouched, or a bare 401 is returned
//!
//! ## Security
//!
//! - Every failure is the same 401; the reason only reaches the logs
//! - Tokens are never logged, only a short SHA-256 fingerprint
//! - Key fetches are bounded by a timeout and fail closed

pub mod config;
pub mod credential;
pub mod error;
pub mod interceptor;
pub mod jwks;
pub mod middleware;
pub mod token;
pub mod verifier;

pub use config::TrustedConfig;
pub use credential::{AuthorizationSource, Credential, Scheme};
pub use error::{AuthError, ClaimFailure};
pub use interceptor::{Decision, Interceptor, Rejection};
pub use jwks::{JwksManager, SigningKey};
pub use middleware::{auth_middleware, require_auth};
pub use verifier::{VerifiedToken, Verifier};
