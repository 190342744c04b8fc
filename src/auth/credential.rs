// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction from the `authorization` header.
//!
//! Two schemes are understood:
//!
//! - `Bearer <jwt>`: the credential is the token.
//! - `Basic <base64(identity:jwt)>`: the token travels as the password. The
//!   decoded string is split on every `:` and the second field is taken, so an
//!   identity or token containing `:` changes what is extracted
//!   (`user:pa:ss` yields `pa`).
//!
//! Header values are split on single spaces; anything after the second field
//! is ignored.

use axum::http::{header::AUTHORIZATION, HeaderMap, Request};
use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use tracing::trace;

use super::AuthError;

/// Standard alphabet, padding optional.
const BASIC_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Anything the pipeline can read an `authorization` header from.
///
/// Implementations must not copy or alter the request; only the first value
/// of the header is consulted.
pub trait AuthorizationSource {
    /// Raw bytes of the first `authorization` header value, if any.
    fn authorization(&self) -> Option<&[u8]>;
}

impl AuthorizationSource for HeaderMap {
    fn authorization(&self) -> Option<&[u8]> {
        self.get(AUTHORIZATION).map(|value| value.as_bytes())
    }
}

impl<B> AuthorizationSource for Request<B> {
    fn authorization(&self) -> Option<&[u8]> {
        self.headers().authorization()
    }
}

/// Authorization scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Basic,
    Bearer,
    Unsupported,
}

impl Scheme {
    /// Parse scheme from string (case-insensitive).
    pub fn parse(s: &str) -> Scheme {
        if s.eq_ignore_ascii_case("basic") {
            Scheme::Basic
        } else if s.eq_ignore_ascii_case("bearer") {
            Scheme::Bearer
        } else {
            Scheme::Unsupported
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Basic => write!(f, "basic"),
            Scheme::Bearer => write!(f, "bearer"),
            Scheme::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Scheme plus the raw credential that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: Scheme,
    pub raw: String,
}

impl Credential {
    /// Split a header value into scheme and credential.
    pub fn from_header_value(value: &str) -> Self {
        let mut fields = value.split(' ');
        let scheme = Scheme::parse(fields.next().unwrap_or_default());
        let raw = fields.next().unwrap_or_default().to_string();

        Self { scheme, raw }
    }

    /// Turn the credential into the JWT it carries.
    pub fn into_token(self) -> Result<String, AuthError> {
        let token = match self.scheme {
            Scheme::Unsupported => return Err(AuthError::UnsupportedScheme),
            Scheme::Bearer => self.raw,
            Scheme::Basic => basic_password(&self.raw)?,
        };

        if token.is_empty() {
            return Err(AuthError::MalformedToken);
        }

        Ok(token)
    }
}

/// Extract the credential from a request.
pub fn extract_credential<S>(source: &S) -> Result<Credential, AuthError>
where
    S: AuthorizationSource + ?Sized,
{
    let header = source.authorization().ok_or(AuthError::MissingCredential)?;
    let value = std::str::from_utf8(header).map_err(|_| AuthError::MalformedToken)?;

    let credential = Credential::from_header_value(value);
    trace!(target: "edge_auth::credential", scheme = %credential.scheme, "Authorization scheme detected");

    Ok(credential)
}

/// Second `:`-separated field of a Basic credential.
fn basic_password(raw: &str) -> Result<String, AuthError> {
    let bytes = BASIC_ENGINE
        .decode(raw)
        .map_err(|_| AuthError::MalformedToken)?;
    let decoded = String::from_utf8(bytes).map_err(|_| AuthError::MalformedToken)?;

    decoded
        .split(':')
        .nth(1)
        .map(str::to_string)
        .ok_or(AuthError::MalformedToken)
}
