// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Unverified token decoding.
//!
//! The header and payload are parsed only to learn which key to fetch and
//! whether the issuer is worth a network round trip. Nothing decoded here is
//! trusted until [`super::verifier::Verifier`] has checked the signature.

use jsonwebtoken::Algorithm;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::AuthError;

/// `aud` claim: a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `audience` equals or is contained in this claim.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(aud) => aud == audience,
            Audience::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// Token header fields needed to pick a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    /// Key ID
    pub kid: Option<String>,
    /// Declared signing algorithm
    pub alg: Algorithm,
}

/// Payload claims read before verification. Other claims are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecodedPayload {
    /// Issuer
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience
    #[serde(default)]
    pub aud: Option<Audience>,
    /// Expiration timestamp (seconds, may be fractional)
    #[serde(default)]
    pub exp: Option<f64>,
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,
}

/// Result of the structural parse.
#[derive(Debug, Clone)]
pub struct DecodedToken {
    pub header: DecodedHeader,
    pub payload: DecodedPayload,
}

/// Parse a compact JWS into header and payload without checking the signature.
pub fn decode_unverified(token: &str) -> Result<DecodedToken, AuthError> {
    if token.split('.').count() != 3 {
        return Err(AuthError::MalformedToken);
    }

    let data = jsonwebtoken::dangerous::insecure_decode::<DecodedPayload>(token)
        .map_err(|_| AuthError::MalformedToken)?;

    Ok(DecodedToken {
        header: DecodedHeader {
            kid: data.header.kid,
            alg: data.header.alg,
        },
        payload: data.claims,
    })
}

/// Short SHA-256 prefix identifying a token in logs without revealing it.
pub fn fingerprint(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    /// Unsigned token for structural tests; the signature is never checked here.
    fn unsigned_jwt(header: &str, claims: &str) -> String {
        format!(
            "{}.{}.fake_signature",
            URL_SAFE_NO_PAD.encode(header.as_bytes()),
            URL_SAFE_NO_PAD.encode(claims.as_bytes())
        )
    }

    #[test]
    fn decodes_kid_alg_and_claims() {
        let token = unsigned_jwt(
            r#"{"alg":"RS256","typ":"JWT","kid":"key-1"}"#,
            r#"{"iss":"https://auth.example.com/","aud":"https://agent.example.com","exp":9999999999,"sub":"user_1","scope":"ignored"}"#,
        );

        let decoded = decode_unverified(&token).unwrap();
        assert_eq!(decoded.header.kid.as_deref(), Some("key-1"));
        assert_eq!(decoded.header.alg, Algorithm::RS256);
        assert_eq!(
            decoded.payload.iss.as_deref(),
            Some("https://auth.example.com/")
        );
        assert_eq!(
            decoded.payload.aud,
            Some(Audience::One("https://agent.example.com".to_string()))
        );
        assert_eq!(decoded.payload.exp, Some(9999999999.0));
        assert_eq!(decoded.payload.sub.as_deref(), Some("user_1"));
    }

    #[test]
    fn decodes_audience_array() {
        let token = unsigned_jwt(
            r#"{"alg":"EdDSA"}"#,
            r#"{"iss":"a","aud":["x","y"]}"#,
        );

        let decoded = decode_unverified(&token).unwrap();
        assert!(decoded.header.kid.is_none());
        let aud = decoded.payload.aud.unwrap();
        assert!(aud.contains("y"));
        assert!(!aud.contains("z"));
    }

    #[test]
    fn missing_claims_decode_as_none() {
        let token = unsigned_jwt(r#"{"alg":"ES256"}"#, "{}");

        let decoded = decode_unverified(&token).unwrap();
        assert!(decoded.payload.iss.is_none());
        assert!(decoded.payload.aud.is_none());
        assert!(decoded.payload.exp.is_none());
    }

    #[test]
    fn wrong_part_count_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d"] {
            assert!(matches!(
                decode_unverified(token),
                Err(AuthError::MalformedToken)
            ));
        }
    }

    #[test]
    fn non_json_parts_are_malformed() {
        let token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode("not json"),
            URL_SAFE_NO_PAD.encode("{}")
        );
        assert!(matches!(
            decode_unverified(&token),
            Err(AuthError::MalformedToken)
        ));

        let token = unsigned_jwt(r#"{"alg":"RS256"}"#, "[1,2,3]");
        assert!(matches!(
            decode_unverified(&token),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn unknown_algorithm_is_malformed() {
        let token = unsigned_jwt(r#"{"alg":"none"}"#, r#"{"iss":"a"}"#);
        assert!(matches!(
            decode_unverified(&token),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = fingerprint("abc.def.ghi");
        assert_eq!(a.len(), 12);
        assert_eq!(a, fingerprint("abc.def.ghi"));
        assert_ne!(a, fingerprint("abc.def.ghj"));
    }
}
