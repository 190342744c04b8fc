// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CloudFront event types.

use std::collections::HashMap;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::auth::AuthorizationSource;

/// Viewer-request event as delivered by CloudFront.
#[derive(Debug, Deserialize)]
pub struct CloudFrontEvent {
    #[serde(rename = "Records")]
    pub records: Vec<CloudFrontRecord>,
}

impl CloudFrontEvent {
    /// The request of the first record, which is the one CloudFront acts on.
    pub fn into_request(self) -> Option<CloudFrontRequest> {
        self.records.into_iter().next().map(|record| record.cf.request)
    }
}

#[derive(Debug, Deserialize)]
pub struct CloudFrontRecord {
    pub cf: CloudFrontPayload,
}

#[derive(Debug, Deserialize)]
pub struct CloudFrontPayload {
    pub request: CloudFrontRequest,
}

/// One header entry; CloudFront keeps the original casing in `key`.
#[derive(Debug, Deserialize)]
struct HeaderEntry {
    value: String,
}

/// The parts of the request the authenticator reads.
#[derive(Debug, Default, Deserialize)]
struct RequestView {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    headers: HashMap<String, Vec<HeaderEntry>>,
}

/// The `cf.request` object, kept verbatim.
#[derive(Debug)]
pub struct CloudFrontRequest {
    raw: Box<RawValue>,
    method: Option<String>,
    uri: Option<String>,
    authorization: Option<String>,
}

impl CloudFrontRequest {
    /// Wrap a raw request object, reading the fields the authenticator needs.
    pub fn from_raw(raw: Box<RawValue>) -> Result<Self, serde_json::Error> {
        let view: RequestView = serde_json::from_str(raw.get())?;
        let authorization = view
            .headers
            .get("authorization")
            .and_then(|values| values.first())
            .map(|entry| entry.value.clone());

        Ok(Self {
            raw,
            method: view.method,
            uri: view.uri,
            authorization,
        })
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// The request JSON exactly as received.
    pub fn as_raw(&self) -> &RawValue {
        &self.raw
    }

    pub fn into_raw(self) -> Box<RawValue> {
        self.raw
    }
}

impl<'de> Deserialize<'de> for CloudFrontRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(D::Error::custom)
    }
}

impl AuthorizationSource for CloudFrontRequest {
    fn authorization(&self) -> Option<&[u8]> {
        self.authorization.as_deref().map(str::as_bytes)
    }
}

/// Synthetic response returned instead of forwarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFrontResponse {
    pub status: String,
    pub status_description: String,
}

impl CloudFrontResponse {
    /// The fixed rejection: no body, no headers.
    pub fn unauthorized() -> Self {
        Self {
            status: "401".to_string(),
            status_description: "Unauthorized".to_string(),
        }
    }
}
