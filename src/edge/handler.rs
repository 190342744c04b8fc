// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Viewer-request handler.

use serde::Serialize;
use serde_json::value::RawValue;
use tracing::{debug, warn};

use super::event::{CloudFrontEvent, CloudFrontResponse};
use crate::auth::{Decision, Interceptor};

/// What CloudFront should do with the request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EdgeResult {
    /// Continue to the origin with this (unchanged) request object.
    Forward(Box<RawValue>),
    /// Answer the viewer directly.
    Respond(CloudFrontResponse),
}

impl EdgeResult {
    pub fn is_forward(&self) -> bool {
        matches!(self, EdgeResult::Forward(_))
    }
}

/// Authenticate the request carried by a raw viewer-request event.
pub async fn handle_viewer_request(interceptor: &Interceptor, event: &[u8]) -> EdgeResult {
    let request = match serde_json::from_slice::<CloudFrontEvent>(event) {
        Ok(event) => event.into_request(),
        Err(e) => {
            warn!(target: "edge_auth::edge", error = %e, "Unparseable viewer-request event");
            None
        }
    };

    let Some(request) = request else {
        return EdgeResult::Respond(CloudFrontResponse::unauthorized());
    };

    debug!(
        target: "edge_auth::edge",
        method = ?request.method(),
        uri = ?request.uri(),
        "Handling viewer request"
    );

    match interceptor.intercept(request).await {
        Decision::Forward(request) => EdgeResult::Forward(request.into_raw()),
        Decision::Reject(_) => EdgeResult::Respond(CloudFrontResponse::unauthorized()),
    }
}
