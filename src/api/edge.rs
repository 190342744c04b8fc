// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{body::Bytes, extract::State, Json};

use crate::edge::{handle_viewer_request, EdgeResult};
use crate::state::AppState;

/// Authenticate a CloudFront viewer-request event.
///
/// Always 200: the body is either the request to forward or the 401
/// response object for CloudFront to return.
pub async fn viewer_request(State(state): State<AppState>, body: Bytes) -> Json<EdgeResult> {
    Json(handle_viewer_request(&state.interceptor, &body).await)
}
