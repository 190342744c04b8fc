// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{any, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{auth::require_auth, state::AppState};

pub mod edge;
pub mod forward_auth;
pub mod health;

pub fn router(state: AppState) -> Router {
    let protected = require_auth(
        Router::new().route("/authorize", any(forward_auth::authorize)),
        state.interceptor.clone(),
    );

    let v1_routes = Router::new()
        .route("/edge/viewer-request", post(edge::viewer_request))
        .merge(protected);

    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
