// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Puts the [`Interceptor`] in front of a router subtree. Authenticated
//! requests reach the inner service exactly as they arrived; nothing is
//! added to headers or extensions. Everything else gets a bare 401.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

use super::interceptor::{Decision, Interceptor};

/// Authentication middleware function.
///
/// # Usage
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/protected", get(protected_handler))
///     .route_layer(axum::middleware::from_fn_with_state(
///         interceptor.clone(),
///         auth_middleware,
///     ));
/// ```
pub async fn auth_middleware(
    State(interceptor): State<Interceptor>,
    request: Request,
    next: Next,
) -> Response {
    match interceptor.intercept(request).await {
        Decision::Forward(request) => next.run(request).await,
        Decision::Reject(rejection) => rejection.into_response(),
    }
}

/// Require authentication for every route currently in `router`.
pub fn require_auth<S>(router: Router<S>, interceptor: Interceptor) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(interceptor, auth_middleware))
}
