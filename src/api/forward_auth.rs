// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::http::StatusCode;

/// Forward-auth check for reverse proxies.
///
/// Only reached once the auth middleware has accepted the request.
pub async fn authorize() -> StatusCode {
    StatusCode::NO_CONTENT
}
