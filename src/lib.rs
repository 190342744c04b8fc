// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge Authenticator - JWT gate in front of an unauthenticated origin
//!
//! Every request must carry a bearer token signed by a trusted identity
//! provider. Valid requests pass through unchanged; everything else is
//! answered with a bare `401 Unauthorized`.
//!
//! ## Modules
//!
//! - `auth` - Credential extraction, JWKS key resolution and JWT verification
//! - `edge` - CloudFront viewer-request envelope
//! - `api` - HTTP surface (Axum)
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod edge;
pub mod logging;
pub mod state;

#[cfg(test)]
mod test_support;
