// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # CloudFront Viewer-Request Envelope
//!
//! Adapter between Lambda@Edge style viewer-request events and the
//! [`Interceptor`](crate::auth::Interceptor).
//!
//! - The request object is kept as raw JSON and handed back byte-for-byte
//!   when the request is forwarded
//! - Only `headers.authorization[0].value` is read from it
//! - A rejection is the fixed `{"status":"401","statusDescription":"Unauthorized"}`
//! - An event that cannot be parsed is rejected as well
//!
//! ## Deployment
//!
//! The binary exposes the handler as `POST /v1/edge/viewer-request`. The
//! request body is the event, and the JSON response is what the function
//! returns to CloudFront. A Lambda@Edge deployment runs the binary behind an
//! HTTP-forwarding Lambda runtime adapter (such as the AWS Lambda Web
//! Adapter extension), which posts each invocation payload to this route.
//! Embedding in a native Lambda runtime only needs
//! [`handle_viewer_request`] with the raw event bytes and an
//! [`Interceptor`](crate::auth::Interceptor) built once per cold start.

pub mod event;
pub mod handler;

pub use event::{CloudFrontEvent, CloudFrontRequest, CloudFrontResponse};
pub use handler::{handle_viewer_request, EdgeResult};
