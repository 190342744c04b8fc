// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use crate::auth::{Interceptor, TrustedConfig};

#[derive(Clone)]
pub struct AppState {
    pub interceptor: Interceptor,
}

impl AppState {
    pub fn new(config: TrustedConfig) -> Self {
        Self {
            interceptor: Interceptor::new(config),
        }
    }
}
