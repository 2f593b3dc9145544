// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Router state shared by every handler.

use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use printgate_core::error::{GatewayError, Result};

use crate::services::AppServices;

/// Services plus the key that signs flash cookies.
#[derive(Clone)]
pub struct AppState {
    services: Arc<AppServices>,
    flash_key: Key,
}

impl AppState {
    /// Wrap `services`, taking the flash key from `FLASH_SECRET` or
    /// generating one for this process.
    pub fn new(services: AppServices) -> Result<Self> {
        let flash_key = match services.config().flash_secret.as_deref() {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|e| GatewayError::Config(format!("FLASH_SECRET: {e}")))?,
            None => Key::generate(),
        };
        Ok(Self {
            services: Arc::new(services),
            flash_key,
        })
    }
}

impl Deref for AppState {
    type Target = AppServices;

    fn deref(&self) -> &AppServices {
        &self.services
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.flash_key.clone()
    }
}
