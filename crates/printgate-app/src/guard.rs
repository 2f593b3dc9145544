// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request guard: identifies the user a fronting proxy authenticated.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

/// User name recorded for a request.
///
/// `anonymous` when no header is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser(pub String);

impl RemoteUser {
    pub fn anonymous() -> Self {
        Self("anonymous".into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// Middleware requiring the configured remote-user header.
///
/// Requests without it get 401. Otherwise the user is stored as a
/// [`RemoteUser`] extension for handlers and log spans.
pub async fn require_remote_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user = match state.config().remote_user_header.as_deref() {
        None => RemoteUser::anonymous(),
        Some(header) => {
            let value = req
                .headers()
                .get(header)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            match value {
                Some(name) => RemoteUser(name.to_string()),
                None => {
                    warn!(header, path = %req.uri().path(), "request without remote user");
                    return (StatusCode::UNAUTHORIZED, "authentication required").into_response();
                }
            }
        }
    };

    req.extensions_mut().insert(user);
    next.run(req).await
}
