// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP surface of the gateway.

mod files;
mod queue;
mod upload;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::response::Redirect;
use axum::routing::{get, post};

use crate::guard::require_remote_user;
use crate::state::AppState;

pub use queue::{CancelForm, QueuePage};
pub use upload::UploadPage;

/// Build the router with every gateway endpoint.
///
/// The remote-user guard covers all routes; the body limit follows
/// `max_upload_bytes`.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config().max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/index", get(index))
        .route("/upload", get(upload::upload_page).post(upload::submit_upload))
        .route("/queue", get(queue::queue_page))
        .route("/cancel_job", post(queue::cancel_job))
        .route("/uploads/{filename}", get(files::uploaded_file))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_remote_user,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn index() -> Redirect {
    Redirect::to("/upload")
}
