// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Read-only access to files that are still in the upload directory.

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use printgate_core::types::DocumentType;

use crate::services::upload_dir::resolve_upload;
use crate::state::AppState;

pub(super) async fn uploaded_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    let Some(path) = resolve_upload(&state.config().upload_dir, &filename) else {
        debug!(filename = %filename, "rejected upload path");
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = DocumentType::from_filename(&filename).mime_type();
            (
                [
                    (header::CONTENT_TYPE, mime.to_string()),
                    (header::CONTENT_DISPOSITION, format!("inline; filename=\"{filename}\"")),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!(error = %e, path = %path.display(), "could not read upload");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
