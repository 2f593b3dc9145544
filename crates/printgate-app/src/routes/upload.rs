// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::collections::{BTreeMap, BTreeSet};

use axum::Json;
use axum::extract::{Extension, Multipart, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Serialize;
use tracing::{Instrument, error, info_span, warn};

use printgate_core::types::{Notice, PrinterDescriptor};

use crate::flash;
use crate::guard::RemoteUser;
use crate::qr::upload_page_qr;
use crate::services::{UploadForm, UploadedFile};
use crate::state::AppState;

/// Data behind the upload form.
#[derive(Debug, Serialize)]
pub struct UploadPage {
    pub printers: BTreeMap<String, PrinterDescriptor>,
    pub messages: Vec<Notice>,
    pub allowed_extensions: BTreeSet<String>,
    pub max_upload_bytes: usize,
    /// Base64 PNG QR code of this page's URL, when it could be built.
    pub qr_code: Option<String>,
}

pub(super) async fn upload_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Json<UploadPage>) {
    let (jar, mut messages) = flash::take(jar);
    let qr_code = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .and_then(|host| match upload_page_qr(host) {
            Ok(code) => Some(code),
            Err(e) => {
                error!(error = %e, "could not build upload page QR code");
                None
            }
        });
    let (printers, failure) = state.printers().await;
    messages.extend(failure);

    let config = state.config();
    let page = UploadPage {
        printers,
        messages,
        allowed_extensions: config.allowed_extensions.clone(),
        max_upload_bytes: config.max_upload_bytes,
        qr_code,
    };
    (jar, Json(page))
}

pub(super) async fn submit_upload(
    State(state): State<AppState>,
    Extension(user): Extension<RemoteUser>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut form = UploadForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "unreadable upload body");
                return e.into_response();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => form.file = Some(UploadedFile { filename, bytes }),
                    Err(e) => {
                        warn!(error = %e, "upload interrupted");
                        return e.into_response();
                    }
                }
            }
            "printer_name" => match field.text().await {
                Ok(text) => form.printer_name = Some(text),
                Err(e) => return e.into_response(),
            },
            _ => {}
        }
    }

    let outcome = state
        .handle_upload(form)
        .instrument(info_span!("upload", user = %user.name()))
        .await;

    let jar = flash::push(jar, outcome.notice().clone());
    (jar, Redirect::to(outcome.redirect_to())).into_response()
}
