// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use axum::Json;
use axum::extract::{Extension, Form, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::{Deserialize, Serialize};
use tracing::{Instrument, info_span};

use printgate_core::types::Notice;
use printgate_print::QueueView;

use crate::flash;
use crate::guard::RemoteUser;
use crate::state::AppState;

/// The queue view plus any pending notices.
#[derive(Debug, Serialize)]
pub struct QueuePage {
    #[serde(flatten)]
    pub view: QueueView,
    pub messages: Vec<Notice>,
}

/// Body of `POST /cancel_job`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    pub job_id: Option<String>,
}

pub(super) async fn queue_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Json<QueuePage>) {
    let (jar, messages) = flash::take(jar);
    let view = state.queue().await;
    (jar, Json(QueuePage { view, messages }))
}

pub(super) async fn cancel_job(
    State(state): State<AppState>,
    Extension(user): Extension<RemoteUser>,
    jar: SignedCookieJar,
    Form(form): Form<CancelForm>,
) -> (SignedCookieJar, Redirect) {
    let notice = state
        .cancel_job_notice(form.job_id.as_deref())
        .instrument(info_span!("cancel_job", user = %user.name()))
        .await;
    (flash::push(jar, notice), Redirect::to("/queue"))
}
