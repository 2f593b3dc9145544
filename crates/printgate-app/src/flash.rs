// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One-shot user notices carried across a redirect in a cookie.
//
// The cookie holds a hex-encoded JSON array of `Notice`s, signed with the
// server's key so clients cannot plant notices of their own. It is written by
// POST handlers and consumed (and cleared) by the next page that renders.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use tracing::warn;

use printgate_core::types::Notice;

pub const FLASH_COOKIE: &str = "printgate_flash";

/// Longest notice text kept in the cookie. Browsers cap cookies near 4 KiB
/// and hex doubles the size.
const MAX_TEXT_CHARS: usize = 600;

/// Queue `notice` for the next rendered page.
pub fn push(jar: SignedCookieJar, notice: Notice) -> SignedCookieJar {
    let (jar, mut pending) = take(jar);
    pending.push(truncate(notice));
    // Only the most recent notices fit.
    if pending.len() > 2 {
        pending.drain(..pending.len() - 2);
    }

    match serde_json::to_vec(&pending) {
        Ok(json) => jar.add(
            Cookie::build((FLASH_COOKIE, hex::encode(json)))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax),
        ),
        Err(e) => {
            warn!(error = %e, "could not encode flash notice");
            jar
        }
    }
}

/// Remove pending notices from the jar and return them.
///
/// A cookie with a bad signature is ignored; one that does not decode is
/// dropped with a warning.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Notice>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, Vec::new());
    };

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    let notices = hex::decode(&raw)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Vec<Notice>>(&bytes).ok());

    match notices {
        Some(notices) => (jar, notices),
        None => {
            warn!("discarding malformed flash cookie");
            (jar, Vec::new())
        }
    }
}

fn truncate(mut notice: Notice) -> Notice {
    if notice.text.chars().count() > MAX_TEXT_CHARS {
        notice.text = notice.text.chars().take(MAX_TEXT_CHARS).collect::<String>() + "...";
    }
    notice
}
