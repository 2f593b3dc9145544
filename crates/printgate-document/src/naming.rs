// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk naming for uploaded documents.

use uuid::Uuid;

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped, reserved and control characters removed, and
/// leading dots stripped so the result can never name a hidden file or climb
/// out of the upload directory. Returns `None` when nothing usable is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = sanitize_filename::sanitize(last);
    let cleaned = cleaned.trim().trim_start_matches('.').trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Unique name under which an upload is stored.
///
/// The random prefix keeps two users uploading `report.docx` at the same
/// time from overwriting each other, and gives the converter a distinct
/// output name (`<prefix>_report.pdf`).
pub fn stored_filename(secure_name: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), secure_name)
}
