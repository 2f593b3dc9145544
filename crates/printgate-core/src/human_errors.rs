// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing messages for gateway errors.
//
// Every error that reaches a request handler becomes a `Notice`. The
// technical detail still goes to the server log; users get a sentence they
// can act on, plus the print server's own diagnostic where it helps.

use crate::error::GatewayError;
use crate::types::Notice;

/// Convert a `GatewayError` into the notice shown after a redirect.
pub fn humanize_error(err: &GatewayError) -> Notice {
    match err {
        GatewayError::Validation(detail) => Notice::warning(format!("Invalid input: {detail}.")),

        GatewayError::Connection { endpoint, .. } => {
            Notice::danger(format!("Unable to connect to the print service ({endpoint})."))
        }

        GatewayError::PrintBackend { code, message } => {
            Notice::danger(humanize_backend_failure(*code, message))
        }

        GatewayError::JobNotFound(id) => Notice::danger(format!(
            "Could not cancel job {id}: it may have already finished, or you lack permission."
        )),

        GatewayError::Conversion(detail) => Notice::danger(format!(
            "The document could not be converted to PDF. Try saving it as a PDF first. ({detail})"
        )),

        GatewayError::FileSystem(_) | GatewayError::Io(_) => {
            Notice::danger("The uploaded file could not be stored. Please try again.")
        }

        GatewayError::Serialization(_) | GatewayError::Encoding(_) | GatewayError::Config(_) => {
            Notice::danger("The print gateway hit an internal problem. Please try again.")
        }
    }
}

/// Turn an `lp` / IPP failure into a sentence, keeping the server's text.
fn humanize_backend_failure(code: i32, message: &str) -> String {
    let lower = message.to_ascii_lowercase();

    if lower.contains("timed out") {
        format!("The print server did not respond in time. ({message})")
    } else if lower.contains("does not exist") || lower.contains("unknown destination") {
        format!("That printer is not known to the print server. ({message})")
    } else if lower.contains("not accepting") {
        format!("That printer is not accepting jobs right now. ({message})")
    } else if lower.contains("forbidden") || lower.contains("not authorized") {
        format!("The print server refused the request. ({message})")
    } else if message.is_empty() {
        format!("The print server reported an error (code {code}).")
    } else {
        format!("The print server reported an error (code {code}): {message}")
    }
}
