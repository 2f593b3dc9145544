// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// printgate-document: document handling for the Printgate gateway.
//
// Converts office documents to PDF through a headless LibreOffice process and
// decides how uploads are named on disk.

pub mod convert;
pub mod naming;

pub use convert::DocumentConverter;
pub use naming::{secure_filename, stored_filename};
