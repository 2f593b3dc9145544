// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer: the upload/print orchestration behind the HTTP handlers.
//
// Handlers stay thin: they parse the request, call into `AppServices`, and
// turn the outcome into a redirect or a JSON view.

pub mod app_services;
pub mod upload_dir;

pub use app_services::{AppServices, UploadForm, UploadOutcome, UploadedFile};
