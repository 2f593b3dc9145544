// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Owns the print backend and converter and runs the
// upload → convert → submit pipeline for each request.
//
// There is no job state in here. Every view asks the print server, and every
// upload leaves the upload directory as it found it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use tracing::{error, info, instrument, warn};

use printgate_core::GatewayConfig;
use printgate_core::error::{GatewayError, Result};
use printgate_core::human_errors::humanize_error;
use printgate_core::types::{JobId, Notice, PrintJobRequest, PrinterDescriptor};
use printgate_document::{DocumentConverter, secure_filename};
use printgate_print::{CupsClient, PrintBackend, QueueView};

use super::upload_dir::{self, TempFiles};

const INVALID_FILE: &str = "Please choose a valid file!";
const MISSING_PRINTER: &str = "Please choose a printer!";

/// A file part from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the browser; not yet sanitised.
    pub filename: String,
    pub bytes: Bytes,
}

/// The upload form as received.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub printer_name: Option<String>,
    pub file: Option<UploadedFile>,
}

/// How an upload ended. Every variant carries the notice for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The form was incomplete or the file type is not allowed. Nothing was
    /// saved or sent.
    Rejected(Notice),
    /// The print server accepted the job.
    Submitted(Notice),
    /// Saving, converting or submitting failed.
    Failed(Notice),
}

impl UploadOutcome {
    pub fn notice(&self) -> &Notice {
        match self {
            Self::Rejected(n) | Self::Submitted(n) | Self::Failed(n) => n,
        }
    }

    /// Page the browser is sent to next.
    pub fn redirect_to(&self) -> &'static str {
        match self {
            Self::Submitted(_) => "/queue",
            Self::Rejected(_) | Self::Failed(_) => "/upload",
        }
    }
}

/// Shared services for all request handlers.
pub struct AppServices {
    config: Arc<GatewayConfig>,
    backend: Arc<dyn PrintBackend>,
    converter: DocumentConverter,
}

impl AppServices {
    /// Wire up services against the CUPS server named in `config`.
    pub fn init(config: GatewayConfig) -> Result<Self> {
        let backend = CupsClient::from_config(&config)?;
        info!(
            server = %backend.endpoint(),
            upload_dir = %config.upload_dir.display(),
            "app services initialised"
        );
        Ok(Self::new(Arc::new(config), Arc::new(backend)))
    }

    /// Services over an arbitrary backend; the converter follows `config`.
    pub fn new(config: Arc<GatewayConfig>, backend: Arc<dyn PrintBackend>) -> Self {
        let converter = DocumentConverter::from_config(&config);
        Self {
            config,
            backend,
            converter,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    // -- Printers ------------------------------------------------------------

    /// Printers for the upload form.
    ///
    /// A backend failure yields an empty list plus a notice explaining why.
    pub async fn printers(&self) -> (BTreeMap<String, PrinterDescriptor>, Option<Notice>) {
        match self.backend.list_printers().await {
            Ok(printers) => (printers, None),
            Err(e) => {
                error!(error = %e, "could not list printers");
                (BTreeMap::new(), Some(humanize_error(&e)))
            }
        }
    }

    // -- Queue ---------------------------------------------------------------

    pub async fn queue(&self) -> QueueView {
        QueueView::fetch(self.backend.as_ref()).await
    }

    /// Cancel the job named by a raw form value.
    ///
    /// The id is validated before the print server is contacted.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, raw_job_id: &str) -> Result<JobId> {
        let job_id: JobId = raw_job_id.parse()?;
        self.backend.cancel_job(job_id, false).await?;
        info!(%job_id, "job cancelled");
        Ok(job_id)
    }

    /// Cancel a job and describe the result for the user.
    pub async fn cancel_job_notice(&self, raw_job_id: Option<&str>) -> Notice {
        let Some(raw) = raw_job_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Notice::danger("No job id specified.");
        };

        match self.cancel_job(raw).await {
            Ok(job_id) => Notice::success(format!("Job {job_id} was canceled.")),
            Err(GatewayError::Validation(detail)) => {
                warn!(detail = %detail, "rejected cancel request");
                Notice::danger("Invalid job id format.")
            }
            Err(e) => {
                error!(error = %e, "cancel failed");
                humanize_error(&e)
            }
        }
    }

    // -- Printing ------------------------------------------------------------

    /// Validate, save, convert and submit one upload.
    ///
    /// Never fails: every problem ends up as the outcome's notice, and the
    /// saved and converted files are gone by the time this returns.
    #[instrument(skip_all, fields(printer = form.printer_name.as_deref().unwrap_or("")))]
    pub async fn handle_upload(&self, form: UploadForm) -> UploadOutcome {
        let Some(file) = form.file.filter(|f| !f.filename.trim().is_empty()) else {
            warn!("upload without a file");
            return UploadOutcome::Rejected(Notice::warning(INVALID_FILE));
        };

        let original_filename = match secure_filename(&file.filename) {
            Some(name) if self.config.is_allowed_file(&name) => name,
            _ => {
                warn!(filename = %file.filename, "file type not allowed");
                return UploadOutcome::Rejected(Notice::warning(INVALID_FILE));
            }
        };

        let Some(printer_name) = form
            .printer_name
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
        else {
            warn!("upload without a printer");
            return UploadOutcome::Rejected(Notice::warning(MISSING_PRINTER));
        };

        let mut cleanup = TempFiles::default();
        let result = self
            .print_upload(&mut cleanup, &file.bytes, original_filename, printer_name)
            .await;
        drop(cleanup);

        match result {
            Ok(request) => UploadOutcome::Submitted(Notice::success(format!(
                "File '{}' was submitted to printer '{}'.",
                request.original_filename, request.printer_name
            ))),
            Err(e) => {
                error!(error = %e, "upload could not be printed");
                UploadOutcome::Failed(humanize_error(&e))
            }
        }
    }

    async fn print_upload(
        &self,
        cleanup: &mut TempFiles,
        bytes: &[u8],
        original_filename: String,
        printer_name: String,
    ) -> Result<PrintJobRequest> {
        let stored_path =
            upload_dir::save_upload(&self.config.upload_dir, &original_filename, bytes, cleanup)
                .await?;
        let request = PrintJobRequest {
            original_filename,
            stored_path,
            printer_name,
        };

        let printable: PathBuf = self
            .converter
            .convert(&request.stored_path, &request.original_filename)
            .await?;
        if printable != request.stored_path {
            cleanup.track(printable.clone());
        }

        info!(
            file = %printable.display(),
            printer = %request.printer_name,
            "submitting print job"
        );
        self.backend
            .submit_job(&request.printer_name, &printable, &request.job_title())
            .await?;

        info!(printer = %request.printer_name, "print job submitted");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_submitted_uploads_go_to_the_queue() {
        let ok = UploadOutcome::Submitted(Notice::success("done"));
        let rejected = UploadOutcome::Rejected(Notice::warning(INVALID_FILE));
        let failed = UploadOutcome::Failed(Notice::danger("boom"));

        assert_eq!(ok.redirect_to(), "/queue");
        assert_eq!(rejected.redirect_to(), "/upload");
        assert_eq!(failed.redirect_to(), "/upload");
        assert_eq!(rejected.notice().text, INVALID_FILE);
    }
}
