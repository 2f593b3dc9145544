// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print backend abstraction.
//
// Request handlers only see `dyn PrintBackend`; `CupsClient` is the
// production implementation and tests substitute in-memory fakes.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use printgate_core::error::Result;
use printgate_core::types::{JobId, PrintJob, PrinterDescriptor};

/// Which jobs a listing should include (IPP `which-jobs`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobScope {
    /// Every job the server still remembers.
    #[default]
    All,
    /// Pending, held, processing and stopped jobs.
    NotCompleted,
    /// Completed, canceled and aborted jobs.
    Completed,
}

impl JobScope {
    /// IPP `which-jobs` keyword (RFC 8011 §4.2.6.1, CUPS adds `all`).
    pub fn ipp_keyword(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::NotCompleted => "not-completed",
            Self::Completed => "completed",
        }
    }
}

/// Operations the gateway needs from a print server.
///
/// Every method fails with `GatewayError::Connection` when the server cannot
/// be reached, so callers can degrade to an empty view instead of failing
/// the whole request.
#[async_trait]
pub trait PrintBackend: Send + Sync {
    /// All printer queues, keyed by queue name.
    async fn list_printers(&self) -> Result<BTreeMap<String, PrinterDescriptor>>;

    /// Queue `file_path` on `printer_name` under `job_title`.
    async fn submit_job(&self, printer_name: &str, file_path: &Path, job_title: &str) -> Result<()>;

    async fn list_jobs(&self, scope: JobScope) -> Result<Vec<PrintJob>>;

    /// Cancel a job. `purge` also drops it from the server's history.
    ///
    /// A job that does not exist or has already finished fails with
    /// `GatewayError::JobNotFound`.
    async fn cancel_job(&self, job_id: JobId, purge: bool) -> Result<()>;
}
