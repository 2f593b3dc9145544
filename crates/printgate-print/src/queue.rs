// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Queue view: the print server's jobs split into active and history lists.
//
// Nothing is cached here. Every view costs one Get-Jobs round trip, so the
// page never shows a job state the server has already moved past.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{error, info, instrument};

use printgate_core::types::{JobId, PrintJob};

use crate::backend::{JobScope, PrintBackend};
use crate::status::{JobBucket, has_completion_time, map_state};

const NOT_AVAILABLE: &str = "N/A";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row of the queue page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobEntry {
    pub id: JobId,
    pub printer: String,
    pub title: String,
    pub user: String,
    /// Raw IPP job-state, kept so clients can decide whether to offer cancel.
    pub state_id: i32,
    pub state: &'static str,
    pub size: String,
    pub submission_time: String,
    pub completion_time: String,
}

impl JobEntry {
    pub fn from_job(job: &PrintJob) -> Self {
        let status = map_state(job.state);
        let completion_time = if has_completion_time(job.state) {
            format_time(job.completed_at.unwrap_or(DateTime::UNIX_EPOCH))
        } else {
            NOT_AVAILABLE.to_string()
        };

        Self {
            id: job.id,
            printer: text_or_na(job.printer.as_deref()),
            title: text_or_na(job.title.as_deref()),
            user: text_or_na(job.user.as_deref()),
            state_id: job.state,
            state: status.label,
            size: format!("{:.2} MB", job.size_kb as f64 / 1024.0),
            submission_time: format_time(job.created_at),
            completion_time,
        }
    }
}

/// Everything the queue page shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueView {
    /// Newest first.
    pub active_jobs: Vec<JobEntry>,
    /// Newest first.
    pub history_jobs: Vec<JobEntry>,
    /// Empty unless the jobs could not be fetched.
    pub status_message: String,
}

impl QueueView {
    /// Partition and sort jobs already fetched from the server.
    ///
    /// "Newest" means highest job id. CUPS hands ids out monotonically, but
    /// other servers need not, and this ordering would then be off.
    pub fn from_jobs(jobs: &[PrintJob]) -> Self {
        let (mut active_jobs, mut history_jobs): (Vec<_>, Vec<_>) = jobs
            .iter()
            .map(JobEntry::from_job)
            .partition(|entry| map_state(entry.state_id).bucket == JobBucket::Active);

        active_jobs.sort_by(|a, b| b.id.cmp(&a.id));
        history_jobs.sort_by(|a, b| b.id.cmp(&a.id));

        Self {
            active_jobs,
            history_jobs,
            status_message: String::new(),
        }
    }

    /// Empty view carrying a banner message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status_message: message.into(),
            ..Self::default()
        }
    }

    /// Fetch every job from `backend` and build the view.
    ///
    /// Never fails: a backend error yields empty lists plus a status message.
    #[instrument(skip(backend))]
    pub async fn fetch(backend: &dyn PrintBackend) -> Self {
        match backend.list_jobs(JobScope::All).await {
            Ok(jobs) => {
                info!(count = jobs.len(), "fetched jobs from print server");
                Self::from_jobs(&jobs)
            }
            Err(e) if e.is_connection() => {
                error!(error = %e, "print server unreachable");
                Self::unavailable("Unable to connect to the print service.")
            }
            Err(e) => {
                error!(error = %e, "failed to fetch queue");
                Self::unavailable("Failed to fetch the print queue.")
            }
        }
    }
}

fn text_or_na(value: Option<&str>) -> String {
    match value {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(TIME_FORMAT).to_string()
}
