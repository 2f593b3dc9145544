// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IPP job-state → display label and queue bucket.

use serde::Serialize;

/// Which half of the queue page a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobBucket {
    /// Not finished yet.
    Active,
    /// Finished, canceled, or in a state we do not recognise.
    History,
}

/// Display form of a numeric job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub label: &'static str,
    pub bucket: JobBucket,
}

/// Map an IPP `job-state` enum value (RFC 8011 §5.3.7).
///
/// 8 is `canceled` and 9 `completed`; 7 (`aborted` in the RFC) is shown as
/// stopped and kept in the active list, matching what users expect from the
/// CUPS web interface.
pub fn map_state(code: i32) -> JobStatus {
    let (label, bucket) = match code {
        3 => ("Pending", JobBucket::Active),
        4 => ("Held", JobBucket::Active),
        5 => ("Processing", JobBucket::Active),
        6 | 7 => ("Stopped", JobBucket::Active),
        8 => ("Canceled", JobBucket::History),
        9 => ("Completed", JobBucket::History),
        _ => ("Unknown", JobBucket::History),
    };
    JobStatus { label, bucket }
}

/// Whether a job in this state has a meaningful completion time.
///
/// Only canceled and completed jobs do. Unknown states land in history too
/// but show "N/A".
pub fn has_completion_time(code: i32) -> bool {
    matches!(code, 8 | 9)
}
