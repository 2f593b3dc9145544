// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Printgate print gateway.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Job identifier assigned by the print server.
///
/// Always in `1..=i32::MAX`: IPP carries `job-id` as a signed 32-bit
/// integer and CUPS never hands out job 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(i32);

impl JobId {
    /// Wrap a backend-assigned id. Returns `None` for values an IPP
    /// `job-id` cannot hold.
    pub fn new(id: i64) -> Option<Self> {
        i32::try_from(id).ok().filter(|id| *id > 0).map(Self)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl FromStr for JobId {
    type Err = GatewayError;

    /// Parse a job id from user input (form fields, query strings).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| GatewayError::Validation(format!("'{trimmed}' is not a valid job id")))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A job as reported by the print server. Read-only: the server owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    pub id: JobId,
    /// Destination queue name, if the server reported one.
    pub printer: Option<String>,
    /// `job-name` attribute.
    pub title: Option<String>,
    /// `job-originating-user-name` attribute.
    pub user: Option<String>,
    /// Numeric IPP `job-state` (3 = pending … 9 = completed).
    pub state: i32,
    /// `job-k-octets`: document size in kilobytes.
    pub size_kb: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A printer queue as advertised by the print server.
///
/// Attributes are passed through to the client as flat strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

/// A validated, saved upload on its way to the printer.
///
/// Lives only for the duration of one HTTP request.
#[derive(Debug, Clone)]
pub struct PrintJobRequest {
    /// Sanitised name the user uploaded (used for the job title).
    pub original_filename: String,
    /// Where the upload was written inside the upload directory.
    pub stored_path: PathBuf,
    pub printer_name: String,
}

impl PrintJobRequest {
    /// Title shown in the print server's queue.
    pub fn job_title(&self) -> String {
        format!("Web Print: {}", self.original_filename)
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    /// Word processing documents (doc, docx, odt, rtf).
    Text,
    /// Spreadsheets (xls, xlsx, ods, csv).
    Spreadsheet,
    /// Slide decks (ppt, pptx, odp).
    Presentation,
    PlainText,
    Jpeg,
    Png,
    /// Anything else; served as an opaque byte stream.
    Other,
}

impl DocumentType {
    /// MIME type string used when serving the file back.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "application/msword",
            Self::Spreadsheet => "application/vnd.ms-excel",
            Self::Presentation => "application/vnd.ms-powerpoint",
            Self::PlainText => "text/plain; charset=utf-8",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Other => "application/octet-stream",
        }
    }

    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" | "odt" | "rtf" => Self::Text,
            "xls" | "xlsx" | "ods" | "csv" => Self::Spreadsheet,
            "ppt" | "pptx" | "odp" => Self::Presentation,
            "txt" => Self::PlainText,
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            _ => Self::Other,
        }
    }

    /// Infer document type from a file name's last extension.
    pub fn from_filename(name: &str) -> Self {
        name.rsplit_once('.')
            .map(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::Other)
    }

    /// Whether the print path must run this through the converter first.
    pub fn needs_conversion(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Presentation level of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// A one-shot message shown to the user on the next page they load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Danger, text)
    }
}
