// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Printgate.

use thiserror::Error;

use crate::types::JobId;

/// Top-level error type for all Printgate operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    // -- User input --
    #[error("invalid input: {0}")]
    Validation(String),

    // -- Print server --
    #[error("cannot reach print server at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("print server error (code {code}): {message}")]
    PrintBackend { code: i32, message: String },

    #[error("job {0} not found or already completed")]
    JobNotFound(JobId),

    // -- Documents --
    #[error("document conversion failed: {0}")]
    Conversion(String),

    // -- Local storage --
    #[error("filesystem error: {0}")]
    FileSystem(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    // -- Startup --
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Shorthand for a connection failure against `host:port`.
    pub fn connection(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the print server could not be reached at all.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GatewayError>;
