// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job submission through the CUPS `lp` command-line client.
//
// `lp` picks its server from the `CUPS_SERVER` environment variable, sends
// the file with the right document-format, and reports failures as a
// non-zero exit plus a line on stderr. The job id comes back on stdout as
// `request id is <printer>-<id> (1 file(s))`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{error, info, instrument};

use printgate_core::GatewayConfig;
use printgate_core::error::{GatewayError, Result};

/// Exit code reported when `lp` could not be run or was killed.
pub const NO_EXIT_CODE: i32 = -1;

/// Runs `lp -d <printer> -t <title> [-U <user>] <file>` against one CUPS
/// server.
#[derive(Debug, Clone)]
pub struct LpSubmitter {
    program: String,
    /// `host:port` passed as `CUPS_SERVER`.
    server: String,
    timeout: Duration,
    /// Job owner; `lp` falls back to the process user when unset.
    user: Option<String>,
}

impl LpSubmitter {
    pub fn new(program: impl Into<String>, server: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            server: server.into(),
            timeout,
            user: None,
        }
    }

    /// Submit jobs as `user`.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.lp_bin.clone(),
            config.print_server_endpoint(),
            config.submit_timeout,
        )
        .with_user(config.print_user.clone())
    }

    /// Submit `file` to `printer`.
    ///
    /// Returns the request id `lp` printed, when it printed one.
    #[instrument(skip(self), fields(server = %self.server, file = %file.display()))]
    pub async fn submit(&self, printer: &str, file: &Path, title: &str) -> Result<Option<String>> {
        let mut command = Command::new(&self.program);
        command
            .arg("-d")
            .arg(printer)
            .arg("-t")
            .arg(title);
        if let Some(user) = &self.user {
            command.arg("-U").arg(user);
        }
        command
            .arg(file)
            .env("CUPS_SERVER", &self.server)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("submitting job via lp");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(error = %e, program = %self.program, "could not start lp");
                return Err(GatewayError::PrintBackend {
                    code: NO_EXIT_CODE,
                    message: format!("failed to start '{}': {e}", self.program),
                });
            }
            Err(_) => {
                error!(timeout_secs = self.timeout.as_secs(), "lp timed out");
                return Err(GatewayError::PrintBackend {
                    code: NO_EXIT_CODE,
                    message: format!("lp timed out after {}s", self.timeout.as_secs()),
                });
            }
        };

        if !output.status.success() {
            let code = output.status.code().unwrap_or(NO_EXIT_CODE);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(code, stderr = %stderr, "lp rejected the job");
            return Err(GatewayError::PrintBackend { code, message: stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let request_id = parse_request_id(&stdout);
        info!(request_id = ?request_id, "job accepted by print server");
        Ok(request_id)
    }
}

/// Pull `Office-42` out of `request id is Office-42 (1 file(s))`.
pub fn parse_request_id(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        line.trim()
            .strip_prefix("request id is ")
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_string)
    })
}
