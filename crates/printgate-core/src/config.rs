// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gateway configuration, read once from the environment at startup.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

const DEFAULT_EXTENSIONS: &str = "pdf,doc,docx,xls,xlsx,txt";
/// Used when neither `CUPS_USER` nor the login variables name a user.
const FALLBACK_PRINT_USER: &str = "printgate";

/// Runtime settings for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// CUPS host name or address.
    pub print_server_host: String,
    /// CUPS port (default 631).
    pub print_server_port: u16,
    /// Where uploads are written before printing.
    pub upload_dir: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Lower-case extensions (without the dot) users may upload.
    pub allowed_extensions: BTreeSet<String>,
    /// Office converter executable (LibreOffice or `soffice`).
    pub converter_bin: String,
    /// CUPS command-line submitter.
    pub lp_bin: String,
    pub conversion_timeout: Duration,
    pub submit_timeout: Duration,
    /// Timeout for each IPP request against the print server.
    pub backend_timeout: Duration,
    /// Header carrying the authenticated user from a fronting proxy.
    /// When set, requests without it are refused.
    pub remote_user_header: Option<String>,
    /// User the gateway acts as towards CUPS (`requesting-user-name` and
    /// `lp -U`). Jobs are owned by this user, so cancelling needs it too.
    pub print_user: String,
    /// Secret for signing the flash cookie, at least 64 bytes. A random key
    /// is generated per process when unset.
    #[serde(skip_serializing)]
    pub flash_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            print_server_host: "localhost".into(),
            print_server_port: 631,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
            allowed_extensions: parse_extensions(DEFAULT_EXTENSIONS),
            converter_bin: "libreoffice".into(),
            lp_bin: "lp".into(),
            conversion_timeout: Duration::from_secs(120),
            submit_timeout: Duration::from_secs(60),
            backend_timeout: Duration::from_secs(10),
            remote_user_header: None,
            print_user: FALLBACK_PRINT_USER.into(),
            flash_secret: None,
        }
    }
}

impl GatewayConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Unset or empty variables keep their defaults; values that are set but
    /// unparseable are a startup error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = get(&["CUPS_SERVER", "CUPS_SERVER_IP"]) {
            config.print_server_host = host;
        }
        if let Some(port) = get(&["CUPS_PORT", "CUPS_SERVER_PORT"]) {
            config.print_server_port = parse_value("CUPS_PORT", &port)?;
        }
        if let Some(dir) = get(&["UPLOAD_FOLDER"]) {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Some(max) = get(&["MAX_CONTENT_LENGTH"]) {
            config.max_upload_bytes = parse_value("MAX_CONTENT_LENGTH", &max)?;
        }
        if let Some(exts) = get(&["ALLOWED_EXTENSIONS"]) {
            config.allowed_extensions = parse_extensions(&exts);
        }
        if let Some(bin) = get(&["CONVERTER_BIN"]) {
            config.converter_bin = bin;
        }
        if let Some(bin) = get(&["LP_BIN"]) {
            config.lp_bin = bin;
        }
        if let Some(secs) = get(&["CONVERSION_TIMEOUT_SECS"]) {
            config.conversion_timeout =
                Duration::from_secs(parse_value("CONVERSION_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get(&["SUBMIT_TIMEOUT_SECS"]) {
            config.submit_timeout = Duration::from_secs(parse_value("SUBMIT_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = get(&["BACKEND_TIMEOUT_SECS"]) {
            config.backend_timeout =
                Duration::from_secs(parse_value("BACKEND_TIMEOUT_SECS", &secs)?);
        }
        config.remote_user_header = get(&["REMOTE_USER_HEADER"]);
        if let Some(user) = get(&["CUPS_USER", "USER", "LOGNAME", "USERNAME"]) {
            config.print_user = user;
        }
        config.flash_secret = get(&["FLASH_SECRET"]);

        Ok(config)
    }

    /// `host:port` form understood by the CUPS command-line tools.
    pub fn print_server_endpoint(&self) -> String {
        format!("{}:{}", self.print_server_host, self.print_server_port)
    }

    /// Directory the converter writes PDFs into.
    pub fn converted_dir(&self) -> PathBuf {
        self.upload_dir.join("converted")
    }

    /// Whether `filename` carries an extension from the allowlist.
    pub fn is_allowed_file(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.contains(&ext.to_ascii_lowercase()),
            None => false,
        }
    }
}

/// Split a comma-separated extension list into a normalised set.
pub fn parse_extensions(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| GatewayError::Config(format!("{key}='{raw}': {e}")))
}
