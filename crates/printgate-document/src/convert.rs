// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office document → PDF conversion through a headless LibreOffice process.
//
// LibreOffice writes `<stem>.pdf` into `--outdir`. Every run gets its own
// throwaway user profile: two soffice processes sharing one profile block
// on its lock file and the second exits without converting anything.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

use printgate_core::GatewayConfig;
use printgate_core::error::{GatewayError, Result};
use printgate_core::types::DocumentType;

/// LibreOffice export filter used for every conversion.
const PDF_EXPORT_FILTER: &str = "pdf:writer_pdf_Export";

/// Converts uploads to PDF by shelling out to an office suite.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    /// Converter executable (`libreoffice`, `soffice`, or an absolute path).
    program: String,
    /// Directory the converter writes its PDFs into.
    output_dir: PathBuf,
    timeout: Duration,
}

impl DocumentConverter {
    pub fn new(program: impl Into<String>, output_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            output_dir: output_dir.into(),
            timeout,
        }
    }

    /// Converter writing into `<upload_dir>/converted`.
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            config.converter_bin.clone(),
            config.converted_dir(),
            config.conversion_timeout,
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Produce a printable PDF for the upload stored at `path`.
    ///
    /// `original_filename` decides whether conversion is needed at all: a
    /// `.pdf` upload is returned unchanged and the converter never runs.
    /// Otherwise the absolute path of the converted file is returned. The
    /// caller owns (and must delete) that file.
    #[instrument(skip(self), fields(program = %self.program, path = %path.display()))]
    pub async fn convert(&self, path: &Path, original_filename: &str) -> Result<PathBuf> {
        if !DocumentType::from_filename(original_filename).needs_conversion() {
            debug!("already a PDF, no conversion needed");
            return Ok(path.to_path_buf());
        }

        let stem = path
            .file_stem()
            .ok_or_else(|| GatewayError::Conversion(format!("'{}' has no file name", path.display())))?;
        let expected = self.output_dir.join(format!("{}.pdf", stem.to_string_lossy()));

        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            GatewayError::Conversion(format!(
                "cannot create output directory {}: {e}",
                self.output_dir.display()
            ))
        })?;

        // Removed when this function returns, whatever the outcome.
        let profile = tempfile::Builder::new()
            .prefix("printgate-lo-profile-")
            .tempdir()
            .map_err(|e| GatewayError::Conversion(format!("cannot create converter profile: {e}")))?;

        let mut command = Command::new(&self.program);
        command
            .arg("--headless")
            .arg(format!("-env:UserInstallation=file://{}", profile.path().display()))
            .arg("--convert-to")
            .arg(PDF_EXPORT_FILTER)
            .arg("--outdir")
            .arg(&self.output_dir)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(output = %expected.display(), "converting document to PDF");

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(error = %e, "could not start converter");
                return Err(GatewayError::Conversion(format!(
                    "failed to start '{}': {e}",
                    self.program
                )));
            }
            Err(_) => {
                // The child was killed when the output future was dropped.
                error!(timeout_secs = self.timeout.as_secs(), "converter timed out");
                remove_partial_output(&expected).await;
                return Err(GatewayError::Conversion(format!(
                    "converter timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            error!(status = %output.status, stderr = %stderr, "converter failed");
            return Err(GatewayError::Conversion(format!(
                "converter exited with {}: {}",
                output.status,
                if stderr.is_empty() { &stdout } else { &stderr }
            )));
        }
        debug!(stdout = %stdout, "converter finished");

        // LibreOffice exits 0 for some failures (unsupported input, a profile
        // lock held by another instance) without writing anything.
        let exists = tokio::fs::try_exists(&expected).await.unwrap_or(false);
        if !exists {
            error!(expected = %expected.display(), stderr = %stderr, "converted file missing");
            return Err(GatewayError::Conversion(format!(
                "converted file {} not found: {}",
                expected.file_name().unwrap_or_default().to_string_lossy(),
                stderr
            )));
        }

        let absolute = tokio::fs::canonicalize(&expected).await.map_err(|e| {
            GatewayError::Conversion(format!("cannot resolve {}: {e}", expected.display()))
        })?;
        info!(pdf = %absolute.display(), "conversion complete");
        Ok(absolute)
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial converter output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(program: &str, dir: &Path, timeout: Duration) -> DocumentConverter {
        DocumentConverter::new(program, dir.join("converted"), timeout)
    }

    #[tokio::test]
    async fn pdf_passes_through_without_running_converter() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("abc_report.pdf");
        // A converter that does not exist proves it is never spawned.
        let conv = converter("/nonexistent/soffice", dir.path(), Duration::from_secs(5));

        let out = conv.convert(&input, "report.pdf").await.unwrap();
        assert_eq!(out, input);

        let out = conv.convert(&input, "SCAN.PDF").await.unwrap();
        assert_eq!(out, input);
        assert!(!conv.output_dir().exists());
    }

    #[tokio::test]
    async fn missing_converter_binary_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("abc_letter.docx");
        std::fs::write(&input, b"not really a docx").unwrap();
        let conv = converter("/nonexistent/soffice", dir.path(), Duration::from_secs(5));

        let err = conv.convert(&input, "letter.docx").await.unwrap_err();
        assert!(matches!(err, GatewayError::Conversion(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_without_output_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("abc_letter.docx");
        std::fs::write(&input, b"x").unwrap();
        let conv = converter("true", dir.path(), Duration::from_secs(5));

        let err = conv.convert(&input, "letter.docx").await.unwrap_err();
        match err {
            GatewayError::Conversion(msg) => assert!(msg.contains("abc_letter.pdf"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_conversion_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("abc_sheet.xlsx");
        std::fs::write(&input, b"x").unwrap();
        let conv = converter("false", dir.path(), Duration::from_secs(5));

        let err = conv.convert(&input, "sheet.xlsx").await.unwrap_err();
        assert!(matches!(err, GatewayError::Conversion(_)));
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_conversion_returns_absolute_pdf_path() {
        let dir = tempfile::tempdir().unwrap();
        // Mimics soffice: writes <outdir>/<stem>.pdf for the last argument.
        let script = write_script(
            dir.path(),
            "fake-soffice",
            r#"while [ $# -gt 1 ]; do
  if [ "$1" = "--outdir" ]; then outdir="$2"; fi
  shift
done
base=$(basename "$1")
printf '%%PDF-1.4\n' > "$outdir/${base%.*}.pdf"
echo "convert $1 -> $outdir"
"#,
        );
        let input = dir.path().join("abc_notes.odt");
        std::fs::write(&input, b"x").unwrap();
        let conv = converter(script.to_str().unwrap(), dir.path(), Duration::from_secs(10));

        let out = conv.convert(&input, "notes.odt").await.unwrap();
        assert!(out.is_absolute());
        assert_eq!(out.file_name().unwrap(), "abc_notes.pdf");
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_converter_times_out_and_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "slow-soffice",
            r#"while [ $# -gt 1 ]; do
  if [ "$1" = "--outdir" ]; then outdir="$2"; fi
  shift
done
base=$(basename "$1")
printf 'partial' > "$outdir/${base%.*}.pdf"
sleep 5
"#,
        );
        let input = dir.path().join("abc_slides.pptx");
        std::fs::write(&input, b"x").unwrap();
        let conv = converter(script.to_str().unwrap(), dir.path(), Duration::from_millis(500));

        let err = conv.convert(&input, "slides.pptx").await.unwrap_err();
        match err {
            GatewayError::Conversion(msg) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!conv.output_dir().join("abc_slides.pdf").exists());
    }
}
