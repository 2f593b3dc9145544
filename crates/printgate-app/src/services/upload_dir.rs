// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload directory handling: saving uploads and removing them afterwards.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use printgate_core::error::{GatewayError, Result};
use printgate_document::{secure_filename, stored_filename};

/// Files to delete when the current request finishes.
///
/// Removal happens on drop, so it also runs when the handler returns early
/// with an error or its future is dropped because the client went away.
/// Failures are logged and otherwise ignored.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TempFiles {
    // Blocking removal on the current worker thread. A request tracks at most
    // the upload and its converted PDF.
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed temporary file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    let err = GatewayError::FileSystem(format!("remove {}: {e}", path.display()));
                    error!(error = %err, "cleanup failed");
                }
            }
        }
    }
}

/// Write an upload into `dir` under a unique name and return its absolute path.
///
/// The path is registered with `cleanup` before any byte is written, so a
/// half-written file is removed as well.
pub async fn save_upload(
    dir: &Path,
    secure_name: &str,
    bytes: &[u8],
    cleanup: &mut TempFiles,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| GatewayError::FileSystem(format!("create {}: {e}", dir.display())))?;

    let path = dir.join(stored_filename(secure_name));
    cleanup.track(path.clone());

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| GatewayError::FileSystem(format!("write {}: {e}", path.display())))?;

    let absolute = tokio::fs::canonicalize(&path).await?;
    debug!(path = %absolute.display(), size = bytes.len(), "upload saved");
    Ok(absolute)
}

/// Resolve a file name from a URL to a path inside the upload directory.
///
/// Only plain names that survive sanitising unchanged are accepted.
pub fn resolve_upload(dir: &Path, filename: &str) -> Option<PathBuf> {
    match secure_filename(filename) {
        Some(clean) if clean == filename => Some(dir.join(clean)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_upload_is_removed_when_guard_drops() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");

        let saved = {
            let mut cleanup = TempFiles::default();
            let saved = save_upload(&uploads, "cv.pdf", b"%PDF-1.4", &mut cleanup).await.unwrap();
            assert!(saved.exists());
            assert!(saved.is_absolute());
            assert!(saved.file_name().unwrap().to_string_lossy().ends_with("_cv.pdf"));
            saved
        };

        assert!(!saved.exists());
        assert_eq!(std::fs::read_dir(&uploads).unwrap().count(), 0);
    }

    #[test]
    fn guard_ignores_missing_files() {
        let mut cleanup = TempFiles::default();
        cleanup.track("/nonexistent/printgate/file.pdf");
        assert_eq!(cleanup.paths().len(), 1);
        drop(cleanup);
    }

    #[test]
    fn resolve_rejects_path_tricks() {
        let dir = Path::new("/srv/uploads");
        assert_eq!(resolve_upload(dir, "a_cv.pdf"), Some(dir.join("a_cv.pdf")));
        assert_eq!(resolve_upload(dir, "../secret"), None);
        assert_eq!(resolve_upload(dir, ".env"), None);
        assert_eq!(resolve_upload(dir, ""), None);
    }
}
