// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop host — saves into a downloads-style directory or through the
// native save dialog, and reports alerts on stderr.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use biodata_core::error::{BiodataError, Result};
use tracing::{info, warn};

use crate::traits::*;

/// Gives up after this many "name (n).ext" candidates.
const MAX_RENAMES: u32 = 999;

#[derive(Debug, Clone)]
pub struct DesktopHost {
    output_dir: PathBuf,
    save_dialog: bool,
}

impl DesktopHost {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            save_dialog: false,
        }
    }

    /// Ask the user where to save instead of writing to the output directory.
    ///
    /// The dialog is modal and blocks the calling thread, so saves are
    /// expected to run on a blocking pool. macOS only shows native dialogs
    /// from the main thread; there, and on mobile, a dialog save fails with
    /// `HostUnavailable`.
    pub fn with_save_dialog(mut self, enabled: bool) -> Self {
        self.save_dialog = enabled;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write into the output directory without overwriting: a taken
    /// `biodata.pdf` becomes `biodata (1).pdf`, then `biodata (2).pdf`.
    fn save_to_dir(&self, filename: &str, bytes: &[u8]) -> Result<SavedArtifact> {
        std::fs::create_dir_all(&self.output_dir)?;
        let (stem, ext) = split_name(filename);
        for n in 0..=MAX_RENAMES {
            let candidate = match (n, ext) {
                (0, _) => filename.to_owned(),
                (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
                (n, None) => format!("{stem} ({n})"),
            };
            let path = self.output_dir.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    fill_or_discard(&path, file, |file| {
                        file.write_all(bytes)?;
                        file.sync_all()
                    })?;
                    return Ok(SavedArtifact {
                        filename: candidate,
                        location: Some(path),
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(BiodataError::Io(err)),
            }
        }
        Err(BiodataError::Bridge(format!(
            "no free name for {filename} in {}",
            self.output_dir.display()
        )))
    }

    #[cfg(not(any(target_os = "ios", target_os = "android", target_os = "macos")))]
    fn save_with_dialog(&self, filename: &str, bytes: &[u8]) -> Result<Option<SavedArtifact>> {
        let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.output_dir)
            .set_file_name(filename)
            .add_filter("PDF", &["pdf"])
            .save_file()
        else {
            return Ok(None);
        };
        std::fs::write(&path, bytes)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| filename.to_owned());
        Ok(Some(SavedArtifact {
            filename: name,
            location: Some(path),
        }))
    }

    #[cfg(any(target_os = "ios", target_os = "android", target_os = "macos"))]
    fn save_with_dialog(&self, _filename: &str, _bytes: &[u8]) -> Result<Option<SavedArtifact>> {
        Err(BiodataError::HostUnavailable)
    }
}

/// Write a freshly created file, deleting it again if writing fails so a
/// truncated download never takes the name.
fn fill_or_discard(
    path: &Path,
    mut file: File,
    fill: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> Result<()> {
    let outcome = fill(&mut file);
    drop(file);
    if let Err(err) = outcome {
        if let Err(cleanup) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial file");
        }
        return Err(BiodataError::Io(err));
    }
    Ok(())
}

fn split_name(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

impl HostBridge for DesktopHost {
    fn host_name(&self) -> &str {
        "Desktop"
    }
}

impl SaveFile for DesktopHost {
    fn save_file(&self, filename: &str, bytes: &[u8], mime_type: &str) -> Result<Option<SavedArtifact>> {
        let saved = if self.save_dialog {
            self.save_with_dialog(filename, bytes)?
        } else {
            Some(self.save_to_dir(filename, bytes)?)
        };
        match &saved {
            Some(artifact) => info!(
                filename = %artifact.filename,
                location = ?artifact.location,
                mime_type,
                len = bytes.len(),
                "file saved"
            ),
            None => info!(filename, "save cancelled by user"),
        }
        Ok(saved)
    }
}

impl Notify for DesktopHost {
    fn alert(&self, message: &str) {
        warn!(message, "alert");
        eprintln!("{message}");
    }
}
