// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the host capabilities the exporter
// relies on: handing a finished file to the user and telling them something.

use std::path::PathBuf;

use biodata_core::error::Result;

/// MIME type of every artifact the exporter produces.
pub const PDF_MIME: &str = "application/pdf";

/// Unified bridge that groups the host capabilities.
pub trait HostBridge: SaveFile + Notify + Send + Sync {
    /// Human-readable host name (e.g. "Desktop", "Memory").
    fn host_name(&self) -> &str;
}

/// Deliver a finished file to the user (download, save dialog, ...).
pub trait SaveFile {
    /// Save `bytes` under the suggested `filename`.
    /// Returns Ok(None) if the user cancelled.
    fn save_file(&self, filename: &str, bytes: &[u8], mime_type: &str) -> Result<Option<SavedArtifact>>;
}

/// Show a blocking, user-visible message.
pub trait Notify {
    fn alert(&self, message: &str);
}

/// Where a saved file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    /// Name the file was saved under; may differ from the suggestion.
    pub filename: String,
    /// Filesystem location, when the host writes to disk.
    pub location: Option<PathBuf>,
}
