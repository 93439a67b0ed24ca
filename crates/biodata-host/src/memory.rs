// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory host — records every save and alert instead of touching the
// filesystem or the terminal. Used when embedding the exporter and in tests.

use std::sync::{Mutex, MutexGuard};

use biodata_core::error::{BiodataError, Result};
use tracing::debug;

use crate::traits::*;

/// A file handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSave {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Journal {
    saves: Vec<RecordedSave>,
    alerts: Vec<String>,
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    journal: Mutex<Journal>,
    fail_saves: bool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose every save fails with a bridge error.
    pub fn failing() -> Self {
        Self {
            journal: Mutex::default(),
            fail_saves: true,
        }
    }

    pub fn saves(&self) -> Vec<RecordedSave> {
        self.journal().saves.clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.journal().alerts.clone()
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HostBridge for MemoryHost {
    fn host_name(&self) -> &str {
        "Memory"
    }
}

impl SaveFile for MemoryHost {
    fn save_file(&self, filename: &str, bytes: &[u8], mime_type: &str) -> Result<Option<SavedArtifact>> {
        if self.fail_saves {
            return Err(BiodataError::Bridge(format!("refusing to save {filename}")));
        }
        debug!(filename, len = bytes.len(), "save recorded");
        self.journal().saves.push(RecordedSave {
            filename: filename.to_owned(),
            mime_type: mime_type.to_owned(),
            bytes: bytes.to_vec(),
        });
        Ok(Some(SavedArtifact {
            filename: filename.to_owned(),
            location: None,
        }))
    }
}

impl Notify for MemoryHost {
    fn alert(&self, message: &str) {
        self.journal().alerts.push(message.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_saves_and_alerts_in_order() {
        let host = MemoryHost::new();
        host.save_file("biodata.pdf", b"%PDF-1", PDF_MIME).unwrap();
        host.save_file("biodata.pdf", b"%PDF-2", PDF_MIME).unwrap();
        host.alert("first");
        host.alert("second");

        let saves = host.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[1].bytes, b"%PDF-2");
        assert_eq!(saves[0].mime_type, PDF_MIME);
        assert_eq!(host.alerts(), vec!["first", "second"]);
    }

    #[test]
    fn failing_host_records_nothing() {
        let host = MemoryHost::failing();
        let err = host.save_file("biodata.pdf", b"x", PDF_MIME).unwrap_err();
        assert!(matches!(err, BiodataError::Bridge(_)));
        assert!(host.saves().is_empty());
    }
}
