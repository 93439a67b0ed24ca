// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// biodata-host — Host bridge abstractions.
//
// The exporter never writes files or prints messages itself; it goes through
// `HostBridge`, implemented here for the desktop and for in-memory use.

pub mod desktop;
pub mod memory;
pub mod traits;

use std::path::PathBuf;

use biodata_core::AppConfig;

pub use desktop::DesktopHost;
pub use memory::MemoryHost;
pub use traits::{HostBridge, Notify, PDF_MIME, SaveFile, SavedArtifact};

/// Build the desktop host described by `config`, saving into the configured
/// output directory or the current directory.
pub fn desktop_host(config: &AppConfig) -> DesktopHost {
    let dir = config
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    DesktopHost::new(dir).with_save_dialog(config.save_dialog)
}
