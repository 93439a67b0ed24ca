// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the biodata exporter.

use thiserror::Error;

/// Top-level error type for all biodata operations.
#[derive(Debug, Error)]
pub enum BiodataError {
    // -- Export errors --
    /// The region selector matched nothing in the live view.
    #[error("region not found: {0}")]
    RegionNotFound(String),

    /// Rasterization of the detached copy failed.
    #[error("capture failed: {0}")]
    Capture(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- View errors --
    #[error("view node {0} does not exist")]
    UnknownNode(usize),

    #[error("invalid view operation: {0}")]
    InvalidTree(String),

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Host bridge --
    #[error("host bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this host")]
    HostUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BiodataError>;
