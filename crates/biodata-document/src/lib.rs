// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// biodata-document — From snapshot to downloadable document.
//
// Provides the A4 page plan for a tall snapshot, PDF assembly (`printpdf`)
// and inspection (`lopdf`), SHA-256 fingerprints, and the `Exporter` that
// runs the whole pipeline against a live view tree and a host bridge.

pub mod export;
pub mod integrity;
pub mod paginate;
pub mod pdf;

// Re-export the primary structs so callers can use `biodata_document::Exporter` etc.
pub use export::{ExportSettings, Exporter};
pub use paginate::{PageGeometry, PagePlacement, PagePlan, plan_pages};
pub use pdf::reader::PdfReader;
pub use pdf::writer::PdfWriter;
