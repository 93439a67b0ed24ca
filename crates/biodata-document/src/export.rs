// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exporter — turns the rendered profile card into `biodata.pdf`.
//
// Pipeline: resolve the region, copy it into an off-screen container, capture
// the copy, drop the container, paginate the snapshot over A4 pages, write
// the PDF, and hand it to the host. Failures end the invocation with a log
// line and one alert; nothing is retried and nothing is left behind.

use std::sync::Arc;

use biodata_core::error::{BiodataError, Result};
use biodata_core::human_errors::{export_alert, humanize_error};
use biodata_core::{AppConfig, ExportId, ExportReceipt, PageStrategy};
use biodata_host::{HostBridge, PDF_MIME};
use biodata_view::{CaptureOptions, ContainerGuard, Rasterizer, SharedTree};
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span};

use crate::integrity::hash_bytes;
use crate::paginate::{PageGeometry, plan_pages};
use crate::pdf::writer::{DEFAULT_TITLE, PdfWriter};

/// Everything an export needs besides the tree, rasterizer, and host.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub region_selector: String,
    pub filename: String,
    pub capture: CaptureOptions,
    pub strategy: PageStrategy,
    pub geometry: PageGeometry,
    pub title: String,
}

impl ExportSettings {
    pub fn from_config(config: &AppConfig, profile_name: Option<&str>) -> Self {
        let title = match profile_name.map(str::trim) {
            Some(name) if !name.is_empty() => format!("{DEFAULT_TITLE} - {name}"),
            _ => DEFAULT_TITLE.to_owned(),
        };
        Self {
            region_selector: config.region_selector.clone(),
            filename: config.output_filename.clone(),
            capture: CaptureOptions::from_config(config),
            strategy: config.page_strategy,
            geometry: PageGeometry::A4,
            title,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default(), None)
    }
}

/// Exports a region of the live tree to a paginated PDF.
///
/// Cheap to clone; clones share the tree, rasterizer, and host.
pub struct Exporter<R, H> {
    tree: SharedTree,
    rasterizer: Arc<R>,
    host: Arc<H>,
    settings: Arc<ExportSettings>,
}

impl<R, H> Clone for Exporter<R, H> {
    fn clone(&self) -> Self {
        Self {
            tree: Arc::clone(&self.tree),
            rasterizer: Arc::clone(&self.rasterizer),
            host: Arc::clone(&self.host),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<R: Rasterizer + 'static, H: HostBridge + 'static> Exporter<R, H> {
    pub fn new(tree: SharedTree, rasterizer: Arc<R>, host: Arc<H>, settings: ExportSettings) -> Self {
        Self {
            tree,
            rasterizer,
            host,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Export the region named by `region_selector`.
    ///
    /// Never fails: errors are logged and reported to the user through the
    /// host, and `None` is returned.
    pub async fn export_to_document(&self, region_selector: &str) -> Option<ExportReceipt> {
        match self.try_export(region_selector).await {
            Ok(receipt) => Some(receipt),
            Err(err) => {
                let human = humanize_error(&err);
                error!(error = %err, suggestion = %human.suggestion, "export failed");
                self.host.alert(export_alert(&err));
                None
            }
        }
    }

    /// Export the configured region; what the Download control invokes.
    pub async fn download(&self) -> Option<ExportReceipt> {
        self.export_to_document(&self.settings.region_selector).await
    }

    /// Run an export as its own task so the trigger is not blocked.
    pub fn spawn_download(&self) -> JoinHandle<Option<ExportReceipt>> {
        let exporter = self.clone();
        tokio::spawn(async move { exporter.download().await })
    }

    /// The export pipeline, with errors surfaced to the caller.
    pub async fn try_export(&self, region_selector: &str) -> Result<ExportReceipt> {
        let export_id = ExportId::new();
        let span = info_span!("export", %export_id, selector = region_selector);
        self.run(export_id, region_selector).instrument(span).await
    }

    async fn run(&self, export_id: ExportId, region_selector: &str) -> Result<ExportReceipt> {
        let settings = &self.settings;

        let (guard, layout) =
            ContainerGuard::attach_region(&self.tree, region_selector, settings.capture.background)?;
        info!(container = guard.container().index(), "capturing detached copy");
        let captured = self.rasterizer.capture(layout, &settings.capture).await;
        drop(guard);
        let snapshot = captured?;

        let plan = plan_pages(snapshot.width(), snapshot.height(), settings.geometry)?;
        let snapshot_px = (snapshot.width(), snapshot.height());

        let mut writer = PdfWriter::new(settings.geometry);
        writer.set_title(settings.title.clone());
        writer.set_strategy(settings.strategy);
        writer.set_background(settings.capture.background);
        let pdf_plan = plan.clone();
        let bytes = tokio::task::spawn_blocking(move || {
            writer.create_from_snapshot(snapshot.image(), &pdf_plan)
        })
        .await
        .map_err(|err| BiodataError::PdfError(format!("PDF writer task failed: {err}")))??;

        let sha256 = hash_bytes(&bytes);
        let host = Arc::clone(&self.host);
        let suggested = settings.filename.clone();
        let saved = tokio::task::spawn_blocking(move || host.save_file(&suggested, &bytes, PDF_MIME))
            .await
            .map_err(|err| BiodataError::Bridge(format!("save task failed: {err}")))??;
        let (filename, location) = match saved {
            Some(artifact) => (artifact.filename, artifact.location),
            None => (settings.filename.clone(), None),
        };

        info!(
            filename = %filename,
            pages = plan.page_count(),
            width = snapshot_px.0,
            height = snapshot_px.1,
            sha256 = %sha256,
            host = self.host.host_name(),
            "export complete"
        );

        Ok(ExportReceipt {
            export_id,
            filename,
            location,
            page_count: plan.page_count(),
            snapshot_px,
            sha256,
            created_at: Utc::now(),
        })
    }
}
