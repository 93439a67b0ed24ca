// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads settings, builds the profile view, and runs
// exports against the desktop host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use biodata_core::error::{BiodataError, Result};
use biodata_core::{AppConfig, Biodata, ExportReceipt, PageStrategy};
use biodata_document::{ExportSettings, Exporter};
use biodata_host::desktop_host;
use biodata_view::{ProfileView, SoftwareRasterizer};
use tracing::{debug, info, instrument};

use super::data_dir::{self, CONFIG_FILE};

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct ExportOverrides {
    pub output_dir: Option<PathBuf>,
    pub save_dialog: bool,
    pub viewport_width: Option<u32>,
    pub page_strategy: Option<PageStrategy>,
    pub asset_root: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub capture_scale: Option<f32>,
}

pub struct AppServices {
    config: AppConfig,
    data_dir: PathBuf,
}

impl AppServices {
    /// Load settings from `config_path`, or from the data directory when no
    /// path is given. A missing default settings file means defaults.
    pub fn init(config_path: Option<&Path>) -> Result<Self> {
        let dir = data_dir::data_dir();
        info!(path = %dir.display(), "initialising app services");
        let config = match config_path {
            Some(path) => AppConfig::load(path)?,
            None => load_config(&dir)?.unwrap_or_default(),
        };
        Ok(Self::with_config(config, dir))
    }

    pub fn with_config(config: AppConfig, data_dir: PathBuf) -> Self {
        Self { config, data_dir }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fold command-line overrides into the loaded settings.
    pub fn apply_overrides(&mut self, overrides: ExportOverrides) -> Result<()> {
        let config = &mut self.config;
        if let Some(dir) = overrides.output_dir {
            config.output_dir = Some(dir);
        }
        if overrides.save_dialog {
            config.save_dialog = true;
        }
        if let Some(width) = overrides.viewport_width {
            config.viewport_width = width;
        }
        if let Some(strategy) = overrides.page_strategy {
            config.page_strategy = strategy;
        }
        if let Some(root) = overrides.asset_root {
            config.asset_root = root;
        }
        if let Some(font) = overrides.font_path {
            config.font_path = Some(font);
        }
        if let Some(scale) = overrides.capture_scale {
            config.capture_scale = scale;
        }
        config.validate()?;
        debug!(config = ?self.config, "overrides applied");
        Ok(())
    }

    /// Persist the current settings to the data directory.
    pub fn save_config(&self) -> Result<PathBuf> {
        persist_config(&self.data_dir, &self.config)
    }

    /// Render the profile at `profile_path` and download it as a PDF.
    ///
    /// Returns `None` when the export failed; the user has already been
    /// alerted through the host in that case.
    #[instrument(skip(self), fields(profile = %profile_path.display()))]
    pub async fn export_profile(
        &self,
        profile_path: &Path,
        selected_image: Option<usize>,
    ) -> Result<Option<ExportReceipt>> {
        let profile = load_profile(profile_path)?;

        let mut config = self.config.clone();
        config.asset_root = resolve_against(profile_path, &config.asset_root);

        let mut view = ProfileView::new(profile, config.viewport_width)?;
        if let Some(index) = selected_image {
            view.select_image(index)?;
        }

        let rasterizer = SoftwareRasterizer::new(config.font_path.as_deref());
        debug!(has_font = rasterizer.has_font(), "rasterizer ready");
        let exporter = Exporter::new(
            view.tree(),
            Arc::new(rasterizer),
            Arc::new(desktop_host(&config)),
            ExportSettings::from_config(&config, Some(view.profile().name.as_str())),
        );

        // The Download control only starts the task; completion is reported
        // through the receipt or an alert.
        exporter
            .spawn_download()
            .await
            .map_err(|err| BiodataError::Bridge(format!("export task failed: {err}")))
    }
}

fn load_profile(path: &Path) -> Result<Biodata> {
    let json = std::fs::read_to_string(path)?;
    Biodata::from_json(&json)
}

/// Relative asset roots are taken relative to the profile's directory.
fn resolve_against(profile_path: &Path, asset_root: &Path) -> PathBuf {
    if asset_root.is_absolute() {
        return asset_root.to_path_buf();
    }
    match profile_path.parent() {
        Some(parent) => parent.join(asset_root),
        None => asset_root.to_path_buf(),
    }
}

// -- Config file persistence -------------------------------------------------

fn load_config(data_dir: &Path) -> Result<Option<AppConfig>> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    AppConfig::load(&path).map(Some)
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<PathBuf> {
    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(CONFIG_FILE);
    config.save(&path)?;
    info!(path = %path.display(), "config saved");
    Ok(path)
}
