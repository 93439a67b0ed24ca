// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BiodataError, Result};
use crate::types::{Color, PageStrategy};

/// Selector of the profile card that the Download control exports.
pub const DEFAULT_REGION_SELECTOR: &str = ".w-full.max-w-5xl";

/// Filename the exported document is saved under.
pub const DEFAULT_OUTPUT_FILENAME: &str = "biodata.pdf";

/// Largest canvas edge most browsers will allocate.
pub const DEFAULT_MAX_CANVAS_PX: u32 = 32_767;

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Selector of the region to export.
    pub region_selector: String,
    /// Filename handed to the host's save mechanism.
    pub output_filename: String,
    /// Device-pixel-ratio used for the capture.
    pub capture_scale: f32,
    /// Opaque background painted behind the detached copy.
    pub background: Color,
    /// Include assets from outside the asset root instead of blanking them.
    pub use_cors: bool,
    /// Tolerate assets that fail to load instead of failing the capture.
    pub allow_taint: bool,
    /// Maximum width or height of the captured bitmap, in device pixels.
    pub max_canvas_px: u32,
    pub page_strategy: PageStrategy,
    /// Width of the simulated viewport, in CSS pixels.
    pub viewport_width: u32,
    /// TrueType font used for text; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    /// Directory that image sources are resolved against.
    pub asset_root: PathBuf,
    /// Download directory; the current directory when unset.
    pub output_dir: Option<PathBuf>,
    /// Ask the user where to save through the native dialog.
    pub save_dialog: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            region_selector: DEFAULT_REGION_SELECTOR.to_owned(),
            output_filename: DEFAULT_OUTPUT_FILENAME.to_owned(),
            capture_scale: 2.0,
            background: Color::WHITE,
            use_cors: true,
            allow_taint: true,
            max_canvas_px: DEFAULT_MAX_CANVAS_PX,
            page_strategy: PageStrategy::Reposition,
            viewport_width: 1280,
            font_path: None,
            asset_root: PathBuf::from("."),
            output_dir: None,
            save_dialog: false,
        }
    }
}

impl AppConfig {
    /// Read a config file written by [`AppConfig::save`]. Missing fields take
    /// their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: AppConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.capture_scale.is_finite() && self.capture_scale > 0.0) {
            return Err(BiodataError::Config(format!(
                "capture_scale must be positive, got {}",
                self.capture_scale
            )));
        }
        if self.output_filename.trim().is_empty()
            || self.output_filename.contains(['/', '\\'])
        {
            return Err(BiodataError::Config(format!(
                "output_filename must be a bare file name, got {:?}",
                self.output_filename
            )));
        }
        if self.region_selector.trim().is_empty() {
            return Err(BiodataError::Config("region_selector is empty".into()));
        }
        if self.viewport_width == 0 {
            return Err(BiodataError::Config("viewport_width must be non-zero".into()));
        }
        if self.max_canvas_px == 0 {
            return Err(BiodataError::Config("max_canvas_px must be non-zero".into()));
        }
        Ok(())
    }
}
