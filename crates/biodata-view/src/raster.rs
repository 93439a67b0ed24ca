// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rasterizer — paints a laid-out box tree into an RGBA bitmap at a fixed
// device-pixel-ratio, using the `image`, `imageproc`, and `rusttype` crates.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use biodata_core::error::{BiodataError, Result};
use biodata_core::{AppConfig, Color};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use rusttype::{Font, Scale, point};
use tracing::{debug, info, instrument, warn};

use crate::layout::{Content, LayoutBox, TextBlock};

/// Fonts tried, in order, when no font path is configured.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Fill used where an image cannot be drawn.
const PLACEHOLDER: Color = Color::rgb(0xe5, 0xe7, 0xeb);

/// Options for a single capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    /// Device pixels per CSS pixel.
    pub scale: f32,
    /// Opaque colour the canvas starts from.
    pub background: Color,
    /// Draw assets from outside `asset_root` instead of blanking them.
    pub use_cors: bool,
    /// Replace unreadable assets with a placeholder instead of failing.
    pub allow_taint: bool,
    /// Largest accepted canvas edge, in device pixels.
    pub max_dimension: u32,
    pub asset_root: PathBuf,
}

impl CaptureOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            scale: config.capture_scale,
            background: config.background,
            use_cors: config.use_cors,
            allow_taint: config.allow_taint,
            max_dimension: config.max_canvas_px,
            asset_root: config.asset_root.clone(),
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Immutable bitmap of a captured region.
#[derive(Debug, Clone)]
pub struct RenderSnapshot {
    image: RgbaImage,
    scale: f32,
}

impl RenderSnapshot {
    pub fn new(image: RgbaImage, scale: f32) -> Self {
        Self { image, scale }
    }

    /// Width in device pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in device pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Converts a laid-out region into a bitmap.
pub trait Rasterizer: Send + Sync {
    fn capture(
        &self,
        layout: LayoutBox,
        options: &CaptureOptions,
    ) -> impl Future<Output = Result<RenderSnapshot>> + Send;
}

/// CPU rasterizer. Painting runs on the blocking thread pool.
#[derive(Clone, Default)]
pub struct SoftwareRasterizer {
    font: Option<Arc<Font<'static>>>,
}

impl std::fmt::Debug for SoftwareRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareRasterizer")
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

impl SoftwareRasterizer {
    /// Rasterizer without a font; text is drawn as placeholder bars.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    /// Load the configured font, or the first system font found.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => load_font(path),
            None => SYSTEM_FONT_PATHS
                .iter()
                .find_map(|candidate| load_font(Path::new(candidate))),
        };
        if font.is_none() {
            warn!("no usable font found; text will be drawn as placeholder bars");
        }
        Self {
            font: font.map(Arc::new),
        }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }
}

fn load_font(path: &Path) -> Option<Font<'static>> {
    let data = std::fs::read(path).ok()?;
    let font = Font::try_from_vec(data)?;
    info!(path = %path.display(), "font loaded");
    Some(font)
}

impl Rasterizer for SoftwareRasterizer {
    fn capture(
        &self,
        layout: LayoutBox,
        options: &CaptureOptions,
    ) -> impl Future<Output = Result<RenderSnapshot>> + Send {
        let font = self.font.clone();
        let options = options.clone();
        async move {
            tokio::task::spawn_blocking(move || paint_snapshot(&layout, &options, font.as_deref()))
                .await
                .map_err(|err| BiodataError::Capture(format!("rasterizer task failed: {err}")))?
        }
    }
}

/// Paint `layout` synchronously.
#[instrument(skip_all, fields(scale = options.scale))]
pub fn paint_snapshot(
    layout: &LayoutBox,
    options: &CaptureOptions,
    font: Option<&Font<'static>>,
) -> Result<RenderSnapshot> {
    if !(options.scale.is_finite() && options.scale > 0.0) {
        return Err(BiodataError::Capture(format!(
            "invalid capture scale {}",
            options.scale
        )));
    }
    let width = (layout.rect.width * options.scale).ceil() as u32;
    let height = (layout.rect.height * options.scale).ceil() as u32;
    if width == 0 || height == 0 {
        return Err(BiodataError::Capture(format!(
            "region has no area ({width}x{height} px)"
        )));
    }
    if width > options.max_dimension || height > options.max_dimension {
        return Err(BiodataError::Capture(format!(
            "snapshot {width}x{height} px exceeds the {} px canvas limit",
            options.max_dimension
        )));
    }

    let mut painter = Painter {
        canvas: RgbaImage::from_pixel(width, height, rgba(options.background)),
        scale: options.scale,
        origin: (layout.rect.x, layout.rect.y),
        font,
        options,
        assets: HashMap::new(),
    };
    painter.paint_box(layout)?;

    debug!(width, height, boxes = layout.box_count(), "region rasterized");
    Ok(RenderSnapshot::new(painter.canvas, options.scale))
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Where an image source points, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AssetOrigin {
    Local(PathBuf),
    Foreign(PathBuf),
    Remote(String),
}

fn classify_asset(src: &str, root: &Path) -> AssetOrigin {
    if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//") {
        return AssetOrigin::Remote(src.to_owned());
    }
    let trimmed = src.trim_start_matches('/');
    let candidate = if Path::new(src).is_absolute() && Path::new(src).exists() {
        PathBuf::from(src)
    } else {
        // Site-absolute sources ("/photo.jpg") resolve against the root.
        root.join(trimmed)
    };
    match (candidate.canonicalize(), root.canonicalize()) {
        (Ok(resolved), Ok(base)) if !resolved.starts_with(&base) => AssetOrigin::Foreign(resolved),
        (Ok(resolved), _) => AssetOrigin::Local(resolved),
        _ => AssetOrigin::Local(candidate),
    }
}

struct Painter<'a> {
    canvas: RgbaImage,
    scale: f32,
    origin: (f32, f32),
    font: Option<&'a Font<'static>>,
    options: &'a CaptureOptions,
    assets: HashMap<String, Option<Arc<RgbaImage>>>,
}

impl Painter<'_> {
    fn px_x(&self, x: f32) -> i32 {
        ((x - self.origin.0) * self.scale).round() as i32
    }

    fn px_y(&self, y: f32) -> i32 {
        ((y - self.origin.1) * self.scale).round() as i32
    }

    fn px_len(&self, len: f32) -> u32 {
        (len * self.scale).round().max(0.0) as u32
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let (w, h) = (self.px_len(width), self.px_len(height));
        if w == 0 || h == 0 {
            return;
        }
        let rect = PixelRect::at(self.px_x(x), self.px_y(y)).of_size(w, h);
        draw_filled_rect_mut(&mut self.canvas, rect, rgba(color));
    }

    fn paint_box(&mut self, layout: &LayoutBox) -> Result<()> {
        let r = layout.rect;
        if let Some(bg) = layout.background {
            self.fill(r.x, r.y, r.width, r.height, bg);
        }
        if let Some(border) = layout.border {
            let bw = border.width as f32;
            self.fill(r.x, r.y, r.width, bw, border.color);
            self.fill(r.x, r.y + r.height - bw, r.width, bw, border.color);
            self.fill(r.x, r.y, bw, r.height, border.color);
            self.fill(r.x + r.width - bw, r.y, bw, r.height, border.color);
        }
        if let Some(accent) = layout.border_left {
            let inset = layout.border.map(|b| b.width as f32).unwrap_or(0.0);
            self.fill(
                r.x + inset,
                r.y + inset,
                accent.width as f32,
                r.height - 2.0 * inset,
                accent.color,
            );
        }

        match &layout.content {
            Content::None => {}
            Content::Text(block) => self.paint_text(layout, block),
            Content::Image { src, .. } => self.paint_image(layout, src)?,
        }

        for child in &layout.children {
            self.paint_box(child)?;
        }
        Ok(())
    }

    fn paint_text(&mut self, layout: &LayoutBox, block: &TextBlock) {
        let area = layout.content_rect;
        for (index, line) in block.lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let top = area.y + index as f32 * block.line_height;
            match self.font {
                Some(font) => self.draw_glyphs(font, line, area.x, top, block),
                None => {
                    // Bar proportional to the line length, vertically centred.
                    let glyph = block.style.size_px * 0.5;
                    let width = (line.chars().count() as f32 * glyph).min(area.width);
                    let bar = block.style.size_px * 0.6;
                    let muted = mix(block.style.color, self.options.background);
                    self.fill(area.x, top + (block.line_height - bar) / 2.0, width, bar, muted);
                }
            }
        }
    }

    fn draw_glyphs(&mut self, font: &Font<'static>, line: &str, x: f32, top: f32, block: &TextBlock) {
        let scale = Scale::uniform(block.style.size_px * self.scale);
        let ascent = font.v_metrics(scale).ascent;
        let leading = (block.line_height - block.style.size_px) * self.scale / 2.0;
        let start = point(
            self.px_x(x) as f32,
            self.px_y(top) as f32 + leading + ascent,
        );
        // Faux bold: a second pass one device pixel to the right.
        let passes: &[f32] = if block.style.bold { &[0.0, 1.0] } else { &[0.0] };
        let color = block.style.color;
        let (cw, ch) = (self.canvas.width() as i32, self.canvas.height() as i32);
        for shift in passes {
            let origin = point(start.x + shift, start.y);
            for glyph in font.layout(line, scale, origin) {
                let Some(bounds) = glyph.pixel_bounding_box() else {
                    continue;
                };
                let canvas = &mut self.canvas;
                glyph.draw(|gx, gy, coverage| {
                    let px = bounds.min.x + gx as i32;
                    let py = bounds.min.y + gy as i32;
                    if px < 0 || py < 0 || px >= cw || py >= ch {
                        return;
                    }
                    blend(canvas.get_pixel_mut(px as u32, py as u32), color, coverage);
                });
            }
        }
    }

    fn paint_image(&mut self, layout: &LayoutBox, src: &str) -> Result<()> {
        let area = layout.content_rect;
        let (tw, th) = (self.px_len(area.width), self.px_len(area.height));
        if tw == 0 || th == 0 {
            return Ok(());
        }
        let Some(pixels) = self.load_asset(src)? else {
            self.fill(area.x, area.y, area.width, area.height, PLACEHOLDER);
            return Ok(());
        };

        let (iw, ih) = (pixels.width() as f32, pixels.height() as f32);
        if iw == 0.0 || ih == 0.0 {
            return Ok(());
        }
        let ratio = (tw as f32 / iw).min(th as f32 / ih);
        let nw = ((iw * ratio).round() as u32).max(1);
        let nh = ((ih * ratio).round() as u32).max(1);
        let fitted = imageops::resize(&*pixels, nw, nh, FilterType::Triangle);
        let x = self.px_x(area.x) as i64 + (tw.saturating_sub(nw) / 2) as i64;
        let y = self.px_y(area.y) as i64 + (th.saturating_sub(nh) / 2) as i64;
        imageops::overlay(&mut self.canvas, &fitted, x, y);
        Ok(())
    }

    /// Decoded pixels for `src`, or `None` when it must be blanked.
    fn load_asset(&mut self, src: &str) -> Result<Option<Arc<RgbaImage>>> {
        if let Some(cached) = self.assets.get(src) {
            return Ok(cached.clone());
        }

        let loaded = match classify_asset(src, &self.options.asset_root) {
            AssetOrigin::Remote(url) if !self.options.use_cors => {
                debug!(%url, "cross-origin asset blanked");
                None
            }
            AssetOrigin::Remote(url) => {
                self.taint(src, &format!("remote asset {url} is not available offline"))?
            }
            AssetOrigin::Foreign(path) if !self.options.use_cors => {
                debug!(path = %path.display(), "cross-origin asset blanked");
                None
            }
            AssetOrigin::Foreign(path) | AssetOrigin::Local(path) => match image::open(&path) {
                Ok(decoded) => Some(Arc::new(decoded.to_rgba8())),
                Err(err) => self.taint(src, &format!("failed to load {}: {err}", path.display()))?,
            },
        };

        self.assets.insert(src.to_owned(), loaded.clone());
        Ok(loaded)
    }

    fn taint(&self, src: &str, reason: &str) -> Result<Option<Arc<RgbaImage>>> {
        if self.options.allow_taint {
            warn!(src, reason, "asset replaced by placeholder");
            Ok(None)
        } else {
            Err(BiodataError::Capture(reason.to_owned()))
        }
    }
}

/// Alpha-blend `color` onto an opaque pixel with the given coverage.
fn blend(pixel: &mut Rgba<u8>, color: Color, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0);
    let mixc = |dst: u8, src: u8| (dst as f32 * (1.0 - a) + src as f32 * a).round() as u8;
    let Rgba([r, g, b, alpha]) = *pixel;
    *pixel = Rgba([mixc(r, color.r), mixc(g, color.g), mixc(b, color.b), alpha]);
}

/// Halfway between two colours.
fn mix(a: Color, b: Color) -> Color {
    let avg = |x: u8, y: u8| ((x as u16 + y as u16) / 2) as u8;
    Color::rgb(avg(a.r, b.r), avg(a.g, b.g), avg(a.b, b.b))
}
