// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — lays a raster snapshot out over a page plan using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use biodata_core::error::{BiodataError, Result};
use biodata_core::{Color, PageStrategy};
use image::{RgbImage, RgbaImage, imageops};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectId, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::paginate::{PageGeometry, PagePlan};

/// Title used when the profile has no name.
pub const DEFAULT_TITLE: &str = "Biodata";

/// Creates paginated PDF documents from a single snapshot.
pub struct PdfWriter {
    geometry: PageGeometry,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
    strategy: PageStrategy,
    /// Colour transparent snapshot pixels are composited over.
    background: Color,
}

impl PdfWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            title: None,
            strategy: PageStrategy::default(),
            background: Color::WHITE,
        }
    }

    /// Create a new writer for A4 portrait pages.
    pub fn a4() -> Self {
        Self::new(PageGeometry::A4)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_strategy(&mut self, strategy: PageStrategy) {
        self.strategy = strategy;
    }

    pub fn set_background(&mut self, background: Color) {
        self.background = background;
    }

    fn page_dimensions(&self) -> (Mm, Mm) {
        (
            Mm(self.geometry.width_mm as f32),
            Mm(self.geometry.height_mm as f32),
        )
    }

    /// Render `snapshot` onto the pages described by `plan`.
    #[instrument(skip_all, fields(
        width = snapshot.width(),
        height = snapshot.height(),
        pages = plan.page_count(),
        strategy = ?self.strategy,
    ))]
    pub fn create_from_snapshot(&self, snapshot: &RgbaImage, plan: &PagePlan) -> Result<Vec<u8>> {
        if plan.geometry != self.geometry {
            return Err(BiodataError::PdfError(format!(
                "plan is for {:?} pages, writer is for {:?}",
                plan.geometry, self.geometry
            )));
        }
        if snapshot.width() == 0 || snapshot.height() == 0 {
            return Err(BiodataError::PdfError("snapshot has no pixels".into()));
        }

        let title = self.title.as_deref().unwrap_or(DEFAULT_TITLE);
        info!(title, "creating snapshot PDF");

        let flat = flatten(snapshot, self.background);
        let mut doc = PdfDocument::new(title);
        let pages = match self.strategy {
            PageStrategy::Reposition => self.reposition_pages(&mut doc, flat, plan),
            PageStrategy::Crop => self.cropped_pages(&mut doc, &flat, plan),
        };
        doc.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        for warning in &warnings {
            warn!(?warning, "printpdf warning");
        }

        debug!(output_bytes = output.len(), "snapshot PDF serialised");
        Ok(output)
    }

    /// One embedded image, placed on every page with the page's offset.
    fn reposition_pages(&self, doc: &mut PdfDocument, flat: RgbImage, plan: &PagePlan) -> Vec<PdfPage> {
        let (page_w, page_h) = self.page_dimensions();
        let width_px = flat.width();
        let dpi = placement_dpi(width_px, plan.image_width_mm);
        let xobject_id = doc.add_image(&raw_rgb(flat));

        plan.placements
            .iter()
            .map(|placement| {
                // PDF space grows upward from the page's bottom-left corner.
                let bottom_mm = self.geometry.height_mm - (placement.offset_y_mm + placement.height_mm);
                debug!(page = placement.page_index, bottom_mm, "image placed");
                PdfPage::new(page_w, page_h, vec![place(&xobject_id, bottom_mm, dpi)])
            })
            .collect()
    }

    /// One page-tall slice of the image per page.
    fn cropped_pages(&self, doc: &mut PdfDocument, flat: &RgbImage, plan: &PagePlan) -> Vec<PdfPage> {
        let (page_w, page_h) = self.page_dimensions();
        let (width_px, height_px) = flat.dimensions();
        let dpi = placement_dpi(width_px, plan.image_width_mm);
        let px_per_mm = 1.0 / plan.mm_per_px(width_px);

        plan.placements
            .iter()
            .map(|placement| {
                let top_mm = -placement.offset_y_mm;
                let top = ((top_mm * px_per_mm).round() as u32).min(height_px);
                let bottom = (((top_mm + self.geometry.height_mm) * px_per_mm).round() as u32)
                    .min(height_px);
                if bottom <= top {
                    return PdfPage::new(page_w, page_h, Vec::new());
                }
                let slice = imageops::crop_imm(flat, 0, top, width_px, bottom - top).to_image();
                let slice_mm = f64::from(bottom - top) / px_per_mm;
                let xobject_id = doc.add_image(&raw_rgb(slice));
                let bottom_mm = self.geometry.height_mm - slice_mm;
                debug!(page = placement.page_index, top, bottom, "slice placed");
                PdfPage::new(page_w, page_h, vec![place(&xobject_id, bottom_mm, dpi)])
            })
            .collect()
    }
}

/// DPI at which `width_px` pixels span exactly `width_mm`.
fn placement_dpi(width_px: u32, width_mm: f64) -> f32 {
    (f64::from(width_px) * 25.4 / width_mm) as f32
}

fn place(xobject_id: &XObjectId, bottom_mm: f64, dpi: f32) -> Op {
    Op::UseXobject {
        id: xobject_id.clone(),
        transform: XObjectTransform {
            translate_x: Some(Pt(0.0)),
            translate_y: Some(Mm(bottom_mm as f32).into_pt()),
            scale_x: None,
            scale_y: None,
            dpi: Some(dpi),
            rotate: None,
        },
    }
}

fn raw_rgb(image: RgbImage) -> RawImage {
    let (width, height) = image.dimensions();
    RawImage {
        pixels: RawImageData::U8(image.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    }
}

/// Composite RGBA pixels over an opaque background.
fn flatten(snapshot: &RgbaImage, background: Color) -> RgbImage {
    RgbImage::from_fn(snapshot.width(), snapshot.height(), |x, y| {
        let [r, g, b, a] = snapshot.get_pixel(x, y).0;
        let over = |fg: u8, bg: u8| {
            ((u32::from(fg) * u32::from(a) + u32::from(bg) * (255 - u32::from(a)) + 127) / 255) as u8
        };
        image::Rgb([
            over(r, background.r),
            over(g, background.g),
            over(b, background.b),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginate::plan_pages;
    use crate::pdf::reader::PdfReader;
    use image::Rgba;

    fn snapshot(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |_, y| {
            let shade = (y % 256) as u8;
            Rgba([shade, 0, 255 - shade, 255])
        })
    }

    #[test]
    fn repositioned_pages_share_one_image() {
        let image = snapshot(100, 300);
        let plan = plan_pages(100, 300, PageGeometry::A4).unwrap();
        assert_eq!(plan.page_count(), 3);

        let bytes = PdfWriter::a4().create_from_snapshot(&image, &plan).unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert_eq!(reader.image_count(), 1);

        let (w, h) = reader.page_size_mm(1).unwrap();
        assert!((w - 210.0).abs() < 0.1, "width {w}");
        assert!((h - 297.0).abs() < 0.1, "height {h}");
    }

    #[test]
    fn cropped_pages_embed_a_slice_each() {
        let image = snapshot(100, 300);
        let plan = plan_pages(100, 300, PageGeometry::A4).unwrap();
        let mut writer = PdfWriter::a4();
        writer.set_strategy(PageStrategy::Crop);
        writer.set_title("Biodata - Test");

        let bytes = writer.create_from_snapshot(&image, &plan).unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 3);
        assert_eq!(reader.image_count(), 3);
    }

    /// Combined `cm` transform of the image drawn on `page` (1-indexed):
    /// `[a, b, c, d, e, f]` in points.
    fn image_matrix(bytes: &[u8], page: u32) -> [f32; 6] {
        let doc = lopdf::Document::load_mem(bytes).unwrap();
        let page_id = doc.get_pages()[&page];
        let content = lopdf::content::Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let mut ctm = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        for op in content.operations.iter().filter(|op| op.operator == "cm") {
            let m: Vec<f32> = op.operands.iter().map(|o| o.as_float().unwrap()).collect();
            ctm = [
                m[0] * ctm[0] + m[1] * ctm[2],
                m[0] * ctm[1] + m[1] * ctm[3],
                m[2] * ctm[0] + m[3] * ctm[2],
                m[2] * ctm[1] + m[3] * ctm[3],
                m[4] * ctm[0] + m[5] * ctm[2] + ctm[4],
                m[4] * ctm[1] + m[5] * ctm[3] + ctm[5],
            ];
        }
        ctm
    }

    fn assert_near(actual: f32, expected: f32, what: &str) {
        assert!((actual - expected).abs() < 1.0, "{what}: {actual} != {expected}");
    }

    const MM: f32 = 72.0 / 25.4;

    #[test]
    fn repositioned_image_is_shifted_one_page_per_page() {
        let plan = plan_pages(1000, 3000, PageGeometry::A4).unwrap();
        let bytes = PdfWriter::a4().create_from_snapshot(&snapshot(1000, 3000), &plan).unwrap();

        // Bottom edge of the 630 mm image, measured up from the page bottom.
        for (page, bottom_mm) in [(1, -333.0), (2, -36.0), (3, 261.0)] {
            let [a, _, _, d, e, f] = image_matrix(&bytes, page);
            assert_near(a, 210.0 * MM, "width");
            assert_near(d, 630.0 * MM, "height");
            assert_near(e, 0.0, "x");
            assert_near(f, bottom_mm * MM, "y");
        }
    }

    #[test]
    fn cropped_slices_hang_from_the_page_top() {
        let plan = plan_pages(1000, 3000, PageGeometry::A4).unwrap();
        let mut writer = PdfWriter::a4();
        writer.set_strategy(PageStrategy::Crop);
        let bytes = writer.create_from_snapshot(&snapshot(1000, 3000), &plan).unwrap();

        // Two full pages, then the last 36 mm at the top of page 3.
        for (page, height_mm) in [(1, 297.0), (2, 297.0), (3, 36.0)] {
            let [a, _, _, d, e, f] = image_matrix(&bytes, page);
            assert_near(a, 210.0 * MM, "width");
            assert_near(d, height_mm * MM, "height");
            assert_near(e, 0.0, "x");
            assert_near(f, (297.0 - height_mm) * MM, "y");
        }
    }

    #[test]
    fn mismatched_geometry_is_rejected() {
        let image = snapshot(10, 10);
        let letter = PageGeometry {
            width_mm: 215.9,
            height_mm: 279.4,
        };
        let plan = plan_pages(10, 10, letter).unwrap();
        let err = PdfWriter::a4().create_from_snapshot(&image, &plan).unwrap_err();
        assert!(matches!(err, BiodataError::PdfError(_)));
    }

    #[test]
    fn flatten_composites_over_background() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        image.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let flat = flatten(&image, Color::WHITE);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn dpi_maps_snapshot_width_to_page_width() {
        let dpi = placement_dpi(2048, 210.0);
        let width_mm = 2048.0 / dpi * 25.4;
        assert!((width_mm - 210.0).abs() < 0.01);
    }
}
