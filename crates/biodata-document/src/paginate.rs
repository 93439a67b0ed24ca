// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagination — maps a snapshot onto a stack of fixed-size pages.
//
// The snapshot is scaled to the page width. Page 1 shows it from the top;
// every following page shows the same image shifted up by one more page
// height, so page N presents the rows [N * page_h, (N + 1) * page_h) mm.

use biodata_core::error::{BiodataError, Result};
use tracing::{debug, instrument};

/// Page size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
}

impl PageGeometry {
    /// ISO 216 A4, portrait.
    pub const A4: Self = Self {
        width_mm: 210.0,
        height_mm: 297.0,
    };
}

/// Where the snapshot sits on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePlacement {
    /// Zero-based page number.
    pub page_index: usize,
    /// Offset of the image's top edge below the page's top edge; zero or
    /// negative.
    pub offset_y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub geometry: PageGeometry,
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    pub placements: Vec<PagePlacement>,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// Millimetres per source pixel.
    pub fn mm_per_px(&self, width_px: u32) -> f64 {
        self.image_width_mm / f64::from(width_px)
    }
}

/// Plan the pages for a `width_px` x `height_px` snapshot.
///
/// Always yields at least one page.
#[instrument]
pub fn plan_pages(width_px: u32, height_px: u32, geometry: PageGeometry) -> Result<PagePlan> {
    if width_px == 0 || height_px == 0 {
        return Err(BiodataError::Capture(format!(
            "cannot paginate an empty snapshot ({width_px}x{height_px} px)"
        )));
    }

    let image_width_mm = geometry.width_mm;
    let image_height_mm = f64::from(height_px) * geometry.width_mm / f64::from(width_px);

    let placement = |page_index, offset_y_mm| PagePlacement {
        page_index,
        offset_y_mm,
        width_mm: image_width_mm,
        height_mm: image_height_mm,
    };

    let mut placements = vec![placement(0, 0.0)];
    let mut remaining = image_height_mm - geometry.height_mm;
    while remaining > 0.0 {
        placements.push(placement(placements.len(), remaining - image_height_mm));
        remaining -= geometry.height_mm;
    }

    debug!(
        image_height_mm,
        pages = placements.len(),
        "pages planned"
    );

    Ok(PagePlan {
        geometry,
        image_width_mm,
        image_height_mm,
        placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(plan: &PagePlan) -> Vec<f64> {
        plan.placements.iter().map(|p| p.offset_y_mm).collect()
    }

    #[test]
    fn tall_snapshot_spans_three_pages() {
        let plan = plan_pages(1000, 3000, PageGeometry::A4).unwrap();
        assert_eq!(plan.image_height_mm, 630.0);
        assert_eq!(plan.page_count(), 3);
        assert_eq!(offsets(&plan), vec![0.0, -297.0, -594.0]);
        assert!(plan.placements.iter().all(|p| p.width_mm == 210.0 && p.height_mm == 630.0));
    }

    #[test]
    fn short_snapshot_fits_one_page() {
        let plan = plan_pages(1000, 1200, PageGeometry::A4).unwrap();
        assert_eq!(plan.image_height_mm, 252.0);
        assert_eq!(offsets(&plan), vec![0.0]);
    }

    #[test]
    fn exact_page_height_is_one_page() {
        let plan = plan_pages(210, 297, PageGeometry::A4).unwrap();
        assert_eq!(plan.page_count(), 1);
        let plan = plan_pages(210, 594, PageGeometry::A4).unwrap();
        assert_eq!(offsets(&plan), vec![0.0, -297.0]);
    }

    #[test]
    fn page_count_is_ceiling_of_height_over_page() {
        // 210 px wide maps one pixel to one millimetre.
        for height in (1..=2000).step_by(7).chain([296, 297, 298, 891, 892]) {
            let plan = plan_pages(210, height, PageGeometry::A4).unwrap();
            let expected = (f64::from(height) / 297.0).ceil() as usize;
            assert_eq!(plan.page_count(), expected.max(1), "height {height}");
            for (index, p) in plan.placements.iter().enumerate() {
                assert_eq!(p.page_index, index);
                assert_eq!(p.offset_y_mm, -(index as f64) * 297.0);
            }
        }
    }

    #[test]
    fn empty_snapshot_is_rejected() {
        assert!(matches!(
            plan_pages(0, 100, PageGeometry::A4),
            Err(BiodataError::Capture(_))
        ));
        assert!(plan_pages(100, 0, PageGeometry::A4).is_err());
    }
}
