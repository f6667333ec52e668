//! Per-bubble fill-density classification.

use sheetscan_core::{is_ink, GrayImageView};

use crate::grid::SheetGrid;

/// Fill measurement of one lattice cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BubbleReading {
    pub filled: bool,
    /// Ink pixels inside the test circle over circle pixels, in [0, 1].
    pub density: f64,
}

/// 25x32 grid of bubble readings, row-major.
#[derive(Clone, Debug)]
pub struct DetectionMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<BubbleReading>,
}

impl DetectionMatrix {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> BubbleReading {
        self.cells[row * self.cols + col]
    }

    #[cfg(test)]
    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<BubbleReading>) -> Self {
        assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }
}

/// Measure the fill density around one lattice point.
///
/// A square window of side 2R centered at (cx, cy) is clipped to the mask;
/// a circle of radius R-2 centered in the clipped window selects the test
/// pixels. An out-of-bounds or empty window reads as density 0 rather than
/// an error; the decoder then simply sees a blank bubble.
pub fn measure_fill(
    mask: &GrayImageView<'_>,
    cx: i32,
    cy: i32,
    radius: i32,
    min_fill: f64,
) -> BubbleReading {
    let blank = BubbleReading {
        filled: false,
        density: 0.0,
    };
    let r_test = radius - 2;
    if r_test <= 0 {
        return blank;
    }

    let (w, h) = (mask.width as i32, mask.height as i32);
    let x0 = (cx - radius).max(0);
    let x1 = (cx + radius).min(w);
    let y0 = (cy - radius).max(0);
    let y1 = (cy + radius).min(h);
    if x0 >= x1 || y0 >= y1 {
        return blank;
    }

    // Circle centered in the clipped window, matching how the window itself
    // shifts when clipped at the sheet edge.
    let ccx = x0 + (x1 - x0) / 2;
    let ccy = y0 + (y1 - y0) / 2;
    let r2 = r_test * r_test;

    let mut circle_px = 0u32;
    let mut ink_px = 0u32;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x - ccx;
            let dy = y - ccy;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            circle_px += 1;
            if is_ink(mask.data[(y * w + x) as usize]) {
                ink_px += 1;
            }
        }
    }

    if circle_px == 0 {
        return blank;
    }
    let density = ink_px as f64 / circle_px as f64;
    BubbleReading {
        filled: density >= min_fill,
        density,
    }
}

/// Classify every lattice cell of the canonical bubble-ink mask.
pub fn classify(mask: &GrayImageView<'_>, grid: &SheetGrid, min_fill: f64) -> DetectionMatrix {
    let rows = grid.rows.len();
    let cols = grid.columns.len();
    let mut cells = Vec::with_capacity(rows * cols);
    for &cy in &grid.rows {
        for &cx in &grid.columns {
            cells.push(measure_fill(mask, cx, cy, grid.radius, min_fill));
        }
    }
    DetectionMatrix { rows, cols, cells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetscan_core::GrayImage;

    fn draw_disk(img: &mut GrayImage, cx: i32, cy: i32, r: i32) {
        for y in 0..img.height as i32 {
            for x in 0..img.width as i32 {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    img.data[(y * img.width as i32 + x) as usize] = 255;
                }
            }
        }
    }

    #[test]
    fn full_disk_reads_as_filled() {
        let mut mask = GrayImage::new(60, 60);
        draw_disk(&mut mask, 30, 30, 12);
        let reading = measure_fill(&mask.view(), 30, 30, 11, 0.40);
        assert!(reading.filled);
        assert!(reading.density > 0.95);
    }

    #[test]
    fn blank_area_reads_as_empty() {
        let mask = GrayImage::new(60, 60);
        let reading = measure_fill(&mask.view(), 30, 30, 11, 0.40);
        assert!(!reading.filled);
        assert_eq!(reading.density, 0.0);
    }

    #[test]
    fn out_of_bounds_center_degrades_gracefully() {
        let mask = GrayImage::new(60, 60);
        let reading = measure_fill(&mask.view(), -40, 30, 11, 0.40);
        assert!(!reading.filled);
        assert_eq!(reading.density, 0.0);
    }

    #[test]
    fn fill_decision_crosses_threshold_exactly_once() {
        // Sweep ink coverage from empty to full by growing a centered disk;
        // the filled flag must flip false->true exactly once.
        let mut flips = 0;
        let mut prev = false;
        for r in 0..=12 {
            let mut mask = GrayImage::new(60, 60);
            if r > 0 {
                draw_disk(&mut mask, 30, 30, r);
            }
            let reading = measure_fill(&mask.view(), 30, 30, 11, 0.40);
            assert_eq!(reading.filled, reading.density >= 0.40);
            if reading.filled != prev {
                assert!(reading.filled, "fill decision must never flip back");
                flips += 1;
                prev = reading.filled;
            }
        }
        assert_eq!(flips, 1);
    }

    #[test]
    fn partial_fill_density_matches_pixel_ratio() {
        // Disk of radius 7 inside a test circle of radius 9: 149 of 253
        // circle pixels are ink.
        let mut mask = GrayImage::new(60, 60);
        draw_disk(&mut mask, 30, 30, 7);
        let reading = measure_fill(&mask.view(), 30, 30, 11, 0.40);
        approx::assert_abs_diff_eq!(reading.density, 149.0 / 253.0, epsilon = 1e-12);
        assert!(reading.filled);
    }
}
