//! Border tick calibration and bubble-lattice interpolation.
//!
//! The sheet prints 9 square ticks along the top border and 25 flat ticks
//! along the left border of the canonical frame. The left ticks give the 25
//! row centers directly. The top ticks anchor only 9 of the 32 column
//! centers; the rest are reconstructed algebraically from the fixed physical
//! layout, which is far more robust to local noise than trying to observe
//! all 32 independently.

use log::debug;

use sheetscan_core::{find_ink_regions, GrayImage, GrayImageView};

use crate::{OmrError, ScanEdge};

/// Bubble rows on the sheet.
pub const ROWS: usize = 25;
/// Bubble columns on the sheet (8 question groups of 4).
pub const COLUMNS: usize = 32;
/// Questions per sheet.
pub const QUESTIONS: usize = 200;

const TOP_ANCHORS: usize = 9;

/// Border strip height/width that is scanned for calibration ticks.
const SCAN_THICKNESS: usize = 50;

// Size filters for the border ticks, in canonical pixels. The top ticks are
// small squares, the left ticks are flat bars.
const TOP_TICK_MIN: usize = 19;
const TOP_TICK_MAX: usize = 29;
const TOP_TICK_ASPECT_MIN: f64 = 0.8;
const TOP_TICK_ASPECT_MAX: f64 = 1.2;
const LEFT_TICK_W_MIN: usize = 22;
const LEFT_TICK_W_MAX: usize = 32;
const LEFT_TICK_H_MIN: usize = 4;
const LEFT_TICK_H_MAX: usize = 14;

/// The reconstructed bubble lattice of one sheet, in canonical pixels.
#[derive(Clone, Debug)]
pub struct SheetGrid {
    /// 32 column centers, 9 observed and 23 interpolated.
    pub columns: [i32; COLUMNS],
    /// 25 observed row centers, ascending.
    pub rows: [i32; ROWS],
    /// Bubble test radius derived from the mean top-tick size.
    pub radius: i32,
}

struct TopTick {
    center_x: usize,
    width: usize,
    height: usize,
}

fn scan_top(mask: &GrayImageView<'_>) -> Result<Vec<TopTick>, OmrError> {
    let strip = GrayImage::crop_from(mask, 0, 0, mask.width, SCAN_THICKNESS);
    let mut ticks: Vec<TopTick> = find_ink_regions(&strip.view())
        .into_iter()
        .filter(|r| {
            let aspect = r.width as f64 / r.height as f64;
            (TOP_TICK_MIN..=TOP_TICK_MAX).contains(&r.width)
                && (TOP_TICK_MIN..=TOP_TICK_MAX).contains(&r.height)
                && (TOP_TICK_ASPECT_MIN..=TOP_TICK_ASPECT_MAX).contains(&aspect)
        })
        .map(|r| TopTick {
            center_x: r.center().0,
            width: r.width,
            height: r.height,
        })
        .collect();

    if ticks.len() != TOP_ANCHORS {
        return Err(OmrError::TemplateMismatch {
            edge: ScanEdge::Top,
            found: ticks.len(),
            required: TOP_ANCHORS,
        });
    }
    ticks.sort_unstable_by_key(|t| t.center_x);
    Ok(ticks)
}

fn scan_left(mask: &GrayImageView<'_>) -> Result<[i32; ROWS], OmrError> {
    let strip = GrayImage::crop_from(mask, 0, 0, SCAN_THICKNESS, mask.height);
    let mut centers: Vec<i32> = find_ink_regions(&strip.view())
        .into_iter()
        .filter(|r| {
            (LEFT_TICK_W_MIN..=LEFT_TICK_W_MAX).contains(&r.width)
                && (LEFT_TICK_H_MIN..=LEFT_TICK_H_MAX).contains(&r.height)
        })
        .map(|r| r.center().1 as i32)
        .collect();

    let found = centers.len();
    centers.sort_unstable();
    <[i32; ROWS]>::try_from(centers.as_slice()).map_err(|_| OmrError::TemplateMismatch {
        edge: ScanEdge::Left,
        found,
        required: ROWS,
    })
}

/// Bubble radius from the mean top-tick extent, deflated by one pixel so the
/// test circle sits inside the printed outline.
fn bubble_radius(ticks: &[TopTick]) -> i32 {
    let mean_w = ticks.iter().map(|t| t.width).sum::<usize>() as f64 / ticks.len() as f64;
    let mean_h = ticks.iter().map(|t| t.height).sum::<usize>() as f64 / ticks.len() as f64;
    ((mean_w + mean_h) / 4.0 - 1.0) as i32
}

/// Expand the 9 observed x-anchors into all 32 column centers.
///
/// The template prints the same 16-column pattern twice side by side, one per
/// half-page question block. Within a block the anchors pin the first group
/// directly (S1..S3, with the group's first column at the S0/S1 midpoint),
/// the second group by the block pitch LC, the third by S4/S5 plus the unit
/// spacing U, and the fourth around S7. S8 fixes the jump to the second
/// block.
fn interpolate_columns(anchors: &[f64; TOP_ANCHORS]) -> [i32; COLUMNS] {
    let s = anchors;
    let u = ((s[5] - s[4]) + (s[3] - s[2]) + (s[2] - s[1])) / 3.0;
    let lc = ((s[6] - s[0]) / 3.0 + (s[7] - s[5])) / 2.0;
    let jump = s[8] - s[1];

    let mut n = Vec::with_capacity(COLUMNS);
    n.push((s[1] + s[0]) / 2.0);
    n.extend_from_slice(&[s[1], s[2], s[3]]);
    for i in 0..4 {
        n.push(lc + n[i]);
    }
    n.extend_from_slice(&[s[4], s[5]]);
    n.push(n[n.len() - 1] + u);
    n.push(n[n.len() - 1] + u);
    n.extend_from_slice(&[s[7] - u, s[7], s[7] + u, s[7] + 2.0 * u]);
    for i in 0..16 {
        n.push(jump + n[i]);
    }

    let mut columns = [0i32; COLUMNS];
    for (dst, x) in columns.iter_mut().zip(&n) {
        *dst = *x as i32;
    }
    columns
}

/// Scan the canonical fiducial mask borders and build the bubble lattice.
pub fn calibrate(fiducial_mask: &GrayImageView<'_>) -> Result<SheetGrid, OmrError> {
    let top = scan_top(fiducial_mask)?;
    let rows = scan_left(fiducial_mask)?;

    let radius = bubble_radius(&top);
    let anchors: [f64; TOP_ANCHORS] = core::array::from_fn(|i| top[i].center_x as f64);
    let columns = interpolate_columns(&anchors);
    debug!(
        "calibrated grid: radius={radius}, columns {}..{}",
        columns[0],
        columns[COLUMNS - 1]
    );

    Ok(SheetGrid {
        columns,
        rows,
        radius,
    })
}
