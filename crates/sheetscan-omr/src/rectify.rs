//! Corner fiducial detection and perspective rectification.

use log::debug;
use nalgebra::Point2;

use sheetscan_core::{
    find_ink_regions, homography_from_4pt, warp_perspective_gray, warp_perspective_rgb, GrayImage,
    GrayImageView, Homography, RgbImage,
};

use crate::{OmrConfig, OmrError};

const FIDUCIAL_ASPECT_MIN: f64 = 0.8;
const FIDUCIAL_ASPECT_MAX: f64 = 1.2;
const FIDUCIAL_MIN_DENSITY: f64 = 0.7;

/// One corner marker candidate, as a bounding box on the fiducial mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fiducial {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Fiducial {
    #[inline]
    pub fn center(&self) -> (i64, i64) {
        (
            (self.x + self.width / 2) as i64,
            (self.y + self.height / 2) as i64,
        )
    }

    /// Bounding-box top-left corner, the registration anchor. The printed
    /// squares sit fully inside the sheet, so the top-left corner is stable
    /// under partial erosion of the square's far edges, unlike the centroid.
    #[inline]
    pub fn anchor(&self) -> Point2<f32> {
        Point2::new(self.x as f32, self.y as f32)
    }
}

/// The color frame and both ink masks resampled into canonical coordinates.
pub struct CanonicalFrame {
    pub color: RgbImage,
    pub fiducial_mask: GrayImage,
    pub bubble_mask: GrayImage,
    /// Maps canonical coordinates back into the photograph.
    pub homography: Homography,
}

/// Find the 4 corner fiducials on the fiducial ink mask.
///
/// Candidates must be at least `0.5 * fiducial_scaling_ref * image_width` in
/// both dimensions, close to square (aspect in [0.8, 1.2]) and mostly solid
/// (ink density >= 0.7). Anything else on the sheet fails at least one of
/// these. Exactly 4 survivors are required.
pub fn detect_fiducials(
    mask: &GrayImageView<'_>,
    scaling_ref: f64,
) -> Result<[Fiducial; 4], OmrError> {
    let min_size = 0.5 * scaling_ref * mask.width as f64;

    let mut found = Vec::new();
    for region in find_ink_regions(mask) {
        if (region.width as f64) < min_size || (region.height as f64) < min_size {
            continue;
        }
        let aspect = region.width as f64 / region.height as f64;
        if !(FIDUCIAL_ASPECT_MIN..=FIDUCIAL_ASPECT_MAX).contains(&aspect) {
            continue;
        }
        if region.density() < FIDUCIAL_MIN_DENSITY {
            continue;
        }
        found.push(Fiducial {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
        });
    }

    debug!("fiducial candidates surviving filters: {}", found.len());
    <[Fiducial; 4]>::try_from(found.as_slice())
        .map_err(|_| OmrError::InsufficientFiducials { found: found.len() })
}

/// Index of the strict extremum of `key` over the four candidates.
///
/// `None` when the extremum is not unique: a perfectly symmetric layout has
/// no defensible corner assignment, and the caller treats it as degenerate.
fn strict_extremum(keys: &[i64; 4], largest: bool) -> Option<usize> {
    let mut best = 0usize;
    let mut tied = false;
    for i in 1..4 {
        let better = if largest {
            keys[i] > keys[best]
        } else {
            keys[i] < keys[best]
        };
        if better {
            best = i;
            tied = false;
        } else if keys[i] == keys[best] {
            tied = true;
        }
    }
    (!tied).then_some(best)
}

/// Order 4 fiducials as `[top-left, top-right, bottom-right, bottom-left]`.
///
/// Roles come from the bounding-box centers: the coordinate sum x+y is
/// smallest at the top-left and largest at the bottom-right, the difference
/// x-y is largest at the top-right and smallest at the bottom-left. The
/// result does not depend on the discovery order of the candidates. Any tie,
/// or two roles landing on the same candidate, is a degenerate layout.
pub fn assign_corner_roles(fiducials: &[Fiducial; 4]) -> Result<[Fiducial; 4], OmrError> {
    let mut sums = [0i64; 4];
    let mut diffs = [0i64; 4];
    for (i, f) in fiducials.iter().enumerate() {
        let (cx, cy) = f.center();
        sums[i] = cx + cy;
        diffs[i] = cx - cy;
    }

    let tl = strict_extremum(&sums, false).ok_or(OmrError::DegenerateTransform)?;
    let br = strict_extremum(&sums, true).ok_or(OmrError::DegenerateTransform)?;
    let tr = strict_extremum(&diffs, true).ok_or(OmrError::DegenerateTransform)?;
    let bl = strict_extremum(&diffs, false).ok_or(OmrError::DegenerateTransform)?;

    let mut roles = [tl, tr, br, bl];
    roles.sort_unstable();
    if roles.windows(2).any(|w| w[0] == w[1]) {
        return Err(OmrError::DegenerateTransform);
    }

    Ok([fiducials[tl], fiducials[tr], fiducials[br], fiducials[bl]])
}

/// Detect the corner fiducials and resample the color raster plus both ink
/// masks into the canonical frame.
pub fn rectify(
    color: &RgbImage,
    fiducial_mask: &GrayImage,
    bubble_mask: &GrayImage,
    config: &OmrConfig,
) -> Result<CanonicalFrame, OmrError> {
    let candidates = detect_fiducials(&fiducial_mask.view(), config.fiducial_scaling_ref)?;
    let [tl, tr, br, bl] = assign_corner_roles(&candidates)?;

    let (w, h) = (config.canonical_width, config.canonical_height);
    let canon = [
        Point2::new(0.0_f32, 0.0),
        Point2::new(w as f32, 0.0),
        Point2::new(w as f32, h as f32),
        Point2::new(0.0_f32, h as f32),
    ];
    let img = [tl.anchor(), tr.anchor(), br.anchor(), bl.anchor()];

    let homography = homography_from_4pt(&canon, &img).ok_or(OmrError::DegenerateTransform)?;
    debug!(
        "rectifying through corners {:?} -> {}x{} canonical frame",
        [tl, tr, br, bl],
        w,
        h
    );

    Ok(CanonicalFrame {
        color: warp_perspective_rgb(color, &homography, w, h),
        fiducial_mask: warp_perspective_gray(&fiducial_mask.view(), &homography, w, h),
        bubble_mask: warp_perspective_gray(&bubble_mask.view(), &homography, w, h),
        homography,
    })
}
