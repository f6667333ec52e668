//! Connected ink-region extraction from binary masks.
//!
//! The sheet template only ever needs bounding boxes and pixel counts of
//! solid printed shapes (corner fiducials, border ticks), so this is a plain
//! 8-connected component sweep rather than a full border-following contour
//! tracer.

use crate::image::is_ink;
use crate::GrayImageView;

/// Axis-aligned bounding box of one connected ink component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InkRegion {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Number of ink pixels in the component.
    pub area: usize,
}

impl InkRegion {
    /// Ink pixels over bounding-box pixels, in [0, 1].
    #[inline]
    pub fn density(&self) -> f64 {
        self.area as f64 / (self.width * self.height) as f64
    }

    /// Integer center of the bounding box (`x + w/2`, `y + h/2`).
    #[inline]
    pub fn center(&self) -> (usize, usize) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

const NEIGHBORS_8: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Find all 8-connected ink components in a mask.
///
/// The scan is row-major, so the output order depends only on pixel content,
/// never on allocation or hashing — repeated runs over the same mask return
/// the same list.
pub fn find_ink_regions(mask: &GrayImageView<'_>) -> Vec<InkRegion> {
    let (w, h) = (mask.width, mask.height);
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            let idx = sy * w + sx;
            if visited[idx] || !is_ink(mask.data[idx]) {
                continue;
            }

            let (mut min_x, mut max_x) = (sx, sx);
            let (mut min_y, mut max_y) = (sy, sy);
            let mut area = 0usize;

            visited[idx] = true;
            stack.push((sx, sy));
            while let Some((x, y)) = stack.pop() {
                area += 1;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                for (dx, dy) in NEIGHBORS_8 {
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    let nidx = ny as usize * w + nx as usize;
                    if !visited[nidx] && is_ink(mask.data[nidx]) {
                        visited[nidx] = true;
                        stack.push((nx as usize, ny as usize));
                    }
                }
            }

            regions.push(InkRegion {
                x: min_x,
                y: min_y,
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
                area,
            });
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrayImage;

    fn mask_with_rect(w: usize, h: usize, x0: usize, y0: usize, rw: usize, rh: usize) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                img.data[y * w + x] = 255;
            }
        }
        img
    }

    #[test]
    fn solid_rect_has_full_density() {
        let img = mask_with_rect(20, 20, 3, 5, 6, 4);
        let regions = find_ink_regions(&img.view());
        assert_eq!(regions.len(), 1);
        let r = regions[0];
        assert_eq!((r.x, r.y, r.width, r.height), (3, 5, 6, 4));
        assert_eq!(r.area, 24);
        approx::assert_abs_diff_eq!(r.density(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn separate_blobs_yield_separate_regions() {
        let mut img = mask_with_rect(30, 10, 1, 1, 3, 3);
        for y in 6..9 {
            for x in 20..24 {
                img.data[y * 30 + x] = 255;
            }
        }
        let regions = find_ink_regions(&img.view());
        assert_eq!(regions.len(), 2);
        // Row-major discovery: the upper blob comes first.
        assert_eq!(regions[0].y, 1);
        assert_eq!(regions[1].y, 6);
    }

    #[test]
    fn diagonal_pixels_are_one_component() {
        let mut img = GrayImage::new(5, 5);
        img.data[0] = 255;
        img.data[1 * 5 + 1] = 255;
        img.data[2 * 5 + 2] = 255;
        let regions = find_ink_regions(&img.view());
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3);
    }

    #[test]
    fn faint_interpolated_pixels_are_background() {
        let mut img = GrayImage::new(4, 1);
        img.data[0] = 127;
        img.data[1] = 128;
        let regions = find_ink_regions(&img.view());
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].width), (1, 1));
    }
}
