/// Borrowed single-channel raster, row-major, `len = width * height`.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned single-channel raster. Binary masks use 0 for background and 255
/// for ink; warped masks may carry interpolated edge values in between.
#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

/// Owned interleaved RGB raster, `len = width * height * 3`.
#[derive(Clone, Debug)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Copy a rectangular window into a new image. The window is clipped to
    /// the source bounds; a fully out-of-range window yields a 0x0 image.
    pub fn crop_from(src: &GrayImageView<'_>, x0: usize, y0: usize, w: usize, h: usize) -> Self {
        let x1 = (x0 + w).min(src.width);
        let y1 = (y0 + h).min(src.height);
        if x0 >= x1 || y0 >= y1 {
            return Self::new(0, 0);
        }
        let (cw, ch) = (x1 - x0, y1 - y0);
        let mut data = Vec::with_capacity(cw * ch);
        for y in y0..y1 {
            let row = y * src.width;
            data.extend_from_slice(&src.data[row + x0..row + x1]);
        }
        Self {
            width: cw,
            height: ch,
            data,
        }
    }
}

impl RgbImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height * 3],
        }
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}

/// Mask pixels at or above this value count as ink. Warping a binary mask
/// resamples it bilinearly, so edge pixels land anywhere in 0..=255; the
/// midpoint keeps majority-ink pixels and drops the rest.
pub const INK_CUTOFF: u8 = 128;

#[inline]
pub fn is_ink(v: u8) -> bool {
    v >= INK_CUTOFF
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_clips_to_bounds() {
        let mut img = GrayImage::new(4, 4);
        img.data[2 * 4 + 3] = 200;
        let c = GrayImage::crop_from(&img.view(), 2, 1, 10, 10);
        assert_eq!((c.width, c.height), (2, 3));
        assert_eq!(c.data[1 * 2 + 1], 200);
    }

    #[test]
    fn crop_outside_is_empty() {
        let img = GrayImage::new(4, 4);
        let c = GrayImage::crop_from(&img.view(), 5, 0, 2, 2);
        assert_eq!((c.width, c.height), (0, 0));
    }

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage {
            width: 2,
            height: 1,
            data: vec![0, 100],
        };
        let v = sample_bilinear(&img.view(), 0.5, 0.0);
        approx::assert_abs_diff_eq!(v, 50.0, epsilon = 1e-5);
    }
}
