use crate::{sample_bilinear_u8, GrayImage, GrayImageView, RgbImage};
use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// 3x3 projective transform between the canonical frame and the photograph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

fn similarity_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };
    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f32>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance
    // from it is sqrt(2). Keeps the 8x8 system well conditioned.
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= 4.0;
    cy /= 4.0;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= 4.0;

    let t = similarity_normalization(cx, cy, mean_dist);

    let mut out = [Point2::new(0.0_f64, 0.0_f64); 4];
    for (i, p) in pts.iter().enumerate() {
        let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
        out[i] = Point2::new(v[0], v[1]);
    }
    (out, t)
}

fn denormalize(hn: Matrix3<f64>, t_src: Matrix3<f64>, t_dst: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Compute H such that `dst ~ H * src` from 4 point correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the correspondences are degenerate (three collinear points, repeated
/// points) and the system has no unique solution.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1.
    // For each correspondence (x,y)->(u,v):
    //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
    //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::<f64>::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    denormalize(hn, t_src, t_dst).map(Homography::new)
}

/// Resample a grayscale raster into a `out_w` x `out_h` canonical frame.
///
/// `h_img_from_canon` maps canonical coordinates to source image coordinates;
/// each destination pixel (x, y) is sampled bilinearly at H(x, y). Samples
/// outside the source read as 0.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_img_from_canon: &Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = vec![0u8; out_w * out_h];
    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_img_from_canon.apply(Point2::new(x as f32, y as f32));
            out[y * out_w + x] = sample_bilinear_u8(src, p.x, p.y);
        }
    }
    GrayImage {
        width: out_w,
        height: out_h,
        data: out,
    }
}

/// Resample an RGB raster into the canonical frame, channel by channel.
pub fn warp_perspective_rgb(
    src: &RgbImage,
    h_img_from_canon: &Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    let (sw, sh) = (src.width as f32, src.height as f32);
    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_img_from_canon.apply(Point2::new(x as f32, y as f32));
            if p.x < -1.0 || p.y < -1.0 || p.x >= sw || p.y >= sh {
                continue;
            }
            out.put_pixel(x, y, sample_rgb_bilinear(src, p.x, p.y));
        }
    }
    out
}

#[inline]
fn get_rgb(src: &RgbImage, x: i32, y: i32) -> [f32; 3] {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return [0.0; 3];
    }
    let p = src.pixel(x as usize, y as usize);
    [p[0] as f32, p[1] as f32, p[2] as f32]
}

fn sample_rgb_bilinear(src: &RgbImage, x: f32, y: f32) -> [u8; 3] {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_rgb(src, x0, y0);
    let p10 = get_rgb(src, x0 + 1, y0);
    let p01 = get_rgb(src, x0, y0 + 1);
    let p11 = get_rgb(src, x0 + 1, y0 + 1);

    let mut out = [0u8; 3];
    for c in 0..3 {
        let a = p00[c] + fx * (p10[c] - p00[c]);
        let b = p01[c] + fx * (p11[c] - p01[c]);
        out[c] = (a + fy * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = tol);
        assert_abs_diff_eq!(a.y, b.y, epsilon = tol);
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::new(Matrix3::new(
            1.2, 0.1, 5.0, //
            -0.05, 0.9, 3.0, //
            0.001, 0.0005, 1.0,
        ));
        let inv = h.inverse().expect("invertible");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(50.0_f32, -20.0),
            Point2::new(320.0_f32, 200.0),
        ] {
            assert_close(inv.apply(h.apply(p)), p, 1e-3);
        }
    }

    #[test]
    fn four_point_recovers_known_transform() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 120.0, //
            -0.02, 1.1, 80.0, //
            0.0009, -0.0004, 1.0,
        ));
        let canon = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(180.0_f32, 0.0),
            Point2::new(180.0_f32, 130.0),
            Point2::new(0.0_f32, 130.0),
        ];
        let img = canon.map(|p| ground_truth.apply(p));

        let recovered = homography_from_4pt(&canon, &img).expect("recoverable");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(60.0, 40.0),
            Point2::new(150.0, 120.0),
        ] {
            assert_close(recovered.apply(p), ground_truth.apply(p), 1e-3);
        }
    }

    #[test]
    fn repeated_correspondence_is_rejected() {
        // Two coincident corners leave only three constraints; the 8x8
        // system is singular and no unique transform exists.
        let src = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(10.0_f32, 0.0),
            Point2::new(10.0_f32, 0.0),
            Point2::new(0.0_f32, 10.0),
        ];
        let dst = [
            Point2::new(5.0_f32, 5.0),
            Point2::new(25.0_f32, 5.0),
            Point2::new(25.0_f32, 5.0),
            Point2::new(5.0_f32, 25.0),
        ];
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn integer_translation_warp_is_exact() {
        // 20x20 source with a bright block at (12,12)..(16,16); the canonical
        // window starts at (10,10), so the block lands at (2,2).
        let mut src = GrayImage::new(20, 20);
        for y in 12..16 {
            for x in 12..16 {
                src.data[y * 20 + x] = 255;
            }
        }
        let canon = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(8.0_f32, 0.0),
            Point2::new(8.0_f32, 8.0),
            Point2::new(0.0_f32, 8.0),
        ];
        let img = [
            Point2::new(10.0_f32, 10.0),
            Point2::new(18.0_f32, 10.0),
            Point2::new(18.0_f32, 18.0),
            Point2::new(10.0_f32, 18.0),
        ];
        let h = homography_from_4pt(&canon, &img).expect("translation");
        let out = warp_perspective_gray(&src.view(), &h, 8, 8);
        assert_eq!(out.data[2 * 8 + 2], 255);
        assert_eq!(out.data[5 * 8 + 5], 255);
        assert_eq!(out.data[0], 0);
    }
}
