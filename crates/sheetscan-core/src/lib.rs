//! Image primitives and projective geometry for answer-sheet scanning.
//!
//! This crate is intentionally small. It knows nothing about sheet templates
//! or bubbles; it provides the raster types, binary masks, ink-region
//! extraction and the homography/warping machinery the pipeline crates build
//! on.

mod homography;
mod image;
mod logger;
mod regions;
mod threshold;

pub use homography::{homography_from_4pt, warp_perspective_gray, warp_perspective_rgb, Homography};
pub use image::{is_ink, sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage};
pub use logger::init_with_level;
pub use regions::{find_ink_regions, InkRegion};
pub use threshold::threshold_inv;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;
