//! Inverse binary thresholding.

use crate::{GrayImage, GrayImageView};

/// Build an ink mask from a grayscale raster: pixels at or below `cutoff`
/// become 255, everything brighter becomes 0. Printed marks and pencil fills
/// are darker than the paper, so the mask is bright where the sheet is inked.
pub fn threshold_inv(src: &GrayImageView<'_>, cutoff: u8) -> GrayImage {
    let data = src
        .data
        .iter()
        .map(|&v| if v <= cutoff { 255 } else { 0 })
        .collect();
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}
