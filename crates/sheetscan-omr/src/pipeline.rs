//! The caller-owned pipeline composing all stages.

use log::{debug, info};

use sheetscan_core::{threshold_inv, GrayImageView, RgbImage as Raster};

use crate::annotate::annotate;
use crate::classify::{classify, DetectionMatrix};
use crate::config::OmrConfig;
use crate::decode::{answer_string, decode, DecodedAnswer};
use crate::grid::{calibrate, SheetGrid, QUESTIONS};
use crate::rectify::rectify;
use crate::OmrError;

/// Fixed inverse-threshold cutoff for the fiducial mask. The corner squares
/// are solid black print, so they do not need the exposure-dependent cutoff
/// the pencil fills use.
const FIDUCIAL_THRESHOLD: u8 = 127;

/// Everything produced for one successfully decoded sheet.
#[derive(Debug)]
pub struct SheetScan {
    /// 200-character answer string, one symbol per question.
    pub answer_string: String,
    /// Per-question decoding detail in question order.
    pub answers: Vec<DecodedAnswer>,
    /// Raw 25x32 fill readings.
    pub matrix: DetectionMatrix,
    /// The calibrated lattice, in canonical pixels.
    pub grid: SheetGrid,
    /// Canonical color frame with retained marks painted per density band.
    pub preview: image::RgbImage,
}

/// Synchronous single-sheet pipeline around an immutable configuration.
///
/// `process` is a pure function of the input raster; the pipeline holds no
/// per-sheet state, so one instance can serve any number of threads.
pub struct OmrPipeline {
    config: OmrConfig,
}

impl OmrPipeline {
    /// Validate the configuration once and build the pipeline.
    pub fn new(config: OmrConfig) -> Result<Self, OmrError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &OmrConfig {
        &self.config
    }

    /// Decode one photographed sheet into its answer string, detection
    /// matrix and annotated preview.
    pub fn process(&self, photo: &image::RgbImage) -> Result<SheetScan, OmrError> {
        let color = Raster {
            width: photo.width() as usize,
            height: photo.height() as usize,
            data: photo.as_raw().clone(),
        };

        let gray = image::imageops::grayscale(photo);
        let gray_view = GrayImageView {
            width: gray.width() as usize,
            height: gray.height() as usize,
            data: gray.as_raw(),
        };

        let fiducial_mask = threshold_inv(&gray_view, FIDUCIAL_THRESHOLD);
        let bubble_mask = threshold_inv(&gray_view, self.config.bubble_threshold);
        debug!(
            "preprocessed {}x{} photo (bubble cutoff {})",
            color.width, color.height, self.config.bubble_threshold
        );

        let frame = rectify(&color, &fiducial_mask, &bubble_mask, &self.config)?;
        let grid = calibrate(&frame.fiducial_mask.view())?;
        let matrix = classify(
            &frame.bubble_mask.view(),
            &grid,
            self.config.min_fill_percentage,
        );
        let answers = decode(&matrix)?;
        if answers.len() != QUESTIONS {
            return Err(OmrError::DecodeFailure(format!(
                "decoded {} questions, template has {QUESTIONS}",
                answers.len()
            )));
        }

        let preview = annotate(
            &frame.color,
            &grid,
            &matrix,
            &answers,
            &self.config.visualization,
        );
        let preview = image::RgbImage::from_raw(
            preview.width as u32,
            preview.height as u32,
            preview.data,
        )
        .ok_or_else(|| OmrError::DecodeFailure("preview buffer size mismatch".into()))?;

        let answer_string = answer_string(&answers);
        info!(
            "sheet decoded: {} answers, {} blank",
            answers.len(),
            answer_string.chars().filter(|&c| c == '0').count()
        );

        Ok(SheetScan {
            answer_string,
            answers,
            matrix,
            grid,
            preview,
        })
    }
}
