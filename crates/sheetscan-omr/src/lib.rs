//! Answer-sheet decoding pipeline.
//!
//! One photographed multiple-choice sheet goes through five stages, each a
//! pure function of its predecessor's output:
//!
//! 1. preprocessing: grayscale + two inverse-threshold ink masks
//! 2. rectification: locate 4 corner fiducials, assign roles, warp into the
//!    canonical frame
//! 3. grid calibration: border ticks, bubble radius, 32x25 lattice
//! 4. classification: per-bubble fill density
//! 5. decoding: answer symbols with density tie-breaking
//!
//! The caller owns an [`OmrPipeline`] holding the immutable configuration;
//! `process` either yields a full [`SheetScan`] or a single typed
//! [`OmrError`]. There is no partial output and no state carried between
//! sheets, so one pipeline value can be shared across worker threads.

mod annotate;
mod classify;
mod config;
mod decode;
mod error;
mod grid;
mod pipeline;
mod rectify;

pub use classify::{classify, BubbleReading, DetectionMatrix};
pub use config::{OmrConfig, VisualizationConfig};
pub use decode::{answer_string, decode, Answer, DecodedAnswer};
pub use error::{OmrError, ScanEdge};
pub use grid::{calibrate, SheetGrid, COLUMNS, QUESTIONS, ROWS};
pub use pipeline::{OmrPipeline, SheetScan};
pub use rectify::{assign_corner_roles, detect_fiducials, rectify, CanonicalFrame, Fiducial};
