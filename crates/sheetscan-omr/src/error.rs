use std::fmt;

/// Which border strip failed the calibration tick count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanEdge {
    Top,
    Left,
}

impl fmt::Display for ScanEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanEdge::Top => write!(f, "top"),
            ScanEdge::Left => write!(f, "left"),
        }
    }
}

/// Errors produced while decoding one sheet.
///
/// All of them are fatal for the sheet and none of them should abort a
/// batch; the orchestration layer records the error and moves on.
#[derive(thiserror::Error, Debug)]
pub enum OmrError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("found {found} corner fiducials, the sheet needs exactly 4")]
    InsufficientFiducials { found: usize },

    #[error("corner fiducial geometry is degenerate, no unique perspective transform")]
    DegenerateTransform,

    #[error("{edge} border has {found} calibration ticks, the template requires {required}")]
    TemplateMismatch {
        edge: ScanEdge,
        found: usize,
        required: usize,
    },

    #[error("answer decoding invariant violated: {0}")]
    DecodeFailure(String),
}
