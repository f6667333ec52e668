//! Scaled-score lookup tables.
//!
//! The published conversion maps a raw correct count (0-100 per section) to
//! a scaled section score. The table ships as JSON with string raw-count
//! keys:
//!
//! ```json
//! { "LC_SCALE": { "0": 5, "1": 5, ... }, "RC_SCALE": { "0": 5, ... } }
//! ```

use std::collections::HashMap;

use serde::Deserialize;

/// Lowest scaled score; also the fallback for raw counts missing from the
/// table.
const FLOOR_SCORE: u32 = 5;

const MAX_RAW: usize = 100;

#[derive(thiserror::Error, Debug)]
pub enum ScoringTableError {
    #[error("scoring table JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scoring table has a non-numeric raw count key {0:?}")]
    BadRawCount(String),
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(rename = "LC_SCALE")]
    lc: HashMap<String, u32>,
    #[serde(rename = "RC_SCALE")]
    rc: HashMap<String, u32>,
}

/// Raw-to-scaled conversion for both sections.
#[derive(Clone, Debug)]
pub struct ScoringTable {
    lc: HashMap<usize, u32>,
    rc: HashMap<usize, u32>,
}

fn parse_scale(raw: HashMap<String, u32>) -> Result<HashMap<usize, u32>, ScoringTableError> {
    raw.into_iter()
        .map(|(k, v)| {
            k.parse::<usize>()
                .map(|raw_count| (raw_count, v))
                .map_err(|_| ScoringTableError::BadRawCount(k))
        })
        .collect()
}

impl ScoringTable {
    pub fn from_json(json: &str) -> Result<Self, ScoringTableError> {
        let raw: RawTable = serde_json::from_str(json)?;
        Ok(Self {
            lc: parse_scale(raw.lc)?,
            rc: parse_scale(raw.rc)?,
        })
    }

    /// Table mapping every raw count to itself; handy for tests and for
    /// reporting raw scores when no conversion is published.
    pub fn identity() -> Self {
        let scale: HashMap<usize, u32> = (0..=MAX_RAW).map(|i| (i, i as u32)).collect();
        Self {
            lc: scale.clone(),
            rc: scale,
        }
    }

    fn lookup(scale: &HashMap<usize, u32>, raw: usize) -> u32 {
        let clamped = raw.min(MAX_RAW);
        scale.get(&clamped).copied().unwrap_or(FLOOR_SCORE)
    }

    pub fn listening(&self, raw: usize) -> u32 {
        Self::lookup(&self.lc, raw)
    }

    pub fn reading(&self, raw: usize) -> u32 {
        Self::lookup(&self.rc, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_keyed_scales() {
        let table = ScoringTable::from_json(
            r#"{"LC_SCALE": {"0": 5, "50": 255, "100": 495},
                "RC_SCALE": {"0": 5, "100": 495}}"#,
        )
        .expect("parse");
        assert_eq!(table.listening(50), 255);
        assert_eq!(table.reading(100), 495);
    }

    #[test]
    fn missing_raw_count_falls_back_to_floor() {
        let table =
            ScoringTable::from_json(r#"{"LC_SCALE": {"100": 495}, "RC_SCALE": {}}"#).expect("parse");
        assert_eq!(table.listening(40), FLOOR_SCORE);
        assert_eq!(table.reading(0), FLOOR_SCORE);
    }

    #[test]
    fn raw_count_is_clamped() {
        let table = ScoringTable::identity();
        assert_eq!(table.listening(150), 100);
    }

    #[test]
    fn non_numeric_key_is_an_error() {
        let err = ScoringTable::from_json(r#"{"LC_SCALE": {"many": 5}, "RC_SCALE": {}}"#)
            .unwrap_err();
        assert!(matches!(err, ScoringTableError::BadRawCount(_)));
    }
}
