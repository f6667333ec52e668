//! Answer decoding with density tie-breaking.

use std::fmt;

use crate::classify::DetectionMatrix;
use crate::OmrError;

/// Decoded state of one question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    A,
    B,
    C,
    D,
    /// No bubble filled.
    Blank,
    /// Several bubbles filled with no strictly densest one.
    Ambiguous,
}

impl Answer {
    /// One-character form used in answer strings and key files: `A`-`D`,
    /// `0` for blank, `X` for ambiguous.
    pub fn as_char(self) -> char {
        match self {
            Answer::A => 'A',
            Answer::B => 'B',
            Answer::C => 'C',
            Answer::D => 'D',
            Answer::Blank => '0',
            Answer::Ambiguous => 'X',
        }
    }

    fn from_position(pos: usize) -> Self {
        match pos {
            0 => Answer::A,
            1 => Answer::B,
            2 => Answer::C,
            _ => Answer::D,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One decoded question with enough geometry to annotate it afterwards.
#[derive(Clone, Debug)]
pub struct DecodedAnswer {
    pub answer: Answer,
    /// Lattice row of the question.
    pub row: usize,
    /// Lattice column of the retained mark, for A-D answers.
    pub retained: Option<usize>,
    /// Lattice columns of every filled bubble in the group.
    pub filled: Vec<usize>,
}

/// Decode one group of four adjacent columns.
///
/// A single filled bubble maps by position. With several filled, the
/// strictly densest one is the retained mark and the rest are treated as
/// smudges; a genuine density tie cannot be resolved and yields
/// [`Answer::Ambiguous`] instead of failing the sheet.
fn decode_group(readings: [(bool, f64); 4]) -> (Answer, Option<usize>) {
    let filled: Vec<usize> = (0..4).filter(|&i| readings[i].0).collect();
    match filled.len() {
        0 => (Answer::Blank, None),
        1 => (Answer::from_position(filled[0]), Some(filled[0])),
        _ => {
            let mut best = filled[0];
            let mut tied = false;
            for &i in &filled[1..] {
                if readings[i].1 > readings[best].1 {
                    best = i;
                    tied = false;
                } else if readings[i].1 == readings[best].1 {
                    tied = true;
                }
            }
            if tied {
                (Answer::Ambiguous, None)
            } else {
                (Answer::from_position(best), Some(best))
            }
        }
    }
}

/// Decode the detection matrix into the per-question answer sequence.
///
/// Question order follows the printed sheet: down all 25 rows of the first
/// 4-column group, then the next group, through all 8 groups — 200 questions.
pub fn decode(matrix: &DetectionMatrix) -> Result<Vec<DecodedAnswer>, OmrError> {
    if matrix.cols() % 4 != 0 || matrix.cols() == 0 || matrix.rows() == 0 {
        return Err(OmrError::DecodeFailure(format!(
            "detection matrix is {}x{}, need a nonzero multiple of 4 columns",
            matrix.rows(),
            matrix.cols()
        )));
    }

    let groups = matrix.cols() / 4;
    let mut out = Vec::with_capacity(groups * matrix.rows());
    for g in 0..groups {
        let col0 = g * 4;
        for row in 0..matrix.rows() {
            let readings: [(bool, f64); 4] = core::array::from_fn(|i| {
                let cell = matrix.get(row, col0 + i);
                (cell.filled, cell.density)
            });
            let (answer, retained) = decode_group(readings);
            out.push(DecodedAnswer {
                answer,
                row,
                retained: retained.map(|p| col0 + p),
                filled: (0..4).filter(|&i| readings[i].0).map(|i| col0 + i).collect(),
            });
        }
    }
    Ok(out)
}

/// Collapse decoded answers into the one-character-per-question string.
pub fn answer_string(answers: &[DecodedAnswer]) -> String {
    answers.iter().map(|a| a.answer.as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::BubbleReading;

    fn matrix_1row(cells: &[(bool, f64)]) -> DetectionMatrix {
        DetectionMatrix::from_cells(
            1,
            cells.len(),
            cells
                .iter()
                .map(|&(filled, density)| BubbleReading { filled, density })
                .collect(),
        )
    }

    #[test]
    fn single_marks_map_by_position() {
        for (pos, expected) in [(0, 'A'), (1, 'B'), (2, 'C'), (3, 'D')] {
            let mut cells = vec![(false, 0.0); 4];
            cells[pos] = (true, 0.8);
            let decoded = decode(&matrix_1row(&cells)).expect("decode");
            assert_eq!(decoded[0].answer.as_char(), expected);
            assert_eq!(decoded[0].retained, Some(pos));
        }
    }

    #[test]
    fn empty_group_is_blank() {
        let decoded = decode(&matrix_1row(&[(false, 0.1); 4])).expect("decode");
        assert_eq!(decoded[0].answer, Answer::Blank);
        assert!(decoded[0].filled.is_empty());
    }

    #[test]
    fn double_mark_keeps_the_densest() {
        let decoded = decode(&matrix_1row(&[
            (true, 0.6),
            (true, 0.8),
            (false, 0.0),
            (false, 0.0),
        ]))
        .expect("decode");
        assert_eq!(decoded[0].answer, Answer::B);
        assert_eq!(decoded[0].retained, Some(1));
        assert_eq!(decoded[0].filled, vec![0, 1]);
    }

    #[test]
    fn exact_density_tie_is_ambiguous() {
        let decoded = decode(&matrix_1row(&[
            (true, 0.7),
            (false, 0.0),
            (true, 0.7),
            (false, 0.0),
        ]))
        .expect("decode");
        assert_eq!(decoded[0].answer, Answer::Ambiguous);
        assert_eq!(decoded[0].retained, None);
        assert_eq!(decoded[0].filled, vec![0, 2]);
    }

    #[test]
    fn question_order_is_group_major() {
        // 2 rows x 8 columns: mark row 1 of group 0 and row 0 of group 1.
        let mut cells = vec![(false, 0.0); 16];
        cells[8] = (true, 0.9); // row 1, col 0
        cells[5] = (true, 0.9); // row 0, col 5
        let decoded = decode(&DetectionMatrix::from_cells(
            2,
            8,
            cells
                .iter()
                .map(|&(filled, density)| BubbleReading { filled, density })
                .collect(),
        ))
        .expect("decode");
        assert_eq!(answer_string(&decoded), "0AB0");
    }

    #[test]
    fn ragged_matrix_is_a_decode_failure() {
        let m = matrix_1row(&[(false, 0.0); 5]);
        assert!(matches!(decode(&m), Err(OmrError::DecodeFailure(_))));
    }
}
