//! Answer-key grading.
//!
//! Consumes a decoded answer string plus an equal-length answer key and
//! produces per-part correct counts and scaled section scores via lookup
//! tables. The decoding pipeline has no scoring knowledge; this crate has no
//! image knowledge.

mod scoring;

pub use scoring::{ScoringTable, ScoringTableError};

use log::debug;
use serde::Serialize;

/// Question ranges (1-based, inclusive) of the seven test parts.
/// Parts 1-4 are the listening section, parts 5-7 the reading section.
pub const PART_RANGES: [(usize, usize); 7] = [
    (1, 6),
    (7, 31),
    (32, 70),
    (71, 100),
    (101, 130),
    (131, 146),
    (147, 200),
];

/// Questions in the listening section (parts 1-4).
const LISTENING_QUESTIONS: usize = 100;

/// How ambiguous marks ('X') participate in scoring.
///
/// They never match a key symbol either way; `Flag` additionally reports
/// their question numbers so a human can adjudicate the sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AmbiguousPolicy {
    #[default]
    Incorrect,
    Flag,
}

#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    #[error("answer key has {key} symbols but the sheet has {answers}")]
    KeyLengthMismatch { key: usize, answers: usize },
    #[error("part range {start}-{end} exceeds the {total} graded questions")]
    PartOutOfRange {
        start: usize,
        end: usize,
        total: usize,
    },
}

/// Scores of one graded sheet.
#[derive(Clone, Debug, Serialize)]
pub struct GradeReport {
    /// Correct counts per part, in part order.
    pub parts: [usize; 7],
    /// Raw correct counts of the listening and reading sections.
    pub listening_raw: usize,
    pub reading_raw: usize,
    /// Scaled section scores from the lookup table.
    pub listening_scaled: u32,
    pub reading_scaled: u32,
    pub total_scaled: u32,
    /// 1-based numbers of ambiguous questions; populated only under
    /// [`AmbiguousPolicy::Flag`].
    pub ambiguous_questions: Vec<usize>,
}

/// Grader around one normalized answer key.
pub struct Grader {
    key: String,
    table: ScoringTable,
    policy: AmbiguousPolicy,
}

impl Grader {
    /// Build a grader; the key may contain arbitrary whitespace, which is
    /// stripped (key files are often wrapped for readability).
    pub fn new(raw_key: &str, table: ScoringTable, policy: AmbiguousPolicy) -> Self {
        let key: String = raw_key.split_whitespace().collect();
        debug!("grader ready: {} key symbols", key.len());
        Self { key, table, policy }
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Grade one answer string against the key.
    pub fn grade(&self, answers: &str) -> Result<GradeReport, GradeError> {
        if self.key.chars().count() != answers.chars().count() {
            return Err(GradeError::KeyLengthMismatch {
                key: self.key.chars().count(),
                answers: answers.chars().count(),
            });
        }

        let correct: Vec<bool> = answers
            .chars()
            .zip(self.key.chars())
            .map(|(a, k)| a == k)
            .collect();

        let mut parts = [0usize; 7];
        for (i, &(start, end)) in PART_RANGES.iter().enumerate() {
            if end > correct.len() {
                return Err(GradeError::PartOutOfRange {
                    start,
                    end,
                    total: correct.len(),
                });
            }
            parts[i] = correct[start - 1..end].iter().filter(|&&c| c).count();
        }

        let listening_raw = correct[..LISTENING_QUESTIONS.min(correct.len())]
            .iter()
            .filter(|&&c| c)
            .count();
        let reading_raw = correct[LISTENING_QUESTIONS.min(correct.len())..]
            .iter()
            .filter(|&&c| c)
            .count();

        let listening_scaled = self.table.listening(listening_raw);
        let reading_scaled = self.table.reading(reading_raw);

        let ambiguous_questions = match self.policy {
            AmbiguousPolicy::Incorrect => Vec::new(),
            AmbiguousPolicy::Flag => answers
                .chars()
                .enumerate()
                .filter(|&(_, c)| c == 'X')
                .map(|(i, _)| i + 1)
                .collect(),
        };

        Ok(GradeReport {
            parts,
            listening_raw,
            reading_raw,
            listening_scaled,
            reading_scaled,
            total_scaled: listening_scaled + reading_scaled,
            ambiguous_questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_200() -> String {
        "ABCD".chars().cycle().take(200).collect()
    }

    #[test]
    fn key_equal_answers_score_full_in_every_part() {
        let key = key_200();
        let grader = Grader::new(&key, ScoringTable::identity(), AmbiguousPolicy::Incorrect);
        let report = grader.grade(&key).expect("grade");

        for (i, &(start, end)) in PART_RANGES.iter().enumerate() {
            assert_eq!(report.parts[i], end - start + 1, "part {}", i + 1);
        }
        assert_eq!(report.listening_raw, 100);
        assert_eq!(report.reading_raw, 100);
    }

    #[test]
    fn whitespace_in_key_is_ignored() {
        let key = key_200();
        let wrapped: String = key
            .chars()
            .enumerate()
            .flat_map(|(i, c)| {
                if i % 40 == 0 {
                    vec!['\n', c]
                } else {
                    vec![c]
                }
            })
            .collect();
        let grader = Grader::new(&wrapped, ScoringTable::identity(), AmbiguousPolicy::Incorrect);
        assert_eq!(grader.key(), key);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let grader = Grader::new(
            &key_200(),
            ScoringTable::identity(),
            AmbiguousPolicy::Incorrect,
        );
        let err = grader.grade("ABCD").unwrap_err();
        assert!(matches!(
            err,
            GradeError::KeyLengthMismatch {
                key: 200,
                answers: 4
            }
        ));
    }

    #[test]
    fn ambiguous_marks_never_match_and_flag_policy_reports_them() {
        let key = key_200();
        let mut answers: Vec<char> = key.chars().collect();
        answers[0] = 'X';
        answers[150] = 'X';
        let answers: String = answers.into_iter().collect();

        let silent = Grader::new(&key, ScoringTable::identity(), AmbiguousPolicy::Incorrect);
        let report = silent.grade(&answers).expect("grade");
        assert_eq!(report.parts[0], 5);
        assert!(report.ambiguous_questions.is_empty());

        let flagging = Grader::new(&key, ScoringTable::identity(), AmbiguousPolicy::Flag);
        let report = flagging.grade(&answers).expect("grade");
        assert_eq!(report.ambiguous_questions, vec![1, 151]);
    }

    #[test]
    fn blanks_only_miss_their_own_question() {
        let key = key_200();
        let mut answers: Vec<char> = key.chars().collect();
        answers[6] = '0'; // first question of part 2
        let answers: String = answers.into_iter().collect();

        let grader = Grader::new(&key, ScoringTable::identity(), AmbiguousPolicy::Incorrect);
        let report = grader.grade(&answers).expect("grade");
        assert_eq!(report.parts[0], 6);
        assert_eq!(report.parts[1], 24);
        assert_eq!(report.listening_raw, 99);
    }
}
