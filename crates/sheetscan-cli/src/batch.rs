//! Worker-pool batch execution.
//!
//! The pipeline itself is synchronous and single-threaded per sheet, so
//! parallelism lives entirely here: workers pull paths from a shared queue
//! and push outcomes through a channel. A failed sheet produces an error
//! outcome and never stops the batch.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use log::{info, warn};
use sheetscan_grade::{GradeReport, Grader};
use sheetscan_omr::OmrPipeline;

/// Result of one sheet, success or failure, tagged with the file stem.
pub struct SheetOutcome {
    pub name: String,
    pub result: Result<SheetResult, String>,
}

pub struct SheetResult {
    pub answer_string: String,
    pub report: GradeReport,
    pub preview: image::RgbImage,
}

fn process_one(path: &Path, pipeline: &OmrPipeline, grader: &Grader) -> Result<SheetResult, String> {
    let photo = image::open(path)
        .map_err(|e| format!("cannot read image: {e}"))?
        .to_rgb8();
    let scan = pipeline.process(&photo).map_err(|e| e.to_string())?;
    let report = grader
        .grade(&scan.answer_string)
        .map_err(|e| e.to_string())?;
    Ok(SheetResult {
        answer_string: scan.answer_string,
        report,
        preview: scan.preview,
    })
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Run every sheet through the pipeline on `jobs` worker threads.
///
/// Outcomes are returned sorted by sheet name so reports do not depend on
/// scheduling order.
pub fn run_batch(
    paths: Vec<PathBuf>,
    pipeline: &OmrPipeline,
    grader: &Grader,
    jobs: usize,
) -> Vec<SheetOutcome> {
    let total = paths.len();
    info!("processing {total} sheets on {jobs} workers");

    let queue = Mutex::new(VecDeque::from(paths));
    let (tx, rx) = mpsc::channel::<SheetOutcome>();

    thread::scope(|scope| {
        for _ in 0..jobs.max(1) {
            let tx = tx.clone();
            let queue = &queue;
            scope.spawn(move || loop {
                let Some(path) = queue.lock().ok().and_then(|mut q| q.pop_front()) else {
                    break;
                };
                let name = stem_of(&path);
                let result = process_one(&path, pipeline, grader);
                if let Err(reason) = &result {
                    warn!("{name}: {reason}");
                }
                if tx.send(SheetOutcome { name, result }).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        let mut outcomes: Vec<SheetOutcome> = rx.into_iter().collect();
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!("batch done: {} ok, {failed} failed", total - failed);
        outcomes
    })
}
