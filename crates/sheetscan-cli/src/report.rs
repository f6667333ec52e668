//! CSV summary and preview persistence.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::batch::SheetOutcome;
use crate::CliError;

const CSV_HEADER: &str = "name,part1,part2,part3,part4,part5,part6,part7,\
listening_raw,reading_raw,listening_scaled,reading_scaled,total,ambiguous,answer";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Append one row per successful sheet to `summary.csv` in the output
/// directory, writing the header when the file is new. Failed sheets are
/// recorded with the failure reason in the answer column.
pub fn append_summary(out_dir: &Path, outcomes: &[SheetOutcome]) -> Result<(), CliError> {
    let path = out_dir.join("summary.csv");
    let fresh = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if fresh {
        writeln!(file, "{CSV_HEADER}")?;
    }

    for outcome in outcomes {
        match &outcome.result {
            Ok(sheet) => {
                let r = &sheet.report;
                let ambiguous = r
                    .ambiguous_questions
                    .iter()
                    .map(|q| q.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(
                    file,
                    "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                    csv_field(&outcome.name),
                    r.parts[0],
                    r.parts[1],
                    r.parts[2],
                    r.parts[3],
                    r.parts[4],
                    r.parts[5],
                    r.parts[6],
                    r.listening_raw,
                    r.reading_raw,
                    r.listening_scaled,
                    r.reading_scaled,
                    r.total_scaled,
                    csv_field(&ambiguous),
                    sheet.answer_string,
                )?;
            }
            Err(reason) => {
                writeln!(
                    file,
                    "{},,,,,,,,,,,,,,{}",
                    csv_field(&outcome.name),
                    csv_field(&format!("ERROR: {reason}"))
                )?;
            }
        }
    }
    Ok(())
}

/// Write the annotated preview of every successful sheet as
/// `<name>_RESULT.png`.
pub fn save_previews(out_dir: &Path, outcomes: &[SheetOutcome]) -> Result<(), CliError> {
    fs::create_dir_all(out_dir)?;
    for outcome in outcomes {
        if let Ok(sheet) = &outcome.result {
            let path = out_dir.join(format!("{}_RESULT.png", outcome.name));
            sheet.preview.save(&path)?;
        }
    }
    Ok(())
}
