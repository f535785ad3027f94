//! Per-file dispatch: derive the output name, hand off to the transformer

use crate::core::process_workbook;
use crate::types::DiscountJob;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const PROCESSED_SUFFIX: &str = "_processed";

/// `<output_dir>/<stem>_processed.<ext>` for `input`.
///
/// Only the final extension is replaced: `q1.sales.xlsx` becomes
/// `q1.sales_processed.xlsx`; a name without extension just gets the suffix.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name: OsString = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(PROCESSED_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    output_dir.join(name)
}

/// Build the job for one input file
pub fn job_for(input: &Path, sheet_names: &[String], discount: f64, output_dir: &Path) -> DiscountJob {
    DiscountJob {
        input: input.to_path_buf(),
        sheet_names: sheet_names.to_vec(),
        discount,
        output: output_path_for(input, output_dir),
    }
}

/// Process one input file into `output_dir`. Errors are reported, never returned.
pub fn dispatch(input: &Path, sheet_names: &[String], discount: f64, output_dir: &Path) {
    run_job(&job_for(input, sheet_names, discount, output_dir));
}

pub fn run_job(job: &DiscountJob) {
    tracing::debug!(input = %job.input.display(), output = %job.output.display(), "dispatching");
    process_workbook(&job.input, &job.sheet_names, job.discount, &job.output);
}
