//! Batch processing of many workbook files

pub mod dispatcher;
pub mod runner;

pub use dispatcher::{dispatch, job_for, output_path_for, run_job};
pub use runner::{parallel_process, BatchRunner};
