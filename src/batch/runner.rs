//! Batch runner: fan jobs out over a fixed-size worker pool

use super::dispatcher::{job_for, run_job};
use crate::config::{BatchOptions, MissingInputPolicy};
use crate::core::validate_discount;
use crate::error::{DiscountError, DiscountResult};
use crate::types::DiscountJob;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};

/// Processes many workbooks in parallel. Each job owns its file end to end;
/// per-file failures are printed by the job and never reach the runner.
#[derive(Debug, Clone, Default)]
pub struct BatchRunner {
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process every path into `output_dir` and block until all jobs finish.
    ///
    /// Only run-level problems are returned: an invalid discount, a missing
    /// input under [`MissingInputPolicy::Abort`], or an output directory that
    /// cannot be created.
    pub fn run(
        &self,
        paths: &[PathBuf],
        sheet_names: &[String],
        discount: f64,
        output_dir: &Path,
    ) -> DiscountResult<()> {
        validate_discount(discount)?;

        if self.options.missing_input == MissingInputPolicy::Abort {
            if let Some(missing) = paths.iter().find(|p| !p.exists()) {
                return Err(DiscountError::NotFound(missing.clone()));
            }
        }

        std::fs::create_dir_all(output_dir)?;

        let jobs: Vec<DiscountJob> = paths
            .iter()
            .map(|path| job_for(path, sheet_names, discount, output_dir))
            .collect();

        let workers = self.options.worker_count();
        tracing::info!(jobs = jobs.len(), workers, "starting batch");

        match build_pool(workers) {
            Some(pool) => pool.scope(|scope| {
                for job in &jobs {
                    scope.spawn(move |_| run_job(job));
                }
            }),
            None => jobs.iter().for_each(run_job),
        }

        println!("All files processed and saved to \"{}\"", output_dir.display());
        Ok(())
    }
}

/// Dedicated pool for one run. `None` if the OS refuses threads, in which case
/// the caller runs jobs serially.
fn build_pool(workers: usize) -> Option<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|idx| format!("discount-worker-{}", idx))
        .build()
        .map_err(|e| tracing::warn!(error = %e, "worker pool unavailable, running serially"))
        .ok()
}

/// Run a batch with default options (pool sized to the host)
pub fn parallel_process(
    paths: &[PathBuf],
    sheet_names: &[String],
    discount: f64,
    output_dir: &Path,
) -> DiscountResult<()> {
    BatchRunner::default().run(paths, sheet_names, discount, output_dir)
}
