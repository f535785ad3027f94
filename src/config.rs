//! Batch configuration: runtime options and YAML job plans

use crate::error::DiscountResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to do with input paths that do not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInputPolicy {
    /// The job for that file prints an `Error:` line; siblings still run
    #[default]
    Report,
    /// Check every input before starting and fail the whole run on the first missing one
    Abort,
}

/// Runtime options for [`BatchRunner`](crate::batch::BatchRunner)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchOptions {
    /// Worker count; `None` uses the host's available parallelism
    pub workers: Option<usize>,
    pub missing_input: MissingInputPolicy,
}

impl BatchOptions {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_missing_input(mut self, policy: MissingInputPolicy) -> Self {
        self.missing_input = policy;
        self
    }

    /// Effective pool size, never zero
    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("processed_files")
}

/// A batch described in YAML:
///
/// ```yaml
/// files:
///   - transactions_generated.xlsx
///   - transactions.xlsx
/// sheets: [Sheet1, Sheet2, Sheet3]
/// discount: 0.1
/// output_dir: processed_files
/// workers: 4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    pub files: Vec<PathBuf>,
    pub sheets: Vec<String>,
    pub discount: f64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(default)]
    pub missing_input: MissingInputPolicy,
}

impl BatchPlan {
    /// Parse a plan file. Relative input and output paths stay relative to the
    /// current directory, not the plan file.
    pub fn from_file(path: &Path) -> DiscountResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> DiscountResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn options(&self) -> BatchOptions {
        BatchOptions {
            workers: self.workers,
            missing_input: self.missing_input,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscountError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_worker_count_defaults_to_parallelism() {
        let options = BatchOptions::default();
        assert!(options.worker_count() >= 1);
        assert_eq!(BatchOptions::default().with_workers(3).worker_count(), 3);
    }

    #[test]
    fn test_zero_workers_falls_back() {
        assert!(BatchOptions::default().with_workers(0).worker_count() >= 1);
    }

    #[test]
    fn test_plan_from_yaml() {
        let plan = BatchPlan::from_yaml(
            r#"
files:
  - a.xlsx
  - data/b.xlsx
sheets: [Sheet1, Sheet2]
discount: 0.1
workers: 2
missing_input: abort
"#,
        )
        .unwrap();

        assert_eq!(plan.files, vec![PathBuf::from("a.xlsx"), PathBuf::from("data/b.xlsx")]);
        assert_eq!(plan.sheets, vec!["Sheet1", "Sheet2"]);
        assert_eq!(plan.discount, 0.1);
        assert_eq!(plan.output_dir, PathBuf::from("processed_files"));
        assert_eq!(
            plan.options(),
            BatchOptions {
                workers: Some(2),
                missing_input: MissingInputPolicy::Abort,
            }
        );
    }

    #[test]
    fn test_plan_missing_field() {
        let err = BatchPlan::from_yaml("files: [a.xlsx]\nsheets: [Sheet1]\n").unwrap_err();
        assert!(matches!(err, DiscountError::Yaml(_)));
    }
}
