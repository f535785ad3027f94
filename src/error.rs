use std::path::PathBuf;
use thiserror::Error;

pub type DiscountResult<T> = Result<T, DiscountError>;

#[derive(Error, Debug)]
pub enum DiscountError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load workbook: {0}")]
    Load(String),

    #[error("Failed to save workbook: {0}")]
    Save(String),

    #[error("Failed to build chart: {0}")]
    Chart(String),

    #[error("Discount must be in [0, 1), got {0}")]
    InvalidDiscount(f64),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Sheet \"{0}\" already exists")]
    DuplicateSheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
