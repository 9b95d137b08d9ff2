use thiserror::Error;

use crate::domain::{CategoryId, Mode};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse stored data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to create data directory: {0}")]
    Directory(String),
}

impl StorageError {
    pub fn directory(msg: impl Into<String>) -> Self {
        StorageError::Directory(msg.into())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CategoryError {
    #[error("Category name is empty")]
    EmptyName,

    #[error("Category '{0}' already exists")]
    DuplicateId(CategoryId),
}

#[derive(Error, Debug)]
pub enum CheckinError {
    #[error(transparent)]
    Category(#[from] CategoryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize export: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Category '{0}' not found")]
    UnknownCategory(String),

    #[error("No {mode} history entry for '{period_key}'")]
    HistoryEntryNotFound { period_key: String, mode: Mode },

    #[error("Importing is only available in daily mode")]
    ImportUnavailable,

    #[error("Index {0} is out of range")]
    InvalidIndex(usize),

    #[error("Unsupported shell: {0}. Use bash, zsh, or fish.")]
    UnsupportedShell(String),
}
