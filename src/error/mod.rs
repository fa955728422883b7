use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocSealError {
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Directory listing error: {0}")]
    Listing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("Missing output files: {}", .0.join(", "))]
    MissingOutputs(Vec<String>),

    #[error("Report write error: {0}")]
    ReportWrite(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocSealError>;
