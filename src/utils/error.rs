use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Cannot read '{}': {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Row {row} has {found} fields, header declares {expected}")]
    SchemaMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' not found in header")]
    MissingColumn { column: String },

    #[error("Cannot split {files} file(s) across {workers} worker(s)")]
    PartitionInfeasible { workers: usize, files: usize },

    #[error("Worker {worker_id} failed: {message}")]
    WorkerFault { worker_id: usize, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::PartitionInfeasible { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_)
            | EtlError::FileAccess { .. }
            | EtlError::SchemaMismatch { .. }
            | EtlError::MissingColumn { .. } => ErrorCategory::Input,
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            EtlError::IoError(_) | EtlError::WorkerFault { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一檔案的問題，其餘檔案仍會完成
            EtlError::SchemaMismatch { .. } | EtlError::MissingColumn { .. } => ErrorSeverity::Low,
            EtlError::FileAccess { .. } | EtlError::PartitionInfeasible { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::WorkerFault { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::PartitionInfeasible { .. } => {
                "Lower the worker count so that every worker receives at least one file"
            }
            EtlError::FileAccess { .. } => "Check that the file exists and is readable",
            EtlError::SchemaMismatch { .. } => {
                "Fix the short row or rerun with the 'skip' short-row policy"
            }
            EtlError::MissingColumn { .. } => {
                "Check the column names against the header line of the input files"
            }
            EtlError::CsvError(_) => "Check the delimiter setting and the file encoding",
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => "Review the configuration values and retry",
            EtlError::WorkerFault { .. } => "Inspect the worker logs; the run may need more memory",
            EtlError::IoError(_) => "Check disk space and permissions of the output directory",
            EtlError::SerializationError(_) | EtlError::ProcessingError { .. } => {
                "Rerun with --verbose for details"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::FileAccess { path, .. } => {
                format!("Could not open input file {}", path.display())
            }
            EtlError::PartitionInfeasible { workers, files } => format!(
                "{} worker(s) requested but only {} file(s) found",
                workers, files
            ),
            EtlError::WorkerFault { worker_id, .. } => {
                format!("Worker {} stopped unexpectedly", worker_id)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
