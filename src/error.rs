// Error types for netcheck

use thiserror::Error;

/// Exit code used when the primary interface source cannot be read
pub const EXIT_SOURCE_UNAVAILABLE: u8 = 126;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Dependency '{command}' is missing or failing: {reason}")]
    SourceUnavailable { command: String, reason: String },

    #[error("Field '{0}' missing from command output")]
    FieldMissing(String),

    #[error("Probe '{probe}' failed: {reason}")]
    ProbeFailure { probe: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn source_unavailable(command: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::SourceUnavailable {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::SourceUnavailable { command, .. } => {
                let program = command.split_whitespace().next().unwrap_or(command);
                format!(
                    "Dependency '{}' is missing or failing. Please troubleshoot the command '{}' and retry.",
                    program, command
                )
            }
            AppError::FieldMissing(field) => {
                format!("Expected field '{}' was not reported.", field)
            }
            AppError::ProbeFailure { probe, .. } => {
                format!("Connectivity test '{}' could not be completed.", probe)
            }
            AppError::Config(_) => {
                "Configuration error. Check your config file or command-line arguments.".to_string()
            }
            AppError::Io(_) => "File system error. Check permissions and disk space.".to_string(),
            AppError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
        }
    }

    /// Process exit code for an error that ends the run
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::SourceUnavailable { .. } => EXIT_SOURCE_UNAVAILABLE,
            AppError::Config(_) => 2,
            _ => 1,
        }
    }
}
