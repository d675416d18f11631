use crate::completion::CompletionError;
use crate::config::ConfigError;
use crate::image_search::SearchError;
use crate::store::StoreError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Local checks that stop a write before any external call is made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Minimum temperature ({min}) cannot be greater than maximum temperature ({max})")]
    TemperatureOrder { min: f64, max: f64 },

    #[error("Temperatures must be finite numbers")]
    TemperatureNotFinite,

    #[error("Month must be between 1 and 12, got {0}")]
    MonthOutOfRange(u8),

    #[error("Fly name is required")]
    MissingName,

    #[error("A valid email address is required")]
    InvalidEmail,

    #[error("Renaming flies is not supported")]
    RenameUnsupported,

    #[error("Removing a fly's image is not supported")]
    ImageRemovalUnsupported,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("fly not found: {0}")]
    NotFound(String),

    #[error("failed to download image: {0}")]
    Download(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One line of user-facing feedback. Failure text always starts with
/// "Error" so screens can colour it by that substring; `error` is set by the
/// constructor and never inferred from the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub message: String,
    pub error: bool,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            message: text.into(),
            error: false,
        }
    }

    /// "Error: <cause>"
    pub fn error(cause: impl fmt::Display) -> Self {
        Self {
            message: format!("Error: {}", cause),
            error: true,
        }
    }

    /// "Error <context>: <cause>"
    pub fn error_in(context: &str, cause: impl fmt::Display) -> Self {
        Self {
            message: format!("Error {}: {}", context, cause),
            error: true,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
