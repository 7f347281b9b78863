use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Operation-level failures. Extraction problems are deliberately absent:
/// they never abort an upload and are stored as per-document notes instead.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad user input to a manual add/edit form. Nothing was mutated.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A price list or workbook could not be decoded into usable rows.
    /// The previous catalog state for that category is preserved.
    #[error("parse failed: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// A destructive operation was invoked without its confirmation flag.
    #[error("confirmation required: {0}")]
    ConfirmationRequired(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
